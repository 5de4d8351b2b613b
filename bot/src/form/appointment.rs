//! 予約フォーム: 日付 → 時刻 → 洗濯機 の 3 ステップ。
//! 各ステップの検証は描画時の判定を信用せず、押された時点で
//! ストアを読み直して判定し直す。

use crate::form::{
    next_state, rerender, CloseReason, Flow, Step, StepOutcome,
};
use crate::text;
use chrono::NaiveDateTime;
use kernel::availability::{aggregate, boundary_slot, expand, slot_for};
use kernel::model::appointment::{event::CreateAppointment, Appointment};
use kernel::model::draft::AppointmentDraft;
use kernel::model::slot::{Slot, SlotReason};
use kernel::model::user::User;
use kernel::model::washer::Washer;
use kernel::repository::appointment::AppointmentRepository;
use kernel::repository::draft::{AppointmentDraftRepository, SummaryDraftRepository};
use kernel::repository::user::UserRepository;
use kernel::repository::washer::WasherRepository;
use kernel::schedule::{available_dates, times_for, BOOK_CUTOFF_MINUTES};
use kernel::transport::{Button, Keyboard};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

static STEPS: [&(dyn Step<AppointmentForm>); 3] = [&DateStep, &TimeStep, &WasherStep];

pub struct AppointmentForm {
    pub user: User,
    pub draft: AppointmentDraft,
    pub now: NaiveDateTime,
    appointments: Vec<Appointment>,
    washers: Vec<Washer>,
    error: Option<String>,
    closed: bool,
    reserved: bool,
    passed: bool,
}

impl AppointmentForm {
    pub async fn load(
        reg: &AppRegistry,
        user: User,
        draft: AppointmentDraft,
        now: NaiveDateTime,
    ) -> AppResult<Self> {
        let appointments = reg
            .appointment_repository()
            .find_by_draft(draft.draft_id)
            .await?;
        let washers = reg.washer_repository().find_all().await?;

        let mut form = Self {
            user,
            draft,
            now,
            appointments,
            washers,
            error: None,
            closed: false,
            reserved: false,
            passed: false,
        };
        form.refresh_boundary_flags();
        Ok(form)
    }

    fn refresh_boundary_flags(&mut self) {
        // 最終ステップまで来ているドラフトだけが締切・開始の対象になる
        if self.draft.state == STEPS.len() as i32 - 1 {
            if let Some(start) = self.draft.start_at() {
                match boundary_slot(self.now, start).map(|s| s.reason) {
                    Some(SlotReason::Passed) => self.passed = true,
                    Some(SlotReason::Reserved) => self.reserved = true,
                    _ => {}
                }
            }
        }
    }

    async fn evaluate_date(
        &self,
        reg: &AppRegistry,
        date: chrono::NaiveDate,
    ) -> AppResult<Slot> {
        let times = times_for(chrono::Datelike::weekday(&date));
        let appointments = reg
            .appointment_repository()
            .find_matching(date, &times)
            .await?;
        let slots = expand(
            self.now,
            &self.user,
            &appointments,
            date,
            &times,
            &self.washers,
        );
        Ok(aggregate(&slots))
    }

    async fn evaluate_time(
        &self,
        reg: &AppRegistry,
        time: chrono::NaiveTime,
    ) -> AppResult<Option<Slot>> {
        let Some(date) = self.draft.book_date else {
            return Ok(None);
        };
        let appointments = reg
            .appointment_repository()
            .find_matching(date, &[time])
            .await?;
        let slots = expand(
            self.now,
            &self.user,
            &appointments,
            date,
            &[time],
            &self.washers,
        );
        Ok(Some(aggregate(&slots)))
    }

    async fn evaluate_washer(&self, reg: &AppRegistry, washer: &Washer) -> AppResult<Option<Slot>> {
        let Some(start) = self.draft.start_at() else {
            return Ok(None);
        };
        if let Some(slot) = boundary_slot(self.now, start) {
            return Ok(Some(slot));
        }
        let appointment = reg
            .appointment_repository()
            .find_one_at(start.date(), start.time(), washer.washer_id)
            .await?;
        Ok(Some(slot_for(&self.user, appointment.as_ref(), washer)))
    }
}

struct DateStep;

#[async_trait::async_trait]
impl Step<AppointmentForm> for DateStep {
    fn label(&self) -> &'static str {
        "Дата"
    }

    fn prompt(&self) -> &'static str {
        "Выберите дату"
    }

    async fn render_options(
        &self,
        reg: &AppRegistry,
        form: &AppointmentForm,
    ) -> AppResult<Option<Keyboard>> {
        let mut rows = Vec::new();
        for date in available_dates(form.now, form.user.role) {
            let slot = form.evaluate_date(reg, date).await?;
            let sign = text::slot_sign(&slot)
                .map(|s| format!("{} ", s))
                .unwrap_or_default();
            rows.push(vec![Button::new(
                format!("{}{}", sign, text::date_button_to_str(date)),
                form.draft.state,
                date.format("%Y-%m-%d"),
            )]);
        }
        Ok(Some(Keyboard { rows }))
    }

    async fn validate(
        &self,
        reg: &AppRegistry,
        form: &mut AppointmentForm,
        value: &str,
    ) -> AppResult<StepOutcome> {
        let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
            return Ok(StepOutcome::ignored());
        };
        let slot = form.evaluate_date(reg, date).await?;
        if slot.available {
            reg.appointment_draft_repository()
                .set_book_date(form.draft.draft_id, date)
                .await?;
            form.draft.book_date = Some(date);
            Ok(StepOutcome::accepted())
        } else {
            Ok(StepOutcome::rejected(text::date_error_text(slot.reason)))
        }
    }

    fn describe(&self, form: &AppointmentForm) -> String {
        match form.draft.book_date {
            Some(date) => text::date_to_str(date, form.now.date()),
            None => "...".into(),
        }
    }
}

struct TimeStep;

#[async_trait::async_trait]
impl Step<AppointmentForm> for TimeStep {
    fn label(&self) -> &'static str {
        "Время"
    }

    fn prompt(&self) -> &'static str {
        "Выберите время"
    }

    async fn render_options(
        &self,
        reg: &AppRegistry,
        form: &AppointmentForm,
    ) -> AppResult<Option<Keyboard>> {
        let Some(date) = form.draft.book_date else {
            return Ok(None);
        };
        let mut rows = Vec::new();
        for time in times_for(chrono::Datelike::weekday(&date)) {
            // 既に始まってしまった時刻のボタンは出さない
            if form.now >= date.and_time(time) {
                continue;
            }
            let Some(slot) = form.evaluate_time(reg, time).await? else {
                continue;
            };
            let sign = text::slot_sign(&slot)
                .map(|s| format!("{} ", s))
                .unwrap_or_default();
            rows.push(vec![Button::new(
                format!("{}{}", sign, text::time_to_str(time)),
                form.draft.state,
                time.format("%H:%M:%S"),
            )]);
        }
        Ok(Some(Keyboard { rows }))
    }

    async fn validate(
        &self,
        reg: &AppRegistry,
        form: &mut AppointmentForm,
        value: &str,
    ) -> AppResult<StepOutcome> {
        let Ok(time) = chrono::NaiveTime::parse_from_str(value, "%H:%M:%S") else {
            return Ok(StepOutcome::ignored());
        };
        let Some(slot) = form.evaluate_time(reg, time).await? else {
            return Ok(StepOutcome::ignored());
        };
        if slot.available {
            reg.appointment_draft_repository()
                .set_book_time(form.draft.draft_id, time)
                .await?;
            form.draft.book_time = Some(time);
            Ok(StepOutcome::accepted())
        } else {
            Ok(StepOutcome::rejected(text::time_error_text(
                slot.reason,
                BOOK_CUTOFF_MINUTES * 60,
            )))
        }
    }

    fn describe(&self, form: &AppointmentForm) -> String {
        let (Some(date), Some(time)) = (form.draft.book_date, form.draft.book_time) else {
            return "...".into();
        };
        let base = text::time_to_str(time);
        match text::time_note(chrono::Datelike::weekday(&date), time) {
            Some(note) => format!("{} ({})", base, note),
            None => base,
        }
    }
}

struct WasherStep;

#[async_trait::async_trait]
impl Step<AppointmentForm> for WasherStep {
    fn label(&self) -> &'static str {
        "Стиральные машины"
    }

    fn prompt(&self) -> &'static str {
        "Выберите стиральные машины"
    }

    async fn render_options(
        &self,
        reg: &AppRegistry,
        form: &AppointmentForm,
    ) -> AppResult<Option<Keyboard>> {
        let mut row = Vec::new();
        for washer in &form.washers {
            let Some(slot) = form.evaluate_washer(reg, washer).await? else {
                continue;
            };
            let sign = text::slot_sign(&slot)
                .map(|s| format!("{} ", s))
                .unwrap_or_default();
            row.push(Button::new(
                format!("{}{}", sign, washer.washer_name),
                form.draft.state,
                washer.washer_id,
            ));
        }
        Ok(Some(Keyboard { rows: vec![row] }))
    }

    async fn validate(
        &self,
        reg: &AppRegistry,
        form: &mut AppointmentForm,
        value: &str,
    ) -> AppResult<StepOutcome> {
        let Ok(washer_id) = value.parse::<kernel::model::id::WasherId>() else {
            return Ok(StepOutcome::ignored());
        };
        let Some(washer) = reg.washer_repository().find_by_id(washer_id).await? else {
            return Ok(StepOutcome::ignored());
        };
        let Some(slot) = form.evaluate_washer(reg, &washer).await? else {
            return Ok(StepOutcome::ignored());
        };

        if !slot.available {
            return Ok(StepOutcome::rejected(text::washer_error_text(slot.reason)));
        }

        match slot.reason {
            SlotReason::Available => {
                // 役割ごとの上限を確定直前に数え直す
                let planned = reg
                    .appointment_repository()
                    .count_planned(form.user.user_id, form.now)
                    .await?;
                let max_washers = form.user.role.max_washers();
                if planned >= max_washers as i64 {
                    return Ok(StepOutcome::rejected(
                        text::MAX_WASHERS_ERROR.replace("{}", &max_washers.to_string()),
                    ));
                }

                let (Some(date), Some(time)) = (form.draft.book_date, form.draft.book_time) else {
                    return Ok(StepOutcome::ignored());
                };
                let event = CreateAppointment::new(
                    form.user.user_id,
                    form.draft.draft_id,
                    date,
                    time,
                    washer_id,
                );
                match reg.appointment_repository().create(event).await {
                    Ok(_) => Ok(StepOutcome::accepted()),
                    // 検証と確定の間に他の予約が滑り込んだ負け側
                    Err(AppError::UnprocessableEntity(_)) => Ok(StepOutcome::rejected(
                        text::washer_error_text(SlotReason::AlreadyBooked),
                    )),
                    Err(e) => Err(e),
                }
            }
            SlotReason::AlreadyBooked => {
                // 自分の予約を押した場合はキャンセル
                let Some(appointment) = slot.appointment else {
                    return Ok(StepOutcome::ignored());
                };
                reg.appointment_repository()
                    .delete(appointment.appointment_id)
                    .await?;
                Ok(StepOutcome::accepted())
            }
            _ => Ok(StepOutcome::ignored()),
        }
    }

    fn describe(&self, form: &AppointmentForm) -> String {
        if form.appointments.is_empty() {
            return "...".into();
        }
        let names = form
            .appointments
            .iter()
            .filter_map(|a| {
                form.washers
                    .iter()
                    .find(|w| w.washer_id == a.washer_id)
                    .map(|w| w.washer_name.clone())
            })
            .collect();
        text::washers_to_str(names)
    }
}

#[async_trait::async_trait]
impl Flow for AppointmentForm {
    fn user(&self) -> &User {
        &self.user
    }

    fn message_id(&self) -> Option<i64> {
        self.draft.message_id
    }

    fn state(&self) -> i32 {
        self.draft.state
    }

    fn step_count(&self) -> i32 {
        STEPS.len() as i32
    }

    fn step_label(&self, state: i32) -> &'static str {
        STEPS[state as usize].label()
    }

    fn step_prompt(&self, state: i32) -> &'static str {
        STEPS[state as usize].prompt()
    }

    fn describe_step(&self, state: i32) -> String {
        STEPS[state as usize].describe(self)
    }

    fn finished(&self) -> bool {
        !self.appointments.is_empty()
    }

    fn finished_text(&self) -> &'static str {
        text::APPOINTMENT_FINISHED
    }

    fn closed(&self) -> bool {
        self.closed
    }

    fn close_with(&mut self, reason: CloseReason) {
        match reason {
            CloseReason::NotRelevant => self.closed = true,
            CloseReason::Passed => self.passed = true,
            CloseReason::Reserved => self.reserved = true,
        }
    }

    fn boundary_title(&self) -> Option<String> {
        if self.passed {
            Some(format!("📅 {}", text::APPOINTMENT_PASSED_TITLE))
        } else if self.reserved {
            Some(format!("⌛ {}", text::APPOINTMENT_RESERVED_TITLE))
        } else {
            None
        }
    }

    fn keyboard_frozen(&self) -> bool {
        self.passed || self.reserved
    }

    fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    async fn body_override(&self, _reg: &AppRegistry) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn reply_markup(&self, reg: &AppRegistry) -> AppResult<Option<Keyboard>> {
        STEPS[self.draft.state as usize]
            .render_options(reg, self)
            .await
    }

    async fn handle_value(
        &mut self,
        reg: &AppRegistry,
        state: i32,
        value: &str,
    ) -> AppResult<StepOutcome> {
        if !(0..self.step_count()).contains(&state) {
            return Ok(StepOutcome::ignored());
        }
        let outcome = STEPS[state as usize].validate(reg, self, value).await?;
        if outcome.accepted {
            let next = next_state(self.draft.state, state, self.step_count());
            if next != self.draft.state {
                reg.appointment_draft_repository()
                    .set_state(self.draft.draft_id, next)
                    .await?;
                self.draft.state = next;
            }
        }
        Ok(outcome)
    }

    async fn reload(&mut self, reg: &AppRegistry) -> AppResult<()> {
        self.draft = reg
            .appointment_draft_repository()
            .find_by_id(self.draft.draft_id)
            .await?;
        self.appointments = reg
            .appointment_repository()
            .find_by_draft(self.draft.draft_id)
            .await?;
        self.refresh_boundary_flags();
        Ok(())
    }

    async fn reallocate(&mut self, reg: &AppRegistry) -> AppResult<Vec<(i64, i64)>> {
        let repo = reg.appointment_draft_repository();
        let superseded = repo.find_superseded(&self.draft).await?;
        if superseded.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<_> = superseded.iter().map(|d| d.draft_id).collect();
        if let Err(e) = repo.reallocate(self.draft.draft_id, &ids).await {
            // 整理に失敗しても枠の一意性はストア側で守られるため、
            // ここでは記録して続行する
            tracing::error!(error = %e, "appointment draft reallocation failed");
        }

        let chat_id = self.user.chat_id.unwrap_or_default();
        Ok(superseded
            .iter()
            .filter_map(|d| d.message_id.map(|m| (chat_id, m)))
            .collect())
    }

    async fn bind_message(&mut self, reg: &AppRegistry, message_id: i64) -> AppResult<()> {
        reg.appointment_draft_repository()
            .set_message(self.draft.draft_id, message_id)
            .await?;
        self.draft.message_id = Some(message_id);
        Ok(())
    }
}

/// 確定イベントの後始末。新しい予約の影響を受けうるドラフトと
/// サマリーを描き直す。重いので購読側ワーカーで動かす
pub async fn take_affect(
    reg: &AppRegistry,
    draft: &kernel::model::draft::AppointmentDraft,
    now: NaiveDateTime,
) -> AppResult<()> {
    let affected = reg
        .appointment_draft_repository()
        .find_affected_by_commit(draft)
        .await?;
    tracing::info!(count = affected.len(), "appointment drafts affected by commit");

    let jobs: Vec<_> = affected
        .into_iter()
        .map(|d| {
            let reg = reg.clone();
            async move {
                let result: AppResult<()> = async {
                    let user = reg.user_repository().find_by_id(d.user_id).await?;
                    let mut form = AppointmentForm::load(&reg, user, d, now).await?;
                    rerender(&reg, &mut form).await
                }
                .await;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to refresh affected appointment draft");
                }
            }
        })
        .collect();
    futures::future::join_all(jobs).await;

    let Some(book_date) = draft.book_date else {
        return Ok(());
    };
    let summaries = reg
        .summary_draft_repository()
        .find_affected_by_commit(book_date)
        .await?;
    tracing::info!(count = summaries.len(), "summary drafts affected by commit");

    let jobs: Vec<_> = summaries
        .into_iter()
        .map(|d| {
            let reg = reg.clone();
            async move {
                let result: AppResult<()> = async {
                    let user = reg.user_repository().find_by_id(d.user_id).await?;
                    let mut form = crate::form::SummaryForm::load(&reg, user, d, now).await?;
                    rerender(&reg, &mut form).await
                }
                .await;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to refresh affected summary draft");
                }
            }
        })
        .collect();
    futures::future::join_all(jobs).await;

    Ok(())
}

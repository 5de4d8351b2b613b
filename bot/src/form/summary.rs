//! サマリーフォーム: 日付選択の後は、その日の予定表メッセージに切り替わる。
//! 閲覧専用でコピーできないように protect_content を立てて送る。

use crate::form::{next_state, CloseReason, Flow, Step, StepOutcome};
use crate::text;
use chrono::NaiveDateTime;
use kernel::model::draft::SummaryDraft;
use kernel::model::user::User;
use kernel::repository::appointment::AppointmentRepository;
use kernel::repository::draft::SummaryDraftRepository;
use kernel::schedule::available_dates;
use kernel::transport::{Button, Keyboard, ParseMode};
use registry::AppRegistry;
use shared::error::AppResult;

static STEPS: [&(dyn Step<SummaryForm>); 2] = [&SummaryDateStep, &SummaryInfoStep];

pub struct SummaryForm {
    pub user: User,
    pub draft: SummaryDraft,
    pub now: NaiveDateTime,
    error: Option<String>,
    closed: bool,
}

impl SummaryForm {
    pub async fn load(
        _reg: &AppRegistry,
        user: User,
        draft: SummaryDraft,
        now: NaiveDateTime,
    ) -> AppResult<Self> {
        Ok(Self {
            user,
            draft,
            now,
            error: None,
            closed: false,
        })
    }
}

struct SummaryDateStep;

#[async_trait::async_trait]
impl Step<SummaryForm> for SummaryDateStep {
    fn label(&self) -> &'static str {
        "Дата"
    }

    fn prompt(&self) -> &'static str {
        "Выберите дату"
    }

    async fn render_options(
        &self,
        reg: &AppRegistry,
        form: &SummaryForm,
    ) -> AppResult<Option<Keyboard>> {
        let mut rows = Vec::new();
        for date in available_dates(form.now, form.user.role) {
            let count = reg.appointment_repository().count_on(date).await?;
            let label = if count > 0 {
                format!("{} - {}", text::date_button_to_str(date), count)
            } else {
                text::date_button_to_str(date)
            };
            rows.push(vec![Button::new(
                label,
                form.draft.state,
                date.format("%Y-%m-%d"),
            )]);
        }
        Ok(Some(Keyboard { rows }))
    }

    async fn validate(
        &self,
        reg: &AppRegistry,
        form: &mut SummaryForm,
        value: &str,
    ) -> AppResult<StepOutcome> {
        let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
            return Ok(StepOutcome::ignored());
        };
        reg.summary_draft_repository()
            .set_summary_date(form.draft.draft_id, date)
            .await?;
        form.draft.summary_date = Some(date);
        Ok(StepOutcome::accepted())
    }

    fn describe(&self, form: &SummaryForm) -> String {
        match form.draft.summary_date {
            Some(date) => text::date_to_str(date, form.now.date()),
            None => "...".into(),
        }
    }
}

/// ボタンを持たない表示専用のステップ
struct SummaryInfoStep;

#[async_trait::async_trait]
impl Step<SummaryForm> for SummaryInfoStep {
    fn label(&self) -> &'static str {
        "Записи"
    }

    fn prompt(&self) -> &'static str {
        "📅 Записи на дату"
    }

    async fn render_options(
        &self,
        _reg: &AppRegistry,
        _form: &SummaryForm,
    ) -> AppResult<Option<Keyboard>> {
        Ok(None)
    }

    async fn validate(
        &self,
        _reg: &AppRegistry,
        _form: &mut SummaryForm,
        _value: &str,
    ) -> AppResult<StepOutcome> {
        Ok(StepOutcome::ignored())
    }

    fn describe(&self, _form: &SummaryForm) -> String {
        String::new()
    }
}

#[async_trait::async_trait]
impl Flow for SummaryForm {
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
        false
    }

    fn finished_text(&self) -> &'static str {
        ""
    }

    fn protect_content(&self) -> bool {
        true
    }

    fn parse_mode(&self) -> ParseMode {
        if self.draft.state > 0 {
            ParseMode::MarkdownV2
        } else {
            ParseMode::Markdown
        }
    }

    fn closed(&self) -> bool {
        self.closed
    }

    fn close_with(&mut self, reason: CloseReason) {
        if reason == CloseReason::NotRelevant {
            self.closed = true;
        }
    }

    fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    async fn body_override(&self, reg: &AppRegistry) -> AppResult<Option<String>> {
        // 日付が決まったら一覧表示に切り替える
        let Some(date) = self.draft.summary_date else {
            return Ok(None);
        };
        if self.draft.state < 1 {
            return Ok(None);
        }
        let entries = reg.appointment_repository().find_day_schedule(date).await?;
        Ok(Some(text::day_schedule_text(
            date,
            self.now.date(),
            self.now,
            &entries,
        )))
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
                reg.summary_draft_repository()
                    .set_state(self.draft.draft_id, next)
                    .await?;
                self.draft.state = next;
            }
        }
        Ok(outcome)
    }

    async fn reload(&mut self, _reg: &AppRegistry) -> AppResult<()> {
        Ok(())
    }

    async fn reallocate(&mut self, reg: &AppRegistry) -> AppResult<Vec<(i64, i64)>> {
        let repo = reg.summary_draft_repository();
        let superseded = repo.find_superseded(&self.draft).await?;
        if superseded.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<_> = superseded.iter().map(|d| d.draft_id).collect();
        if let Err(e) = repo.reallocate(self.draft.draft_id, &ids).await {
            tracing::error!(error = %e, "summary draft reallocation failed");
        }

        let chat_id = self.user.chat_id.unwrap_or_default();
        Ok(superseded
            .iter()
            .filter_map(|d| d.message_id.map(|m| (chat_id, m)))
            .collect())
    }

    async fn bind_message(&mut self, reg: &AppRegistry, message_id: i64) -> AppResult<()> {
        reg.summary_draft_repository()
            .set_message(self.draft.draft_id, message_id)
            .await?;
        self.draft.message_id = Some(message_id);
        Ok(())
    }
}

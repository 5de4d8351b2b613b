//! リマインダーフォーム: オフセットのトグルだけの単一ステップ。

use crate::form::{CloseReason, Flow, Step, StepOutcome};
use crate::text;
use chrono::NaiveDateTime;
use kernel::model::draft::ReminderDraft;
use kernel::model::reminder::{event::CreateReminder, Reminder};
use kernel::model::user::User;
use kernel::repository::draft::ReminderDraftRepository;
use kernel::repository::reminder::ReminderRepository;
use kernel::schedule::REMINDER_OFFSETS;
use kernel::transport::{Button, Keyboard};
use registry::AppRegistry;
use shared::error::AppResult;

static STEPS: [&(dyn Step<ReminderForm>); 1] = [&OffsetStep];

pub struct ReminderForm {
    pub user: User,
    pub draft: ReminderDraft,
    pub now: NaiveDateTime,
    reminders: Vec<Reminder>,
    error: Option<String>,
    closed: bool,
}

impl ReminderForm {
    pub async fn load(
        reg: &AppRegistry,
        user: User,
        draft: ReminderDraft,
        now: NaiveDateTime,
    ) -> AppResult<Self> {
        let reminders = reg.reminder_repository().find_by_user(user.user_id).await?;
        Ok(Self {
            user,
            draft,
            now,
            reminders,
            error: None,
            closed: false,
        })
    }
}

struct OffsetStep;

#[async_trait::async_trait]
impl Step<ReminderForm> for OffsetStep {
    fn label(&self) -> &'static str {
        "Уведомления"
    }

    fn prompt(&self) -> &'static str {
        "Выберите за сколько вас предупредить"
    }

    async fn render_options(
        &self,
        _reg: &AppRegistry,
        form: &ReminderForm,
    ) -> AppResult<Option<Keyboard>> {
        let mut row = Vec::new();
        for seconds in REMINDER_OFFSETS {
            let active = form.reminders.iter().any(|r| r.seconds == seconds);
            let sign = if active { "✅ " } else { "" };
            row.push(Button::new(
                format!("{}{}", sign, text::timedelta_to_str(seconds)),
                form.draft.state,
                seconds,
            ));
        }
        Ok(Some(Keyboard { rows: vec![row] }))
    }

    async fn validate(
        &self,
        reg: &AppRegistry,
        form: &mut ReminderForm,
        value: &str,
    ) -> AppResult<StepOutcome> {
        let Ok(seconds) = value.parse::<i64>() else {
            return Ok(StepOutcome::ignored());
        };
        if !REMINDER_OFFSETS.contains(&seconds) {
            return Ok(StepOutcome::ignored());
        }

        // 既に有れば外し、無ければ付けるトグル
        match reg
            .reminder_repository()
            .find_by_user_and_seconds(form.user.user_id, seconds)
            .await?
        {
            Some(reminder) => {
                reg.reminder_repository()
                    .delete(reminder.reminder_id)
                    .await?;
            }
            None => {
                reg.reminder_repository()
                    .create(CreateReminder::new(
                        seconds,
                        form.user.user_id,
                        Some(form.draft.draft_id),
                    ))
                    .await?;
            }
        }
        Ok(StepOutcome::accepted())
    }

    fn describe(&self, form: &ReminderForm) -> String {
        if form.reminders.is_empty() {
            return "...".into();
        }
        let mut sorted: Vec<i64> = form.reminders.iter().map(|r| r.seconds).collect();
        sorted.sort_unstable();
        let lines: Vec<String> = sorted
            .into_iter()
            .map(|s| format!("- {}", text::timedelta_to_str(s)))
            .collect();
        format!("\n{}", lines.join("\n"))
    }
}

#[async_trait::async_trait]
impl Flow for ReminderForm {
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
        !self.reminders.is_empty()
    }

    fn finished_text(&self) -> &'static str {
        text::REMINDER_FINISHED
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
        STEPS[state as usize].validate(reg, self, value).await
    }

    async fn reload(&mut self, reg: &AppRegistry) -> AppResult<()> {
        self.reminders = reg
            .reminder_repository()
            .find_by_user(self.user.user_id)
            .await?;
        Ok(())
    }

    async fn reallocate(&mut self, reg: &AppRegistry) -> AppResult<Vec<(i64, i64)>> {
        let repo = reg.reminder_draft_repository();
        let superseded = repo.find_superseded(&self.draft).await?;
        if superseded.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<_> = superseded.iter().map(|d| d.draft_id).collect();
        if let Err(e) = repo.reallocate(self.draft.draft_id, &ids).await {
            tracing::error!(error = %e, "reminder draft reallocation failed");
        }

        let chat_id = self.user.chat_id.unwrap_or_default();
        Ok(superseded
            .iter()
            .filter_map(|d| d.message_id.map(|m| (chat_id, m)))
            .collect())
    }

    async fn bind_message(&mut self, reg: &AppRegistry, message_id: i64) -> AppResult<()> {
        reg.reminder_draft_repository()
            .set_message(self.draft.draft_id, message_id)
            .await?;
        self.draft.message_id = Some(message_id);
        Ok(())
    }
}

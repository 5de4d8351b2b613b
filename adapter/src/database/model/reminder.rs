use kernel::model::{
    id::{DraftId, ReminderId, UserId},
    reminder::Reminder,
};

#[derive(sqlx::FromRow)]
pub struct ReminderRow {
    pub reminder_id: ReminderId,
    pub seconds: i64,
    pub user_id: UserId,
    pub draft_id: Option<DraftId>,
}

impl From<ReminderRow> for Reminder {
    fn from(value: ReminderRow) -> Self {
        let ReminderRow {
            reminder_id,
            seconds,
            user_id,
            draft_id,
        } = value;
        Reminder {
            reminder_id,
            seconds,
            user_id,
            draft_id,
        }
    }
}

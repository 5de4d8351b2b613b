use crate::model::{
    id::{ReminderId, UserId},
    reminder::{event::CreateReminder, Reminder},
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn create(&self, event: CreateReminder) -> AppResult<ReminderId>;
    async fn delete(&self, reminder_id: ReminderId) -> AppResult<()>;
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Reminder>>;
    // トグル判定用: 同じオフセットのリマインダーが既に有るか
    async fn find_by_user_and_seconds(
        &self,
        user_id: UserId,
        seconds: i64,
    ) -> AppResult<Option<Reminder>>;
}

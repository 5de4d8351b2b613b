use crate::database::{model::reminder::ReminderRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{ReminderId, UserId},
    reminder::{event::CreateReminder, Reminder},
};
use kernel::repository::reminder::ReminderRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct ReminderRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ReminderRepository for ReminderRepositoryImpl {
    async fn create(&self, event: CreateReminder) -> AppResult<ReminderId> {
        let reminder_id = ReminderId::new();
        sqlx::query(
            r#"
                INSERT INTO reminders (reminder_id, seconds, user_id, draft_id)
                VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reminder_id)
        .bind(event.seconds)
        .bind(event.user_id)
        .bind(event.draft_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(reminder_id)
    }

    async fn delete(&self, reminder_id: ReminderId) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                DELETE FROM reminders WHERE reminder_id = $1
            "#,
        )
        .bind(reminder_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "specified reminder not found".into(),
            ));
        }

        Ok(())
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Reminder>> {
        sqlx::query_as::<_, ReminderRow>(
            r#"
                SELECT reminder_id, seconds, user_id, draft_id
                FROM reminders
                WHERE user_id = $1
                ORDER BY seconds ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Reminder::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_user_and_seconds(
        &self,
        user_id: UserId,
        seconds: i64,
    ) -> AppResult<Option<Reminder>> {
        sqlx::query_as::<_, ReminderRow>(
            r#"
                SELECT reminder_id, seconds, user_id, draft_id
                FROM reminders
                WHERE user_id = $1 AND seconds = $2
            "#,
        )
        .bind(user_id)
        .bind(seconds)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(Reminder::from))
        .map_err(AppError::SpecificOperationError)
    }
}

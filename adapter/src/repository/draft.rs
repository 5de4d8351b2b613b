use crate::database::{
    model::draft::{AppointmentDraftRow, ReminderDraftRow, SummaryDraftRow},
    ConnectionPool,
};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    draft::{
        event::{CreateAppointmentDraft, CreateReminderDraft, CreateSummaryDraft},
        AppointmentDraft, ReminderDraft, SummaryDraft,
    },
    id::{DraftId, UserId},
};
use kernel::repository::draft::{
    AppointmentDraftRepository, ReminderDraftRepository, SummaryDraftRepository,
};
use shared::error::{AppError, AppResult};
use sqlx::types::chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

fn raw_ids(ids: &[DraftId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.raw()).collect()
}

#[derive(new)]
pub struct AppointmentDraftRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl AppointmentDraftRepository for AppointmentDraftRepositoryImpl {
    async fn create(&self, event: CreateAppointmentDraft) -> AppResult<AppointmentDraft> {
        let draft_id = DraftId::new();
        sqlx::query(
            r#"
                INSERT INTO appointment_drafts (draft_id, state, reserved, user_id)
                VALUES ($1, 0, FALSE, $2)
            "#,
        )
        .bind(draft_id)
        .bind(event.user_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        self.find_by_id(draft_id).await
    }

    async fn find_by_id(&self, draft_id: DraftId) -> AppResult<AppointmentDraft> {
        sqlx::query_as::<_, AppointmentDraftRow>(
            r#"
                SELECT draft_id, state, book_date, book_time, reserved, user_id, message_id
                FROM appointment_drafts
                WHERE draft_id = $1
            "#,
        )
        .bind(draft_id)
        .fetch_one(self.db.inner_ref())
        .await
        .map(AppointmentDraft::from)
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<AppointmentDraft>> {
        sqlx::query_as::<_, AppointmentDraftRow>(
            r#"
                SELECT draft_id, state, book_date, book_time, reserved, user_id, message_id
                FROM appointment_drafts
                WHERE user_id = $1 AND message_id = $2
            "#,
        )
        .bind(user_id)
        .bind(message_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(AppointmentDraft::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_planned_by_user(
        &self,
        user_id: UserId,
        now: NaiveDateTime,
    ) -> AppResult<Vec<AppointmentDraft>> {
        sqlx::query_as::<_, AppointmentDraftRow>(
            r#"
                SELECT d.draft_id, d.state, d.book_date, d.book_time,
                       d.reserved, d.user_id, d.message_id
                FROM appointment_drafts AS d
                WHERE d.user_id = $1
                  AND d.book_date IS NOT NULL AND d.book_time IS NOT NULL
                  AND (d.book_date + d.book_time) >= $2
                  AND EXISTS (
                    SELECT 1 FROM appointments AS a WHERE a.draft_id = d.draft_id
                  )
                ORDER BY d.book_date ASC, d.book_time ASC
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(AppointmentDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_live(&self, now: NaiveDateTime) -> AppResult<Vec<AppointmentDraft>> {
        sqlx::query_as::<_, AppointmentDraftRow>(
            r#"
                SELECT d.draft_id, d.state, d.book_date, d.book_time,
                       d.reserved, d.user_id, d.message_id
                FROM appointment_drafts AS d
                WHERE d.message_id IS NOT NULL
                  AND d.book_date IS NOT NULL AND d.book_time IS NOT NULL
                  AND (d.book_date + d.book_time) >= $1
                  AND EXISTS (
                    SELECT 1 FROM appointments AS a WHERE a.draft_id = d.draft_id
                  )
            "#,
        )
        .bind(now)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(AppointmentDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_superseded(
        &self,
        draft: &AppointmentDraft,
    ) -> AppResult<Vec<AppointmentDraft>> {
        // 未選択 (NULL) 同士も同じ選択内容として扱いたいので
        // IS NOT DISTINCT FROM で比較する
        sqlx::query_as::<_, AppointmentDraftRow>(
            r#"
                SELECT draft_id, state, book_date, book_time, reserved, user_id, message_id
                FROM appointment_drafts
                WHERE draft_id <> $1
                  AND user_id = $2
                  AND book_date IS NOT DISTINCT FROM $3
                  AND book_time IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(draft.draft_id)
        .bind(draft.user_id)
        .bind(draft.book_date)
        .bind(draft.book_time)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(AppointmentDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_affected_by_commit(
        &self,
        draft: &AppointmentDraft,
    ) -> AppResult<Vec<AppointmentDraft>> {
        sqlx::query_as::<_, AppointmentDraftRow>(
            r#"
                SELECT draft_id, state, book_date, book_time, reserved, user_id, message_id
                FROM appointment_drafts
                WHERE draft_id <> $1
                  AND (
                    (book_date = $2 AND book_time = $3 AND state = 2)
                    OR (book_date = $2 AND state = 1)
                    OR (state = 0)
                  )
            "#,
        )
        .bind(draft.draft_id)
        .bind(draft.book_date)
        .bind(draft.book_time)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(AppointmentDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_committed_on(&self, book_date: NaiveDate) -> AppResult<Vec<AppointmentDraft>> {
        sqlx::query_as::<_, AppointmentDraftRow>(
            r#"
                SELECT d.draft_id, d.state, d.book_date, d.book_time,
                       d.reserved, d.user_id, d.message_id
                FROM appointment_drafts AS d
                WHERE d.book_date = $1
                  AND EXISTS (
                    SELECT 1 FROM appointments AS a WHERE a.draft_id = d.draft_id
                  )
                ORDER BY d.book_time ASC
            "#,
        )
        .bind(book_date)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(AppointmentDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn set_book_date(&self, draft_id: DraftId, book_date: NaiveDate) -> AppResult<()> {
        self.update_one(
            sqlx::query(
                r#"
                    UPDATE appointment_drafts SET book_date = $1 WHERE draft_id = $2
                "#,
            )
            .bind(book_date)
            .bind(draft_id),
        )
        .await
    }

    async fn set_book_time(&self, draft_id: DraftId, book_time: NaiveTime) -> AppResult<()> {
        self.update_one(
            sqlx::query(
                r#"
                    UPDATE appointment_drafts SET book_time = $1 WHERE draft_id = $2
                "#,
            )
            .bind(book_time)
            .bind(draft_id),
        )
        .await
    }

    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()> {
        self.update_one(
            sqlx::query(
                r#"
                    UPDATE appointment_drafts SET state = $1 WHERE draft_id = $2
                "#,
            )
            .bind(state)
            .bind(draft_id),
        )
        .await
    }

    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()> {
        self.update_one(
            sqlx::query(
                r#"
                    UPDATE appointment_drafts SET message_id = $1 WHERE draft_id = $2
                "#,
            )
            .bind(message_id)
            .bind(draft_id),
        )
        .await
    }

    async fn set_reserved(&self, draft_id: DraftId) -> AppResult<()> {
        self.update_one(
            sqlx::query(
                r#"
                    UPDATE appointment_drafts SET reserved = TRUE WHERE draft_id = $1
                "#,
            )
            .bind(draft_id),
        )
        .await
    }

    // 古いドラフトの予約を現在のドラフトに付け替えてから行を消す。
    // 予約の付け替えと削除が食い違うと同じ予約を二つのドラフトが
    // 指してしまうため、必ず 1 トランザクションで行う
    async fn reallocate(&self, target: DraftId, superseded: &[DraftId]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
                UPDATE appointments SET draft_id = $1 WHERE draft_id = ANY($2)
            "#,
        )
        .bind(target)
        .bind(raw_ids(superseded))
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        sqlx::query(
            r#"
                DELETE FROM appointment_drafts WHERE draft_id = ANY($1)
            "#,
        )
        .bind(raw_ids(superseded))
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }
}

impl AppointmentDraftRepositoryImpl {
    async fn update_one(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> AppResult<()> {
        let res = query
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "specified draft not found".into(),
            ));
        }

        Ok(())
    }
}

#[derive(new)]
pub struct ReminderDraftRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ReminderDraftRepository for ReminderDraftRepositoryImpl {
    async fn create(&self, event: CreateReminderDraft) -> AppResult<ReminderDraft> {
        let draft_id = DraftId::new();
        sqlx::query(
            r#"
                INSERT INTO reminder_drafts (draft_id, state, user_id)
                VALUES ($1, 0, $2)
            "#,
        )
        .bind(draft_id)
        .bind(event.user_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        sqlx::query_as::<_, ReminderDraftRow>(
            r#"
                SELECT draft_id, state, user_id, message_id
                FROM reminder_drafts
                WHERE draft_id = $1
            "#,
        )
        .bind(draft_id)
        .fetch_one(self.db.inner_ref())
        .await
        .map(ReminderDraft::from)
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<ReminderDraft>> {
        sqlx::query_as::<_, ReminderDraftRow>(
            r#"
                SELECT draft_id, state, user_id, message_id
                FROM reminder_drafts
                WHERE user_id = $1 AND message_id = $2
            "#,
        )
        .bind(user_id)
        .bind(message_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(ReminderDraft::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_superseded(&self, draft: &ReminderDraft) -> AppResult<Vec<ReminderDraft>> {
        sqlx::query_as::<_, ReminderDraftRow>(
            r#"
                SELECT draft_id, state, user_id, message_id
                FROM reminder_drafts
                WHERE draft_id <> $1 AND user_id = $2
            "#,
        )
        .bind(draft.draft_id)
        .bind(draft.user_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(ReminderDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE reminder_drafts SET state = $1 WHERE draft_id = $2
            "#,
        )
        .bind(state)
        .bind(draft_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE reminder_drafts SET message_id = $1 WHERE draft_id = $2
            "#,
        )
        .bind(message_id)
        .bind(draft_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    async fn reallocate(&self, target: DraftId, superseded: &[DraftId]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
                UPDATE reminders SET draft_id = $1 WHERE draft_id = ANY($2)
            "#,
        )
        .bind(target)
        .bind(raw_ids(superseded))
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        sqlx::query(
            r#"
                DELETE FROM reminder_drafts WHERE draft_id = ANY($1)
            "#,
        )
        .bind(raw_ids(superseded))
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }
}

#[derive(new)]
pub struct SummaryDraftRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl SummaryDraftRepository for SummaryDraftRepositoryImpl {
    async fn create(&self, event: CreateSummaryDraft) -> AppResult<SummaryDraft> {
        let draft_id = DraftId::new();
        sqlx::query(
            r#"
                INSERT INTO summary_drafts (draft_id, state, summary_date, user_id)
                VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(draft_id)
        .bind(event.state)
        .bind(event.summary_date)
        .bind(event.user_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        sqlx::query_as::<_, SummaryDraftRow>(
            r#"
                SELECT draft_id, state, summary_date, user_id, message_id
                FROM summary_drafts
                WHERE draft_id = $1
            "#,
        )
        .bind(draft_id)
        .fetch_one(self.db.inner_ref())
        .await
        .map(SummaryDraft::from)
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<SummaryDraft>> {
        sqlx::query_as::<_, SummaryDraftRow>(
            r#"
                SELECT draft_id, state, summary_date, user_id, message_id
                FROM summary_drafts
                WHERE user_id = $1 AND message_id = $2
            "#,
        )
        .bind(user_id)
        .bind(message_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(SummaryDraft::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_superseded(&self, draft: &SummaryDraft) -> AppResult<Vec<SummaryDraft>> {
        sqlx::query_as::<_, SummaryDraftRow>(
            r#"
                SELECT draft_id, state, summary_date, user_id, message_id
                FROM summary_drafts
                WHERE draft_id <> $1
                  AND user_id = $2
                  AND summary_date IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(draft.draft_id)
        .bind(draft.user_id)
        .bind(draft.summary_date)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(SummaryDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_rendered(
        &self,
        user_id: UserId,
        summary_date: NaiveDate,
    ) -> AppResult<Vec<SummaryDraft>> {
        sqlx::query_as::<_, SummaryDraftRow>(
            r#"
                SELECT draft_id, state, summary_date, user_id, message_id
                FROM summary_drafts
                WHERE user_id = $1 AND summary_date = $2 AND message_id IS NOT NULL
            "#,
        )
        .bind(user_id)
        .bind(summary_date)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(SummaryDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_affected_by_commit(&self, book_date: NaiveDate) -> AppResult<Vec<SummaryDraft>> {
        sqlx::query_as::<_, SummaryDraftRow>(
            r#"
                SELECT draft_id, state, summary_date, user_id, message_id
                FROM summary_drafts
                WHERE (summary_date = $1 AND state = 1) OR (state = 0)
            "#,
        )
        .bind(book_date)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(SummaryDraft::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn set_summary_date(&self, draft_id: DraftId, summary_date: NaiveDate) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE summary_drafts SET summary_date = $1 WHERE draft_id = $2
            "#,
        )
        .bind(summary_date)
        .bind(draft_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE summary_drafts SET state = $1 WHERE draft_id = $2
            "#,
        )
        .bind(state)
        .bind(draft_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE summary_drafts SET message_id = $1 WHERE draft_id = $2
            "#,
        )
        .bind(message_id)
        .bind(draft_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    // サマリーは下流レコードを持たないので削除のみ
    async fn reallocate(&self, _target: DraftId, superseded: &[DraftId]) -> AppResult<()> {
        sqlx::query(
            r#"
                DELETE FROM summary_drafts WHERE draft_id = ANY($1)
            "#,
        )
        .bind(raw_ids(superseded))
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }
}

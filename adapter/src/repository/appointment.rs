use crate::database::{
    model::appointment::{AppointmentRow, DayScheduleRow},
    ConnectionPool,
};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    appointment::{event::CreateAppointment, Appointment, DayScheduleEntry},
    id::{AppointmentId, DraftId, UserId, WasherId},
};
use kernel::repository::appointment::AppointmentRepository;
use shared::error::{AppError, AppResult};
use sqlx::types::chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(new)]
pub struct AppointmentRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl AppointmentRepository for AppointmentRepositoryImpl {
    // 予約操作を行う
    async fn create(&self, event: CreateAppointment) -> AppResult<AppointmentId> {
        let mut tx = self.db.begin().await?;

        // トランザクション分離レベルを SERIALIZABLE に設定する
        self.set_transaction_serializable(&mut tx).await?;

        // 事前のチェックとして、同じ (日付, 時刻, 洗濯機) の予約が
        // 既に存在しないかを調べる。フォーム側の検証後に競合予約が
        // 入り込んだ場合はここで負け側を弾く
        {
            let existing: Option<(AppointmentId,)> = sqlx::query_as(
                r#"
                    SELECT appointment_id
                    FROM appointments
                    WHERE book_date = $1 AND book_time = $2 AND washer_id = $3
                    LIMIT 1
                "#,
            )
            .bind(event.book_date)
            .bind(event.book_time)
            .bind(event.washer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            if existing.is_some() {
                return Err(AppError::UnprocessableEntity(format!(
                    "washer {} is already booked at {} {}",
                    event.washer_id, event.book_date, event.book_time
                )));
            }
        }

        let appointment_id = AppointmentId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO appointments
                (appointment_id, book_date, book_time, draft_id, user_id, washer_id)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(appointment_id)
        .bind(event.book_date)
        .bind(event.book_time)
        .bind(event.draft_id)
        .bind(event.user_id)
        .bind(event.washer_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No appointment record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(appointment_id)
    }

    async fn delete(&self, appointment_id: AppointmentId) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                DELETE FROM appointments WHERE appointment_id = $1
            "#,
        )
        .bind(appointment_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "specified appointment not found".into(),
            ));
        }

        Ok(())
    }

    async fn find_matching(
        &self,
        book_date: NaiveDate,
        times: &[NaiveTime],
    ) -> AppResult<Vec<Appointment>> {
        sqlx::query_as::<_, AppointmentRow>(
            r#"
                SELECT appointment_id, book_date, book_time, draft_id, user_id, washer_id
                FROM appointments
                WHERE book_date = $1 AND book_time = ANY($2)
            "#,
        )
        .bind(book_date)
        .bind(times.to_vec())
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Appointment::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_one_at(
        &self,
        book_date: NaiveDate,
        book_time: NaiveTime,
        washer_id: WasherId,
    ) -> AppResult<Option<Appointment>> {
        sqlx::query_as::<_, AppointmentRow>(
            r#"
                SELECT appointment_id, book_date, book_time, draft_id, user_id, washer_id
                FROM appointments
                WHERE book_date = $1 AND book_time = $2 AND washer_id = $3
            "#,
        )
        .bind(book_date)
        .bind(book_time)
        .bind(washer_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(Appointment::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_draft(&self, draft_id: DraftId) -> AppResult<Vec<Appointment>> {
        sqlx::query_as::<_, AppointmentRow>(
            r#"
                SELECT appointment_id, book_date, book_time, draft_id, user_id, washer_id
                FROM appointments
                WHERE draft_id = $1
            "#,
        )
        .bind(draft_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Appointment::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    // 開始日時が now 以降の予約数。
    // 日付と時刻は別カラムなので足し合わせて比較する
    async fn count_planned(&self, user_id: UserId, now: NaiveDateTime) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
                SELECT COUNT(*)
                FROM appointments
                WHERE user_id = $1 AND (book_date + book_time) >= $2
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(count)
    }

    async fn count_at(&self, start: NaiveDateTime) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
                SELECT COUNT(*)
                FROM appointments
                WHERE (book_date + book_time) = $1
            "#,
        )
        .bind(start)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(count)
    }

    async fn count_on(&self, book_date: NaiveDate) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
                SELECT COUNT(*)
                FROM appointments
                WHERE book_date = $1
            "#,
        )
        .bind(book_date)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(count)
    }

    async fn find_day_schedule(&self, book_date: NaiveDate) -> AppResult<Vec<DayScheduleEntry>> {
        sqlx::query_as::<_, DayScheduleRow>(
            r#"
                SELECT
                a.book_time,
                u.username,
                u.first_name,
                w.washer_name
                FROM appointments AS a
                INNER JOIN users AS u ON a.user_id = u.user_id
                INNER JOIN washers AS w ON a.washer_id = w.washer_id
                WHERE a.book_date = $1
                ORDER BY a.book_time ASC, w.washer_name ASC
            "#,
        )
        .bind(book_date)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(DayScheduleEntry::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}

impl AppointmentRepositoryImpl {
    // create でのトランザクションを利用するにあたり
    // トランザクション分離レベルを SERIALIZABLE にするために
    // 内部的に使うメソッド
    async fn set_transaction_serializable(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> AppResult<()> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut **tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }
}

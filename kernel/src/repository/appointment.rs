use crate::model::{
    appointment::{event::CreateAppointment, Appointment, DayScheduleEntry},
    id::{AppointmentId, DraftId, UserId, WasherId},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use shared::error::AppResult;

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    // 予約を作成する。同じ (日付, 時刻, 洗濯機) の予約が既に存在する場合は
    // UnprocessableEntity で弾く
    async fn create(&self, event: CreateAppointment) -> AppResult<AppointmentId>;
    // 予約の取り消し
    async fn delete(&self, appointment_id: AppointmentId) -> AppResult<()>;
    // 指定日で候補時刻のいずれかに入っている予約の一覧
    async fn find_matching(
        &self,
        book_date: NaiveDate,
        times: &[NaiveTime],
    ) -> AppResult<Vec<Appointment>>;
    async fn find_one_at(
        &self,
        book_date: NaiveDate,
        book_time: NaiveTime,
        washer_id: WasherId,
    ) -> AppResult<Option<Appointment>>;
    async fn find_by_draft(&self, draft_id: DraftId) -> AppResult<Vec<Appointment>>;
    // 開始日時がまだ先の予約数（役割ごとの上限チェックに使う）
    async fn count_planned(&self, user_id: UserId, now: NaiveDateTime) -> AppResult<i64>;
    // 指定日時ちょうどに始まる予約数
    async fn count_at(&self, start: NaiveDateTime) -> AppResult<i64>;
    async fn count_on(&self, book_date: NaiveDate) -> AppResult<i64>;
    // 日次サマリー表示用の読み出し
    async fn find_day_schedule(&self, book_date: NaiveDate) -> AppResult<Vec<DayScheduleEntry>>;
}

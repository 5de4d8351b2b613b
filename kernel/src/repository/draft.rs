use crate::model::{
    draft::{
        event::{CreateAppointmentDraft, CreateReminderDraft, CreateSummaryDraft},
        AppointmentDraft, ReminderDraft, SummaryDraft,
    },
    id::{DraftId, UserId},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use shared::error::AppResult;

#[async_trait]
pub trait AppointmentDraftRepository: Send + Sync {
    async fn create(&self, event: CreateAppointmentDraft) -> AppResult<AppointmentDraft>;
    async fn find_by_id(&self, draft_id: DraftId) -> AppResult<AppointmentDraft>;
    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<AppointmentDraft>>;
    // 利用者の、まだ開始していない確定済みドラフト（予約を持つもの）
    async fn find_planned_by_user(
        &self,
        user_id: UserId,
        now: NaiveDateTime,
    ) -> AppResult<Vec<AppointmentDraft>>;
    // 毎分の突き合わせ対象: 予約とメッセージを持ち、開始が now 以降のドラフト
    async fn find_live(&self, now: NaiveDateTime) -> AppResult<Vec<AppointmentDraft>>;
    // 同じ利用者・同じ選択内容を指す別のドラフト。
    // 未選択 (NULL) 同士も一致とみなす
    async fn find_superseded(&self, draft: &AppointmentDraft) -> AppResult<Vec<AppointmentDraft>>;
    // 新しい予約の影響を受けうるドラフト（同じ日付+時刻で最終ステップのもの、
    // 同じ日付で時刻選択中のもの、まだ日付選択中のもの）
    async fn find_affected_by_commit(
        &self,
        draft: &AppointmentDraft,
    ) -> AppResult<Vec<AppointmentDraft>>;
    // 日次サマリーの本文用: 指定日の予約を持つドラフト
    async fn find_committed_on(&self, book_date: NaiveDate) -> AppResult<Vec<AppointmentDraft>>;
    async fn set_book_date(&self, draft_id: DraftId, book_date: NaiveDate) -> AppResult<()>;
    async fn set_book_time(&self, draft_id: DraftId, book_time: NaiveTime) -> AppResult<()>;
    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()>;
    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()>;
    async fn set_reserved(&self, draft_id: DraftId) -> AppResult<()>;
    // 多重ドラフトの整理。古いドラフトが作った予約をこのドラフトに付け替え、
    // 古いドラフト行を消す。全体を 1 トランザクションで行う
    async fn reallocate(&self, target: DraftId, superseded: &[DraftId]) -> AppResult<()>;
}

#[async_trait]
pub trait ReminderDraftRepository: Send + Sync {
    async fn create(&self, event: CreateReminderDraft) -> AppResult<ReminderDraft>;
    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<ReminderDraft>>;
    async fn find_superseded(&self, draft: &ReminderDraft) -> AppResult<Vec<ReminderDraft>>;
    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()>;
    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()>;
    async fn reallocate(&self, target: DraftId, superseded: &[DraftId]) -> AppResult<()>;
}

#[async_trait]
pub trait SummaryDraftRepository: Send + Sync {
    async fn create(&self, event: CreateSummaryDraft) -> AppResult<SummaryDraft>;
    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<SummaryDraft>>;
    async fn find_superseded(&self, draft: &SummaryDraft) -> AppResult<Vec<SummaryDraft>>;
    // リマインダーパス用: 指定利用者の、描画済みで対象日のドラフト
    async fn find_rendered(&self, user_id: UserId, summary_date: NaiveDate)
        -> AppResult<Vec<SummaryDraft>>;
    // 新しい予約の影響を受けうるサマリー（同じ日付の表示中のもの、日付選択中のもの）
    async fn find_affected_by_commit(&self, book_date: NaiveDate) -> AppResult<Vec<SummaryDraft>>;
    async fn set_summary_date(&self, draft_id: DraftId, summary_date: NaiveDate) -> AppResult<()>;
    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()>;
    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()>;
    async fn reallocate(&self, target: DraftId, superseded: &[DraftId]) -> AppResult<()>;
}

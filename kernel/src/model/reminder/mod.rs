use crate::model::id::{DraftId, ReminderId, UserId};

pub mod event;

/// 開始時刻の何秒前に知らせるか、を一件ずつ保持する
#[derive(Debug, Clone)]
pub struct Reminder {
    pub reminder_id: ReminderId,
    pub seconds: i64,
    pub user_id: UserId,
    pub draft_id: Option<DraftId>,
}

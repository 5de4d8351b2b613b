use crate::model::id::{DraftId, UserId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub mod event;

/// 予約フォームのドラフト。ステップごとに選択値が埋まっていく。
#[derive(Debug, Clone)]
pub struct AppointmentDraft {
    pub draft_id: DraftId,
    pub state: i32,
    pub book_date: Option<NaiveDate>,
    pub book_time: Option<NaiveTime>,
    // 締切時刻に入り確定済みとして扱われているか
    pub reserved: bool,
    pub user_id: UserId,
    pub message_id: Option<i64>,
}

impl AppointmentDraft {
    /// 日付と時刻が両方選択済みの場合のみ開始日時が定まる
    pub fn start_at(&self) -> Option<NaiveDateTime> {
        match (self.book_date, self.book_time) {
            (Some(d), Some(t)) => Some(d.and_time(t)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReminderDraft {
    pub draft_id: DraftId,
    pub state: i32,
    pub user_id: UserId,
    pub message_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SummaryDraft {
    pub draft_id: DraftId,
    pub state: i32,
    pub summary_date: Option<NaiveDate>,
    pub user_id: UserId,
    pub message_id: Option<i64>,
}

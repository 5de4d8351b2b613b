use crate::model::id::{AppointmentId, DraftId, UserId, WasherId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub mod event;

#[derive(Debug, Clone)]
pub struct Appointment {
    pub appointment_id: AppointmentId,
    pub book_date: NaiveDate,
    pub book_time: NaiveTime,
    // この予約を作成したドラフトへの参照
    pub draft_id: Option<DraftId>,
    pub user_id: UserId,
    pub washer_id: WasherId,
}

impl Appointment {
    /// 別々のカラムに保存されている日付と時刻から開始日時を組み立てる
    pub fn start_at(&self) -> NaiveDateTime {
        self.book_date.and_time(self.book_time)
    }
}

/// 日次サマリー表示用に、予約と利用者・洗濯機の表示名を
/// あわせて読み出した行
#[derive(Debug, Clone)]
pub struct DayScheduleEntry {
    pub book_time: NaiveTime,
    pub username: Option<String>,
    pub first_name: String,
    pub washer_name: String,
}

use crate::model::id::{DraftId, UserId, WasherId};
use chrono::{NaiveDate, NaiveTime};
use derive_new::new;

#[derive(new, Debug)]
pub struct CreateAppointment {
    pub user_id: UserId,
    pub draft_id: DraftId,
    pub book_date: NaiveDate,
    pub book_time: NaiveTime,
    pub washer_id: WasherId,
}

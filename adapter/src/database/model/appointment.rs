use kernel::model::{
    appointment::{Appointment, DayScheduleEntry},
    id::{AppointmentId, DraftId, UserId, WasherId},
};
use sqlx::types::chrono::{NaiveDate, NaiveTime};

#[derive(sqlx::FromRow)]
pub struct AppointmentRow {
    pub appointment_id: AppointmentId,
    pub book_date: NaiveDate,
    pub book_time: NaiveTime,
    pub draft_id: Option<DraftId>,
    pub user_id: UserId,
    pub washer_id: WasherId,
}

impl From<AppointmentRow> for Appointment {
    fn from(value: AppointmentRow) -> Self {
        let AppointmentRow {
            appointment_id,
            book_date,
            book_time,
            draft_id,
            user_id,
            washer_id,
        } = value;
        Appointment {
            appointment_id,
            book_date,
            book_time,
            draft_id,
            user_id,
            washer_id,
        }
    }
}

// サマリー表示用に利用者と洗濯機の名前を JOIN した行
#[derive(sqlx::FromRow)]
pub struct DayScheduleRow {
    pub book_time: NaiveTime,
    pub username: Option<String>,
    pub first_name: String,
    pub washer_name: String,
}

impl From<DayScheduleRow> for DayScheduleEntry {
    fn from(value: DayScheduleRow) -> Self {
        let DayScheduleRow {
            book_time,
            username,
            first_name,
            washer_name,
        } = value;
        DayScheduleEntry {
            book_time,
            username,
            first_name,
            washer_name,
        }
    }
}

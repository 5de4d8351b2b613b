use kernel::model::{
    draft::{AppointmentDraft, ReminderDraft, SummaryDraft},
    id::{DraftId, UserId},
};
use sqlx::types::chrono::{NaiveDate, NaiveTime};

#[derive(sqlx::FromRow)]
pub struct AppointmentDraftRow {
    pub draft_id: DraftId,
    pub state: i32,
    pub book_date: Option<NaiveDate>,
    pub book_time: Option<NaiveTime>,
    pub reserved: bool,
    pub user_id: UserId,
    pub message_id: Option<i64>,
}

impl From<AppointmentDraftRow> for AppointmentDraft {
    fn from(value: AppointmentDraftRow) -> Self {
        let AppointmentDraftRow {
            draft_id,
            state,
            book_date,
            book_time,
            reserved,
            user_id,
            message_id,
        } = value;
        AppointmentDraft {
            draft_id,
            state,
            book_date,
            book_time,
            reserved,
            user_id,
            message_id,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct ReminderDraftRow {
    pub draft_id: DraftId,
    pub state: i32,
    pub user_id: UserId,
    pub message_id: Option<i64>,
}

impl From<ReminderDraftRow> for ReminderDraft {
    fn from(value: ReminderDraftRow) -> Self {
        let ReminderDraftRow {
            draft_id,
            state,
            user_id,
            message_id,
        } = value;
        ReminderDraft {
            draft_id,
            state,
            user_id,
            message_id,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct SummaryDraftRow {
    pub draft_id: DraftId,
    pub state: i32,
    pub summary_date: Option<NaiveDate>,
    pub user_id: UserId,
    pub message_id: Option<i64>,
}

impl From<SummaryDraftRow> for SummaryDraft {
    fn from(value: SummaryDraftRow) -> Self {
        let SummaryDraftRow {
            draft_id,
            state,
            summary_date,
            user_id,
            message_id,
        } = value;
        SummaryDraft {
            draft_id,
            state,
            summary_date,
            user_id,
            message_id,
        }
    }
}

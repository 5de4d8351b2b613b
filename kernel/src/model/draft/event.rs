use crate::model::id::UserId;
use chrono::NaiveDate;
use derive_new::new;

#[derive(new, Debug)]
pub struct CreateAppointmentDraft {
    pub user_id: UserId,
}

#[derive(new, Debug)]
pub struct CreateReminderDraft {
    pub user_id: UserId,
}

#[derive(new, Debug)]
pub struct CreateSummaryDraft {
    pub user_id: UserId,
    pub summary_date: Option<NaiveDate>,
    pub state: i32,
}

use crate::model::id::{DraftId, UserId};
use derive_new::new;

#[derive(new, Debug)]
pub struct CreateReminder {
    pub seconds: i64,
    pub user_id: UserId,
    pub draft_id: Option<DraftId>,
}

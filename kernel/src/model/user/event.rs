use crate::model::id::UserId;
use derive_new::new;

#[derive(new, Debug)]
pub struct BindChat {
    pub user_id: UserId,
    pub username: Option<String>,
    pub chat_id: i64,
}

use kernel::model::{id::UserId, role::Role, user::User};

#[derive(sqlx::FromRow)]
pub struct UserRow {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub order_number: String,
    pub username: Option<String>,
    pub chat_id: Option<i64>,
    pub role: Role,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        let UserRow {
            user_id,
            first_name,
            last_name,
            order_number,
            username,
            chat_id,
            role,
        } = value;
        User {
            user_id,
            first_name,
            last_name,
            order_number,
            username,
            chat_id,
            role,
        }
    }
}

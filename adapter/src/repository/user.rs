use crate::database::{model::user::UserRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::UserId,
    role::Role,
    user::{event::BindChat, User},
};
use kernel::repository::user::UserRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct UserRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, first_name, last_name, order_number,
                       username, chat_id, role
                FROM users
                WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(self.db.inner_ref())
        .await
        .map(User::from)
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_chat_id(&self, chat_id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, first_name, last_name, order_number,
                       username, chat_id, role
                FROM users
                WHERE chat_id = $1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(User::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_identity(
        &self,
        first_name: &str,
        last_name: &str,
        order_number: &str,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, first_name, last_name, order_number,
                       username, chat_id, role
                FROM users
                WHERE first_name = $1 AND last_name = $2 AND order_number = $3
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(order_number)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(User::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn bind_chat(&self, event: BindChat) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE users
                SET username = $1, chat_id = $2
                WHERE user_id = $3
            "#,
        )
        .bind(&event.username)
        .bind(event.chat_id)
        .bind(event.user_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "specified user not found".into(),
            ));
        }

        Ok(())
    }

    async fn find_by_role(&self, role: Role) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, first_name, last_name, order_number,
                       username, chat_id, role
                FROM users
                WHERE role = $1
            "#,
        )
        .bind(role)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(User::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}

use crate::database::{model::washer::WasherRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{id::WasherId, washer::Washer};
use kernel::repository::washer::WasherRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct WasherRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl WasherRepository for WasherRepositoryImpl {
    async fn find_all(&self) -> AppResult<Vec<Washer>> {
        sqlx::query_as::<_, WasherRow>(
            r#"
                SELECT washer_id, washer_name, available
                FROM washers
                ORDER BY washer_name ASC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Washer::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_id(&self, washer_id: WasherId) -> AppResult<Option<Washer>> {
        sqlx::query_as::<_, WasherRow>(
            r#"
                SELECT washer_id, washer_name, available
                FROM washers
                WHERE washer_id = $1
            "#,
        )
        .bind(washer_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(Washer::from))
        .map_err(AppError::SpecificOperationError)
    }
}

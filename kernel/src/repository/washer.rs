use crate::model::{id::WasherId, washer::Washer};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait WasherRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Washer>>;
    async fn find_by_id(&self, washer_id: WasherId) -> AppResult<Option<Washer>>;
}

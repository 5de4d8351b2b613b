use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("transaction error")]
    TransactionError(#[source] sqlx::Error),
    #[error("database operation error")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("database query error")]
    DbQueryError(#[source] sqlx::Error),
    #[error("{0}")]
    NoRowsAffectedError(String),
    #[error(transparent)]
    KeyValueStoreError(#[from] redis::RedisError),
    // Bot API がエラー応答を返した場合
    #[error("bot api error {code}: {description}")]
    BotApiError { code: i32, description: String },
    #[error(transparent)]
    HttpClientError(#[from] reqwest::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl AppError {
    /// 既に同じ内容のメッセージを編集しようとした場合などの、
    /// 無視してよい Bot API の 400 応答かどうか
    pub fn is_transient_transport_error(&self) -> bool {
        matches!(self, AppError::BotApiError { code: 400, .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;

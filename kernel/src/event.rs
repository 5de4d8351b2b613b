use async_trait::async_trait;
use shared::error::AppResult;

/// プロセス間通知のトピック。配送は at-most-once で、
/// 取り逃しても毎分の突き合わせで追い付ける前提の低遅延用の経路。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    // 予約ドラフトが最終ステップに達した。payload: "user_id:message_id"
    Commit,
    // 表示を ⌛ に固定してほしい。payload: "chat_id:message_id"
    Close,
    // 認証済みになった利用者のセッションを読み直してほしい。payload: "chat_id"
    IdentityRefresh,
}

impl Topic {
    pub fn channel(&self) -> &'static str {
        match self {
            Topic::Commit => "commit",
            Topic::Close => "close",
            Topic::IdentityRefresh => "identity-refresh",
        }
    }
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, topic: Topic, payload: &str) -> AppResult<()>;
}

//! 対話ハンドラープロセス内のセッション。チャット ID ごとに 1 エントリで、
//! 同じチャットの操作は直列化し、別チャット同士は並行に処理できるように
//! エントリ単位の Mutex を持つ。起動時に空で作られ、エントリは初回アクセス時に
//! 遅延生成される。明示的な破棄は行わない。

use kernel::model::user::User;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Default)]
pub struct Session {
    pub user: Option<User>,
    // /auth の引数待ちの状態
    pub auth_pending: bool,
    // 入力エラー表示を消すための遅延タスク。次の操作で破棄される
    pub error_timer: Option<JoinHandle<()>>,
}

impl Session {
    /// 以前のエラー消去タスクを打ち切って新しいものに置き換える
    pub fn replace_error_timer(&mut self, timer: Option<JoinHandle<()>>) {
        if let Some(old) = self.error_timer.take() {
            old.abort();
        }
        self.error_timer = timer;
    }
}

#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// チャットのセッションを取得する（無ければ作る）
    pub async fn entry(&self, chat_id: i64) -> Arc<Mutex<Session>> {
        let mut map = self.inner.lock().await;
        map.entry(chat_id).or_default().clone()
    }

    /// 既存のセッションだけを返す（identity-refresh 用）
    pub async fn peek(&self, chat_id: i64) -> Option<Arc<Mutex<Session>>> {
        let map = self.inner.lock().await;
        map.get(&chat_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_are_created_lazily_and_shared() {
        let store = SessionStore::new();
        assert!(store.peek(1).await.is_none());
        let a = store.entry(1).await;
        let b = store.entry(1).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(store.peek(1).await.is_some());
    }
}

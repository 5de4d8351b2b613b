//! 対話ハンドラーの入口。Webhook (axum) かロングポーリングで更新を受け、
//! 1 件ずつ独立したタスクで処理する。ハンドラー内の panic は
//! 管理者チャットへ報告してからプロセスを落とす。

use crate::handler::{handle_update, BotState};
use adapter::redis::RedisClient;
use adapter::telegram::TelegramApi;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use futures::StreamExt;
use kernel::event::Topic;
use kernel::repository::user::UserRepository;
use kernel::transport::{Messenger, SendOptions, Update};
use shared::error::AppResult;
use std::sync::Arc;
use std::time::Duration;

pub fn router(state: BotState) -> Router {
    Router::new().route("/", post(webhook)).with_state(state)
}

async fn webhook(State(state): State<BotState>, Json(update): Json<Update>) -> StatusCode {
    spawn_handle(state, update);
    StatusCode::OK
}

/// 更新 1 件を独立したタスクで処理する。
/// Err は記録のみ（操作単位の失敗）、panic は管理者へ報告して fail-fast
pub fn spawn_handle(state: BotState, update: Update) {
    let supervised = state.clone();
    let task = tokio::spawn(async move {
        if let Err(e) = handle_update(&state, update).await {
            tracing::error!(error = %e, "update handling failed");
        }
    });
    tokio::spawn(async move {
        if let Err(join_error) = task.await {
            if join_error.is_panic() {
                tracing::error!(error = %join_error, "update handler panicked");
                report_fault(&supervised, &join_error.to_string()).await;
                std::process::exit(1);
            }
        }
    });
}

async fn report_fault(state: &BotState, description: &str) {
    let config = state.registry.bot_config();
    let admin = TelegramApi::new(config.admin_token.clone());
    let body = format!("Uncaught fault in interactive handler:\n{}", description);
    if let Err(e) = admin
        .send_message(config.admin_chat_id, &body, SendOptions::default())
        .await
    {
        tracing::error!(error = %e, "failed to notify admin channel");
    }
}

pub async fn poll_updates(state: BotState, api: Arc<TelegramApi>) {
    let mut offset = 0i64;
    loop {
        match api.get_updates(offset, 30).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    spawn_handle(state.clone(), update);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "polling failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// 別プロセスで認証された利用者のセッションを読み直す
pub async fn listen_identity_refresh(state: BotState, kv: Arc<RedisClient>) -> AppResult<()> {
    let mut pubsub = kv.subscribe(&[Topic::IdentityRefresh.channel()]).await?;
    let mut stream = pubsub.on_message();
    while let Some(message) = stream.next().await {
        let payload: String = match message.get_payload() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable identity refresh payload");
                continue;
            }
        };
        let Ok(chat_id) = payload.parse::<i64>() else {
            continue;
        };
        // このプロセスがセッションを持っている場合だけ意味がある
        let Some(entry) = state.sessions.peek(chat_id).await else {
            continue;
        };
        let mut session = entry.lock().await;
        if session.user.is_none() {
            continue;
        }
        match state
            .registry
            .user_repository()
            .find_by_chat_id(chat_id)
            .await
        {
            Ok(user) => session.user = user,
            Err(e) => tracing::warn!(error = %e, chat_id, "failed to reload session user"),
        }
    }
    Ok(())
}

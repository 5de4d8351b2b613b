//! 通知購読ワーカー。確定イベントの波及描画と、
//! アプリ状態を持たない軽量なクローズ編集を担当する。
//! 配送は at-most-once で、取り逃した分は毎分の突き合わせが拾う。

use crate::form;
use adapter::redis::RedisClient;
use chrono::Local;
use futures::StreamExt;
use kernel::event::Topic;
use kernel::repository::draft::AppointmentDraftRepository;
use kernel::transport::{Messenger, SendOptions};
use registry::AppRegistry;
use shared::error::AppResult;
use std::sync::Arc;

pub async fn run(registry: AppRegistry, kv: Arc<RedisClient>) -> AppResult<()> {
    let mut pubsub = kv
        .subscribe(&[Topic::Close.channel(), Topic::Commit.channel()])
        .await?;
    tracing::info!("subscriber listening");

    let mut stream = pubsub.on_message();
    while let Some(message) = stream.next().await {
        let channel = message.get_channel_name().to_string();
        let payload: String = match message.get_payload() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, channel, "unreadable payload");
                continue;
            }
        };

        let result = if channel == Topic::Close.channel() {
            handle_close(&registry, &payload).await
        } else {
            handle_commit(&registry, &payload).await
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, channel, payload, "event handling failed");
        }
    }
    Ok(())
}

/// チャットとメッセージの ID だけで表示を ⌛ に固定する
async fn handle_close(registry: &AppRegistry, payload: &str) -> AppResult<()> {
    let Some((chat_id, message_id)) = split_ids(payload) else {
        return Ok(());
    };
    form::suppress_transient(
        registry
            .messenger()
            .edit_message_text(chat_id, message_id, "⌛", SendOptions::default())
            .await,
    )
}

/// 確定した予約ドラフトを読み出し、影響を受ける描画面を更新する
async fn handle_commit(registry: &AppRegistry, payload: &str) -> AppResult<()> {
    let Some((user_id, message_id)) = payload.split_once(':') else {
        return Ok(());
    };
    let Ok(user_id) = user_id.parse::<kernel::model::id::UserId>() else {
        return Ok(());
    };
    let Ok(message_id) = message_id.parse::<i64>() else {
        return Ok(());
    };

    let Some(draft) = registry
        .appointment_draft_repository()
        .find_by_message(user_id, message_id)
        .await?
    else {
        return Ok(());
    };
    let now = Local::now().naive_local();
    form::appointment::take_affect(registry, &draft, now).await
}

fn split_ids(payload: &str) -> Option<(i64, i64)> {
    let (a, b) = payload.split_once(':')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

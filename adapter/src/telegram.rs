//! Bot API の薄いクライアント。kernel::transport::Messenger の実装と、
//! ロングポーリング・Webhook 登録などの起動時にだけ使う操作を提供する。

use async_trait::async_trait;
use kernel::transport::{Keyboard, Messenger, SendOptions, Update};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::error::{AppError, AppResult};

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramApi {
    http: reqwest::Client,
    token: String,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i32>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

fn keyboard_json(keyboard: &Keyboard) -> serde_json::Value {
    let rows: Vec<Vec<serde_json::Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| {
                    serde_json::json!({
                        "text": b.label,
                        "callback_data": b.payload,
                    })
                })
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}

impl TelegramApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> AppResult<T> {
        let url = format!("{}/bot{}/{}", API_BASE, self.token, method);
        let response: ApiResponse<T> = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(AppError::BotApiError {
                code: response.error_code.unwrap_or(0),
                description: response
                    .description
                    .unwrap_or_else(|| "unknown error".into()),
            });
        }

        response.result.ok_or_else(|| AppError::BotApiError {
            code: 0,
            description: "missing result".into(),
        })
    }

    fn apply_options(body: &mut serde_json::Value, opts: &SendOptions) {
        if let Some(mode) = opts.parse_mode {
            body["parse_mode"] = serde_json::json!(mode.as_str());
        }
        if let Some(keyboard) = &opts.keyboard {
            body["reply_markup"] = keyboard_json(keyboard);
        }
        if opts.protect_content {
            body["protect_content"] = serde_json::json!(true);
        }
        if let Some(reply_to) = opts.reply_to {
            body["reply_to_message_id"] = serde_json::json!(reply_to);
        }
    }

    /// ロングポーリングでの受信。timeout_secs の間サーバー側で保留される
    pub async fn get_updates(&self, offset: i64, timeout_secs: u32) -> AppResult<Vec<Update>> {
        self.call(
            "getUpdates",
            serde_json::json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str) -> AppResult<()> {
        let _: serde_json::Value = self
            .call("setWebhook", serde_json::json!({ "url": url }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramApi {
    async fn send_message(&self, chat_id: i64, text: &str, opts: SendOptions) -> AppResult<i64> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        Self::apply_options(&mut body, &opts);
        let sent: SentMessage = self.call("sendMessage", body).await?;
        Ok(sent.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        opts: SendOptions,
    ) -> AppResult<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        Self::apply_options(&mut body, &opts);
        // 編集 API は Message か true を返すので中身は見ない
        let _: serde_json::Value = self.call("editMessageText", body).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> AppResult<()> {
        let _: serde_json::Value = self
            .call(
                "deleteMessage",
                serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                }),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> AppResult<()> {
        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                serde_json::json!({ "callback_query_id": callback_id }),
            )
            .await?;
        Ok(())
    }
}

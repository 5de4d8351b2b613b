//! チャット基盤との境界。本体はこの契約越しにしかメッセージ操作を行わない。

use async_trait::async_trait;
use serde::Deserialize;
use shared::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::MarkdownV2 => "MarkdownV2",
        }
    }
}

/// コールバックボタン。payload は "<step> <value>" 形式の文字列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, step: i32, value: impl std::fmt::Display) -> Self {
        Self {
            label: label.into(),
            payload: format!("{} {}", step, value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<Keyboard>,
    pub protect_content: bool,
    pub reply_to: Option<i64>,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    // 戻り値は送信されたメッセージの ID
    async fn send_message(&self, chat_id: i64, text: &str, opts: SendOptions) -> AppResult<i64>;
    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        opts: SendOptions,
    ) -> AppResult<()>;
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> AppResult<()>;
    async fn answer_callback(&self, callback_id: &str) -> AppResult<()>;
}

// ---- 受信側のワイヤ型 ----

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Sender,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

/// ボタンの payload を (ステップ番号, 値) に分解する
pub fn parse_payload(data: &str) -> Option<(i32, &str)> {
    let (step, value) = data.split_once(' ')?;
    Some((step.parse().ok()?, value))
}

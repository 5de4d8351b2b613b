//! 複数ステップのフォーム基盤。ステップの能力 (Step) と
//! 種類ごとの状態 (Flow) を分け、描画・応答・クローズの駆動は
//! このモジュールの共通関数が行う。

use kernel::event::{EventBus, Topic};
use kernel::model::user::User;
use kernel::transport::{Keyboard, Messenger, ParseMode, SendOptions};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub mod appointment;
pub mod reminder;
pub mod summary;

pub use appointment::AppointmentForm;
pub use reminder::ReminderForm;
pub use summary::SummaryForm;

/// ステップの検証結果。弾かれた場合も値として返り、エラーにはしない
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub accepted: bool,
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            error: Some(error.into()),
        }
    }

    /// 改ざんされた payload など、文言を出さずに握りつぶす場合
    pub fn ignored() -> Self {
        Self {
            accepted: false,
            error: None,
        }
    }
}

/// ステップ 1 つ分の能力。F はフォーム本体（選択値と読み込み済みの
/// 関連データを持つ）で、閉じた種類ごとに実装される
#[async_trait::async_trait]
pub trait Step<F>: Send + Sync {
    fn label(&self) -> &'static str;
    fn prompt(&self) -> &'static str;
    async fn render_options(&self, reg: &AppRegistry, form: &F) -> AppResult<Option<Keyboard>>;
    async fn validate(&self, reg: &AppRegistry, form: &mut F, value: &str)
        -> AppResult<StepOutcome>;
    fn describe(&self, form: &F) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    // 別のドラフトに取って代わられた
    NotRelevant,
    // 開始時刻を過ぎた
    Passed,
    // 締切時間内に入った
    Reserved,
}

/// 駆動側から見たフォーム。種類ごとの差分はここに閉じ込める
#[async_trait::async_trait]
pub trait Flow: Send + Sync {
    fn user(&self) -> &User;
    fn message_id(&self) -> Option<i64>;
    fn state(&self) -> i32;
    fn step_count(&self) -> i32;
    fn step_label(&self, state: i32) -> &'static str;
    fn step_prompt(&self, state: i32) -> &'static str;
    fn describe_step(&self, state: i32) -> String;
    fn finished(&self) -> bool;
    fn finished_text(&self) -> &'static str;
    fn protect_content(&self) -> bool {
        false
    }
    fn parse_mode(&self) -> ParseMode {
        ParseMode::Markdown
    }
    fn closed(&self) -> bool;
    fn close_with(&mut self, reason: CloseReason);
    /// 締切・開始済みでタイトルを差し替える場合のみ Some
    fn boundary_title(&self) -> Option<String> {
        None
    }
    /// 締切・開始済みでキーボードを出さない場合 true
    fn keyboard_frozen(&self) -> bool {
        false
    }
    fn error_text(&self) -> Option<&str>;
    fn set_error(&mut self, error: Option<String>);
    /// タイトル + 項目一覧の代わりに使う本文（サマリーの一覧表示など）
    async fn body_override(&self, reg: &AppRegistry) -> AppResult<Option<String>>;
    async fn reply_markup(&self, reg: &AppRegistry) -> AppResult<Option<Keyboard>>;
    /// payload のステップ番号で検証し、通れば選択値を保存して前進する
    async fn handle_value(
        &mut self,
        reg: &AppRegistry,
        state: i32,
        value: &str,
    ) -> AppResult<StepOutcome>;
    /// ドラフトと関連データをストアから読み直す
    async fn reload(&mut self, reg: &AppRegistry) -> AppResult<()>;
    /// 同じ選択内容を指す古いドラフトを整理し、
    /// 閉じるべき描画面 (chat_id, message_id) を返す
    async fn reallocate(&mut self, reg: &AppRegistry) -> AppResult<Vec<(i64, i64)>>;
    async fn bind_message(&mut self, reg: &AppRegistry, message_id: i64) -> AppResult<()>;
}

pub fn chat_of(form: &dyn Flow) -> AppResult<i64> {
    form.user()
        .chat_id
        .ok_or_else(|| AppError::UnprocessableEntity("user has no chat bound".into()))
}

/// タイトル行。エラー > 完了 > 進行中プロンプトの順で決まり、
/// 締切・開始済みの表示はそれらより優先される
pub fn title_text(form: &dyn Flow) -> String {
    if let Some(title) = form.boundary_title() {
        return title;
    }
    if let Some(error) = form.error_text() {
        return format!("🚫 {}", error);
    }
    if form.finished() {
        return format!("✅ {}", form.finished_text());
    }
    let state = form.state();
    let prefix = if form.step_count() > 1 {
        format!("{}/{} ", state + 1, form.step_count())
    } else {
        String::new()
    };
    format!("{}{}", prefix, form.step_prompt(state))
}

pub async fn render_text(reg: &AppRegistry, form: &dyn Flow) -> AppResult<String> {
    if form.closed() {
        return Ok("⌛".into());
    }
    if let Some(body) = form.body_override(reg).await? {
        return Ok(body);
    }
    let mut lines = vec![title_text(form), String::new()];
    for i in 0..form.step_count() {
        let value = if i < form.state() || form.finished() {
            format!("*{}*", form.describe_step(i))
        } else {
            "...".into()
        };
        lines.push(format!("{}: {}", form.step_label(i), value));
    }
    Ok(lines.join("\n"))
}

async fn markup_for(reg: &AppRegistry, form: &dyn Flow) -> AppResult<Option<Keyboard>> {
    if form.closed() || form.keyboard_frozen() {
        return Ok(None);
    }
    form.reply_markup(reg).await
}

/// 整理で取り除いたドラフトの描画面に「もう有効ではない」ことを伝える。
/// 購読側プロセスが編集するので、ここでは通知を流すだけでよい
async fn signal_closed_surfaces(reg: &AppRegistry, surfaces: &[(i64, i64)]) {
    for (chat_id, message_id) in surfaces {
        let payload = format!("{}:{}", chat_id, message_id);
        if let Err(e) = reg.event_bus().publish(Topic::Close, &payload).await {
            tracing::warn!(error = %e, payload = %payload, "failed to publish close event");
        }
    }
}

/// フォームを新しいメッセージとして送る
pub async fn deliver(reg: &AppRegistry, form: &mut dyn Flow) -> AppResult<()> {
    let surfaces = form.reallocate(reg).await?;
    form.reload(reg).await?;

    let chat_id = chat_of(form)?;
    let text = render_text(reg, form).await?;
    let opts = SendOptions {
        parse_mode: Some(form.parse_mode()),
        keyboard: markup_for(reg, form).await?,
        protect_content: form.protect_content(),
        reply_to: None,
    };
    let message_id = reg.messenger().send_message(chat_id, &text, opts).await?;
    form.bind_message(reg, message_id).await?;

    signal_closed_surfaces(reg, &surfaces).await;
    Ok(())
}

/// 既存のメッセージを現在の状態で描き直す。
/// 「内容が変わっていない」類いの編集エラーは握りつぶす
pub async fn rerender(reg: &AppRegistry, form: &mut dyn Flow) -> AppResult<()> {
    if !form.finished() {
        let surfaces = form.reallocate(reg).await?;
        form.reload(reg).await?;
        signal_closed_surfaces(reg, &surfaces).await;
    }

    let Some(message_id) = form.message_id() else {
        return Ok(());
    };
    let chat_id = chat_of(form)?;
    let text = render_text(reg, form).await?;
    let opts = SendOptions {
        parse_mode: Some(form.parse_mode()),
        keyboard: markup_for(reg, form).await?,
        protect_content: false,
        reply_to: None,
    };
    let result = reg
        .messenger()
        .edit_message_text(chat_id, message_id, &text, opts)
        .await;
    suppress_transient(result)
}

/// フォームを終端状態の表示で固定する
pub async fn close(reg: &AppRegistry, form: &mut dyn Flow, reason: CloseReason) -> AppResult<()> {
    form.close_with(reason);

    let Some(message_id) = form.message_id() else {
        return Ok(());
    };
    let chat_id = chat_of(form)?;
    let text = render_text(reg, form).await?;
    let opts = SendOptions {
        parse_mode: Some(form.parse_mode()),
        keyboard: None,
        protect_content: false,
        reply_to: None,
    };
    let result = reg
        .messenger()
        .edit_message_text(chat_id, message_id, &text, opts)
        .await;
    suppress_transient(result)
}

pub fn suppress_transient(result: AppResult<()>) -> AppResult<()> {
    match result {
        Err(e) if e.is_transient_transport_error() => {
            tracing::debug!(error = %e, "transient transport error suppressed");
            Ok(())
        }
        other => other,
    }
}

/// 受理後の遷移先。保存済みのステップ番号は決して戻らない
pub fn next_state(current: i32, clicked: i32, step_count: i32) -> i32 {
    current.max((clicked + 1).min(step_count - 1))
}

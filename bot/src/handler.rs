//! 受信した更新の振り分け。コマンドとコールバックの両方をここで受け、
//! チャットごとのセッションで直列化して処理する。

use crate::form::{self, AppointmentForm, CloseReason, Flow, ReminderForm, StepOutcome, SummaryForm};
use crate::session::{Session, SessionStore};
use crate::text;
use chrono::{Datelike, Local};
use kernel::event::{EventBus, Topic};
use kernel::model::draft::event::{
    CreateAppointmentDraft, CreateReminderDraft, CreateSummaryDraft,
};
use kernel::model::role::Role;
use kernel::model::user::{event::BindChat, AuthOutcome, User};
use kernel::repository::draft::{
    AppointmentDraftRepository, ReminderDraftRepository, SummaryDraftRepository,
};
use kernel::repository::user::UserRepository;
use kernel::schedule::ERROR_VISIBLE_SECONDS;
use kernel::transport::{
    parse_payload, CallbackQuery, IncomingMessage, Messenger, ParseMode, SendOptions, Update,
};
use registry::AppRegistry;
use shared::error::AppResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct BotState {
    pub registry: AppRegistry,
    pub sessions: Arc<SessionStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    Appointment,
    Reminder,
    Summary,
}

pub async fn handle_update(state: &BotState, update: Update) -> AppResult<()> {
    if let Some(callback) = update.callback_query {
        return handle_callback(state, callback).await;
    }
    if let Some(message) = update.message {
        return handle_message(state, message).await;
    }
    Ok(())
}

async fn reply_text(reg: &AppRegistry, chat_id: i64, text: &str) -> AppResult<()> {
    reg.messenger()
        .send_message(
            chat_id,
            text,
            SendOptions {
                parse_mode: Some(ParseMode::Markdown),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
}

async fn handle_message(state: &BotState, message: IncomingMessage) -> AppResult<()> {
    let Some(message_text) = message.text.clone() else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let entry = state.sessions.entry(chat_id).await;
    let mut session = entry.lock().await;

    let started = Instant::now();
    let mut words = message_text.split_whitespace();
    let command = words.next().unwrap_or("");
    let args: Vec<&str> = words.collect();

    match command {
        "/start" => cmd_start(state, chat_id).await?,
        "/auth" => cmd_auth(state, &mut session, &message, &args).await?,
        "/book" => {
            if let Some(user) = ensure_user(state, &mut session, chat_id).await? {
                cmd_book(state, user).await?;
            }
        }
        "/my" => {
            if let Some(user) = ensure_user(state, &mut session, chat_id).await? {
                cmd_my(state, user).await?;
            }
        }
        "/remind" => {
            if let Some(user) = ensure_user(state, &mut session, chat_id).await? {
                cmd_remind(state, user).await?;
            }
        }
        "/summary" => {
            if let Some(user) = ensure_moderator(state, &mut session, chat_id).await? {
                cmd_summary(state, user).await?;
            }
        }
        "/today" => {
            if let Some(user) = ensure_moderator(state, &mut session, chat_id).await? {
                cmd_today(state, user).await?;
            }
        }
        _ => {
            // 認証の引数待ちなら平文メッセージも /auth と同じ扱い
            if session.auth_pending {
                let all_words: Vec<&str> = message_text.split_whitespace().collect();
                cmd_auth(state, &mut session, &message, &all_words).await?;
            }
        }
    }

    tracing::info!(
        command,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "message handled"
    );
    Ok(())
}

async fn ensure_user(
    state: &BotState,
    session: &mut Session,
    chat_id: i64,
) -> AppResult<Option<User>> {
    if let Some(user) = &session.user {
        return Ok(Some(user.clone()));
    }
    match state
        .registry
        .user_repository()
        .find_by_chat_id(chat_id)
        .await?
    {
        Some(user) => {
            session.user = Some(user.clone());
            Ok(Some(user))
        }
        None => {
            let prompt = format!("{}\n\n{}", text::AUTH_REQUIRED, text::AUTH_ACTION);
            reply_text(&state.registry, chat_id, &prompt).await?;
            Ok(None)
        }
    }
}

async fn ensure_moderator(
    state: &BotState,
    session: &mut Session,
    chat_id: i64,
) -> AppResult<Option<User>> {
    let Some(user) = ensure_user(state, session, chat_id).await? else {
        return Ok(None);
    };
    if user.role != Role::Moderator {
        reply_text(&state.registry, chat_id, text::MODERATOR_ONLY).await?;
        return Ok(None);
    }
    Ok(Some(user))
}

async fn cmd_start(state: &BotState, chat_id: i64) -> AppResult<()> {
    let authorized = state
        .registry
        .user_repository()
        .find_by_chat_id(chat_id)
        .await?
        .is_some();
    if authorized {
        reply_text(&state.registry, chat_id, text::START_AUTHORIZED).await
    } else {
        let intro = format!("{}\n\n{}", text::START_INTRO, text::AUTH_ACTION);
        reply_text(&state.registry, chat_id, &intro).await
    }
}

/// 身元の解決。登録済みの (姓, 名, 契約番号) に一致した場合のみ
/// チャットへ紐付ける。役割の割り当ては登録時に済んでいる
async fn authorize(
    reg: &AppRegistry,
    first_name: &str,
    last_name: &str,
    order_number: &str,
    username: Option<String>,
    chat_id: i64,
) -> AppResult<(Option<User>, AuthOutcome)> {
    let Some(user) = reg
        .user_repository()
        .find_by_identity(first_name, last_name, order_number)
        .await?
    else {
        return Ok((None, AuthOutcome::NotFound));
    };

    match user.chat_id {
        Some(existing) if existing == chat_id => Ok((Some(user), AuthOutcome::SelfAlreadyAuthorized)),
        Some(_) => Ok((None, AuthOutcome::OtherAlreadyAuthorized)),
        None => {
            reg.user_repository()
                .bind_chat(BindChat::new(user.user_id, username.clone(), chat_id))
                .await?;
            let user = User {
                username,
                chat_id: Some(chat_id),
                ..user
            };
            Ok((Some(user), AuthOutcome::Successful))
        }
    }
}

async fn cmd_auth(
    state: &BotState,
    session: &mut Session,
    message: &IncomingMessage,
    args: &[&str],
) -> AppResult<()> {
    let reg = &state.registry;
    let chat_id = message.chat.id;

    // 既に紐付いているチャットからの再認証
    if reg.user_repository().find_by_chat_id(chat_id).await?.is_some() {
        session.auth_pending = false;
        form::suppress_transient(
            reg.messenger()
                .delete_message(chat_id, message.message_id)
                .await,
        )?;
        return reply_text(
            reg,
            chat_id,
            text::auth_outcome_text(AuthOutcome::SelfAlreadyAuthorized),
        )
        .await;
    }

    let from = message.from.as_ref();
    let profile_first = from.and_then(|f| f.first_name.clone());
    let profile_last = from.and_then(|f| f.last_name.clone());

    let (first_name, last_name) = match args.len() {
        1 if profile_first.is_some() && profile_last.is_some() => {
            (profile_first.unwrap(), profile_last.unwrap())
        }
        3 => (args[1].to_string(), args[0].to_string()),
        _ => {
            session.auth_pending = true;
            return reply_text(reg, chat_id, text::AUTH_ACTION).await;
        }
    };
    let order_number = args[args.len() - 1];
    let username = from.and_then(|f| f.username.clone());

    let (user, outcome) = authorize(reg, &first_name, &last_name, order_number, username, chat_id)
        .await?;

    // 契約番号をチャット履歴に残さない
    if outcome != AuthOutcome::NotFound {
        form::suppress_transient(
            reg.messenger()
                .delete_message(chat_id, message.message_id)
                .await,
        )?;
    }

    reply_text(reg, chat_id, text::auth_outcome_text(outcome)).await?;

    if let Some(user) = user {
        session.user = Some(user);
        session.auth_pending = false;
        // 他プロセスが同じ利用者のセッションを抱えていれば読み直させる
        if let Err(e) = reg
            .event_bus()
            .publish(Topic::IdentityRefresh, &chat_id.to_string())
            .await
        {
            tracing::warn!(error = %e, "failed to publish identity refresh");
        }
    }
    Ok(())
}

async fn cmd_book(state: &BotState, user: User) -> AppResult<()> {
    let reg = &state.registry;
    let now = Local::now().naive_local();
    let draft = reg
        .appointment_draft_repository()
        .create(CreateAppointmentDraft::new(user.user_id))
        .await?;
    let mut form = AppointmentForm::load(reg, user, draft, now).await?;
    form::deliver(reg, &mut form).await
}

async fn cmd_remind(state: &BotState, user: User) -> AppResult<()> {
    let reg = &state.registry;
    let now = Local::now().naive_local();
    let draft = reg
        .reminder_draft_repository()
        .create(CreateReminderDraft::new(user.user_id))
        .await?;
    let mut form = ReminderForm::load(reg, user, draft, now).await?;
    form::deliver(reg, &mut form).await
}

async fn cmd_my(state: &BotState, user: User) -> AppResult<()> {
    let reg = &state.registry;
    let now = Local::now().naive_local();
    let drafts = reg
        .appointment_draft_repository()
        .find_planned_by_user(user.user_id, now)
        .await?;

    if drafts.is_empty() {
        let chat_id = user.chat_id.unwrap_or_default();
        return reply_text(reg, chat_id, text::NO_ACTIVE_BOOKINGS).await;
    }

    // 古い描画を無効化してから新しいメッセージとして出し直す
    for draft in &drafts {
        let mut form = AppointmentForm::load(reg, user.clone(), draft.clone(), now).await?;
        form::close(reg, &mut form, CloseReason::NotRelevant).await?;
    }
    for draft in drafts {
        let mut form = AppointmentForm::load(reg, user.clone(), draft, now).await?;
        form::deliver(reg, &mut form).await?;
    }
    Ok(())
}

async fn cmd_summary(state: &BotState, user: User) -> AppResult<()> {
    let reg = &state.registry;
    let now = Local::now().naive_local();
    let draft = reg
        .summary_draft_repository()
        .create(CreateSummaryDraft::new(user.user_id, None, 0))
        .await?;
    let mut form = SummaryForm::load(reg, user, draft, now).await?;
    form::deliver(reg, &mut form).await
}

async fn cmd_today(state: &BotState, user: User) -> AppResult<()> {
    let reg = &state.registry;
    let now = Local::now().naive_local();
    let today = now.date();

    if !user.role.allowed_weekdays().contains(&today.weekday()) {
        let chat_id = user.chat_id.unwrap_or_default();
        return reply_text(reg, chat_id, &text::today_is_text(today.weekday())).await;
    }

    // 日付選択を飛ばして今日の一覧から始める
    let draft = reg
        .summary_draft_repository()
        .create(CreateSummaryDraft::new(user.user_id, Some(today), 1))
        .await?;
    let mut form = SummaryForm::load(reg, user, draft, now).await?;
    form::deliver(reg, &mut form).await
}

async fn handle_callback(state: &BotState, callback: CallbackQuery) -> AppResult<()> {
    let reg = &state.registry;
    let Some(message) = callback.message else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.message_id;

    let entry = state.sessions.entry(chat_id).await;
    let mut session = entry.lock().await;

    let Some(user) = ensure_user(state, &mut session, chat_id).await? else {
        return Ok(());
    };

    // ボタン押下の確認はすぐに返す
    form::suppress_transient(reg.messenger().answer_callback(&callback.id).await)?;

    let Some(data) = callback.data else {
        return Ok(());
    };
    let Some((step, value)) = parse_payload(&data) else {
        return Ok(());
    };

    let started = Instant::now();
    let now = Local::now().naive_local();

    // メッセージ ID からフォームの種類を特定する
    if let Some(draft) = reg
        .appointment_draft_repository()
        .find_by_message(user.user_id, message_id)
        .await?
    {
        let mut form = AppointmentForm::load(reg, user.clone(), draft, now).await?;
        let outcome = form.handle_value(reg, step, value).await?;
        form.reload(reg).await?;
        apply_outcome(
            state,
            &mut session,
            &mut form,
            &outcome,
            user.clone(),
            chat_id,
            message_id,
            FormKind::Appointment,
        );
        form::rerender(reg, &mut form).await?;

        // 最終ステップに達した予約ドラフトは他の描画面へ波及させる
        if form.draft.state == form.step_count() - 1 {
            let payload = format!("{}:{}", user.user_id, message_id);
            if let Err(e) = reg.event_bus().publish(Topic::Commit, &payload).await {
                tracing::warn!(error = %e, "failed to publish commit event");
            }
        }
    } else if let Some(draft) = reg
        .reminder_draft_repository()
        .find_by_message(user.user_id, message_id)
        .await?
    {
        let mut form = ReminderForm::load(reg, user.clone(), draft, now).await?;
        let outcome = form.handle_value(reg, step, value).await?;
        form.reload(reg).await?;
        apply_outcome(
            state,
            &mut session,
            &mut form,
            &outcome,
            user,
            chat_id,
            message_id,
            FormKind::Reminder,
        );
        form::rerender(reg, &mut form).await?;
    } else if let Some(draft) = reg
        .summary_draft_repository()
        .find_by_message(user.user_id, message_id)
        .await?
    {
        let mut form = SummaryForm::load(reg, user.clone(), draft, now).await?;
        let outcome = form.handle_value(reg, step, value).await?;
        form.reload(reg).await?;
        apply_outcome(
            state,
            &mut session,
            &mut form,
            &outcome,
            user,
            chat_id,
            message_id,
            FormKind::Summary,
        );
        form::rerender(reg, &mut form).await?;
    }

    tracing::info!(
        data = %data,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "callback handled"
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_outcome(
    state: &BotState,
    session: &mut Session,
    form: &mut dyn Flow,
    outcome: &StepOutcome,
    user: User,
    chat_id: i64,
    message_id: i64,
    kind: FormKind,
) {
    if outcome.accepted {
        session.replace_error_timer(None);
        return;
    }
    if let Some(error) = &outcome.error {
        form.set_error(Some(error.clone()));
        let timer = schedule_error_clear(state.clone(), user, chat_id, message_id, kind);
        session.replace_error_timer(Some(timer));
    }
}

/// 一定時間後にエラー表示だけを消して描き直す遅延タスク。
/// ドラフトがその間に前へ進んでいても、現在の状態で描き直すだけなので無害
fn schedule_error_clear(
    state: BotState,
    user: User,
    chat_id: i64,
    message_id: i64,
    kind: FormKind,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(ERROR_VISIBLE_SECONDS)).await;
        let entry = state.sessions.entry(chat_id).await;
        let _serialized = entry.lock().await;
        if let Err(e) = clear_error(&state, &user, message_id, kind).await {
            tracing::debug!(error = %e, "error banner clear failed");
        }
    })
}

async fn clear_error(
    state: &BotState,
    user: &User,
    message_id: i64,
    kind: FormKind,
) -> AppResult<()> {
    let reg = &state.registry;
    let now = Local::now().naive_local();
    match kind {
        FormKind::Appointment => {
            if let Some(draft) = reg
                .appointment_draft_repository()
                .find_by_message(user.user_id, message_id)
                .await?
            {
                let mut form = AppointmentForm::load(reg, user.clone(), draft, now).await?;
                form::rerender(reg, &mut form).await?;
            }
        }
        FormKind::Reminder => {
            if let Some(draft) = reg
                .reminder_draft_repository()
                .find_by_message(user.user_id, message_id)
                .await?
            {
                let mut form = ReminderForm::load(reg, user.clone(), draft, now).await?;
                form::rerender(reg, &mut form).await?;
            }
        }
        FormKind::Summary => {
            if let Some(draft) = reg
                .summary_draft_repository()
                .find_by_message(user.user_id, message_id)
                .await?
            {
                let mut form = SummaryForm::load(reg, user.clone(), draft, now).await?;
                form::rerender(reg, &mut form).await?;
            }
        }
    }
    Ok(())
}

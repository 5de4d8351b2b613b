//! 毎分の突き合わせパス。リマインダーの発火と、締切・開始を跨いだ
//! ドラフトの状態遷移をここでまとめて行う。ストア障害はパス全体を
//! 中断させ、通知の送信失敗は 1 件ずつ記録して他を止めない。

use crate::form::{self, AppointmentForm, CloseReason};
use crate::text;
use chrono::{Duration, NaiveDateTime, Timelike};
use futures::future::BoxFuture;
use kernel::ledger::{LedgerKey, SentLedger};
use kernel::model::role::Role;
use kernel::repository::appointment::AppointmentRepository;
use kernel::repository::draft::{AppointmentDraftRepository, SummaryDraftRepository};
use kernel::repository::reminder::ReminderRepository;
use kernel::repository::user::UserRepository;
use kernel::schedule::book_cutoff;
use kernel::transport::{Messenger, ParseMode, SendOptions};
use registry::AppRegistry;
use shared::error::AppResult;

pub fn truncate_to_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .expect("zero is a valid second")
}

pub async fn run(reg: &AppRegistry, now: NaiveDateTime, ledger: &mut SentLedger) -> AppResult<()> {
    let now = truncate_to_minute(now);
    ledger.prune_before(now);

    let mut outbound: Vec<BoxFuture<'static, ()>> = Vec::new();

    reminder_pass(reg, now, ledger, &mut outbound).await?;
    draft_pass(reg, now, ledger, &mut outbound).await?;

    // 送信と編集はまとめて並行に流し、全件の完了を待つ
    futures::future::join_all(outbound).await;
    Ok(())
}

/// モデレーターのリマインダー: target 時刻ちょうどに始まる予約があれば、
/// その日のサマリーメッセージへ件数をぶら下げて知らせる
async fn reminder_pass(
    reg: &AppRegistry,
    now: NaiveDateTime,
    ledger: &mut SentLedger,
    outbound: &mut Vec<BoxFuture<'static, ()>>,
) -> AppResult<()> {
    let moderators = reg.user_repository().find_by_role(Role::Moderator).await?;
    for moderator in moderators {
        let Some(chat_id) = moderator.chat_id else {
            continue;
        };
        let reminders = reg
            .reminder_repository()
            .find_by_user(moderator.user_id)
            .await?;
        for reminder in reminders {
            let target = now + Duration::seconds(reminder.seconds);
            let count = reg.appointment_repository().count_at(target).await?;
            if count == 0 {
                continue;
            }
            let summaries = reg
                .summary_draft_repository()
                .find_rendered(moderator.user_id, target.date())
                .await?;
            for summary in summaries {
                let Some(message_id) = summary.message_id else {
                    continue;
                };
                let key = LedgerKey {
                    draft_id: summary.draft_id,
                    seconds: reminder.seconds,
                };
                if !ledger.mark(now, key) {
                    continue;
                }
                let reg = reg.clone();
                let seconds = reminder.seconds;
                outbound.push(Box::pin(async move {
                    let opts = SendOptions {
                        parse_mode: Some(ParseMode::Markdown),
                        reply_to: Some(message_id),
                        ..Default::default()
                    };
                    let body = text::moderator_reminder_text(seconds, count);
                    if let Err(e) = reg.messenger().send_message(chat_id, &body, opts).await {
                        tracing::warn!(error = %e, chat_id, "failed to send summary reminder");
                    }
                }));
            }
        }
    }
    Ok(())
}

/// 確定済みドラフトの時刻遷移と本人向けリマインダー
async fn draft_pass(
    reg: &AppRegistry,
    now: NaiveDateTime,
    ledger: &mut SentLedger,
    outbound: &mut Vec<BoxFuture<'static, ()>>,
) -> AppResult<()> {
    let drafts = reg.appointment_draft_repository().find_live(now).await?;
    for draft in drafts {
        let Some(start) = draft.start_at() else {
            continue;
        };
        let user = reg.user_repository().find_by_id(draft.user_id).await?;

        if now >= start - book_cutoff() {
            let reason = if now >= start {
                CloseReason::Passed
            } else {
                if draft.reserved {
                    // 一度閉じた表示を毎分書き換えない
                    continue;
                }
                reg.appointment_draft_repository()
                    .set_reserved(draft.draft_id)
                    .await?;
                CloseReason::Reserved
            };
            tracing::info!(draft_id = %draft.draft_id, ?reason, "closing appointment draft");

            let reg = reg.clone();
            let draft = draft.clone();
            outbound.push(Box::pin(async move {
                match AppointmentForm::load(&reg, user, draft, now).await {
                    Ok(mut f) => {
                        if let Err(e) = form::close(&reg, &mut f, reason).await {
                            tracing::warn!(error = %e, "failed to close appointment draft");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to load appointment draft"),
                }
            }));
        } else {
            // 締切前のドラフトは本人のリマインダー時刻だけを見る
            let Some(chat_id) = user.chat_id else {
                continue;
            };
            let Some(message_id) = draft.message_id else {
                continue;
            };
            let reminders = reg.reminder_repository().find_by_user(user.user_id).await?;
            for reminder in reminders {
                if start - Duration::seconds(reminder.seconds) != now {
                    continue;
                }
                let key = LedgerKey {
                    draft_id: draft.draft_id,
                    seconds: reminder.seconds,
                };
                if !ledger.mark(now, key) {
                    continue;
                }
                let reg = reg.clone();
                let seconds = reminder.seconds;
                outbound.push(Box::pin(async move {
                    let opts = SendOptions {
                        parse_mode: Some(ParseMode::Markdown),
                        reply_to: Some(message_id),
                        ..Default::default()
                    };
                    let body = text::personal_reminder_text(seconds);
                    if let Err(e) = reg.messenger().send_message(chat_id, &body, opts).await {
                        tracing::warn!(error = %e, chat_id, "failed to send personal reminder");
                    }
                }));
            }
        }
    }
    Ok(())
}

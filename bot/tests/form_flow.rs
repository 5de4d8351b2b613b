//! フォーム遷移の通しテスト。フェイクのストア・バス・メッセンジャーで
//! 予約フローの競合・上限・多重ドラフト整理を確認する。

mod common;

use bot::form::{self, AppointmentForm, Flow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use kernel::model::appointment::Appointment;
use kernel::model::draft::{event::CreateAppointmentDraft, AppointmentDraft, SummaryDraft};
use kernel::model::id::{AppointmentId, DraftId, UserId};
use kernel::model::role::Role;
use kernel::repository::draft::AppointmentDraftRepository;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    monday().and_hms_opt(h, m, 0).unwrap()
}

fn time(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn committed_draft(user_id: UserId, t: NaiveTime, message_id: i64) -> AppointmentDraft {
    AppointmentDraft {
        draft_id: DraftId::new(),
        state: 2,
        book_date: Some(monday()),
        book_time: Some(t),
        reserved: false,
        user_id,
        message_id: Some(message_id),
    }
}

#[tokio::test]
async fn booking_flow_commits_and_blocks_competitor() -> anyhow::Result<()> {
    let h = common::harness();
    let user = common::make_user(Role::User, 10);
    let competitor = common::make_user(Role::User, 20);
    let washer = common::make_washer("W1");
    h.store.add_user(user.clone());
    h.store.add_user(competitor.clone());
    h.store.add_washer(washer.clone());

    let now = at(8, 0);

    let draft = h
        .registry
        .appointment_draft_repository()
        .create(CreateAppointmentDraft::new(user.user_id))
        .await?;
    let mut form = AppointmentForm::load(&h.registry, user.clone(), draft, now).await?;
    form::deliver(&h.registry, &mut form).await?;

    let outcome = form.handle_value(&h.registry, 0, "2024-06-10").await?;
    assert!(outcome.accepted);
    assert_eq!(form.state(), 1);

    let outcome = form.handle_value(&h.registry, 1, "10:00:00").await?;
    assert!(outcome.accepted);
    assert_eq!(form.state(), 2);

    let outcome = form
        .handle_value(&h.registry, 2, &washer.washer_id.to_string())
        .await?;
    assert!(outcome.accepted);

    let appointments = h.store.appointments.lock().unwrap().clone();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].user_id, user.user_id);

    // 競合者が同じ時刻を選ぼうとすると弾かれる
    let draft2 = h
        .registry
        .appointment_draft_repository()
        .create(CreateAppointmentDraft::new(competitor.user_id))
        .await?;
    let mut form2 = AppointmentForm::load(&h.registry, competitor, draft2, now).await?;
    let outcome = form2.handle_value(&h.registry, 0, "2024-06-10").await?;
    // 他の時刻がまだ空いているので日付自体は選べる
    assert!(outcome.accepted);
    let outcome = form2.handle_value(&h.registry, 1, "10:00:00").await?;
    assert!(!outcome.accepted);
    assert!(outcome.error.is_some());
    assert_eq!(form2.state(), 1);

    // 予約は増えていない（枠の一意性）
    assert_eq!(h.store.appointments.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn role_quota_rejects_extra_booking() -> anyhow::Result<()> {
    let h = common::harness();
    let user = common::make_user(Role::User, 10);
    let washer = common::make_washer("W1");
    h.store.add_user(user.clone());
    h.store.add_washer(washer.clone());

    // 既に上限 (2) まで予約済み
    for t in [time(14), time(18)] {
        h.store.add_appointment(Appointment {
            appointment_id: AppointmentId::new(),
            book_date: monday(),
            book_time: t,
            draft_id: None,
            user_id: user.user_id,
            washer_id: washer.washer_id,
        });
    }

    let draft = AppointmentDraft {
        draft_id: DraftId::new(),
        state: 2,
        book_date: Some(monday()),
        book_time: Some(time(10)),
        reserved: false,
        user_id: user.user_id,
        message_id: Some(100),
    };
    h.store.add_appointment_draft(draft.clone());

    let now = at(8, 0);
    let mut form = AppointmentForm::load(&h.registry, user, draft, now).await?;
    let outcome = form
        .handle_value(&h.registry, 2, &washer.washer_id.to_string())
        .await?;
    assert!(!outcome.accepted);
    assert!(outcome.error.unwrap().contains("не более"));
    assert_eq!(h.store.appointments.lock().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn restarted_flow_reallocates_superseded_draft() -> anyhow::Result<()> {
    let h = common::harness();
    let user = common::make_user(Role::User, 10);
    let washer = common::make_washer("W1");
    h.store.add_user(user.clone());
    h.store.add_washer(washer.clone());

    let now = at(8, 0);

    // 1 度目のフローを最後まで通す
    let draft_a = h
        .registry
        .appointment_draft_repository()
        .create(CreateAppointmentDraft::new(user.user_id))
        .await?;
    let mut form_a = AppointmentForm::load(&h.registry, user.clone(), draft_a, now).await?;
    form::deliver(&h.registry, &mut form_a).await?;
    assert!(form_a.handle_value(&h.registry, 0, "2024-06-10").await?.accepted);
    assert!(form_a.handle_value(&h.registry, 1, "10:00:00").await?.accepted);
    assert!(form_a
        .handle_value(&h.registry, 2, &washer.washer_id.to_string())
        .await?
        .accepted);
    let message_a = form_a.draft.message_id.unwrap();

    // /book をやり直して同じ日時まで進める
    let draft_b = h
        .registry
        .appointment_draft_repository()
        .create(CreateAppointmentDraft::new(user.user_id))
        .await?;
    let mut form_b = AppointmentForm::load(&h.registry, user.clone(), draft_b, now).await?;
    form::deliver(&h.registry, &mut form_b).await?;
    // 自分の予約が入っている枠は「自分の枠」としてそのまま選べる
    assert!(form_b.handle_value(&h.registry, 0, "2024-06-10").await?.accepted);
    assert!(form_b.handle_value(&h.registry, 1, "10:00:00").await?.accepted);

    // 再描画のタイミングで古いドラフトが整理される
    form::rerender(&h.registry, &mut form_b).await?;

    let drafts = h.store.appointment_drafts.lock().unwrap().clone();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].draft_id, form_b.draft.draft_id);

    // 予約は複製されず、新しいドラフトに付け替えられている
    let appointments = h.store.appointments.lock().unwrap().clone();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].draft_id, Some(form_b.draft.draft_id));

    // 取って代わられた描画面には close が流れる
    let events = h.bus.events.lock().unwrap().clone();
    assert!(events
        .iter()
        .any(|(topic, payload)| *topic == "close" && payload == &format!("10:{}", message_a)));

    // 新しいフォームで同じ洗濯機を押すとキャンセルになる（複製はされない）
    let outcome = form_b
        .handle_value(&h.registry, 2, &washer.washer_id.to_string())
        .await?;
    assert!(outcome.accepted);
    assert_eq!(h.store.appointments.lock().unwrap().len(), 0);
    Ok(())
}

#[tokio::test]
async fn commit_fanout_refreshes_affected_surfaces() -> anyhow::Result<()> {
    let h = common::harness();
    let owner = common::make_user(Role::User, 10);
    let other = common::make_user(Role::User, 20);
    let moderator = common::make_user(Role::Moderator, 99);
    let washer = common::make_washer("W1");
    h.store.add_user(owner.clone());
    h.store.add_user(other.clone());
    h.store.add_user(moderator.clone());
    h.store.add_washer(washer.clone());

    let committed = committed_draft(owner.user_id, time(10), 100);
    h.store.add_appointment_draft(committed.clone());
    h.store.add_appointment(Appointment {
        appointment_id: AppointmentId::new(),
        book_date: monday(),
        book_time: time(10),
        draft_id: Some(committed.draft_id),
        user_id: owner.user_id,
        washer_id: washer.washer_id,
    });

    // 影響を受けるはずのドラフト
    let at_first_step = AppointmentDraft {
        draft_id: DraftId::new(),
        state: 0,
        book_date: None,
        book_time: None,
        reserved: false,
        user_id: other.user_id,
        message_id: Some(201),
    };
    let same_date = AppointmentDraft {
        draft_id: DraftId::new(),
        state: 1,
        book_date: Some(monday()),
        book_time: None,
        reserved: false,
        user_id: other.user_id,
        message_id: Some(202),
    };
    // 別の日付・時刻選択済みのものは対象外
    let unrelated = AppointmentDraft {
        draft_id: DraftId::new(),
        state: 1,
        book_date: Some(monday().succ_opt().unwrap()),
        book_time: None,
        reserved: false,
        user_id: other.user_id,
        message_id: Some(203),
    };
    h.store.add_appointment_draft(at_first_step);
    h.store.add_appointment_draft(same_date);
    h.store.add_appointment_draft(unrelated);

    let shown_summary = SummaryDraft {
        draft_id: DraftId::new(),
        state: 1,
        summary_date: Some(monday()),
        user_id: moderator.user_id,
        message_id: Some(301),
    };
    let pending_summary = SummaryDraft {
        draft_id: DraftId::new(),
        state: 0,
        summary_date: None,
        user_id: moderator.user_id,
        message_id: Some(302),
    };
    let other_day_summary = SummaryDraft {
        draft_id: DraftId::new(),
        state: 1,
        summary_date: Some(monday().succ_opt().unwrap()),
        user_id: moderator.user_id,
        message_id: Some(303),
    };
    h.store.add_summary_draft(shown_summary);
    h.store.add_summary_draft(pending_summary);
    h.store.add_summary_draft(other_day_summary);

    form::appointment::take_affect(&h.registry, &committed, at(8, 0)).await?;

    let edited: Vec<i64> = h
        .messenger
        .edits
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.message_id)
        .collect();
    assert!(edited.contains(&201));
    assert!(edited.contains(&202));
    assert!(edited.contains(&301));
    assert!(edited.contains(&302));
    assert!(!edited.contains(&203));
    assert!(!edited.contains(&303));
    Ok(())
}

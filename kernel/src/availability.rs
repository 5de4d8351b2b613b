//! 予約枠の空き判定。入力と現在時刻だけで決まる純粋な計算で、
//! ストアへの副作用は持たない。

use crate::model::appointment::Appointment;
use crate::model::slot::{Slot, SlotReason};
use crate::model::user::User;
use crate::model::washer::Washer;
use crate::schedule::book_cutoff;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// 1 台の洗濯機に対する判定。
/// 予約が無ければ洗濯機の稼働状態で決まり、
/// 予約が有れば自分のものかどうかで available が変わる
/// （自分の予約を押すことはキャンセルを意味するため）。
pub fn slot_for(user: &User, appointment: Option<&Appointment>, washer: &Washer) -> Slot {
    match appointment {
        None => {
            if washer.available {
                Slot::new(true, SlotReason::Available, None)
            } else {
                Slot::new(false, SlotReason::NotAvailable, None)
            }
        }
        Some(a) => {
            let own = a.user_id == user.user_id;
            Slot::new(
                own,
                SlotReason::AlreadyBooked,
                own.then(|| a.clone()),
            )
        }
    }
}

/// 時刻側の境界チェック。開始済みなら Passed、締切内なら Reserved、
/// どちらでもなければ None。締切境界ちょうどは締切内とみなす
pub fn boundary_slot(now: NaiveDateTime, start: NaiveDateTime) -> Option<Slot> {
    if now >= start {
        Some(Slot::new(false, SlotReason::Passed, None))
    } else if now >= start - book_cutoff() {
        Some(Slot::new(false, SlotReason::Reserved, None))
    } else {
        None
    }
}

/// 候補日時の組合せごとの判定一覧を展開する。
/// 時刻側の境界条件（開始済み・締切内）は洗濯機の状態より優先され、
/// その場合は洗濯機ごとの展開は行わない。
pub fn expand(
    now: NaiveDateTime,
    user: &User,
    appointments: &[Appointment],
    date: NaiveDate,
    times: &[NaiveTime],
    washers: &[Washer],
) -> Vec<Slot> {
    let mut slots = Vec::new();
    for t in times {
        let start = date.and_time(*t);
        if let Some(slot) = boundary_slot(now, start) {
            slots.push(slot);
            continue;
        }
        for w in washers {
            let matched = appointments
                .iter()
                .find(|a| a.start_at() == start && a.washer_id == w.washer_id);
            slots.push(slot_for(user, matched, w));
        }
    }
    slots
}

/// 1 つの日付/時刻選択肢を要約する。優先順位の高い判定から順に、
/// どれか 1 枠でも該当すればそれを全体の判定とする。
/// 順序にも乱数にも依存しないので、入力の並びを変えても結果は同じ。
pub fn aggregate(slots: &[Slot]) -> Slot {
    let levels = [
        Slot::new(true, SlotReason::AlreadyBooked, None),
        Slot::new(true, SlotReason::Available, None),
        Slot::new(false, SlotReason::AlreadyBooked, None),
        Slot::new(false, SlotReason::Passed, None),
        Slot::new(false, SlotReason::Reserved, None),
    ];

    for level in levels {
        if slots.iter().any(|s| level.verdict_eq(s)) {
            return level;
        }
    }
    // 全滅（すべてメンテナンス中など）の場合
    Slot::new(false, SlotReason::NotAvailable, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::{AppointmentId, UserId, WasherId};
    use crate::model::role::Role;

    fn user(chat_id: i64) -> User {
        User {
            user_id: UserId::new(),
            first_name: "Иван".into(),
            last_name: "Иванов".into(),
            order_number: "42".into(),
            username: None,
            chat_id: Some(chat_id),
            role: Role::User,
        }
    }

    fn washer(available: bool) -> Washer {
        Washer {
            washer_id: WasherId::new(),
            washer_name: "W1".into(),
            available,
        }
    }

    fn appointment(owner: &User, washer: &Washer, date: NaiveDate, time: NaiveTime) -> Appointment {
        Appointment {
            appointment_id: AppointmentId::new(),
            book_date: date,
            book_time: time,
            draft_id: None,
            user_id: owner.user_id,
            washer_id: washer.washer_id,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn free_washer_is_available() {
        let u = user(1);
        let w = washer(true);
        let slot = slot_for(&u, None, &w);
        assert!(slot.available);
        assert_eq!(slot.reason, SlotReason::Available);
    }

    #[test]
    fn maintenance_washer_is_not_available() {
        let u = user(1);
        let w = washer(false);
        let slot = slot_for(&u, None, &w);
        assert!(!slot.available);
        assert_eq!(slot.reason, SlotReason::NotAvailable);
    }

    #[test]
    fn own_booking_stays_available_for_toggle() {
        let u = user(1);
        let w = washer(true);
        let a = appointment(&u, &w, date(), time(10, 0));
        let slot = slot_for(&u, Some(&a), &w);
        assert!(slot.available);
        assert_eq!(slot.reason, SlotReason::AlreadyBooked);
        assert!(slot.appointment.is_some());
    }

    #[test]
    fn evaluate_turns_already_booked_after_competitor_commits() {
        let u = user(1);
        let u2 = user(2);
        let w = washer(true);
        let now = date().and_time(time(9, 0));

        let slots = expand(now, &u, &[], date(), &[time(10, 0)], &[w.clone()]);
        assert_eq!(slots.len(), 1);
        assert!(slots[0].available);
        assert_eq!(slots[0].reason, SlotReason::Available);

        // 競合者が同じ枠を確定させた後の再評価
        let committed = appointment(&u2, &w, date(), time(10, 0));
        let slots = expand(now, &u, &[committed], date(), &[time(10, 0)], &[w]);
        assert!(!slots[0].available);
        assert_eq!(slots[0].reason, SlotReason::AlreadyBooked);
        assert!(slots[0].appointment.is_none());
    }

    #[test]
    fn cutoff_window_dominates_washer_state() {
        let u = user(1);
        let w = washer(true);
        // 開始 20 分前、締切 30 分 → 予約は締切内
        let now = date().and_time(time(9, 40));
        let slots = expand(now, &u, &[], date(), &[time(10, 0)], &[w]);
        assert_eq!(slots.len(), 1);
        assert!(!slots[0].available);
        assert_eq!(slots[0].reason, SlotReason::Reserved);
    }

    #[test]
    fn cutoff_boundary_is_inclusive() {
        let u = user(1);
        let w = washer(true);
        // 締切境界ちょうど（開始 30 分前）は締切内
        let slots = expand(
            date().and_time(time(9, 30)),
            &u,
            &[],
            date(),
            &[time(10, 0)],
            &[w.clone()],
        );
        assert_eq!(slots[0].reason, SlotReason::Reserved);
        // その 1 分前はまだ予約可能
        let slots = expand(
            date().and_time(time(9, 29)),
            &u,
            &[],
            date(),
            &[time(10, 0)],
            &[w],
        );
        assert!(slots[0].available);
        assert_eq!(slots[0].reason, SlotReason::Available);
    }

    #[test]
    fn start_instant_is_passed() {
        let u = user(1);
        let w = washer(true);
        let slots = expand(
            date().and_time(time(10, 0)),
            &u,
            &[],
            date(),
            &[time(10, 0)],
            &[w],
        );
        assert_eq!(slots[0].reason, SlotReason::Passed);
    }

    #[test]
    fn aggregate_is_order_independent() {
        let base = vec![
            Slot::new(false, SlotReason::Reserved, None),
            Slot::new(false, SlotReason::AlreadyBooked, None),
            Slot::new(true, SlotReason::Available, None),
            Slot::new(false, SlotReason::Passed, None),
        ];
        let expected = aggregate(&base);
        assert!(expected.available);
        assert_eq!(expected.reason, SlotReason::Available);

        let mut rotated = base.clone();
        for _ in 0..base.len() {
            rotated.rotate_left(1);
            assert!(aggregate(&rotated).verdict_eq(&expected));
        }
        let reversed: Vec<Slot> = base.into_iter().rev().collect();
        assert!(aggregate(&reversed).verdict_eq(&expected));
    }

    #[test]
    fn aggregate_prefers_own_booking_over_free_slot() {
        let slots = vec![
            Slot::new(true, SlotReason::Available, None),
            Slot::new(true, SlotReason::AlreadyBooked, None),
        ];
        assert_eq!(aggregate(&slots).reason, SlotReason::AlreadyBooked);
    }

    #[test]
    fn aggregate_of_all_maintenance_falls_back() {
        let slots = vec![
            Slot::new(false, SlotReason::NotAvailable, None),
            Slot::new(false, SlotReason::NotAvailable, None),
        ];
        let out = aggregate(&slots);
        assert!(!out.available);
        assert_eq!(out.reason, SlotReason::NotAvailable);
    }
}

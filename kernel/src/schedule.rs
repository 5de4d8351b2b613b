use crate::model::role::Role;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// 開始時刻の何分前から予約を確定扱いにするか
pub const BOOK_CUTOFF_MINUTES: i64 = 30;

/// 入力エラーの表示秒数
pub const ERROR_VISIBLE_SECONDS: u64 = 2;

/// リマインダーフォームで選べるオフセット（秒）
pub const REMINDER_OFFSETS: [i64; 5] = [300, 900, 3_600, 10_800, 86_400];

pub fn book_cutoff() -> Duration {
    Duration::minutes(BOOK_CUTOFF_MINUTES)
}

const USER_HOURS: [u32; 4] = [10, 14, 18, 20];
const MODERATOR_HOURS: [u32; 5] = [10, 13, 16, 19, 22];

/// その曜日に予約枠として開いている時刻の一覧。
/// 水曜と日曜はモデレーター向けの時間割になる。
pub fn times_for(weekday: Weekday) -> Vec<NaiveTime> {
    let hours: &[u32] = match weekday {
        Weekday::Wed | Weekday::Sun => &MODERATOR_HOURS,
        _ => &USER_HOURS,
    };
    hours
        .iter()
        .map(|h| NaiveTime::from_hms_opt(*h, 0, 0).expect("valid hour"))
        .collect()
}

/// 日付キーボードに並べる候補日。
/// 今日の枠がすべて過ぎていれば翌日から数え、
/// 役割で許可されていない曜日は飛ばして offered_days 件を返す。
pub fn available_dates(now: NaiveDateTime, role: Role) -> Vec<NaiveDate> {
    let mut day = now.date();
    let exhausted = times_for(day.weekday())
        .iter()
        .all(|t| now > day.and_time(*t));
    if exhausted {
        day = day.succ_opt().expect("date in range");
    }

    let allowed = role.allowed_weekdays();
    let mut dates = Vec::with_capacity(role.offered_days());
    for _ in 0..role.offered_days() {
        while !allowed.contains(&day.weekday()) {
            day = day.succ_opt().expect("date in range");
        }
        dates.push(day);
        day = day.succ_opt().expect("date in range");
    }
    dates
}

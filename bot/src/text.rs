//! 利用者向けの文言とその整形。ボットの応答はロシア語で返す。

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use kernel::model::appointment::DayScheduleEntry;
use kernel::model::slot::{Slot, SlotReason};
use kernel::model::user::AuthOutcome;

pub const START_AUTHORIZED: &str = "Для записи в прачечную введите комманду: /book";
pub const START_INTRO: &str =
    "Здравствуйте! Это бот записи в прачечную.\n\n\
     Для начала работы нужно авторизоваться:";
pub const AUTH_ACTION: &str =
    "Отправьте сообщение вида: `/auth Фамилия Имя НомерДоговора`\n\
     Если фамилия и имя указаны в профиле, достаточно: `/auth НомерДоговора`";
pub const AUTH_REQUIRED: &str = "Сначала нужно авторизоваться";
pub const NO_ACTIVE_BOOKINGS: &str = "На данный момент нет действующих записей";
pub const MODERATOR_ONLY: &str = "Эта команда доступна только модераторам";

pub const APPOINTMENT_FINISHED: &str = "Вы записаны";
pub const APPOINTMENT_PASSED_TITLE: &str = "Запись уже прошла";
pub const APPOINTMENT_RESERVED_TITLE: &str = "Запись зарезервирована";
pub const REMINDER_FINISHED: &str = "Уведомления настроены";

pub const MAX_WASHERS_ERROR: &str = "Можно записаться не более чем на {} машин";

pub fn auth_outcome_text(outcome: AuthOutcome) -> &'static str {
    match outcome {
        AuthOutcome::Successful => "Вы успешно авторизованы ✅",
        AuthOutcome::SelfAlreadyAuthorized => "Вы уже авторизованы",
        AuthOutcome::OtherAlreadyAuthorized => {
            "Этот пользователь уже привязан к другому чату"
        }
        AuthOutcome::NotFound => "Пользователь не найден. Проверьте фамилию, имя и номер договора",
    }
}

/// 日付ステップで弾かれたときの文言
pub fn date_error_text(reason: SlotReason) -> &'static str {
    match reason {
        SlotReason::AlreadyBooked => "В этот день свободных машин уже нет",
        SlotReason::NotAvailable => "В этот день машины недоступны",
        SlotReason::Passed => "Этот день уже прошёл",
        SlotReason::Reserved => "Запись на этот день уже закрыта",
        SlotReason::Available => "",
    }
}

pub fn time_error_text(reason: SlotReason, cutoff_seconds: i64) -> String {
    match reason {
        SlotReason::AlreadyBooked => "На это время свободных машин нет".into(),
        SlotReason::NotAvailable => "На это время машины недоступны".into(),
        SlotReason::Passed => "Это время уже прошло".into(),
        SlotReason::Reserved => format!(
            "Запись возможна не позднее чем за {} до начала",
            timedelta_to_str(cutoff_seconds)
        ),
        SlotReason::Available => String::new(),
    }
}

pub fn washer_error_text(reason: SlotReason) -> &'static str {
    match reason {
        SlotReason::AlreadyBooked => "Эта машина уже занята",
        SlotReason::NotAvailable => "Машина на обслуживании",
        SlotReason::Passed => "Время записи уже прошло",
        SlotReason::Reserved => "Запись уже закрыта",
        SlotReason::Available => "",
    }
}

/// ボタン先頭に付ける状態記号
pub fn slot_sign(slot: &Slot) -> Option<&'static str> {
    match (slot.reason, slot.available) {
        (SlotReason::Available, _) => None,
        (SlotReason::AlreadyBooked, true) => Some("✅"),
        (SlotReason::AlreadyBooked, false) => Some("❌"),
        (SlotReason::NotAvailable, _) => Some("🔧"),
        (SlotReason::Passed, _) | (SlotReason::Reserved, _) => Some("⌛"),
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "понедельник",
        Weekday::Tue => "вторник",
        Weekday::Wed => "среда",
        Weekday::Thu => "четверг",
        Weekday::Fri => "пятница",
        Weekday::Sat => "суббота",
        Weekday::Sun => "воскресенье",
    }
}

pub fn weekday_short(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "пн",
        Weekday::Tue => "вт",
        Weekday::Wed => "ср",
        Weekday::Thu => "чт",
        Weekday::Fri => "пт",
        Weekday::Sat => "сб",
        Weekday::Sun => "вс",
    }
}

const SHIFT_DAYS: [&str; 3] = ["сегодня", "завтра", "послезавтра"];

/// "10.6.2024 (сегодня)" のような表示
pub fn date_to_str(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    let addition = if (0..SHIFT_DAYS.len() as i64).contains(&delta) {
        SHIFT_DAYS[delta as usize]
    } else {
        weekday_name(date.weekday())
    };
    format!(
        "{}.{}.{} ({})",
        date.day(),
        date.month(),
        date.year(),
        addition
    )
}

/// ボタン用の短い表示 "10.06 (пн)"
pub fn date_button_to_str(date: NaiveDate) -> String {
    format!(
        "{:02}.{:02} ({})",
        date.day(),
        date.month(),
        weekday_short(date.weekday())
    )
}

pub fn time_to_str(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// 秒数を "1 д. 2 ч. 30 мин." のように読める形へ
pub fn timedelta_to_str(seconds: i64) -> String {
    let mut units = seconds;
    let mut pieces = Vec::new();
    if units >= 86_400 {
        pieces.push(format!("{} д.", units / 86_400));
        units %= 86_400;
    }
    if units >= 3_600 {
        pieces.push(format!("{} ч.", units / 3_600));
        units %= 3_600;
    }
    if units >= 60 {
        pieces.push(format!("{} мин.", units / 60));
        units %= 60;
    }
    if units > 0 {
        pieces.push(format!("{} с.", units));
    }
    pieces.join(" ")
}

pub fn washers_to_str(mut names: Vec<String>) -> String {
    names.sort();
    names.join(", ")
}

/// 水曜・日曜の 10:00 枠には受け取り時刻の注意書きが付く
pub fn time_note(weekday: Weekday, time: NaiveTime) -> Option<&'static str> {
    match (weekday, time.format("%H:%M").to_string().as_str()) {
        (Weekday::Wed | Weekday::Sun, "10:00") => Some("забрать следует в 12:00"),
        _ => None,
    }
}

/// MarkdownV2 の特殊文字をエスケープする
pub fn md2_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '_' | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn moderator_reminder_text(seconds: i64, count: i64) -> String {
    format!(
        "🔔 Через *{}* назначены стирки - {}",
        timedelta_to_str(seconds),
        count
    )
}

pub fn personal_reminder_text(seconds: i64) -> String {
    format!("🔔 Через *{}* назначена ваша стирка", timedelta_to_str(seconds))
}

pub fn today_is_text(weekday: Weekday) -> String {
    format!("☕ Сегодня {}, записи в этот день нет", weekday_name(weekday))
}

/// 日次サマリーの本文 (MarkdownV2)。
/// 時刻ごとにまとめ、過ぎた枠の時刻は取り消し線にする
pub fn day_schedule_text(
    date: NaiveDate,
    today: NaiveDate,
    now: NaiveDateTime,
    entries: &[DayScheduleEntry],
) -> String {
    let mut text = md2_escape(&date_to_str(date, today));
    text.push_str("\n\n");

    // (時刻, 利用者) 単位で洗濯機の表示名をまとめる
    let mut current_time: Option<NaiveTime> = None;
    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        if current_time != Some(entry.book_time) {
            current_time = Some(entry.book_time);
            let expired = now >= date.and_time(entry.book_time);
            let time_str = time_to_str(entry.book_time);
            if expired {
                text.push_str(&format!("~{}~\n", time_str));
            } else {
                text.push_str(&format!("*{}*\n", time_str));
            }
        }

        let mut washers = vec![entry.washer_name.clone()];
        let mut j = i + 1;
        while j < entries.len()
            && entries[j].book_time == entry.book_time
            && entries[j].username == entry.username
            && entries[j].first_name == entry.first_name
        {
            washers.push(entries[j].washer_name.clone());
            j += 1;
        }

        text.push_str(&format!(
            "\\- @{} \\- ||{}|| \\- \\({}\\)\n",
            md2_escape(entry.username.as_deref().unwrap_or("")),
            md2_escape(&entry.first_name),
            washers_to_str(washers)
        ));
        i = j;
    }

    text
}

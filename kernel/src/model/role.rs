use chrono::Weekday;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// 利用者の役割。DB 側の user_role 型と対応する。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[strum(serialize = "user")]
    #[sqlx(rename = "user")]
    User,
    #[strum(serialize = "moderator:partial")]
    #[sqlx(rename = "moderator:partial")]
    ModeratorPartial,
    #[strum(serialize = "moderator")]
    #[sqlx(rename = "moderator")]
    Moderator,
    #[strum(serialize = "employee")]
    #[sqlx(rename = "employee")]
    Employee,
}

const USER_WEEKDAYS: &[Weekday] = &[
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

const FULL_WEEKDAYS: &[Weekday] = &[
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl Role {
    /// 同時に予約できる洗濯機数の上限
    pub fn max_washers(&self) -> usize {
        match self {
            Role::User | Role::ModeratorPartial => 2,
            Role::Moderator | Role::Employee => 3,
        }
    }

    /// 予約を入れられる曜日
    pub fn allowed_weekdays(&self) -> &'static [Weekday] {
        match self {
            Role::User | Role::ModeratorPartial => USER_WEEKDAYS,
            Role::Moderator | Role::Employee => FULL_WEEKDAYS,
        }
    }

    /// 日付キーボードに表示する候補日数
    pub fn offered_days(&self) -> usize {
        match self {
            Role::User | Role::ModeratorPartial => 5,
            Role::Moderator | Role::Employee => 7,
        }
    }
}

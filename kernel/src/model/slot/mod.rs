use crate::model::appointment::Appointment;

/// 1 つの (日付, 時刻, 洗濯機) 候補に対する判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotReason {
    Available,
    AlreadyBooked,
    NotAvailable,
    Passed,
    Reserved,
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub available: bool,
    pub reason: SlotReason,
    // 自分の予約が入っている場合のみ保持する（押下でキャンセルするため）
    pub appointment: Option<Appointment>,
}

impl Slot {
    pub fn new(available: bool, reason: SlotReason, appointment: Option<Appointment>) -> Self {
        Self {
            available,
            reason,
            appointment,
        }
    }

    /// 予約の中身は無視して判定だけを比較する
    pub fn verdict_eq(&self, other: &Slot) -> bool {
        self.available == other.available && self.reason == other.reason
    }
}

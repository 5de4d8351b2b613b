//! 送信済みリマインダーの台帳。スケジューラープロセスが 1 つだけ持ち、
//! 同じ分に対して同じ通知を二度送らないためのガードとして使う。
//! 過去分の掃除は毎分のパスの先頭で明示的に行う。

use crate::model::id::DraftId;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub draft_id: DraftId,
    pub seconds: i64,
}

#[derive(Debug, Default)]
pub struct SentLedger {
    fired: BTreeMap<NaiveDateTime, HashSet<LedgerKey>>,
}

impl SentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 発火を記録する。既に記録済みなら false を返す。
    pub fn mark(&mut self, at: NaiveDateTime, key: LedgerKey) -> bool {
        self.fired.entry(at).or_default().insert(key)
    }

    /// now より前の分のエントリを落とす
    pub fn prune_before(&mut self, now: NaiveDateTime) {
        self.fired = self.fired.split_off(&now);
    }

    pub fn len(&self) -> usize {
        self.fired.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

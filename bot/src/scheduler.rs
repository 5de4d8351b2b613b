//! 毎分 0 秒に突き合わせパスを回すループ。
//! パスの失敗は記録して次の分を待つ。

use crate::reconcile;
use chrono::{Local, Timelike};
use kernel::ledger::SentLedger;
use registry::AppRegistry;
use std::time::{Duration, Instant};

pub async fn run(registry: AppRegistry) {
    let mut ledger = SentLedger::new();
    loop {
        wait_for_next_minute().await;

        let now = Local::now().naive_local();
        let started = Instant::now();
        match reconcile::run(&registry, now, &mut ledger).await {
            Ok(()) => tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                ledger_len = ledger.len(),
                "reconcile pass finished"
            ),
            Err(e) => tracing::error!(error = %e, "reconcile pass aborted"),
        }
    }
}

async fn wait_for_next_minute() {
    let second = Local::now().second() as u64;
    tokio::time::sleep(Duration::from_secs(60 - second.min(59))).await;
}

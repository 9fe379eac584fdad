//! 进程内提醒调度器
//!
//! 与 cron 入口可以同时运行，重复发送由提醒记录的唯一约束避免。

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::cron::run_reminder_pass;
use crate::models::audit::entities::NewAuditLog;
use crate::services::{EmailSender, audit};
use crate::storage::Storage;

const MIN_INTERVAL_SECS: u64 = 60;

/// 扫描间隔，不低于一分钟
fn scheduler_period(interval_secs: u64) -> Duration {
    Duration::from_secs(interval_secs.max(MIN_INTERVAL_SECS))
}

pub fn spawn_scheduler(
    storage: Arc<dyn Storage>,
    sender: Arc<dyn EmailSender>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let period = scheduler_period(interval_secs);
    info!("提醒调度器已启动，间隔 {}s", period.as_secs());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match run_reminder_pass(storage.as_ref(), sender.as_ref(), chrono::Utc::now()).await {
                Ok(report) => {
                    audit::record(
                        storage.as_ref(),
                        None,
                        NewAuditLog::new("cron.reminders", "system", None)
                            .details(serde_json::json!(report)),
                    )
                    .await;
                }
                Err(e) => error!("定时提醒执行失败: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_period_has_floor() {
        assert_eq!(scheduler_period(5), Duration::from_secs(60));
        assert_eq!(scheduler_period(900), Duration::from_secs(900));
    }
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RetentionSettings;
use crate::domain::repositories::activity_log_repository::ActivityLogRepository;
use crate::domain::repositories::attack_repository::AttackRepository;
use crate::queue::task_queue::CrawlerQueue;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 留存清理工作器
///
/// 定期做三件维护：删除超过保留窗口的活动日志，
/// 把窗口已过且从未执行的攻击标记为过期，
/// 逐出内存里超过保留时长的终态手动任务。
pub struct RetentionWorker {
    activities: Arc<dyn ActivityLogRepository>,
    attacks: Arc<dyn AttackRepository>,
    queue: Arc<CrawlerQueue>,
    settings: RetentionSettings,
}

impl RetentionWorker {
    pub fn new(
        activities: Arc<dyn ActivityLogRepository>,
        attacks: Arc<dyn AttackRepository>,
        queue: Arc<CrawlerQueue>,
        settings: RetentionSettings,
    ) -> Self {
        Self {
            activities,
            attacks,
            queue,
            settings,
        }
    }

    /// 运行工作器
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Retention worker started");

        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.settings.sweep_interval_secs));

        loop {
            tokio::select! {
                _ = interval.tick() => self.sweep().await,
                _ = shutdown.changed() => {
                    info!("Retention worker stopping");
                    return;
                }
            }
        }
    }

    /// 启动后台运行
    pub fn start(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    async fn sweep(&self) {
        let now = Utc::now();

        let cutoff = now - Duration::days(self.settings.activity_log_days);
        match self.activities.delete_older_than(cutoff).await {
            Ok(count) if count > 0 => info!("Pruned {} expired activity log rows", count),
            Ok(_) => {}
            Err(e) => error!("Failed to prune activity logs: {}", e),
        }

        match self.attacks.expire_overdue(now).await {
            Ok(count) if count > 0 => info!("Expired {} overdue scheduled attacks", count),
            Ok(_) => {}
            Err(e) => error!("Failed to expire overdue attacks: {}", e),
        }

        self.queue.evict_stale(now);
    }
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::crawler_worker::CrawlerWorker;
use crate::workers::retention_worker::RetentionWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 关闭信号发出后等待工作器自行退出的宽限
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// 工作管理器
///
/// 持有后台任务句柄并负责优雅关闭。爬虫工作器必须恰好
/// 启动一个实例，单会话约束依赖这一点。关闭通过watch通道
/// 广播，工作器收到信号后放弃在途任务并退出循环。
pub struct WorkerManager {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerManager {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            handles: Vec::new(),
            shutdown,
        }
    }

    /// 启动唯一的爬虫工作器
    pub fn start_crawler(&mut self, worker: Arc<CrawlerWorker>) {
        let rx = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            worker.run(rx).await;
        });
        self.handles.push(handle);
    }

    /// 启动留存清理工作器
    pub fn start_retention(&mut self, worker: RetentionWorker) {
        self.handles.push(worker.start(self.shutdown.subscribe()));
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        let _ = self.shutdown.send(true);
        for mut handle in self.handles.drain(..) {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut handle)
                .await
                .is_err()
            {
                warn!("Worker did not stop within grace period, aborting");
                handle.abort();
            }
        }

        info!("Workers shut down successfully");
    }
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::registry::HandlerRegistry;
use crate::automation::session::{SessionError, SessionProvider};
use crate::automation::traits::{HandlerContext, HandlerOutcome};
use crate::domain::models::activity_log::{ActivityEventType, ActivityLog};
use crate::domain::models::execution_log::{ExecutionLog, ExecutionStatus};
use crate::domain::models::manual_task::ManualTaskStatus;
use crate::domain::models::task_kind::TaskKind;
use crate::domain::repositories::activity_log_repository::ActivityLogRepository;
use crate::domain::repositories::execution_log_repository::ExecutionLogRepository;
use crate::domain::repositories::plan_repository::PlanRepository;
use crate::domain::services::recovery::{FailureKind, RecoveryAction, RecoveryPolicy};
use crate::queue::scheduler::PlanScheduler;
use crate::queue::task_queue::{CrawlerQueue, QueuedTask, TaskSource};
use crate::workers::state::{CurrentTask, WorkerState};
use chrono::{DateTime, Utc};
use metrics::counter;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 空闲时两次调度检查之间的最长睡眠
const IDLE_POLL_CAP: Duration = Duration::from_secs(5);

/// 一次任务运行的结果
enum TaskRun {
    /// 运行成功
    Completed { summary: Option<String> },
    /// 运行失败，已归类
    Failed { failure: FailureKind, message: String },
}

/// 爬虫工作器
///
/// 单一消费者：整个进程只有一个实例从队列取任务，同一时刻
/// 至多一个游戏会话在活动。每次运行开启一条执行日志，结束时
/// 定稿一次，失败交给恢复策略决定封锁、冷却或继续。
pub struct CrawlerWorker {
    queue: Arc<CrawlerQueue>,
    scheduler: Arc<PlanScheduler>,
    plans: Arc<dyn PlanRepository>,
    executions: Arc<dyn ExecutionLogRepository>,
    activities: Arc<dyn ActivityLogRepository>,
    sessions: Arc<dyn SessionProvider>,
    registry: Arc<HandlerRegistry>,
    recovery: RecoveryPolicy,
    state: Arc<WorkerState>,
    /// 任务间随机延迟区间（毫秒）
    jitter_ms: (u64, u64),
    /// 每个服务器的连续会话失败计数
    session_failures: Mutex<HashMap<i32, u32>>,
    /// 当前未定稿的执行日志，关闭时以错误定稿
    current_execution: Mutex<Option<Uuid>>,
}

impl CrawlerWorker {
    /// 创建新的爬虫工作器实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<CrawlerQueue>,
        scheduler: Arc<PlanScheduler>,
        plans: Arc<dyn PlanRepository>,
        executions: Arc<dyn ExecutionLogRepository>,
        activities: Arc<dyn ActivityLogRepository>,
        sessions: Arc<dyn SessionProvider>,
        registry: Arc<HandlerRegistry>,
        recovery: RecoveryPolicy,
        state: Arc<WorkerState>,
        jitter_ms: (u64, u64),
    ) -> Self {
        Self {
            queue,
            scheduler,
            plans,
            executions,
            activities,
            sessions,
            registry,
            recovery,
            state,
            jitter_ms,
            session_failures: Mutex::new(HashMap::new()),
            current_execution: Mutex::new(None),
        }
    }

    /// 运行工作器主循环
    ///
    /// 关闭信号打断一切等待：在途任务的超时被放弃，手动任务
    /// 以关闭原因标记失败，循环随即退出
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Crawler worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let now = Utc::now();
            if let Err(e) = self.scheduler.pump_due(now).await {
                error!("Failed to pump due plans: {}", e);
                tokio::select! {
                    _ = sleep(Duration::from_secs(1)) => {}
                    _ = shutdown.changed() => {}
                }
                continue;
            }

            let Some(task) = self.queue.try_dequeue() else {
                self.idle(now, &mut shutdown).await;
                continue;
            };

            tokio::select! {
                _ = self.process(task.clone()) => {
                    self.queue.finish_current();
                    self.pause_between_tasks().await;
                }
                _ = shutdown.changed() => {
                    self.abort_for_shutdown(&task).await;
                    break;
                }
            }
        }

        info!("Crawler worker stopped");
    }

    /// 关闭时放弃被打断的任务，未定稿的执行日志以错误收尾
    async fn abort_for_shutdown(&self, task: &QueuedTask) {
        warn!(
            server_id = task.server_id,
            kind = %task.task_kind,
            "Shutdown requested, abandoning in-flight task"
        );
        let interrupted = self.current_execution.lock().take();
        if let Some(execution_id) = interrupted {
            if let Err(e) = self
                .executions
                .finalize(
                    execution_id,
                    ExecutionStatus::Error,
                    Some("shutdown in progress".to_string()),
                    Utc::now(),
                )
                .await
            {
                error!("Failed to finalize interrupted execution log: {}", e);
            }
        }
        if task.source == TaskSource::Manual {
            self.queue.finish_manual(
                task.id,
                ManualTaskStatus::Failed,
                Some("shutdown in progress".to_string()),
            );
        }
        self.queue.finish_current();
        self.state.clear();
    }

    /// 没有工作时睡到下一个到期时刻，手动入队或关闭信号立即唤醒
    async fn idle(&self, now: DateTime<Utc>, shutdown: &mut watch::Receiver<bool>) {
        let wakeup = match self.scheduler.next_wakeup(now).await {
            Ok(w) => w,
            Err(e) => {
                error!("Failed to compute next wakeup: {}", e);
                None
            }
        };
        let duration = wakeup
            .and_then(|w| (w - now).to_std().ok())
            .unwrap_or(IDLE_POLL_CAP)
            .min(IDLE_POLL_CAP);

        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.queue.notified() => {
                debug!("Woken up by manual task");
            }
            _ = shutdown.changed() => {}
        }
    }

    /// 任务之间的随机间隔，模糊自动化节奏
    async fn pause_between_tasks(&self) {
        let (min, max) = self.jitter_ms;
        if max == 0 {
            return;
        }
        let delay = rand::random_range(min..=max.max(min));
        sleep(Duration::from_millis(delay)).await;
    }

    /// 处理一个已出队的任务
    pub(crate) async fn process(&self, task: QueuedTask) {
        let server_id = task.server_id;
        let kind = task.task_kind;
        let manual_id = matches!(task.source, TaskSource::Manual).then_some(task.id);

        self.state.set_current(CurrentTask {
            server_id,
            task_kind: kind,
            started_at: Utc::now(),
            manual_task_id: manual_id,
        });
        counter!("twcrawler_tasks_started_total", "kind" => kind.to_string()).increment(1);

        let log = match self
            .executions
            .create(&ExecutionLog::started(server_id, None, kind.title()))
            .await
        {
            Ok(log) => log,
            Err(e) => {
                error!(server_id, kind = %kind, "Failed to open execution log: {}", e);
                if let Some(id) = manual_id {
                    self.queue
                        .finish_manual(id, ManualTaskStatus::Failed, Some(e.to_string()));
                }
                self.state.clear();
                return;
            }
        };
        *self.current_execution.lock() = Some(log.id);

        let mut run = self.attempt(&task, log.id, false).await;

        // A rejected session gets exactly one immediate retry on a fresh login
        if let TaskRun::Failed {
            failure: FailureKind::SessionExpired,
            ..
        } = run
        {
            let prior = self
                .session_failures
                .lock()
                .get(&server_id)
                .copied()
                .unwrap_or(0);
            if self
                .recovery
                .decide(FailureKind::SessionExpired, prior, Utc::now())
                == RecoveryAction::RetryWithRelogin
            {
                warn!(server_id, kind = %kind, "Session rejected, retrying once with fresh login");
                run = self.attempt(&task, log.id, true).await;
            }
        }

        let finished_at = Utc::now();
        match run {
            TaskRun::Completed { summary } => {
                self.session_failures.lock().remove(&server_id);
                if let Err(e) = self
                    .executions
                    .finalize(log.id, ExecutionStatus::Success, summary, finished_at)
                    .await
                {
                    error!(server_id, kind = %kind, "Failed to finalize execution log: {}", e);
                }
                counter!("twcrawler_tasks_total", "kind" => kind.to_string(), "status" => "success")
                    .increment(1);
                if let Some(id) = manual_id {
                    self.queue.finish_manual(id, ManualTaskStatus::Succeeded, None);
                }
                info!(server_id, kind = %kind, "Task completed");
            }
            TaskRun::Failed { failure, message } => {
                if let Err(e) = self
                    .executions
                    .finalize(
                        log.id,
                        ExecutionStatus::Error,
                        Some(message.clone()),
                        finished_at,
                    )
                    .await
                {
                    error!(server_id, kind = %kind, "Failed to finalize execution log: {}", e);
                }
                counter!("twcrawler_tasks_total", "kind" => kind.to_string(), "status" => "error")
                    .increment(1);
                if let Some(id) = manual_id {
                    self.queue
                        .finish_manual(id, ManualTaskStatus::Failed, Some(message.clone()));
                }
                warn!(server_id, kind = %kind, "Task failed: {}", message);
                self.apply_recovery(server_id, kind, log.id, failure, &message, finished_at)
                    .await;
            }
        }

        // Scheduled plans re-arm from the completion time of every finished run
        if matches!(task.source, TaskSource::Scheduled) {
            if let Err(e) = self.plans.advance(server_id, kind, Utc::now()).await {
                error!(server_id, kind = %kind, "Failed to re-arm plan: {}", e);
            }
        }
        self.current_execution.lock().take();
        self.state.clear();
    }

    /// 单次运行：取会话、执行处理器、落活动记录、归类结果
    async fn attempt(&self, task: &QueuedTask, execution_id: Uuid, fresh: bool) -> TaskRun {
        let Some(handler) = self.registry.get(task.task_kind) else {
            return TaskRun::Failed {
                failure: FailureKind::HandlerError,
                message: format!("no handler registered for task kind {}", task.task_kind),
            };
        };

        let acquired = if fresh {
            self.sessions.acquire_fresh(task.server_id).await
        } else {
            self.sessions.acquire(task.server_id).await
        };
        let acquired = match acquired {
            Ok(a) => a,
            Err(SessionError::RecaptchaBlocked) => {
                return TaskRun::Failed {
                    failure: FailureKind::RecaptchaBlocked,
                    message: "login blocked by anti-bot verification".to_string(),
                }
            }
            Err(e) => {
                return TaskRun::Failed {
                    failure: FailureKind::HandlerError,
                    message: format!("session acquisition failed: {e}"),
                }
            }
        };
        if acquired.via_relogin {
            self.record_activity(ActivityLog::new(
                Some(execution_id),
                task.server_id,
                task.task_kind.to_string(),
                ActivityEventType::SessionExpired,
                "session re-established via fresh login",
            ))
            .await;
        }

        let ctx = HandlerContext {
            server_id: task.server_id,
            village_id: None,
            payload: (!task.payload.is_null()).then(|| task.payload.clone()),
        };
        let budget = task.task_kind.timeout();
        let report =
            match tokio::time::timeout(budget, handler.execute(&acquired.session, ctx)).await {
                Ok(report) => report,
                Err(_) => {
                    return TaskRun::Failed {
                        failure: FailureKind::HandlerTimeout,
                        message: format!("handler exceeded {}s budget", budget.as_secs()),
                    }
                }
            };

        for event in &report.events {
            let mut log = ActivityLog::new(
                Some(execution_id),
                task.server_id,
                task.task_kind.to_string(),
                event.event_type,
                event.message.clone(),
            );
            if let Some(meta) = &event.metadata {
                log = log.with_metadata(meta.clone());
            }
            self.record_activity(log).await;
        }

        match report.outcome {
            HandlerOutcome::Success => TaskRun::Completed {
                summary: report.summary,
            },
            HandlerOutcome::AntiBotBlocked => TaskRun::Failed {
                failure: FailureKind::RecaptchaBlocked,
                message: "anti-bot verification encountered during task".to_string(),
            },
            HandlerOutcome::SessionInvalid => TaskRun::Failed {
                failure: FailureKind::SessionExpired,
                message: "session rejected by game server".to_string(),
            },
            HandlerOutcome::Error(msg) => TaskRun::Failed {
                failure: FailureKind::HandlerError,
                message: msg,
            },
        }
    }

    /// 执行恢复策略决定的动作
    async fn apply_recovery(
        &self,
        server_id: i32,
        kind: TaskKind,
        execution_id: Uuid,
        failure: FailureKind,
        message: &str,
        now: DateTime<Utc>,
    ) {
        let consecutive = if failure == FailureKind::SessionExpired {
            let mut map = self.session_failures.lock();
            let count = map.entry(server_id).or_insert(0);
            *count += 1;
            *count
        } else {
            self.session_failures
                .lock()
                .get(&server_id)
                .copied()
                .unwrap_or(0)
        };

        if failure == FailureKind::RecaptchaBlocked {
            self.record_activity(ActivityLog::new(
                Some(execution_id),
                server_id,
                kind.to_string(),
                ActivityEventType::RecaptchaBlocked,
                message,
            ))
            .await;
        }

        // A session failure that ends the run leaves its own trace, whether
        // or not a relogin retry preceded it
        if failure == FailureKind::SessionExpired {
            self.record_activity(ActivityLog::new(
                Some(execution_id),
                server_id,
                kind.to_string(),
                ActivityEventType::SessionExpired,
                message,
            ))
            .await;
        }

        match self.recovery.decide(failure, consecutive, now) {
            RecoveryAction::BlockServer { until } => {
                warn!(server_id, %until, "Blocking server scheduling after anti-bot detection");
                if let Err(e) = self.plans.block_server(server_id, until).await {
                    error!(server_id, "Failed to block server plans: {}", e);
                }
                counter!("twcrawler_server_blocks_total", "reason" => "recaptcha").increment(1);
                self.record_activity(ActivityLog::new(
                    None,
                    server_id,
                    kind.to_string(),
                    ActivityEventType::Info,
                    format!("server scheduling blocked until {until}"),
                ))
                .await;
            }
            RecoveryAction::CooldownServer { until } => {
                warn!(server_id, %until, "Cooling down server after repeated session failures");
                if let Err(e) = self.plans.block_server(server_id, until).await {
                    error!(server_id, "Failed to cool down server plans: {}", e);
                }
                counter!("twcrawler_server_blocks_total", "reason" => "session").increment(1);
                self.record_activity(ActivityLog::new(
                    None,
                    server_id,
                    kind.to_string(),
                    ActivityEventType::Info,
                    format!("server cooling down until {until}"),
                ))
                .await;
            }
            RecoveryAction::RetryWithRelogin | RecoveryAction::Continue => {}
        }
    }

    async fn record_activity(&self, log: ActivityLog) {
        if let Err(e) = self.activities.create(&log).await {
            error!(server_id = log.server_id, "Failed to write activity log: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "crawler_worker_test.rs"]
mod tests;

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_kind::TaskKind;
use crate::domain::repositories::plan_repository::{PlanRepository, RepositoryError};
use crate::queue::task_queue::CrawlerQueue;
use crate::workers::state::WorkerState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 状态视图中的当前任务
#[derive(Debug, Clone, Serialize)]
pub struct ActiveTaskView {
    pub server_id: i32,
    pub task_kind: TaskKind,
    pub running_for_seconds: i64,
}

/// 状态视图中的封锁服务器
#[derive(Debug, Clone, Serialize)]
pub struct BlockedServerView {
    pub server_id: i32,
    pub blocked_until: DateTime<Utc>,
}

/// 状态视图中即将到期的任务
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingTaskView {
    pub server_id: i32,
    pub task_kind: TaskKind,
    pub seconds_until_due: i64,
}

/// 爬虫整体状态
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerStatus {
    /// Worker临界区内的任务（如有）
    pub active_task: Option<ActiveTaskView>,
    /// 当前被封锁的服务器及解封时间
    pub blocked_servers: Vec<BlockedServerView>,
    /// 距离下一个到期任务的秒数
    pub seconds_until_next_task: Option<i64>,
    /// 下一个到期任务
    pub next_task: Option<UpcomingTaskView>,
    /// 有界的即将到期任务列表
    pub upcoming_tasks: Vec<UpcomingTaskView>,
    /// 队列中的任务总数
    pub queue_length: usize,
    /// 其中手动任务数量
    pub queued_manual_tasks: usize,
}

/// 状态投影服务
///
/// 只读：从计划存储和队列状态推导人类可读的状态视图，
/// 不做任何变更。读取是快照，允许轻微滞后。
pub struct StatusService {
    plans: Arc<dyn PlanRepository>,
    queue: Arc<CrawlerQueue>,
    worker_state: Arc<WorkerState>,
    lookahead_limit: usize,
}

impl StatusService {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        queue: Arc<CrawlerQueue>,
        worker_state: Arc<WorkerState>,
        lookahead_limit: usize,
    ) -> Self {
        Self {
            plans,
            queue,
            worker_state,
            lookahead_limit,
        }
    }

    /// 计算爬虫状态视图
    pub async fn crawler_status(&self) -> Result<CrawlerStatus, RepositoryError> {
        let now = Utc::now();

        let active_task = self.worker_state.snapshot().map(|t| ActiveTaskView {
            server_id: t.server_id,
            task_kind: t.task_kind,
            running_for_seconds: (now - t.started_at).num_seconds().max(0),
        });

        let all_plans = self.plans.find_all().await?;

        let mut blocked_servers: Vec<BlockedServerView> = Vec::new();
        for plan in &all_plans {
            if plan.effectively_blocked(now) {
                if let Some(until) = plan.blocked_until {
                    if !blocked_servers.iter().any(|b| b.server_id == plan.server_id) {
                        blocked_servers.push(BlockedServerView {
                            server_id: plan.server_id,
                            blocked_until: until,
                        });
                    }
                }
            }
        }
        blocked_servers.sort_by_key(|b| b.server_id);

        let mut upcoming: Vec<UpcomingTaskView> = all_plans
            .iter()
            .filter(|p| p.is_active && !p.effectively_blocked(now))
            .map(|p| UpcomingTaskView {
                server_id: p.server_id,
                task_kind: p.task_kind,
                seconds_until_due: (p.next_due_at - now).num_seconds().max(0),
            })
            .collect();
        upcoming.sort_by(|a, b| {
            a.seconds_until_due
                .cmp(&b.seconds_until_due)
                .then_with(|| b.task_kind.priority().cmp(&a.task_kind.priority()))
        });
        upcoming.truncate(self.lookahead_limit);

        let next_task = upcoming.first().cloned();
        let seconds_until_next_task = next_task.as_ref().map(|t| t.seconds_until_due);

        Ok(CrawlerStatus {
            active_task,
            blocked_servers,
            seconds_until_next_task,
            next_task,
            upcoming_tasks: upcoming,
            queue_length: self.queue.len(),
            queued_manual_tasks: self.queue.queued_manual_count(),
        })
    }

    /// 用于初始化新计划的静态默认间隔表
    pub fn default_intervals() -> BTreeMap<String, i64> {
        TaskKind::ALL
            .iter()
            .map(|k| (k.to_string(), k.default_interval().num_milliseconds()))
            .collect()
    }
}

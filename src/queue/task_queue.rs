// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::manual_task::{ManualTask, ManualTaskStatus};
use crate::domain::models::task_kind::TaskKind;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::Notify;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] crate::domain::repositories::plan_repository::RepositoryError),
}

/// 任务来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSource {
    /// 由计划存储按到期时间拉入
    Scheduled,
    /// 由外部触发直接推入
    Manual,
}

/// 队列中的一个任务项
#[derive(Debug, Clone)]
pub struct QueuedTask {
    /// 任务ID，手动任务沿用其公开ID
    pub id: Uuid,
    /// 服务器ID
    pub server_id: i32,
    /// 任务类型
    pub task_kind: TaskKind,
    /// 类型相关负载，调度任务为Null
    pub payload: serde_json::Value,
    /// 任务来源
    pub source: TaskSource,
    /// 入队时间
    pub enqueued_at: DateTime<Utc>,
}

/// 手动任务入队回执
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueReceipt {
    /// 任务ID
    pub task_id: Uuid,
    /// 队列位置，1为队首
    pub queue_position: usize,
    /// 预计等待秒数，基于执行中任务与前方每项的预期时长，只是估算
    pub estimated_wait_seconds: i64,
}

struct QueueInner {
    items: VecDeque<QueuedTask>,
    /// Worker当前正在执行的(服务器, 任务类型)
    executing: Option<(i32, TaskKind)>,
}

/// 爬虫任务队列
///
/// 合并两个来源的单一优先级结构：计划到期任务由调度tick拉入，
/// 手动任务直接推入并排在同服务器计划任务之前，但绝不抢占
/// 已在执行的任务。出队操作只有Worker一个消费者。
///
/// 入队和状态查询可被多个调用方并发使用，短临界区由
/// parking_lot互斥锁保护，绝不阻塞在Worker上。
pub struct CrawlerQueue {
    inner: Mutex<QueueInner>,
    /// 手动任务状态表，终态保留一段时间供轮询后逐出
    manual_tasks: DashMap<Uuid, ManualTask>,
    notify: Notify,
    retention: Duration,
}

impl CrawlerQueue {
    /// 创建新的爬虫队列
    ///
    /// # 参数
    ///
    /// * `retention` - 手动任务终态的保留时长
    pub fn new(retention: Duration) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                executing: None,
            }),
            manual_tasks: DashMap::new(),
            notify: Notify::new(),
            retention,
        }
    }

    /// 尝试把一个到期的计划任务放入队列
    ///
    /// 同一(服务器, 任务类型)在队列或执行中已有实例时跳过，
    /// 保证每个计划最多一个未完成的到期实例
    ///
    /// # 返回值
    ///
    /// 是否实际入队
    pub fn offer_scheduled(&self, server_id: i32, task_kind: TaskKind) -> bool {
        let mut inner = self.inner.lock();

        let already_queued = inner
            .items
            .iter()
            .any(|t| t.server_id == server_id && t.task_kind == task_kind);
        let currently_executing = inner.executing == Some((server_id, task_kind));
        if already_queued || currently_executing {
            return false;
        }

        inner.items.push_back(QueuedTask {
            id: Uuid::new_v4(),
            server_id,
            task_kind,
            payload: serde_json::Value::Null,
            source: TaskSource::Scheduled,
            enqueued_at: Utc::now(),
        });
        true
    }

    /// 入队一个手动任务
    ///
    /// 插入到同服务器第一个计划任务之前；没有则追加到队尾。
    /// 回执中的位置和等待时间按插入后的有效顺序计算。
    pub fn enqueue_manual(
        &self,
        task_kind: TaskKind,
        server_id: i32,
        payload: serde_json::Value,
    ) -> EnqueueReceipt {
        let task = ManualTask::new(task_kind, server_id, payload.clone());
        let task_id = task.id;

        let receipt = {
            let mut inner = self.inner.lock();

            let insert_at = inner
                .items
                .iter()
                .position(|t| t.source == TaskSource::Scheduled && t.server_id == server_id)
                .unwrap_or(inner.items.len());

            let executing_wait = inner
                .executing
                .map(|(_, kind)| kind.expected_duration().num_seconds())
                .unwrap_or(0);
            let estimated_wait_seconds = executing_wait
                + inner
                    .items
                    .iter()
                    .take(insert_at)
                    .map(|t| t.task_kind.expected_duration().num_seconds())
                    .sum::<i64>();

            inner.items.insert(
                insert_at,
                QueuedTask {
                    id: task_id,
                    server_id,
                    task_kind,
                    payload,
                    source: TaskSource::Manual,
                    enqueued_at: task.enqueued_at,
                },
            );

            EnqueueReceipt {
                task_id,
                queue_position: insert_at + 1,
                estimated_wait_seconds,
            }
        };

        self.manual_tasks.insert(task_id, task);
        self.notify.notify_one();
        receipt
    }

    /// 出队下一个可执行任务
    ///
    /// 只由唯一的Worker调用。出队即进入执行态，
    /// 手动任务同步标记为Running。
    pub fn try_dequeue(&self) -> Option<QueuedTask> {
        let task = {
            let mut inner = self.inner.lock();
            let task = inner.items.pop_front()?;
            inner.executing = Some((task.server_id, task.task_kind));
            task
        };

        if task.source == TaskSource::Manual {
            if let Some(mut entry) = self.manual_tasks.get_mut(&task.id) {
                entry.status = ManualTaskStatus::Running;
            }
        }
        Some(task)
    }

    /// Worker完成当前任务后清除执行标记
    pub fn finish_current(&self) {
        self.inner.lock().executing = None;
    }

    /// 标记手动任务终态
    pub fn finish_manual(&self, task_id: Uuid, status: ManualTaskStatus, error: Option<String>) {
        if let Some(mut entry) = self.manual_tasks.get_mut(&task_id) {
            entry.status = status;
            entry.error_message = error;
            entry.finished_at = Some(Utc::now());
        }
    }

    /// 点查手动任务状态
    ///
    /// 未知或已逐出的ID返回None
    pub fn manual_task_status(&self, task_id: Uuid) -> Option<ManualTask> {
        self.evict_stale(Utc::now());
        self.manual_tasks.get(&task_id).map(|e| e.clone())
    }

    /// 逐出超过保留窗口的终态手动任务
    pub fn evict_stale(&self, now: DateTime<Utc>) {
        let retention = self.retention;
        self.manual_tasks.retain(|_, task| {
            if !task.status.is_terminal() {
                return true;
            }
            match task.finished_at {
                Some(finished) => finished + retention > now,
                None => true,
            }
        });
    }

    /// 队列长度快照
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// 队列是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前执行中的(服务器, 任务类型)快照
    pub fn executing(&self) -> Option<(i32, TaskKind)> {
        self.inner.lock().executing
    }

    /// 队列内容快照，供状态视图读取
    pub fn snapshot(&self) -> Vec<QueuedTask> {
        self.inner.lock().items.iter().cloned().collect()
    }

    /// 队列中排队的手动任务数量
    pub fn queued_manual_count(&self) -> usize {
        self.inner
            .lock()
            .items
            .iter()
            .filter(|t| t.source == TaskSource::Manual)
            .count()
    }

    /// 等待手动入队信号
    pub fn notified(&self) -> tokio::sync::futures::Notified<'_> {
        self.notify.notified()
    }
}

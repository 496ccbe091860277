// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_kind::TaskKind;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

/// Worker当前执行的任务信息
#[derive(Debug, Clone)]
pub struct CurrentTask {
    /// 服务器ID
    pub server_id: i32,
    /// 任务类型
    pub task_kind: TaskKind,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 手动任务ID（如果是手动触发）
    pub manual_task_id: Option<Uuid>,
}

/// Worker状态快照
///
/// Worker在进入临界区时写入，状态视图无锁等待地读取快照，
/// 读到的内容允许轻微滞后
#[derive(Default)]
pub struct WorkerState {
    current: RwLock<Option<CurrentTask>>,
}

impl WorkerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录进入临界区
    pub fn set_current(&self, task: CurrentTask) {
        *self.current.write() = Some(task);
    }

    /// 记录离开临界区
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// 读取快照
    pub fn snapshot(&self) -> Option<CurrentTask> {
        self.current.read().clone()
    }
}

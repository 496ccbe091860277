// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_kind::TaskKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 手动任务实体
///
/// 由外部触发的一次性作业，与周期调度任务竞争唯一的Worker。
/// 终态后保留一段时间供状态轮询观察，然后可被逐出。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务类型
    pub task_kind: TaskKind,
    /// 目标服务器ID
    pub server_id: i32,
    /// 类型相关的负载，队列将其视为不透明数据
    pub payload: serde_json::Value,
    /// 入队时间
    pub enqueued_at: DateTime<Utc>,
    /// 任务状态
    pub status: ManualTaskStatus,
    /// 失败时的错误消息
    pub error_message: Option<String>,
    /// 进入终态的时间，用于逐出判定
    pub finished_at: Option<DateTime<Utc>>,
}

/// 手动任务状态枚举
///
/// 状态转换遵循 Queued → Running → Succeeded/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ManualTaskStatus {
    /// 已入队，等待Worker执行
    #[default]
    Queued,
    /// 执行中
    Running,
    /// 已成功
    Succeeded,
    /// 已失败
    Failed,
}

impl ManualTaskStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ManualTaskStatus::Succeeded | ManualTaskStatus::Failed)
    }
}

impl fmt::Display for ManualTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ManualTaskStatus::Queued => write!(f, "queued"),
            ManualTaskStatus::Running => write!(f, "running"),
            ManualTaskStatus::Succeeded => write!(f, "succeeded"),
            ManualTaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl ManualTask {
    /// 创建一个新的手动任务
    pub fn new(task_kind: TaskKind, server_id: i32, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_kind,
            server_id,
            payload,
            enqueued_at: Utc::now(),
            status: ManualTaskStatus::Queued,
            error_message: None,
            finished_at: None,
        }
    }
}

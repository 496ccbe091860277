// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 执行日志实体
///
/// 每次Worker运行一行。运行开始时以临时状态创建，
/// 运行结束时定稿，之后不可变，是追加式审计记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// 日志唯一标识符
    pub id: Uuid,
    /// 服务器ID
    pub server_id: i32,
    /// 村庄ID（可选）
    pub village_id: Option<i32>,
    /// 任务类型/操作的人类可读标题
    pub title: String,
    /// 描述（可选）
    pub description: Option<String>,
    /// 执行状态
    pub status: ExecutionStatus,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 结束时间，持续时长 = ended_at - started_at
    pub ended_at: Option<DateTime<Utc>>,
}

/// 执行状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// 执行中，行创建时的临时状态
    #[default]
    Running,
    /// 成功完成
    Success,
    /// 出错结束
    Error,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for ExecutionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ExecutionStatus::Running),
            "success" => Ok(ExecutionStatus::Success),
            "error" => Ok(ExecutionStatus::Error),
            _ => Err(()),
        }
    }
}

impl ExecutionLog {
    /// 以临时状态开启一条执行记录
    pub fn started(server_id: i32, village_id: Option<i32>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            server_id,
            village_id,
            title: title.into(),
            description: None,
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
        }
    }
}

/// 执行日志查询参数
#[derive(Debug, Default, Clone)]
pub struct ExecutionLogQuery {
    pub server_id: Option<i32>,
    pub status: Option<ExecutionStatus>,
    pub title: Option<String>,
    pub started_after: Option<DateTime<Utc>>,
    pub started_before: Option<DateTime<Utc>>,
    pub limit: u64,
    pub offset: u64,
}

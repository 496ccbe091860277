// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::server_plan::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 计划攻击实体
///
/// 由攻击派遣任务生产和消费的状态机。派遣时刻是一个时间窗口
/// `[send_time_from, send_time_to]`，不是一个时间点。
/// 状态转换只沿以下图进行：
/// Pending → Scheduled → Executing → Completed/Failed，
/// Scheduled → Expired（窗口过期），Pending/Scheduled → Cancelled。
///
/// 外部调用方只能创建Pending行或请求取消，其余转换归Worker独占。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAttack {
    /// 攻击唯一标识符
    pub id: Uuid,
    /// 服务器ID
    pub server_id: i32,
    /// 出发村庄ID（可选）
    pub village_id: Option<i32>,
    /// 目标ID
    pub target_id: i32,
    /// 出发坐标，如 "512|483"
    pub source_coordinates: String,
    /// 目标坐标
    pub target_coordinates: String,
    /// 攻击类型
    pub attack_type: AttackType,
    /// 派遣窗口起点
    pub send_time_from: DateTime<Utc>,
    /// 派遣窗口终点
    pub send_time_to: DateTime<Utc>,
    /// 当前状态
    pub status: AttackStatus,
    /// 实际派遣时间
    pub executed_at: Option<DateTime<Utc>>,
    /// 失败时的错误消息
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 攻击类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// 真实进攻
    Off,
    /// 佯攻
    Fake,
    /// 贵族进攻
    Nobleman,
    /// 支援
    Support,
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttackType::Off => write!(f, "off"),
            AttackType::Fake => write!(f, "fake"),
            AttackType::Nobleman => write!(f, "nobleman"),
            AttackType::Support => write!(f, "support"),
        }
    }
}

impl FromStr for AttackType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(AttackType::Off),
            "fake" => Ok(AttackType::Fake),
            "nobleman" => Ok(AttackType::Nobleman),
            "support" => Ok(AttackType::Support),
            _ => Err(()),
        }
    }
}

/// 攻击状态枚举
///
/// Completed、Failed、Cancelled、Expired为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttackStatus {
    /// 已创建，等待确认
    #[default]
    Pending,
    /// 已接受，时间窗口有效
    Scheduled,
    /// Worker正在窗口内派遣
    Executing,
    /// 派遣已确认
    Completed,
    /// 适配器报告错误
    Failed,
    /// 窗口过期且从未进入执行
    Expired,
    /// 外部显式取消
    Cancelled,
}

impl AttackStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttackStatus::Completed
                | AttackStatus::Failed
                | AttackStatus::Expired
                | AttackStatus::Cancelled
        )
    }
}

impl fmt::Display for AttackStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttackStatus::Pending => write!(f, "pending"),
            AttackStatus::Scheduled => write!(f, "scheduled"),
            AttackStatus::Executing => write!(f, "executing"),
            AttackStatus::Completed => write!(f, "completed"),
            AttackStatus::Failed => write!(f, "failed"),
            AttackStatus::Expired => write!(f, "expired"),
            AttackStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AttackStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AttackStatus::Pending),
            "scheduled" => Ok(AttackStatus::Scheduled),
            "executing" => Ok(AttackStatus::Executing),
            "completed" => Ok(AttackStatus::Completed),
            "failed" => Ok(AttackStatus::Failed),
            "expired" => Ok(AttackStatus::Expired),
            "cancelled" => Ok(AttackStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl ScheduledAttack {
    /// 创建一个新的Pending攻击
    ///
    /// # 返回值
    ///
    /// * `Err(DomainError::ValidationError)` - 时间窗口无效
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        server_id: i32,
        village_id: Option<i32>,
        target_id: i32,
        source_coordinates: String,
        target_coordinates: String,
        attack_type: AttackType,
        send_time_from: DateTime<Utc>,
        send_time_to: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if send_time_to < send_time_from {
            return Err(DomainError::ValidationError(
                "send_time_to must not precede send_time_from".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            server_id,
            village_id,
            target_id,
            source_coordinates,
            target_coordinates,
            attack_type,
            send_time_from,
            send_time_to,
            status: AttackStatus::Pending,
            executed_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn transition_error(&self, to: AttackStatus) -> DomainError {
        DomainError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// 接受攻击，Pending → Scheduled
    pub fn schedule(mut self) -> Result<Self, DomainError> {
        match self.status {
            AttackStatus::Pending => {
                self.status = AttackStatus::Scheduled;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.transition_error(AttackStatus::Scheduled)),
        }
    }

    /// Worker在窗口内拾取，Scheduled → Executing
    pub fn begin_execution(mut self) -> Result<Self, DomainError> {
        match self.status {
            AttackStatus::Scheduled => {
                self.status = AttackStatus::Executing;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.transition_error(AttackStatus::Executing)),
        }
    }

    /// 派遣确认，Executing → Completed
    pub fn complete(mut self, executed_at: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.status {
            AttackStatus::Executing => {
                self.status = AttackStatus::Completed;
                self.executed_at = Some(executed_at);
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.transition_error(AttackStatus::Completed)),
        }
    }

    /// 适配器报告错误，Executing → Failed
    pub fn fail(mut self, error_message: impl Into<String>) -> Result<Self, DomainError> {
        match self.status {
            AttackStatus::Executing => {
                self.status = AttackStatus::Failed;
                self.error_message = Some(error_message.into());
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.transition_error(AttackStatus::Failed)),
        }
    }

    /// 窗口过期，Scheduled → Expired
    pub fn expire(mut self) -> Result<Self, DomainError> {
        match self.status {
            AttackStatus::Scheduled => {
                self.status = AttackStatus::Expired;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.transition_error(AttackStatus::Expired)),
        }
    }

    /// 外部取消，Pending/Scheduled → Cancelled
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        match self.status {
            AttackStatus::Pending | AttackStatus::Scheduled => {
                self.status = AttackStatus::Cancelled;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.transition_error(AttackStatus::Cancelled)),
        }
    }

    /// 当前时刻是否落在派遣窗口内且状态允许派遣
    pub fn is_dispatchable(&self, now: DateTime<Utc>) -> bool {
        self.status == AttackStatus::Scheduled
            && self.send_time_from <= now
            && now <= self.send_time_to
    }
}

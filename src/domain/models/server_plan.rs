// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_kind::TaskKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 领域错误类型
///
/// 表示在领域层可能发生的各种错误情况，包括状态转换错误和验证失败
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当状态转换不符合业务规则时发生
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 服务器调度计划实体
///
/// 每个(服务器, 任务类型)组合一条记录，保存周期调度状态。
/// 队列中同一组合最多存在一个未执行的到期实例，
/// 重新武装只在上一轮执行完成之后进行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerPlan {
    /// 计划唯一标识符
    pub id: Uuid,
    /// 游戏服务器ID
    pub server_id: i32,
    /// 任务类型
    pub task_kind: TaskKind,
    /// 调度间隔（毫秒），必须为正
    pub interval_ms: i64,
    /// 下次到期时间
    pub next_due_at: DateTime<Utc>,
    /// 是否激活，运营开关
    pub is_active: bool,
    /// 是否被反机器人检测封锁
    pub is_blocked: bool,
    /// 封锁解除时间
    pub blocked_until: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl ServerPlan {
    /// 用默认间隔创建新计划
    ///
    /// `next_due_at`初始化为当前时间，激活后立即触发一次
    pub fn new(server_id: i32, task_kind: TaskKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            server_id,
            task_kind,
            interval_ms: task_kind.default_interval().num_milliseconds(),
            next_due_at: now,
            is_active: true,
            is_blocked: false,
            blocked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 计划在给定时刻是否到期可调度
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.effectively_blocked(now) && self.next_due_at <= now
    }

    /// 封锁窗口是否仍然生效
    ///
    /// `blocked_until`过期后计划恰好在该时刻恢复，无需显式解锁
    pub fn effectively_blocked(&self, now: DateTime<Utc>) -> bool {
        if !self.is_blocked {
            return false;
        }
        match self.blocked_until {
            Some(until) => now < until,
            None => true,
        }
    }

    /// 从完成时间重新武装计划
    ///
    /// `next_due_at = completed_at + interval`，并且永远不早于
    /// 完成时间本身。长时间停机后不会产生追赶风暴。
    pub fn advance(&mut self, completed_at: DateTime<Utc>) {
        let interval = Duration::milliseconds(self.interval_ms.max(0));
        let mut next = completed_at + interval;
        if next < completed_at {
            next = completed_at;
        }
        self.next_due_at = next;
        self.updated_at = Utc::now();
    }

    /// 按反机器人冷却封锁计划
    pub fn block(&mut self, until: DateTime<Utc>) {
        self.is_blocked = true;
        self.blocked_until = Some(until);
        self.updated_at = Utc::now();
    }

    /// 解除封锁
    pub fn unblock(&mut self) {
        self.is_blocked = false;
        self.blocked_until = None;
        self.updated_at = Utc::now();
    }

    /// 设置调度间隔
    ///
    /// # 返回值
    ///
    /// * `Err(DomainError::ValidationError)` - 间隔不为正
    pub fn set_interval(&mut self, interval_ms: i64) -> Result<(), DomainError> {
        if interval_ms <= 0 {
            return Err(DomainError::ValidationError(format!(
                "interval_ms must be positive, got {}",
                interval_ms
            )));
        }
        self.interval_ms = interval_ms;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plan_fires_immediately() {
        let before = Utc::now();
        let plan = ServerPlan::new(101, TaskKind::Scavenging);
        assert!(plan.next_due_at >= before);
        assert!(plan.is_due(Utc::now() + Duration::seconds(1)));
        assert_eq!(plan.interval_ms, 300_000);
    }

    #[test]
    fn test_advance_rearms_from_completion_time() {
        let mut plan = ServerPlan::new(101, TaskKind::Scavenging);
        // Simulate a run finishing 5 seconds after activation
        let completed_at = plan.next_due_at + Duration::seconds(5);
        plan.advance(completed_at);
        assert_eq!(plan.next_due_at, completed_at + Duration::milliseconds(300_000));
    }

    #[test]
    fn test_advance_is_monotonic_over_consecutive_runs() {
        let mut plan = ServerPlan::new(1, TaskKind::ConstructionQueue);
        let mut completed = Utc::now();
        let mut previous_due = plan.next_due_at;
        for _ in 0..5 {
            completed = completed + Duration::seconds(7);
            plan.advance(completed);
            assert!(plan.next_due_at > previous_due);
            assert!(plan.next_due_at >= completed + Duration::milliseconds(plan.interval_ms));
            previous_due = plan.next_due_at;
        }
    }

    #[test]
    fn test_blocked_plan_is_not_due_until_cooldown_elapses() {
        let mut plan = ServerPlan::new(7, TaskKind::MiniAttacks);
        let now = Utc::now();
        let until = now + Duration::minutes(30);
        plan.block(until);

        assert!(!plan.is_due(now + Duration::minutes(29)));
        // Resumes exactly at/after blocked_until
        assert!(plan.is_due(until));
        assert!(plan.is_due(until + Duration::seconds(1)));
    }

    #[test]
    fn test_set_interval_rejects_non_positive_values() {
        let mut plan = ServerPlan::new(1, TaskKind::VillageSync);
        assert!(plan.set_interval(0).is_err());
        assert!(plan.set_interval(-500).is_err());
        assert!(plan.set_interval(60_000).is_ok());
        assert_eq!(plan.interval_ms, 60_000);
    }
}

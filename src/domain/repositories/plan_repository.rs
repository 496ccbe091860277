// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::server_plan::ServerPlan;
use crate::domain::models::task_kind::TaskKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 记录已存在
    #[error("Record already exists")]
    AlreadyExists,
}

/// 调度计划仓库特质
///
/// 定义每个(服务器, 任务类型)周期调度状态的数据访问接口。
/// 计划行的状态转换归Worker独占，外部调用方只使用运营开关。
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// 创建计划
    async fn create(&self, plan: &ServerPlan) -> Result<ServerPlan, RepositoryError>;
    /// 查找单个计划
    async fn find(
        &self,
        server_id: i32,
        task_kind: TaskKind,
    ) -> Result<Option<ServerPlan>, RepositoryError>;
    /// 查找服务器的全部计划
    async fn find_by_server(&self, server_id: i32) -> Result<Vec<ServerPlan>, RepositoryError>;
    /// 查找所有计划
    async fn find_all(&self) -> Result<Vec<ServerPlan>, RepositoryError>;
    /// 获取到期可调度的计划
    ///
    /// 按`next_due_at`升序排列，到期时间相同时按任务类型优先级降序，
    /// 保证平局打破的确定性
    async fn get_due(&self, now: DateTime<Utc>) -> Result<Vec<ServerPlan>, RepositoryError>;
    /// 更新计划
    async fn update(&self, plan: &ServerPlan) -> Result<ServerPlan, RepositoryError>;
    /// 从完成时间重新武装计划
    async fn advance(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        completed_at: DateTime<Utc>,
    ) -> Result<ServerPlan, RepositoryError>;
    /// 封锁服务器的全部计划直到给定时间
    ///
    /// 所有计划行得到同一个`blocked_until`
    async fn block_server(
        &self,
        server_id: i32,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
    /// 清除已过期的封锁标记
    async fn clear_expired_blocks(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 计算下一次唤醒时间
    ///
    /// 活跃计划中最近的有效到期时刻，被封锁的计划取
    /// max(next_due_at, blocked_until)
    async fn next_wakeup(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError>;
    /// 激活服务器，按默认间隔表补齐全部任务类型的计划
    async fn activate_server(&self, server_id: i32) -> Result<Vec<ServerPlan>, RepositoryError>;
    /// 停用服务器的全部计划（不删除）
    async fn deactivate_server(&self, server_id: i32) -> Result<u64, RepositoryError>;
    /// 设置单个计划的调度间隔
    async fn set_interval(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        interval_ms: i64,
    ) -> Result<ServerPlan, RepositoryError>;
    /// 设置单个计划的激活开关
    async fn set_active(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        is_active: bool,
    ) -> Result<ServerPlan, RepositoryError>;
}

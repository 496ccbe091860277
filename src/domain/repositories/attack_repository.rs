// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scheduled_attack::ScheduledAttack;
use crate::domain::repositories::plan_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 计划攻击仓库特质
///
/// 6元组(服务器, 村庄, 目标, 窗口起, 窗口止, 类型)唯一，
/// 相同窗口的重复请求以`AlreadyExists`幂等拒绝
#[async_trait]
pub trait AttackRepository: Send + Sync {
    /// 创建Pending攻击
    async fn create(&self, attack: &ScheduledAttack) -> Result<ScheduledAttack, RepositoryError>;
    /// 根据ID查找
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledAttack>, RepositoryError>;
    /// 更新攻击（持久化状态机转换）
    async fn update(&self, attack: &ScheduledAttack) -> Result<ScheduledAttack, RepositoryError>;
    /// 服务器上待确认的Pending攻击
    async fn find_pending(&self, server_id: i32) -> Result<Vec<ScheduledAttack>, RepositoryError>;
    /// 服务器上窗口包含当前时刻的Scheduled攻击
    async fn find_dispatchable(
        &self,
        server_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledAttack>, RepositoryError>;
    /// 把窗口已过且从未执行的Scheduled攻击标记为Expired
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 服务器上的全部攻击
    async fn find_by_server(&self, server_id: i32)
        -> Result<Vec<ScheduledAttack>, RepositoryError>;
}

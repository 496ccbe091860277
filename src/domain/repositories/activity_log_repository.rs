// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::activity_log::ActivityLog;
use crate::domain::repositories::plan_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 活动日志仓库特质
///
/// Worker与恢复策略只写，运行详情视图按执行ID读，留存清理定期删
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// 追加一条活动记录
    async fn create(&self, log: &ActivityLog) -> Result<ActivityLog, RepositoryError>;
    /// 按执行ID列出活动，创建时间升序
    async fn find_by_execution(
        &self,
        execution_log_id: Uuid,
    ) -> Result<Vec<ActivityLog>, RepositoryError>;
    /// 删除早于给定时刻的记录
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

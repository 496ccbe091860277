// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::execution_log::{ExecutionLog, ExecutionLogQuery, ExecutionStatus};
use crate::domain::repositories::plan_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 执行日志仓库特质
///
/// 追加式审计：行在运行开始时创建，运行结束时定稿一次，之后不再更新
#[async_trait]
pub trait ExecutionLogRepository: Send + Sync {
    /// 以临时状态写入一行
    async fn create(&self, log: &ExecutionLog) -> Result<ExecutionLog, RepositoryError>;
    /// 定稿一行，返回定稿后的内容
    async fn finalize(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        description: Option<String>,
        ended_at: DateTime<Utc>,
    ) -> Result<ExecutionLog, RepositoryError>;
    /// 根据ID查找
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ExecutionLog>, RepositoryError>;
    /// 过滤分页查询，最新在前
    ///
    /// # 返回值
    ///
    /// 返回 (当前页, 总行数)
    async fn query(
        &self,
        params: ExecutionLogQuery,
    ) -> Result<(Vec<ExecutionLog>, u64), RepositoryError>;
}

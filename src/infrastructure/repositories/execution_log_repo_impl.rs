// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::execution_log::{ExecutionLog, ExecutionLogQuery, ExecutionStatus};
use crate::domain::repositories::execution_log_repository::ExecutionLogRepository;
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::infrastructure::database::entities::execution_log as log_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 执行日志仓库实现
#[derive(Clone)]
pub struct ExecutionLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ExecutionLogRepositoryImpl {
    /// 创建新的执行日志仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn filtered(params: &ExecutionLogQuery) -> Select<log_entity::Entity> {
        let mut query = log_entity::Entity::find();
        if let Some(server_id) = params.server_id {
            query = query.filter(log_entity::Column::ServerId.eq(server_id));
        }
        if let Some(status) = params.status {
            query = query.filter(log_entity::Column::Status.eq(status.to_string()));
        }
        if let Some(title) = &params.title {
            query = query.filter(log_entity::Column::Title.eq(title.clone()));
        }
        if let Some(after) = params.started_after {
            query = query.filter(log_entity::Column::StartedAt.gte(after));
        }
        if let Some(before) = params.started_before {
            query = query.filter(log_entity::Column::StartedAt.lte(before));
        }
        query
    }
}

fn to_domain(model: log_entity::Model) -> Result<ExecutionLog, RepositoryError> {
    let status: ExecutionStatus = model.status.parse().map_err(|_| {
        RepositoryError::Database(DbErr::Custom(format!(
            "unknown status in execution_logs row: {}",
            model.status
        )))
    })?;
    Ok(ExecutionLog {
        id: model.id,
        server_id: model.server_id,
        village_id: model.village_id,
        title: model.title,
        description: model.description,
        status,
        started_at: model.started_at,
        ended_at: model.ended_at,
    })
}

#[async_trait]
impl ExecutionLogRepository for ExecutionLogRepositoryImpl {
    async fn create(&self, log: &ExecutionLog) -> Result<ExecutionLog, RepositoryError> {
        let model = log_entity::ActiveModel {
            id: Set(log.id),
            server_id: Set(log.server_id),
            village_id: Set(log.village_id),
            title: Set(log.title.clone()),
            description: Set(log.description.clone()),
            status: Set(log.status.to_string()),
            started_at: Set(log.started_at),
            ended_at: Set(log.ended_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(log.clone())
    }

    async fn finalize(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        description: Option<String>,
        ended_at: DateTime<Utc>,
    ) -> Result<ExecutionLog, RepositoryError> {
        let model = log_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut active: log_entity::ActiveModel = model.into();
        active.status = Set(status.to_string());
        active.description = Set(description);
        active.ended_at = Set(Some(ended_at));
        let updated = active.update(self.db.as_ref()).await?;
        to_domain(updated)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ExecutionLog>, RepositoryError> {
        log_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn query(
        &self,
        params: ExecutionLogQuery,
    ) -> Result<(Vec<ExecutionLog>, u64), RepositoryError> {
        let total = Self::filtered(&params).count(self.db.as_ref()).await?;

        let mut query = Self::filtered(&params)
            .order_by_desc(log_entity::Column::StartedAt)
            .offset(params.offset);
        if params.limit > 0 {
            query = query.limit(params.limit);
        }

        let rows = query
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect::<Result<_, _>>()?;
        Ok((rows, total))
    }
}

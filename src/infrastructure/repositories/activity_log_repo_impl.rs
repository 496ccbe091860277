// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::activity_log::{ActivityEventType, ActivityLog};
use crate::domain::repositories::activity_log_repository::ActivityLogRepository;
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::infrastructure::database::entities::activity_log as log_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 活动日志仓库实现
#[derive(Clone)]
pub struct ActivityLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ActivityLogRepositoryImpl {
    /// 创建新的活动日志仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_domain(model: log_entity::Model) -> Result<ActivityLog, RepositoryError> {
    let event_type: ActivityEventType = model.event_type.parse().map_err(|_| {
        RepositoryError::Database(DbErr::Custom(format!(
            "unknown event type in activity_logs row: {}",
            model.event_type
        )))
    })?;
    Ok(ActivityLog {
        id: model.id,
        execution_log_id: model.execution_log_id,
        server_id: model.server_id,
        operation_type: model.operation_type,
        event_type,
        message: model.message,
        metadata: model.metadata,
        created_at: model.created_at,
    })
}

#[async_trait]
impl ActivityLogRepository for ActivityLogRepositoryImpl {
    async fn create(&self, log: &ActivityLog) -> Result<ActivityLog, RepositoryError> {
        let model = log_entity::ActiveModel {
            id: Set(log.id),
            execution_log_id: Set(log.execution_log_id),
            server_id: Set(log.server_id),
            operation_type: Set(log.operation_type.clone()),
            event_type: Set(log.event_type.to_string()),
            message: Set(log.message.clone()),
            metadata: Set(log.metadata.clone()),
            created_at: Set(log.created_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(log.clone())
    }

    async fn find_by_execution(
        &self,
        execution_log_id: Uuid,
    ) -> Result<Vec<ActivityLog>, RepositoryError> {
        log_entity::Entity::find()
            .filter(log_entity::Column::ExecutionLogId.eq(execution_log_id))
            .order_by_asc(log_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = log_entity::Entity::delete_many()
            .filter(log_entity::Column::CreatedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}

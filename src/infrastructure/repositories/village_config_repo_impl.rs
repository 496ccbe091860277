// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::village_config::VillageConfig;
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::domain::repositories::village_config_repository::VillageConfigRepository;
use crate::infrastructure::database::entities::village_config as config_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use std::sync::Arc;

/// 村庄配置仓库实现
///
/// 目标列表序列化为JSON列，轮询游标是普通整数列
#[derive(Clone)]
pub struct VillageConfigRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl VillageConfigRepositoryImpl {
    /// 创建新的村庄配置仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_domain(model: config_entity::Model) -> Result<VillageConfig, RepositoryError> {
    let targets: Vec<String> = serde_json::from_value(model.targets).map_err(|e| {
        RepositoryError::Database(DbErr::Custom(format!(
            "malformed targets in village_configs row: {e}"
        )))
    })?;
    Ok(VillageConfig {
        id: model.id,
        server_id: model.server_id,
        village_id: model.village_id,
        targets,
        next_target_index: model.next_target_index,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn to_active(config: &VillageConfig) -> config_entity::ActiveModel {
    config_entity::ActiveModel {
        id: Set(config.id),
        server_id: Set(config.server_id),
        village_id: Set(config.village_id),
        targets: Set(serde_json::json!(config.targets)),
        next_target_index: Set(config.next_target_index),
        created_at: Set(config.created_at),
        updated_at: Set(config.updated_at),
    }
}

#[async_trait]
impl VillageConfigRepository for VillageConfigRepositoryImpl {
    async fn create(&self, config: &VillageConfig) -> Result<VillageConfig, RepositoryError> {
        match to_active(config).insert(self.db.as_ref()).await {
            Ok(_) => Ok(config.clone()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(RepositoryError::AlreadyExists),
                _ => Err(RepositoryError::Database(e)),
            },
        }
    }

    async fn find(
        &self,
        server_id: i32,
        village_id: i32,
    ) -> Result<Option<VillageConfig>, RepositoryError> {
        config_entity::Entity::find()
            .filter(config_entity::Column::ServerId.eq(server_id))
            .filter(config_entity::Column::VillageId.eq(village_id))
            .one(self.db.as_ref())
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_server(&self, server_id: i32) -> Result<Vec<VillageConfig>, RepositoryError> {
        config_entity::Entity::find()
            .filter(config_entity::Column::ServerId.eq(server_id))
            .order_by_asc(config_entity::Column::VillageId)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn update(&self, config: &VillageConfig) -> Result<VillageConfig, RepositoryError> {
        to_active(config).update(self.db.as_ref()).await?;
        Ok(config.clone())
    }
}

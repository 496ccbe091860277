// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scheduled_attack::{AttackStatus, AttackType, ScheduledAttack};
use crate::domain::repositories::attack_repository::AttackRepository;
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::infrastructure::database::entities::scheduled_attack as attack_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

/// 计划攻击仓库实现
///
/// 窗口6元组的唯一索引在数据库层拒绝重复，
/// 重复插入映射为`AlreadyExists`
#[derive(Clone)]
pub struct AttackRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AttackRepositoryImpl {
    /// 创建新的攻击仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_domain(model: attack_entity::Model) -> Result<ScheduledAttack, RepositoryError> {
    let corrupt = |what: &str, value: &str| {
        RepositoryError::Database(DbErr::Custom(format!(
            "unknown {what} in scheduled_attacks row: {value}"
        )))
    };
    let attack_type: AttackType = model
        .attack_type
        .parse()
        .map_err(|_| corrupt("attack type", &model.attack_type))?;
    let status: AttackStatus = model
        .status
        .parse()
        .map_err(|_| corrupt("status", &model.status))?;
    Ok(ScheduledAttack {
        id: model.id,
        server_id: model.server_id,
        village_id: model.village_id,
        target_id: model.target_id,
        source_coordinates: model.source_coordinates,
        target_coordinates: model.target_coordinates,
        attack_type,
        send_time_from: model.send_time_from,
        send_time_to: model.send_time_to,
        status,
        executed_at: model.executed_at,
        error_message: model.error_message,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

impl From<ScheduledAttack> for attack_entity::ActiveModel {
    fn from(attack: ScheduledAttack) -> Self {
        Self {
            id: Set(attack.id),
            server_id: Set(attack.server_id),
            village_id: Set(attack.village_id),
            target_id: Set(attack.target_id),
            source_coordinates: Set(attack.source_coordinates),
            target_coordinates: Set(attack.target_coordinates),
            attack_type: Set(attack.attack_type.to_string()),
            send_time_from: Set(attack.send_time_from),
            send_time_to: Set(attack.send_time_to),
            status: Set(attack.status.to_string()),
            executed_at: Set(attack.executed_at),
            error_message: Set(attack.error_message),
            created_at: Set(attack.created_at),
            updated_at: Set(attack.updated_at),
        }
    }
}

#[async_trait]
impl AttackRepository for AttackRepositoryImpl {
    async fn create(&self, attack: &ScheduledAttack) -> Result<ScheduledAttack, RepositoryError> {
        // 唯一索引把NULL村庄视为互不相同，这里先做应用层查重
        let mut duplicate = attack_entity::Entity::find()
            .filter(attack_entity::Column::ServerId.eq(attack.server_id))
            .filter(attack_entity::Column::TargetId.eq(attack.target_id))
            .filter(attack_entity::Column::SendTimeFrom.eq(attack.send_time_from))
            .filter(attack_entity::Column::SendTimeTo.eq(attack.send_time_to))
            .filter(attack_entity::Column::AttackType.eq(attack.attack_type.to_string()));
        duplicate = match attack.village_id {
            Some(village_id) => duplicate.filter(attack_entity::Column::VillageId.eq(village_id)),
            None => duplicate.filter(attack_entity::Column::VillageId.is_null()),
        };
        if duplicate.one(self.db.as_ref()).await?.is_some() {
            return Err(RepositoryError::AlreadyExists);
        }

        let model: attack_entity::ActiveModel = attack.clone().into();
        match model.insert(self.db.as_ref()).await {
            Ok(_) => Ok(attack.clone()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(RepositoryError::AlreadyExists),
                _ => Err(RepositoryError::Database(e)),
            },
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledAttack>, RepositoryError> {
        attack_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn update(&self, attack: &ScheduledAttack) -> Result<ScheduledAttack, RepositoryError> {
        let model: attack_entity::ActiveModel = attack.clone().into();
        model.update(self.db.as_ref()).await?;
        Ok(attack.clone())
    }

    async fn find_pending(&self, server_id: i32) -> Result<Vec<ScheduledAttack>, RepositoryError> {
        attack_entity::Entity::find()
            .filter(attack_entity::Column::ServerId.eq(server_id))
            .filter(attack_entity::Column::Status.eq(AttackStatus::Pending.to_string()))
            .order_by_asc(attack_entity::Column::SendTimeFrom)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn find_dispatchable(
        &self,
        server_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledAttack>, RepositoryError> {
        attack_entity::Entity::find()
            .filter(attack_entity::Column::ServerId.eq(server_id))
            .filter(attack_entity::Column::Status.eq(AttackStatus::Scheduled.to_string()))
            .filter(attack_entity::Column::SendTimeFrom.lte(now))
            .filter(attack_entity::Column::SendTimeTo.gte(now))
            .order_by_asc(attack_entity::Column::SendTimeTo)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = attack_entity::Entity::update_many()
            .col_expr(
                attack_entity::Column::Status,
                Expr::value(AttackStatus::Expired.to_string()),
            )
            .col_expr(attack_entity::Column::UpdatedAt, Expr::value(now))
            .filter(attack_entity::Column::Status.eq(AttackStatus::Scheduled.to_string()))
            .filter(attack_entity::Column::SendTimeTo.lt(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn find_by_server(
        &self,
        server_id: i32,
    ) -> Result<Vec<ScheduledAttack>, RepositoryError> {
        attack_entity::Entity::find()
            .filter(attack_entity::Column::ServerId.eq(server_id))
            .order_by_asc(attack_entity::Column::SendTimeFrom)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }
}

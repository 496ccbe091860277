// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::server_plan::ServerPlan;
use crate::domain::models::task_kind::TaskKind;
use crate::domain::repositories::plan_repository::{PlanRepository, RepositoryError};
use crate::infrastructure::database::entities::server_plan as plan_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use std::sync::Arc;

/// 计划仓库实现
///
/// 基于SeaORM实现的计划存储访问层。任务类型优先级
/// 只存在于代码里，到期平局的打破在内存中完成。
#[derive(Clone)]
pub struct PlanRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl PlanRepositoryImpl {
    /// 创建新的计划仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_domain(model: plan_entity::Model) -> Result<ServerPlan, RepositoryError> {
    let task_kind: TaskKind = model.task_kind.parse().map_err(|_| {
        RepositoryError::Database(DbErr::Custom(format!(
            "unknown task kind in server_plans row: {}",
            model.task_kind
        )))
    })?;
    Ok(ServerPlan {
        id: model.id,
        server_id: model.server_id,
        task_kind,
        interval_ms: model.interval_ms,
        next_due_at: model.next_due_at,
        is_active: model.is_active,
        is_blocked: model.is_blocked,
        blocked_until: model.blocked_until,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

impl From<ServerPlan> for plan_entity::ActiveModel {
    fn from(plan: ServerPlan) -> Self {
        Self {
            id: Set(plan.id),
            server_id: Set(plan.server_id),
            task_kind: Set(plan.task_kind.to_string()),
            interval_ms: Set(plan.interval_ms),
            next_due_at: Set(plan.next_due_at),
            is_active: Set(plan.is_active),
            is_blocked: Set(plan.is_blocked),
            blocked_until: Set(plan.blocked_until),
            created_at: Set(plan.created_at),
            updated_at: Set(plan.updated_at),
        }
    }
}

impl PlanRepositoryImpl {
    async fn find_model(
        &self,
        server_id: i32,
        task_kind: TaskKind,
    ) -> Result<Option<plan_entity::Model>, RepositoryError> {
        Ok(plan_entity::Entity::find()
            .filter(plan_entity::Column::ServerId.eq(server_id))
            .filter(plan_entity::Column::TaskKind.eq(task_kind.to_string()))
            .one(self.db.as_ref())
            .await?)
    }
}

#[async_trait]
impl PlanRepository for PlanRepositoryImpl {
    async fn create(&self, plan: &ServerPlan) -> Result<ServerPlan, RepositoryError> {
        let model: plan_entity::ActiveModel = plan.clone().into();
        match model.insert(self.db.as_ref()).await {
            Ok(_) => Ok(plan.clone()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(RepositoryError::AlreadyExists),
                _ => Err(RepositoryError::Database(e)),
            },
        }
    }

    async fn find(
        &self,
        server_id: i32,
        task_kind: TaskKind,
    ) -> Result<Option<ServerPlan>, RepositoryError> {
        self.find_model(server_id, task_kind)
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_server(&self, server_id: i32) -> Result<Vec<ServerPlan>, RepositoryError> {
        plan_entity::Entity::find()
            .filter(plan_entity::Column::ServerId.eq(server_id))
            .order_by_asc(plan_entity::Column::TaskKind)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn find_all(&self) -> Result<Vec<ServerPlan>, RepositoryError> {
        plan_entity::Entity::find()
            .order_by_asc(plan_entity::Column::ServerId)
            .order_by_asc(plan_entity::Column::TaskKind)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn get_due(&self, now: DateTime<Utc>) -> Result<Vec<ServerPlan>, RepositoryError> {
        let unblocked = Condition::any()
            .add(plan_entity::Column::IsBlocked.eq(false))
            .add(plan_entity::Column::BlockedUntil.lte(now));

        let mut plans: Vec<ServerPlan> = plan_entity::Entity::find()
            .filter(plan_entity::Column::IsActive.eq(true))
            .filter(plan_entity::Column::NextDueAt.lte(now))
            .filter(unblocked)
            .order_by_asc(plan_entity::Column::NextDueAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect::<Result<_, _>>()?;

        // Deterministic tie break: equal due times go by kind priority
        plans.sort_by(|a, b| {
            a.next_due_at
                .cmp(&b.next_due_at)
                .then(b.task_kind.priority().cmp(&a.task_kind.priority()))
        });
        Ok(plans)
    }

    async fn update(&self, plan: &ServerPlan) -> Result<ServerPlan, RepositoryError> {
        let model: plan_entity::ActiveModel = plan.clone().into();
        model.update(self.db.as_ref()).await?;
        Ok(plan.clone())
    }

    async fn advance(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        completed_at: DateTime<Utc>,
    ) -> Result<ServerPlan, RepositoryError> {
        let model = self
            .find_model(server_id, task_kind)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut plan = to_domain(model)?;
        plan.advance(completed_at);
        self.update(&plan).await
    }

    async fn block_server(
        &self,
        server_id: i32,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = plan_entity::Entity::update_many()
            .col_expr(plan_entity::Column::IsBlocked, Expr::value(true))
            .col_expr(plan_entity::Column::BlockedUntil, Expr::value(until))
            .col_expr(plan_entity::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(plan_entity::Column::ServerId.eq(server_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn clear_expired_blocks(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = plan_entity::Entity::update_many()
            .col_expr(plan_entity::Column::IsBlocked, Expr::value(false))
            .col_expr(
                plan_entity::Column::BlockedUntil,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(plan_entity::Column::UpdatedAt, Expr::value(now))
            .filter(plan_entity::Column::IsBlocked.eq(true))
            .filter(plan_entity::Column::BlockedUntil.lte(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn next_wakeup(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let plans: Vec<ServerPlan> = plan_entity::Entity::find()
            .filter(plan_entity::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(to_domain)
            .collect::<Result<_, _>>()?;

        Ok(plans
            .iter()
            .map(|p| {
                if p.effectively_blocked(now) {
                    p.next_due_at.max(p.blocked_until.unwrap_or(p.next_due_at))
                } else {
                    p.next_due_at
                }
            })
            .min())
    }

    async fn activate_server(&self, server_id: i32) -> Result<Vec<ServerPlan>, RepositoryError> {
        for kind in TaskKind::ALL {
            match self.find_model(server_id, kind).await? {
                Some(model) => {
                    if !model.is_active {
                        let mut active: plan_entity::ActiveModel = model.into();
                        active.is_active = Set(true);
                        active.updated_at = Set(Utc::now());
                        active.update(self.db.as_ref()).await?;
                    }
                }
                None => {
                    self.create(&ServerPlan::new(server_id, kind)).await?;
                }
            }
        }
        self.find_by_server(server_id).await
    }

    async fn deactivate_server(&self, server_id: i32) -> Result<u64, RepositoryError> {
        let result = plan_entity::Entity::update_many()
            .col_expr(plan_entity::Column::IsActive, Expr::value(false))
            .col_expr(plan_entity::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(plan_entity::Column::ServerId.eq(server_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn set_interval(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        interval_ms: i64,
    ) -> Result<ServerPlan, RepositoryError> {
        let model = self
            .find_model(server_id, task_kind)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut plan = to_domain(model)?;
        plan.set_interval(interval_ms)
            .map_err(|e| RepositoryError::Database(DbErr::Custom(e.to_string())))?;
        self.update(&plan).await
    }

    async fn set_active(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        is_active: bool,
    ) -> Result<ServerPlan, RepositoryError> {
        let model = self
            .find_model(server_id, task_kind)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut active: plan_entity::ActiveModel = model.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db.as_ref()).await?;
        to_domain(updated)
    }
}

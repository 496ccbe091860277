// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::attack_request::ScheduleAttackRequestDto;
use crate::domain::models::scheduled_attack::ScheduledAttack;
use crate::domain::repositories::attack_repository::AttackRepository;
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 攻击计划创建处理器
///
/// 新建的攻击处于待确认状态，由工作线程在发送窗口前确认和派遣。
pub async fn schedule_attack(
    Extension(attacks): Extension<Arc<dyn AttackRepository>>,
    Json(request): Json<ScheduleAttackRequestDto>,
) -> Result<(StatusCode, Json<ScheduledAttack>), AppError> {
    request.validate()?;

    let attack = request.into_domain()?;
    let created = attacks.create(&attack).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// 攻击计划取消处理器
///
/// 只有待确认或已确认的攻击可以取消，终态攻击返回冲突。
pub async fn cancel_attack(
    Extension(attacks): Extension<Arc<dyn AttackRepository>>,
    Path(attack_id): Path<Uuid>,
) -> Result<Json<ScheduledAttack>, AppError> {
    let attack = attacks
        .find_by_id(attack_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let cancelled = attack.cancel()?;
    let updated = attacks.update(&cancelled).await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AttackListQuery {
    pub server_id: i32,
}

/// 按服务器查询攻击计划处理器
pub async fn list_attacks(
    Extension(attacks): Extension<Arc<dyn AttackRepository>>,
    Query(query): Query<AttackListQuery>,
) -> Result<Json<Vec<ScheduledAttack>>, AppError> {
    let rows = attacks.find_by_server(query.server_id).await?;
    Ok(Json(rows))
}

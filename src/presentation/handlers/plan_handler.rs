// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::plan_request::UpdatePlanRequestDto;
use crate::domain::models::server_plan::ServerPlan;
use crate::domain::models::task_kind::TaskKind;
use crate::domain::repositories::plan_repository::{PlanRepository, RepositoryError};
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

/// 服务器计划列表查询处理器
pub async fn list_plans(
    Extension(plans): Extension<Arc<dyn PlanRepository>>,
    Path(server_id): Path<i32>,
) -> Result<Json<Vec<ServerPlan>>, AppError> {
    let rows = plans.find_by_server(server_id).await?;
    Ok(Json(rows))
}

/// 单个计划调整处理器
///
/// 可以修改执行间隔或激活开关，两者都省略时请求无效。
pub async fn update_plan(
    Extension(plans): Extension<Arc<dyn PlanRepository>>,
    Path((server_id, kind)): Path<(i32, String)>,
    Json(request): Json<UpdatePlanRequestDto>,
) -> Result<Json<ServerPlan>, AppError> {
    request.validate()?;

    let task_kind = TaskKind::from_str(&kind)
        .map_err(|_| anyhow::anyhow!("invalid task kind: {kind}"))?;

    if request.interval_ms.is_none() && request.is_active.is_none() {
        return Err(anyhow::anyhow!("invalid request: nothing to update").into());
    }

    let mut plan = None;
    if let Some(interval_ms) = request.interval_ms {
        plan = Some(plans.set_interval(server_id, task_kind, interval_ms).await?);
    }
    if let Some(is_active) = request.is_active {
        plan = Some(plans.set_active(server_id, task_kind, is_active).await?);
    }

    // 两个分支至少进入一个，前面已拒绝空请求
    let plan = plan.ok_or(RepositoryError::NotFound)?;
    Ok(Json(plan))
}

/// 服务器激活处理器
///
/// 为服务器建立全部任务种类的计划，已存在的计划重新激活。
pub async fn activate_server(
    Extension(plans): Extension<Arc<dyn PlanRepository>>,
    Path(server_id): Path<i32>,
) -> Result<Json<Vec<ServerPlan>>, AppError> {
    let rows = plans.activate_server(server_id).await?;
    Ok(Json(rows))
}

/// 服务器停用处理器
pub async fn deactivate_server(
    Extension(plans): Extension<Arc<dyn PlanRepository>>,
    Path(server_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let deactivated = plans.deactivate_server(server_id).await?;
    Ok(Json(json!({ "deactivated": deactivated })))
}

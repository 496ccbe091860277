// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::log_query_request::ExecutionLogQueryDto;
use crate::domain::models::execution_log::ExecutionLogQuery;
use crate::domain::repositories::activity_log_repository::ActivityLogRepository;
use crate::domain::repositories::execution_log_repository::ExecutionLogRepository;
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 执行日志列表查询处理器
///
/// 支持按服务器、状态、标题和开始时间范围过滤，按开始时间倒序分页返回。
pub async fn list_executions(
    Extension(executions): Extension<Arc<dyn ExecutionLogRepository>>,
    Query(request): Query<ExecutionLogQueryDto>,
) -> Result<Json<Value>, AppError> {
    request.validate()?;

    let query = ExecutionLogQuery::from(request);
    let limit = query.limit;
    let offset = query.offset;
    let (logs, total) = executions.query(query).await?;

    Ok(Json(json!({
        "executions": logs,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

/// 单次执行的活动明细查询处理器
pub async fn get_execution_activities(
    Extension(executions): Extension<Arc<dyn ExecutionLogRepository>>,
    Extension(activities): Extension<Arc<dyn ActivityLogRepository>>,
    Path(execution_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let execution = executions
        .find_by_id(execution_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let rows = activities.find_by_execution(execution_id).await?;

    Ok(Json(json!({
        "execution": execution,
        "activities": rows,
    })))
}

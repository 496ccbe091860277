// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::queue_task_request::{QueueTaskRequestDto, QueueTaskResponseDto};
use crate::domain::models::manual_task::ManualTask;
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::presentation::errors::AppError;
use crate::queue::task_queue::CrawlerQueue;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 手动任务入队处理器
///
/// 手动任务插入到同服务器的计划任务之前，回执包含队列位置和预计等待时间。
pub async fn enqueue_task(
    Extension(queue): Extension<Arc<CrawlerQueue>>,
    Json(request): Json<QueueTaskRequestDto>,
) -> Result<(StatusCode, Json<QueueTaskResponseDto>), AppError> {
    request.validate()?;

    let payload = request.payload.unwrap_or(Value::Null);
    let receipt = queue.enqueue_manual(request.task_kind, request.server_id, payload);

    Ok((
        StatusCode::ACCEPTED,
        Json(QueueTaskResponseDto {
            task_id: receipt.task_id,
            queue_position: receipt.queue_position,
            estimated_wait_seconds: receipt.estimated_wait_seconds,
        }),
    ))
}

/// 手动任务状态查询处理器
pub async fn get_task_status(
    Extension(queue): Extension<Arc<CrawlerQueue>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ManualTask>, AppError> {
    let task = queue
        .manual_task_status(task_id)
        .ok_or(RepositoryError::NotFound)?;

    Ok(Json(task))
}

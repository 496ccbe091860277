// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::status_service::{CrawlerStatus, StatusService};
use crate::presentation::errors::AppError;
use axum::{extract::Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// 爬虫状态查询处理器
///
/// 汇总当前执行中的任务、队列深度、被封锁的服务器以及即将到期的计划。
pub async fn get_status(
    Extension(status_service): Extension<Arc<StatusService>>,
) -> Result<Json<CrawlerStatus>, AppError> {
    let status = status_service.crawler_status().await?;
    Ok(Json(status))
}

/// 默认任务间隔查询处理器
pub async fn get_intervals() -> Json<Value> {
    Json(json!({ "intervals": StatusService::default_intervals() }))
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_kind::TaskKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// 手动任务入队请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct QueueTaskRequestDto {
    /// 任务类型
    pub task_kind: TaskKind,
    /// 服务器ID
    #[validate(range(min = 1))]
    pub server_id: i32,
    /// 类型相关负载
    pub payload: Option<Value>,
}

/// 手动任务入队响应DTO
///
/// 回执携带队列位置和等待估算，调用方据此轮询任务状态
#[derive(Debug, Serialize)]
pub struct QueueTaskResponseDto {
    pub task_id: uuid::Uuid,
    pub queue_position: usize,
    pub estimated_wait_seconds: i64,
}

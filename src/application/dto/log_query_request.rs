// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::execution_log::{ExecutionLogQuery, ExecutionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 执行日志查询请求DTO
#[derive(Debug, Deserialize, Serialize, Validate, Default)]
pub struct ExecutionLogQueryDto {
    /// 服务器ID过滤
    pub server_id: Option<i32>,
    /// 状态过滤
    pub status: Option<ExecutionStatus>,
    /// 任务标题过滤
    pub title: Option<String>,
    /// 开始时间下限
    pub started_after: Option<DateTime<Utc>>,
    /// 开始时间上限
    pub started_before: Option<DateTime<Utc>>,
    /// 分页大小
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    /// 分页偏移
    pub offset: Option<u64>,
}

impl From<ExecutionLogQueryDto> for ExecutionLogQuery {
    fn from(dto: ExecutionLogQueryDto) -> Self {
        Self {
            server_id: dto.server_id,
            status: dto.status,
            title: dto.title,
            started_after: dto.started_after,
            started_before: dto.started_before,
            limit: dto.limit.unwrap_or(50),
            offset: dto.offset.unwrap_or(0),
        }
    }
}

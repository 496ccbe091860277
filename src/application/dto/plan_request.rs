// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 计划更新请求DTO
///
/// 调度间隔和激活开关都可单独更新
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdatePlanRequestDto {
    /// 新的调度间隔（毫秒）
    #[validate(range(min = 1000))]
    pub interval_ms: Option<i64>,
    /// 激活开关
    pub is_active: Option<bool>,
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scheduled_attack::{AttackType, ScheduledAttack};
use crate::domain::models::server_plan::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 计划攻击创建请求DTO
///
/// 派遣时刻是时间窗口而非时间点，窗口校验在领域构造器里完成
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ScheduleAttackRequestDto {
    /// 服务器ID
    #[validate(range(min = 1))]
    pub server_id: i32,
    /// 出发村庄ID
    pub village_id: Option<i32>,
    /// 目标ID
    pub target_id: i32,
    /// 出发坐标
    #[validate(length(min = 3))]
    pub source_coordinates: String,
    /// 目标坐标
    #[validate(length(min = 3))]
    pub target_coordinates: String,
    /// 攻击类型
    pub attack_type: AttackType,
    /// 派遣窗口起点
    pub send_time_from: DateTime<Utc>,
    /// 派遣窗口终点
    pub send_time_to: DateTime<Utc>,
}

impl ScheduleAttackRequestDto {
    /// 转换为领域实体（Pending状态）
    pub fn into_domain(self) -> Result<ScheduledAttack, DomainError> {
        ScheduledAttack::new(
            self.server_id,
            self.village_id,
            self.target_id,
            self.source_coordinates,
            self.target_coordinates,
            self.attack_type,
            self.send_time_from,
            self.send_time_to,
        )
    }
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scheduled_attacks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub server_id: i32,
    pub village_id: Option<i32>,
    pub target_id: i32,
    pub source_coordinates: String,
    pub target_coordinates: String,
    pub attack_type: String,
    pub send_time_from: DateTimeUtc,
    pub send_time_to: DateTimeUtc,
    pub status: String,
    pub executed_at: Option<DateTimeUtc>,
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

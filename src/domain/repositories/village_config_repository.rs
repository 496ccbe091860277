// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::village_config::VillageConfig;
use crate::domain::repositories::plan_repository::RepositoryError;
use async_trait::async_trait;

/// 村庄配置仓库特质
#[async_trait]
pub trait VillageConfigRepository: Send + Sync {
    /// 创建配置
    async fn create(&self, config: &VillageConfig) -> Result<VillageConfig, RepositoryError>;
    /// 查找单个村庄的配置
    async fn find(
        &self,
        server_id: i32,
        village_id: i32,
    ) -> Result<Option<VillageConfig>, RepositoryError>;
    /// 服务器上的全部村庄配置
    async fn find_by_server(&self, server_id: i32) -> Result<Vec<VillageConfig>, RepositoryError>;
    /// 更新配置（持久化轮询游标）
    async fn update(&self, config: &VillageConfig) -> Result<VillageConfig, RepositoryError>;
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::plan_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 服务器账号凭据
///
/// 每个服务器一行的配置实体。凭据的增删改由外部系统负责，
/// 会话提供者只读取凭据并回写Cookie快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCredentials {
    /// 服务器ID
    pub server_id: i32,
    /// 登录用户名
    pub username: String,
    /// 登录密码
    pub password: String,
    /// 游戏世界标识，如 "pl214"
    pub world: String,
    /// 最近一次有效会话的Cookie快照
    pub cookies: Option<serde_json::Value>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 凭据仓库特质
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// 读取服务器凭据
    async fn find(&self, server_id: i32) -> Result<Option<AccountCredentials>, RepositoryError>;
    /// 回写Cookie快照
    async fn save_cookies(
        &self,
        server_id: i32,
        cookies: serde_json::Value,
    ) -> Result<(), RepositoryError>;
    /// 清除Cookie快照（会话失效时）
    async fn clear_cookies(&self, server_id: i32) -> Result<(), RepositoryError>;
}

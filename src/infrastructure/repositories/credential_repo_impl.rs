// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::credential_repository::{AccountCredentials, CredentialRepository};
use crate::domain::repositories::plan_repository::RepositoryError;
use crate::infrastructure::database::entities::account_credential as cred_entity;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;

/// 凭据仓库实现
///
/// 凭据行的写入归外部系统，这里只读取和回写Cookie快照
#[derive(Clone)]
pub struct CredentialRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl CredentialRepositoryImpl {
    /// 创建新的凭据仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        server_id: i32,
    ) -> Result<Option<cred_entity::Model>, RepositoryError> {
        Ok(cred_entity::Entity::find_by_id(server_id)
            .one(self.db.as_ref())
            .await?)
    }
}

impl From<cred_entity::Model> for AccountCredentials {
    fn from(model: cred_entity::Model) -> Self {
        Self {
            server_id: model.server_id,
            username: model.username,
            password: model.password,
            world: model.world,
            cookies: model.cookies,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl CredentialRepository for CredentialRepositoryImpl {
    async fn find(&self, server_id: i32) -> Result<Option<AccountCredentials>, RepositoryError> {
        Ok(self.find_model(server_id).await?.map(Into::into))
    }

    async fn save_cookies(
        &self,
        server_id: i32,
        cookies: serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let model = self
            .find_model(server_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut active: cred_entity::ActiveModel = model.into();
        active.cookies = Set(Some(cookies));
        active.updated_at = Set(chrono::Utc::now());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn clear_cookies(&self, server_id: i32) -> Result<(), RepositoryError> {
        let model = self
            .find_model(server_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let mut active: cred_entity::ActiveModel = model.into();
        active.cookies = Set(None);
        active.updated_at = Set(chrono::Utc::now());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup_db;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use twcrawler::domain::repositories::credential_repository::CredentialRepository;
use twcrawler::domain::repositories::plan_repository::RepositoryError;
use twcrawler::infrastructure::database::entities::account_credential;
use twcrawler::infrastructure::repositories::credential_repo_impl::CredentialRepositoryImpl;

async fn seed_credentials(db: &sea_orm::DatabaseConnection, server_id: i32) {
    account_credential::ActiveModel {
        server_id: Set(server_id),
        username: Set("raider".to_string()),
        password: Set("hunter2".to_string()),
        world: Set("pl214".to_string()),
        cookies: Set(None),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_find_returns_seeded_credentials() {
    let db = setup_db().await;
    seed_credentials(db.as_ref(), 1).await;
    let repo = CredentialRepositoryImpl::new(db);

    let creds = repo.find(1).await.unwrap().unwrap();
    assert_eq!(creds.username, "raider");
    assert_eq!(creds.world, "pl214");
    assert!(creds.cookies.is_none());

    assert!(repo.find(99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cookie_snapshot_roundtrip() {
    let db = setup_db().await;
    seed_credentials(db.as_ref(), 1).await;
    let repo = CredentialRepositoryImpl::new(db);

    let snapshot = serde_json::json!(["sid=abc123; Path=/", "world=pl214"]);
    repo.save_cookies(1, snapshot.clone()).await.unwrap();

    let creds = repo.find(1).await.unwrap().unwrap();
    assert_eq!(creds.cookies, Some(snapshot));

    repo.clear_cookies(1).await.unwrap();
    let creds = repo.find(1).await.unwrap().unwrap();
    assert!(creds.cookies.is_none());
}

#[tokio::test]
async fn test_cookie_updates_require_existing_row() {
    let db = setup_db().await;
    let repo = CredentialRepositoryImpl::new(db);

    let err = repo
        .save_cookies(7, serde_json::json!([]))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));

    let err = repo.clear_cookies(7).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup_db;
use chrono::{Duration, Utc};
use twcrawler::domain::models::scheduled_attack::{AttackStatus, AttackType, ScheduledAttack};
use twcrawler::domain::repositories::attack_repository::AttackRepository;
use twcrawler::domain::repositories::plan_repository::RepositoryError;
use twcrawler::infrastructure::repositories::attack_repo_impl::AttackRepositoryImpl;

fn sample_attack(server_id: i32, offset_minutes: i64) -> ScheduledAttack {
    let now = Utc::now();
    ScheduledAttack::new(
        server_id,
        Some(101),
        2001,
        "500|500".to_string(),
        "512|487".to_string(),
        AttackType::Support,
        now + Duration::minutes(offset_minutes),
        now + Duration::minutes(offset_minutes + 10),
    )
    .unwrap()
}

#[tokio::test]
async fn test_create_rejects_duplicate_id() {
    let db = setup_db().await;
    let repo = AttackRepositoryImpl::new(db);

    let attack = sample_attack(1, 5);
    repo.create(&attack).await.unwrap();

    let err = repo.create(&attack).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists));
}

#[tokio::test]
async fn test_create_rejects_duplicate_dispatch_window() {
    let db = setup_db().await;
    let repo = AttackRepositoryImpl::new(db);

    let attack = sample_attack(1, 5);
    repo.create(&attack).await.unwrap();

    // 同一窗口、同一目标的重复计划即使ID不同也被拒绝
    let mut duplicate = attack.clone();
    duplicate.id = uuid::Uuid::new_v4();
    let err = repo.create(&duplicate).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists));
}

#[tokio::test]
async fn test_create_rejects_duplicate_window_without_village() {
    let db = setup_db().await;
    let repo = AttackRepositoryImpl::new(db);

    let mut attack = sample_attack(1, 5);
    attack.village_id = None;
    repo.create(&attack).await.unwrap();

    // 村庄为空时数据库索引不判重，仓库必须自己拒绝
    let mut duplicate = attack.clone();
    duplicate.id = uuid::Uuid::new_v4();
    let err = repo.create(&duplicate).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists));

    assert_eq!(repo.find_by_server(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_pending_orders_by_window_start() {
    let db = setup_db().await;
    let repo = AttackRepositoryImpl::new(db);

    let later = sample_attack(1, 30);
    let sooner = sample_attack(1, 5);
    let other_server = sample_attack(2, 1);
    repo.create(&later).await.unwrap();
    repo.create(&sooner).await.unwrap();
    repo.create(&other_server).await.unwrap();

    let pending = repo.find_pending(1).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, sooner.id);
    assert_eq!(pending[1].id, later.id);
}

#[tokio::test]
async fn test_find_dispatchable_respects_window_and_status() {
    let db = setup_db().await;
    let repo = AttackRepositoryImpl::new(db);
    let now = Utc::now();

    // 窗口已开但未确认，不可派遣
    let pending = sample_attack(1, -2);
    repo.create(&pending).await.unwrap();

    // 已确认且窗口内
    let in_window = sample_attack(1, -2).schedule().unwrap();
    repo.create(&in_window).await.unwrap();

    // 已确认但窗口未开
    let future = sample_attack(1, 60).schedule().unwrap();
    repo.create(&future).await.unwrap();

    let dispatchable = repo.find_dispatchable(1, now).await.unwrap();
    assert_eq!(dispatchable.len(), 1);
    assert_eq!(dispatchable[0].id, in_window.id);
}

#[tokio::test]
async fn test_lifecycle_survives_persistence() {
    let db = setup_db().await;
    let repo = AttackRepositoryImpl::new(db);
    let now = Utc::now();

    let attack = sample_attack(1, -1).schedule().unwrap();
    repo.create(&attack).await.unwrap();

    let executing = attack.begin_execution().unwrap();
    repo.update(&executing).await.unwrap();

    let completed = executing.complete(now).unwrap();
    repo.update(&completed).await.unwrap();

    let stored = repo.find_by_id(completed.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AttackStatus::Completed);
    assert!(stored.executed_at.is_some());
}

#[tokio::test]
async fn test_expire_overdue_only_touches_scheduled_past_window() {
    let db = setup_db().await;
    let repo = AttackRepositoryImpl::new(db);
    let now = Utc::now();

    // 窗口已过且已确认，应过期
    let overdue = sample_attack(1, -30).schedule().unwrap();
    repo.create(&overdue).await.unwrap();

    // 窗口已过但仍待确认，保持原状态
    let stale_pending = sample_attack(1, -30);
    repo.create(&stale_pending).await.unwrap();

    // 窗口未过
    let fresh = sample_attack(1, 5).schedule().unwrap();
    repo.create(&fresh).await.unwrap();

    let expired = repo.expire_overdue(now).await.unwrap();
    assert_eq!(expired, 1);

    let stored = repo.find_by_id(overdue.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AttackStatus::Expired);

    let stored = repo.find_by_id(stale_pending.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AttackStatus::Pending);

    let stored = repo.find_by_id(fresh.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AttackStatus::Scheduled);
}

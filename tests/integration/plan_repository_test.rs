// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup_db;
use chrono::{Duration, Utc};
use twcrawler::domain::models::server_plan::ServerPlan;
use twcrawler::domain::models::task_kind::TaskKind;
use twcrawler::domain::repositories::plan_repository::{PlanRepository, RepositoryError};
use twcrawler::infrastructure::repositories::plan_repo_impl::PlanRepositoryImpl;

#[tokio::test]
async fn test_create_rejects_duplicate_server_kind_pair() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);

    let plan = ServerPlan::new(1, TaskKind::Scavenging);
    repo.create(&plan).await.unwrap();

    let duplicate = ServerPlan::new(1, TaskKind::Scavenging);
    let err = repo.create(&duplicate).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists));
}

#[tokio::test]
async fn test_activate_server_creates_all_kinds_and_is_idempotent() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);

    let plans = repo.activate_server(5).await.unwrap();
    assert_eq!(plans.len(), TaskKind::ALL.len());
    assert!(plans.iter().all(|p| p.is_active));

    // 停用后再次激活必须复用既有计划
    let deactivated = repo.deactivate_server(5).await.unwrap();
    assert_eq!(deactivated as usize, TaskKind::ALL.len());

    let reactivated = repo.activate_server(5).await.unwrap();
    assert_eq!(reactivated.len(), TaskKind::ALL.len());
    assert!(reactivated.iter().all(|p| p.is_active));

    let all = repo.find_by_server(5).await.unwrap();
    assert_eq!(all.len(), TaskKind::ALL.len());
}

#[tokio::test]
async fn test_get_due_skips_blocked_and_inactive_plans() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);
    let now = Utc::now();

    let due = ServerPlan::new(1, TaskKind::Scavenging);
    repo.create(&due).await.unwrap();

    let mut not_due = ServerPlan::new(1, TaskKind::VillageSync);
    not_due.next_due_at = now + Duration::hours(2);
    repo.create(&not_due).await.unwrap();

    let mut blocked = ServerPlan::new(2, TaskKind::Scavenging);
    blocked.block(now + Duration::hours(1));
    repo.create(&blocked).await.unwrap();

    let mut inactive = ServerPlan::new(3, TaskKind::Scavenging);
    inactive.is_active = false;
    repo.create(&inactive).await.unwrap();

    let due_plans = repo.get_due(now).await.unwrap();
    assert_eq!(due_plans.len(), 1);
    assert_eq!(due_plans[0].id, due.id);
}

#[tokio::test]
async fn test_get_due_returns_expired_block_as_due() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);
    let now = Utc::now();

    let mut plan = ServerPlan::new(1, TaskKind::ConstructionQueue);
    plan.block(now - Duration::minutes(5));
    repo.create(&plan).await.unwrap();

    let due_plans = repo.get_due(now).await.unwrap();
    assert_eq!(due_plans.len(), 1);
    assert_eq!(due_plans[0].id, plan.id);
}

#[tokio::test]
async fn test_advance_moves_next_due_past_completion() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);

    let plan = ServerPlan::new(1, TaskKind::ArmyTraining);
    repo.create(&plan).await.unwrap();

    let completed_at = Utc::now();
    let advanced = repo.advance(1, TaskKind::ArmyTraining, completed_at).await.unwrap();

    assert_eq!(
        advanced.next_due_at,
        completed_at + Duration::milliseconds(plan.interval_ms)
    );
}

#[tokio::test]
async fn test_block_server_blocks_every_plan_and_clear_unblocks() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);
    let now = Utc::now();

    repo.activate_server(9).await.unwrap();
    let until = now + Duration::minutes(30);
    let blocked = repo.block_server(9, until).await.unwrap();
    assert_eq!(blocked as usize, TaskKind::ALL.len());

    let plans = repo.find_by_server(9).await.unwrap();
    assert!(plans.iter().all(|p| p.is_blocked && p.blocked_until == Some(until)));

    // 解封时间未到，清理不应有影响
    let cleared = repo.clear_expired_blocks(now).await.unwrap();
    assert_eq!(cleared, 0);

    let cleared = repo.clear_expired_blocks(until + Duration::seconds(1)).await.unwrap();
    assert_eq!(cleared as usize, TaskKind::ALL.len());

    let plans = repo.find_by_server(9).await.unwrap();
    assert!(plans.iter().all(|p| !p.is_blocked));
}

#[tokio::test]
async fn test_set_interval_and_set_active_roundtrip() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);

    let plan = ServerPlan::new(4, TaskKind::MiniAttacks);
    repo.create(&plan).await.unwrap();

    let updated = repo.set_interval(4, TaskKind::MiniAttacks, 120_000).await.unwrap();
    assert_eq!(updated.interval_ms, 120_000);

    let paused = repo.set_active(4, TaskKind::MiniAttacks, false).await.unwrap();
    assert!(!paused.is_active);

    let missing = repo.set_interval(4, TaskKind::VillageSync, 60_000).await;
    assert!(matches!(missing, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_next_wakeup_returns_earliest_active_due() {
    let db = setup_db().await;
    let repo = PlanRepositoryImpl::new(db);
    let now = Utc::now();

    assert!(repo.next_wakeup(now).await.unwrap().is_none());

    let mut early = ServerPlan::new(1, TaskKind::Scavenging);
    early.next_due_at = now + Duration::minutes(5);
    repo.create(&early).await.unwrap();

    let mut late = ServerPlan::new(1, TaskKind::VillageSync);
    late.next_due_at = now + Duration::hours(1);
    repo.create(&late).await.unwrap();

    let wakeup = repo.next_wakeup(now).await.unwrap().unwrap();
    assert_eq!(wakeup, early.next_due_at);
}

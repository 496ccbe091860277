// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup_db;
use chrono::{Duration, Utc};
use twcrawler::domain::models::activity_log::{ActivityEventType, ActivityLog};
use twcrawler::domain::models::execution_log::{ExecutionLog, ExecutionLogQuery, ExecutionStatus};
use twcrawler::domain::repositories::activity_log_repository::ActivityLogRepository;
use twcrawler::domain::repositories::execution_log_repository::ExecutionLogRepository;
use twcrawler::domain::repositories::plan_repository::RepositoryError;
use twcrawler::infrastructure::repositories::activity_log_repo_impl::ActivityLogRepositoryImpl;
use twcrawler::infrastructure::repositories::execution_log_repo_impl::ExecutionLogRepositoryImpl;
use uuid::Uuid;

#[tokio::test]
async fn test_finalize_closes_running_execution() {
    let db = setup_db().await;
    let repo = ExecutionLogRepositoryImpl::new(db);

    let log = ExecutionLog::started(1, Some(42), "Scavenging");
    repo.create(&log).await.unwrap();

    let ended_at = Utc::now();
    let finalized = repo
        .finalize(
            log.id,
            ExecutionStatus::Success,
            Some("dispatched 3 squads".to_string()),
            ended_at,
        )
        .await
        .unwrap();

    assert_eq!(finalized.status, ExecutionStatus::Success);
    assert_eq!(finalized.description.as_deref(), Some("dispatched 3 squads"));
    assert_eq!(finalized.ended_at, Some(ended_at));

    let missing = repo
        .finalize(Uuid::new_v4(), ExecutionStatus::Error, None, ended_at)
        .await;
    assert!(matches!(missing, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn test_query_filters_by_server_and_status() {
    let db = setup_db().await;
    let repo = ExecutionLogRepositoryImpl::new(db);
    let now = Utc::now();

    for i in 0..3 {
        let log = ExecutionLog::started(1, None, "Scavenging");
        repo.create(&log).await.unwrap();
        repo.finalize(log.id, ExecutionStatus::Success, None, now + Duration::seconds(i))
            .await
            .unwrap();
    }
    let failed = ExecutionLog::started(1, None, "Construction queue");
    repo.create(&failed).await.unwrap();
    repo.finalize(failed.id, ExecutionStatus::Error, Some("boom".to_string()), now)
        .await
        .unwrap();

    let other_server = ExecutionLog::started(2, None, "Scavenging");
    repo.create(&other_server).await.unwrap();

    let (rows, total) = repo
        .query(ExecutionLogQuery {
            server_id: Some(1),
            status: Some(ExecutionStatus::Success),
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 3);

    let (rows, total) = repo
        .query(ExecutionLogQuery {
            server_id: Some(1),
            status: Some(ExecutionStatus::Error),
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].description.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_query_paginates_newest_first() {
    let db = setup_db().await;
    let repo = ExecutionLogRepositoryImpl::new(db);
    let base = Utc::now();

    for i in 0..5 {
        let mut log = ExecutionLog::started(1, None, "Village sync");
        log.started_at = base + Duration::minutes(i);
        repo.create(&log).await.unwrap();
    }

    let (first_page, total) = repo
        .query(ExecutionLogQuery {
            limit: 2,
            offset: 0,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].started_at, base + Duration::minutes(4));

    let (second_page, _) = repo
        .query(ExecutionLogQuery {
            limit: 2,
            offset: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second_page[0].started_at, base + Duration::minutes(2));
}

#[tokio::test]
async fn test_activities_attach_to_execution_in_order() {
    let db = setup_db().await;
    let executions = ExecutionLogRepositoryImpl::new(db.clone());
    let activities = ActivityLogRepositoryImpl::new(db);

    let log = ExecutionLog::started(1, None, "Support dispatch");
    executions.create(&log).await.unwrap();

    let mut first = ActivityLog::new(
        Some(log.id),
        1,
        "support_dispatch",
        ActivityEventType::Info,
        "confirmed attack",
    );
    first.created_at = Utc::now() - Duration::seconds(10);
    activities.create(&first).await.unwrap();

    let second = ActivityLog::new(
        Some(log.id),
        1,
        "support_dispatch",
        ActivityEventType::Success,
        "dispatched attack",
    )
    .with_metadata(serde_json::json!({ "attack_id": "abc" }));
    activities.create(&second).await.unwrap();

    // 其他执行的活动不应串线
    let unrelated = ActivityLog::new(
        Some(Uuid::new_v4()),
        1,
        "support_dispatch",
        ActivityEventType::Error,
        "other run",
    );
    activities.create(&unrelated).await.unwrap();

    let rows = activities.find_by_execution(log.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].message, "confirmed attack");
    assert_eq!(rows[1].event_type, ActivityEventType::Success);
    assert!(rows[1].metadata.is_some());
}

#[tokio::test]
async fn test_delete_older_than_prunes_only_stale_rows() {
    let db = setup_db().await;
    let activities = ActivityLogRepositoryImpl::new(db);
    let now = Utc::now();

    let mut stale = ActivityLog::new(None, 1, "scavenging", ActivityEventType::Info, "old");
    stale.created_at = now - Duration::days(45);
    activities.create(&stale).await.unwrap();

    let fresh = ActivityLog::new(None, 1, "scavenging", ActivityEventType::Info, "new");
    activities.create(&fresh).await.unwrap();

    let deleted = activities
        .delete_older_than(now - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup_db;
use axum::Extension;
use axum_test::TestServer;
use chrono::Duration;
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use twcrawler::domain::repositories::activity_log_repository::ActivityLogRepository;
use twcrawler::domain::repositories::attack_repository::AttackRepository;
use twcrawler::domain::repositories::execution_log_repository::ExecutionLogRepository;
use twcrawler::domain::repositories::plan_repository::PlanRepository;
use twcrawler::domain::services::status_service::StatusService;
use twcrawler::infrastructure::repositories::activity_log_repo_impl::ActivityLogRepositoryImpl;
use twcrawler::infrastructure::repositories::attack_repo_impl::AttackRepositoryImpl;
use twcrawler::infrastructure::repositories::execution_log_repo_impl::ExecutionLogRepositoryImpl;
use twcrawler::infrastructure::repositories::plan_repo_impl::PlanRepositoryImpl;
use twcrawler::presentation::routes;
use twcrawler::queue::task_queue::CrawlerQueue;
use twcrawler::workers::state::WorkerState;

async fn test_server(db: Arc<DatabaseConnection>) -> TestServer {
    let plans: Arc<dyn PlanRepository> = Arc::new(PlanRepositoryImpl::new(db.clone()));
    let executions: Arc<dyn ExecutionLogRepository> =
        Arc::new(ExecutionLogRepositoryImpl::new(db.clone()));
    let activities: Arc<dyn ActivityLogRepository> =
        Arc::new(ActivityLogRepositoryImpl::new(db.clone()));
    let attacks: Arc<dyn AttackRepository> = Arc::new(AttackRepositoryImpl::new(db));
    let queue = Arc::new(CrawlerQueue::new(Duration::minutes(5)));
    let status_service = Arc::new(StatusService::new(
        plans.clone(),
        queue.clone(),
        Arc::new(WorkerState::new()),
        10,
    ));

    let app = routes::routes()
        .layer(Extension(queue))
        .layer(Extension(status_service))
        .layer(Extension(plans))
        .layer(Extension(executions))
        .layer(Extension(activities))
        .layer(Extension(attacks));

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_and_version() {
    let server = test_server(setup_db().await).await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");

    let response = server.get("/v1/version").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_server_activation_and_plan_update_flow() {
    let server = test_server(setup_db().await).await;

    let response = server.post("/v1/servers/1/activate").await;
    response.assert_status_ok();
    let plans: serde_json::Value = response.json();
    assert_eq!(plans.as_array().unwrap().len(), 7);

    let response = server
        .put("/v1/servers/1/plans/scavenging")
        .json(&json!({ "interval_ms": 120000 }))
        .await;
    response.assert_status_ok();
    let plan: serde_json::Value = response.json();
    assert_eq!(plan["interval_ms"], 120000);

    // 未知任务类型
    let response = server
        .put("/v1/servers/1/plans/espionage")
        .json(&json!({ "interval_ms": 120000 }))
        .await;
    response.assert_status_bad_request();

    // 间隔低于下限
    let response = server
        .put("/v1/servers/1/plans/scavenging")
        .json(&json!({ "interval_ms": 10 }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_manual_task_enqueue_and_poll() {
    let server = test_server(setup_db().await).await;

    let response = server
        .post("/v1/crawler/tasks")
        .json(&json!({ "task_kind": "scavenging", "server_id": 1 }))
        .await;
    assert_eq!(response.status_code(), 202);
    let receipt: serde_json::Value = response.json();
    assert_eq!(receipt["queue_position"], 1);

    let task_id = receipt["task_id"].as_str().unwrap();
    let response = server.get(&format!("/v1/crawler/tasks/{task_id}")).await;
    response.assert_status_ok();
    let task: serde_json::Value = response.json();
    assert_eq!(task["status"], "queued");

    let response = server
        .get("/v1/crawler/tasks/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_attack_schedule_and_cancel_flow() {
    let server = test_server(setup_db().await).await;

    let now = chrono::Utc::now();
    let body = json!({
        "server_id": 1,
        "village_id": 101,
        "target_id": 2001,
        "source_coordinates": "500|500",
        "target_coordinates": "512|487",
        "attack_type": "support",
        "send_time_from": now + Duration::hours(1),
        "send_time_to": now + Duration::hours(2),
    });
    let response = server.post("/v1/attacks").json(&body).await;
    assert_eq!(response.status_code(), 201);
    let attack: serde_json::Value = response.json();
    let attack_id = attack["id"].as_str().unwrap().to_string();

    // 同一派遣窗口重复提交
    let response = server.post("/v1/attacks").json(&body).await;
    assert_eq!(response.status_code(), 409);

    let response = server.get("/v1/attacks?server_id=1").await;
    response.assert_status_ok();
    let attacks: serde_json::Value = response.json();
    assert_eq!(attacks.as_array().unwrap().len(), 1);

    let response = server.post(&format!("/v1/attacks/{attack_id}/cancel")).await;
    response.assert_status_ok();
    let cancelled: serde_json::Value = response.json();
    assert_eq!(cancelled["status"], "cancelled");

    // 终态攻击不可再次取消
    let response = server.post(&format!("/v1/attacks/{attack_id}/cancel")).await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_attack_rejects_inverted_window() {
    let server = test_server(setup_db().await).await;

    let now = chrono::Utc::now();
    let response = server
        .post("/v1/attacks")
        .json(&json!({
            "server_id": 1,
            "village_id": null,
            "target_id": 2001,
            "source_coordinates": "500|500",
            "target_coordinates": "512|487",
            "attack_type": "off",
            "send_time_from": now + Duration::hours(2),
            "send_time_to": now + Duration::hours(1),
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_crawler_status_and_intervals() {
    let server = test_server(setup_db().await).await;

    let response = server.get("/v1/crawler/status").await;
    response.assert_status_ok();
    let status: serde_json::Value = response.json();
    assert_eq!(status["queue_length"], 0);

    let response = server.get("/v1/crawler/intervals").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["intervals"].as_object().unwrap().len(), 7);
}

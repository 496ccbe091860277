// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::{
    attack_handler, log_handler, plan_handler, queue_handler, status_handler,
};
use axum::{
    routing::{get, post, put},
    Router,
};

/// 创建应用路由
///
/// 仓库和队列通过 Extension 注入，由 main 在启动时挂载。
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route("/v1/crawler/status", get(status_handler::get_status))
        .route("/v1/crawler/intervals", get(status_handler::get_intervals))
        .route("/v1/crawler/tasks", post(queue_handler::enqueue_task))
        .route(
            "/v1/crawler/tasks/{id}",
            get(queue_handler::get_task_status),
        )
        .route("/v1/logs/executions", get(log_handler::list_executions))
        .route(
            "/v1/logs/executions/{id}/activities",
            get(log_handler::get_execution_activities),
        )
        .route(
            "/v1/attacks",
            post(attack_handler::schedule_attack).get(attack_handler::list_attacks),
        )
        .route("/v1/attacks/{id}/cancel", post(attack_handler::cancel_attack))
        .route("/v1/servers/{id}/plans", get(plan_handler::list_plans))
        .route(
            "/v1/servers/{id}/plans/{kind}",
            put(plan_handler::update_plan),
        )
        .route(
            "/v1/servers/{id}/activate",
            post(plan_handler::activate_server),
        )
        .route(
            "/v1/servers/{id}/deactivate",
            post(plan_handler::deactivate_server),
        );

    Router::new().merge(public_routes).merge(api_routes)
}

/// 健康检查端点
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

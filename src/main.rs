// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Extension;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::net::TcpListener;
use tracing::info;

use chrono::Duration;
use migration::{Migrator, MigratorTrait};
use twcrawler::automation::attack_dispatch::{AttackDispatchHandler, MiniAttacksHandler};
use twcrawler::automation::dispatch::{HttpTroopDispatcher, TroopDispatcher};
use twcrawler::automation::registry::HandlerRegistry;
use twcrawler::automation::session::{HttpSessionProvider, SessionProvider};
use twcrawler::automation::traits::TaskHandler;
use twcrawler::config::settings::Settings;
use twcrawler::domain::repositories::activity_log_repository::ActivityLogRepository;
use twcrawler::domain::repositories::attack_repository::AttackRepository;
use twcrawler::domain::repositories::credential_repository::CredentialRepository;
use twcrawler::domain::repositories::execution_log_repository::ExecutionLogRepository;
use twcrawler::domain::repositories::plan_repository::PlanRepository;
use twcrawler::domain::repositories::village_config_repository::VillageConfigRepository;
use twcrawler::domain::services::recovery::RecoveryPolicy;
use twcrawler::domain::services::status_service::StatusService;
use twcrawler::infrastructure::database::connection;
use twcrawler::infrastructure::repositories::activity_log_repo_impl::ActivityLogRepositoryImpl;
use twcrawler::infrastructure::repositories::attack_repo_impl::AttackRepositoryImpl;
use twcrawler::infrastructure::repositories::credential_repo_impl::CredentialRepositoryImpl;
use twcrawler::infrastructure::repositories::execution_log_repo_impl::ExecutionLogRepositoryImpl;
use twcrawler::infrastructure::repositories::plan_repo_impl::PlanRepositoryImpl;
use twcrawler::infrastructure::repositories::village_config_repo_impl::VillageConfigRepositoryImpl;
use twcrawler::presentation::routes;
use twcrawler::queue::scheduler::PlanScheduler;
use twcrawler::queue::task_queue::CrawlerQueue;
use twcrawler::utils::telemetry;
use twcrawler::workers::crawler_worker::CrawlerWorker;
use twcrawler::workers::manager::WorkerManager;
use twcrawler::workers::retention_worker::RetentionWorker;
use twcrawler::workers::state::WorkerState;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting twcrawler...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    twcrawler::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Repositories
    let plans: Arc<dyn PlanRepository> = Arc::new(PlanRepositoryImpl::new(db.clone()));
    let executions: Arc<dyn ExecutionLogRepository> =
        Arc::new(ExecutionLogRepositoryImpl::new(db.clone()));
    let activities: Arc<dyn ActivityLogRepository> =
        Arc::new(ActivityLogRepositoryImpl::new(db.clone()));
    let attacks: Arc<dyn AttackRepository> = Arc::new(AttackRepositoryImpl::new(db.clone()));
    let credentials: Arc<dyn CredentialRepository> =
        Arc::new(CredentialRepositoryImpl::new(db.clone()));
    let villages: Arc<dyn VillageConfigRepository> =
        Arc::new(VillageConfigRepositoryImpl::new(db.clone()));

    // 5. Initialize Automation Components
    let sessions: Arc<dyn SessionProvider> = Arc::new(HttpSessionProvider::new(
        credentials.clone(),
        settings.game.base_domain.clone(),
        StdDuration::from_secs(settings.game.request_timeout_secs),
    ));
    let dispatcher: Arc<dyn TroopDispatcher> = Arc::new(HttpTroopDispatcher);
    let handlers: Vec<Arc<dyn TaskHandler>> = vec![
        Arc::new(AttackDispatchHandler::new(
            attacks.clone(),
            dispatcher.clone(),
        )),
        Arc::new(MiniAttacksHandler::new(villages.clone(), dispatcher.clone())),
    ];
    let registry = Arc::new(HandlerRegistry::new(handlers));

    // 6. Initialize Queue and Scheduler
    let queue = Arc::new(CrawlerQueue::new(Duration::seconds(
        settings.crawler.manual_task_retention_secs as i64,
    )));
    let scheduler = Arc::new(PlanScheduler::new(
        plans.clone(),
        queue.clone(),
        registry.clone(),
    ));
    let worker_state = Arc::new(WorkerState::new());

    // 7. Start Workers
    let crawler_worker = Arc::new(CrawlerWorker::new(
        queue.clone(),
        scheduler.clone(),
        plans.clone(),
        executions.clone(),
        activities.clone(),
        sessions.clone(),
        registry.clone(),
        RecoveryPolicy::from_settings(&settings.crawler),
        worker_state.clone(),
        (settings.crawler.jitter_min_ms, settings.crawler.jitter_max_ms),
    ));
    let retention_worker = RetentionWorker::new(
        activities.clone(),
        attacks.clone(),
        queue.clone(),
        settings.retention.clone(),
    );

    let mut worker_manager = WorkerManager::new();
    worker_manager.start_crawler(crawler_worker);
    worker_manager.start_retention(retention_worker);

    // 8. Start HTTP server
    let status_service = Arc::new(StatusService::new(
        plans.clone(),
        queue.clone(),
        worker_state.clone(),
        settings.crawler.lookahead_limit,
    ));

    let app = routes::routes()
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(Extension(queue))
        .layer(Extension(status_service))
        .layer(Extension(plans))
        .layer(Extension(executions))
        .layer(Extension(activities))
        .layer(Extension(attacks))
        .layer(Extension(settings.clone()));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = worker_manager.wait_for_shutdown() => {
            info!("Shutdown complete");
        }
    }

    Ok(())
}

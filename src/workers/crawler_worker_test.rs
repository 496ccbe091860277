// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::automation::session::{AcquiredSession, GameSession};
use crate::automation::traits::{ActivityEvent, HandlerReport, TaskHandler};
use crate::domain::models::execution_log::ExecutionLogQuery;
use crate::domain::models::server_plan::ServerPlan;
use crate::domain::repositories::plan_repository::RepositoryError;
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use reqwest::Url;

fn scheduled_task(server_id: i32, kind: TaskKind) -> QueuedTask {
    QueuedTask {
        id: Uuid::new_v4(),
        server_id,
        task_kind: kind,
        payload: serde_json::Value::Null,
        source: TaskSource::Scheduled,
        enqueued_at: Utc::now(),
    }
}

#[derive(Default)]
struct TestPlans {
    due: Mutex<Vec<ServerPlan>>,
    advanced: Mutex<Vec<(i32, TaskKind)>>,
    blocked: Mutex<Vec<(i32, DateTime<Utc>)>>,
}

#[async_trait]
impl PlanRepository for TestPlans {
    async fn create(&self, plan: &ServerPlan) -> Result<ServerPlan, RepositoryError> {
        Ok(plan.clone())
    }

    async fn find(
        &self,
        _server_id: i32,
        _task_kind: TaskKind,
    ) -> Result<Option<ServerPlan>, RepositoryError> {
        Ok(None)
    }

    async fn find_by_server(&self, _server_id: i32) -> Result<Vec<ServerPlan>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn find_all(&self) -> Result<Vec<ServerPlan>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn get_due(&self, _now: DateTime<Utc>) -> Result<Vec<ServerPlan>, RepositoryError> {
        Ok(self.due.lock().clone())
    }

    async fn update(&self, plan: &ServerPlan) -> Result<ServerPlan, RepositoryError> {
        Ok(plan.clone())
    }

    async fn advance(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        _completed_at: DateTime<Utc>,
    ) -> Result<ServerPlan, RepositoryError> {
        self.advanced.lock().push((server_id, task_kind));
        Ok(ServerPlan::new(server_id, task_kind))
    }

    async fn block_server(
        &self,
        server_id: i32,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        self.blocked.lock().push((server_id, until));
        Ok(1)
    }

    async fn clear_expired_blocks(&self, _now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        Ok(0)
    }

    async fn next_wakeup(
        &self,
        _now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        Ok(None)
    }

    async fn activate_server(&self, _server_id: i32) -> Result<Vec<ServerPlan>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn deactivate_server(&self, _server_id: i32) -> Result<u64, RepositoryError> {
        Ok(0)
    }

    async fn set_interval(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        _interval_ms: i64,
    ) -> Result<ServerPlan, RepositoryError> {
        Ok(ServerPlan::new(server_id, task_kind))
    }

    async fn set_active(
        &self,
        server_id: i32,
        task_kind: TaskKind,
        _is_active: bool,
    ) -> Result<ServerPlan, RepositoryError> {
        Ok(ServerPlan::new(server_id, task_kind))
    }
}

#[derive(Default)]
struct TestExecutions {
    created: Mutex<Vec<ExecutionLog>>,
    finalized: Mutex<Vec<(Uuid, ExecutionStatus, Option<String>)>>,
}

#[async_trait]
impl ExecutionLogRepository for TestExecutions {
    async fn create(&self, log: &ExecutionLog) -> Result<ExecutionLog, RepositoryError> {
        self.created.lock().push(log.clone());
        Ok(log.clone())
    }

    async fn finalize(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        description: Option<String>,
        ended_at: DateTime<Utc>,
    ) -> Result<ExecutionLog, RepositoryError> {
        self.finalized.lock().push((id, status, description.clone()));
        let mut log = self
            .created
            .lock()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        log.status = status;
        log.description = description;
        log.ended_at = Some(ended_at);
        Ok(log)
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<ExecutionLog>, RepositoryError> {
        Ok(None)
    }

    async fn query(
        &self,
        _params: ExecutionLogQuery,
    ) -> Result<(Vec<ExecutionLog>, u64), RepositoryError> {
        Ok((Vec::new(), 0))
    }
}

#[derive(Default)]
struct TestActivities {
    rows: Mutex<Vec<ActivityLog>>,
}

impl TestActivities {
    fn events(&self) -> Vec<ActivityEventType> {
        self.rows.lock().iter().map(|a| a.event_type).collect()
    }
}

#[async_trait]
impl ActivityLogRepository for TestActivities {
    async fn create(&self, log: &ActivityLog) -> Result<ActivityLog, RepositoryError> {
        self.rows.lock().push(log.clone());
        Ok(log.clone())
    }

    async fn find_by_execution(
        &self,
        execution_log_id: Uuid,
    ) -> Result<Vec<ActivityLog>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|a| a.execution_log_id == Some(execution_log_id))
            .cloned()
            .collect())
    }

    async fn delete_older_than(&self, _cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        Ok(0)
    }
}

struct TestSessions {
    fresh_acquires: Mutex<u32>,
    fail_with_recaptcha: bool,
}

impl TestSessions {
    fn new() -> Self {
        Self {
            fresh_acquires: Mutex::new(0),
            fail_with_recaptcha: false,
        }
    }

    fn recaptcha_blocked() -> Self {
        Self {
            fresh_acquires: Mutex::new(0),
            fail_with_recaptcha: true,
        }
    }

    fn session(server_id: i32) -> GameSession {
        GameSession {
            server_id,
            world: "pl214".to_string(),
            base_url: Url::parse("http://localhost/").unwrap(),
            client: reqwest::Client::new(),
            established_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SessionProvider for TestSessions {
    async fn acquire(&self, server_id: i32) -> Result<AcquiredSession, SessionError> {
        if self.fail_with_recaptcha {
            return Err(SessionError::RecaptchaBlocked);
        }
        Ok(AcquiredSession {
            session: Self::session(server_id),
            via_relogin: false,
        })
    }

    async fn acquire_fresh(&self, server_id: i32) -> Result<AcquiredSession, SessionError> {
        *self.fresh_acquires.lock() += 1;
        Ok(AcquiredSession {
            session: Self::session(server_id),
            via_relogin: true,
        })
    }

    async fn invalidate(&self, _server_id: i32) {}
}

/// 依次返回脚本里的报告，耗尽后一直返回成功
struct ScriptedHandler {
    kind: TaskKind,
    reports: Mutex<Vec<HandlerReport>>,
}

impl ScriptedHandler {
    fn new(kind: TaskKind, reports: Vec<HandlerReport>) -> Self {
        Self {
            kind,
            reports: Mutex::new(reports),
        }
    }
}

#[async_trait]
impl TaskHandler for ScriptedHandler {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn execute(&self, _session: &GameSession, _ctx: HandlerContext) -> HandlerReport {
        let mut reports = self.reports.lock();
        if reports.is_empty() {
            HandlerReport::success()
        } else {
            reports.remove(0)
        }
    }
}

/// 永不返回的处理器，用于超时路径
struct StalledHandler(TaskKind);

#[async_trait]
impl TaskHandler for StalledHandler {
    fn kind(&self) -> TaskKind {
        self.0
    }

    async fn execute(&self, _session: &GameSession, _ctx: HandlerContext) -> HandlerReport {
        std::future::pending().await
    }
}

struct Harness {
    worker: CrawlerWorker,
    scheduler: Arc<PlanScheduler>,
    queue: Arc<CrawlerQueue>,
    plans: Arc<TestPlans>,
    executions: Arc<TestExecutions>,
    activities: Arc<TestActivities>,
    sessions: Arc<TestSessions>,
}

fn harness(sessions: TestSessions, handlers: Vec<Arc<dyn TaskHandler>>) -> Harness {
    let queue = Arc::new(CrawlerQueue::new(ChronoDuration::minutes(5)));
    let plans = Arc::new(TestPlans::default());
    let executions = Arc::new(TestExecutions::default());
    let activities = Arc::new(TestActivities::default());
    let sessions = Arc::new(sessions);
    let registry = Arc::new(HandlerRegistry::new(handlers));
    let scheduler = Arc::new(PlanScheduler::new(
        plans.clone() as Arc<dyn PlanRepository>,
        queue.clone(),
        registry.clone(),
    ));
    let worker = CrawlerWorker::new(
        queue.clone(),
        scheduler.clone(),
        plans.clone(),
        executions.clone(),
        activities.clone(),
        sessions.clone(),
        registry,
        RecoveryPolicy::new(ChronoDuration::minutes(30), ChronoDuration::minutes(10)),
        Arc::new(WorkerState::new()),
        (0, 0),
    );
    Harness {
        worker,
        scheduler,
        queue,
        plans,
        executions,
        activities,
        sessions,
    }
}

#[tokio::test]
async fn test_success_finalizes_log_and_rearms_plan() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(
            TaskKind::Scavenging,
            vec![HandlerReport::success().with_summary("3 squads sent")],
        ))],
    );

    h.worker.process(scheduled_task(1, TaskKind::Scavenging)).await;

    let finalized = h.executions.finalized.lock();
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0].1, ExecutionStatus::Success);
    assert_eq!(finalized[0].2.as_deref(), Some("3 squads sent"));
    assert_eq!(*h.plans.advanced.lock(), vec![(1, TaskKind::Scavenging)]);
    assert!(h.plans.blocked.lock().is_empty());
}

#[tokio::test]
async fn test_handler_events_become_activity_rows() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(
            TaskKind::Scavenging,
            vec![HandlerReport::success().push_event(ActivityEvent::success("squad sent"))],
        ))],
    );

    h.worker.process(scheduled_task(1, TaskKind::Scavenging)).await;

    assert_eq!(h.activities.events(), vec![ActivityEventType::Success]);
}

#[tokio::test]
async fn test_anti_bot_block_stops_server_scheduling() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(
            TaskKind::MiniAttacks,
            vec![HandlerReport::with_outcome(HandlerOutcome::AntiBotBlocked)],
        ))],
    );

    h.worker.process(scheduled_task(7, TaskKind::MiniAttacks)).await;

    let blocked = h.plans.blocked.lock();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].0, 7);
    assert!(h
        .activities
        .events()
        .contains(&ActivityEventType::RecaptchaBlocked));
    let finalized = h.executions.finalized.lock();
    assert_eq!(finalized[0].1, ExecutionStatus::Error);
}

#[tokio::test]
async fn test_recaptcha_at_login_also_blocks_server() {
    let h = harness(
        TestSessions::recaptcha_blocked(),
        vec![Arc::new(ScriptedHandler::new(TaskKind::Scavenging, vec![]))],
    );

    h.worker.process(scheduled_task(3, TaskKind::Scavenging)).await;

    assert_eq!(h.plans.blocked.lock().len(), 1);
}

#[tokio::test]
async fn test_invalid_session_retries_once_with_fresh_login() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(
            TaskKind::Scavenging,
            vec![
                HandlerReport::with_outcome(HandlerOutcome::SessionInvalid),
                HandlerReport::success(),
            ],
        ))],
    );

    h.worker.process(scheduled_task(1, TaskKind::Scavenging)).await;

    assert_eq!(*h.sessions.fresh_acquires.lock(), 1);
    let finalized = h.executions.finalized.lock();
    assert_eq!(finalized[0].1, ExecutionStatus::Success);
    // Relogin leaves a session_expired trace on the run
    assert!(h
        .activities
        .events()
        .contains(&ActivityEventType::SessionExpired));
    assert!(h.plans.blocked.lock().is_empty());
}

#[tokio::test]
async fn test_repeated_session_failure_escalates_to_cooldown() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(
            TaskKind::Scavenging,
            vec![
                HandlerReport::with_outcome(HandlerOutcome::SessionInvalid),
                HandlerReport::with_outcome(HandlerOutcome::SessionInvalid),
            ],
        ))],
    );

    h.worker.process(scheduled_task(1, TaskKind::Scavenging)).await;

    // One in-run retry happened, then the failure escalated
    assert_eq!(*h.sessions.fresh_acquires.lock(), 1);
    assert_eq!(h.plans.blocked.lock().len(), 1);
    let finalized = h.executions.finalized.lock();
    assert_eq!(finalized[0].1, ExecutionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_handler_hits_its_timeout_budget() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(StalledHandler(TaskKind::Scavenging))],
    );

    h.worker.process(scheduled_task(1, TaskKind::Scavenging)).await;

    let finalized = h.executions.finalized.lock();
    assert_eq!(finalized[0].1, ExecutionStatus::Error);
    assert!(finalized[0].2.as_deref().unwrap().contains("budget"));
    // Timeouts do not block the server
    assert!(h.plans.blocked.lock().is_empty());
    // The plan still re-arms so the next interval gets a fresh try
    assert_eq!(h.plans.advanced.lock().len(), 1);
}

#[tokio::test]
async fn test_unregistered_kind_fails_the_run() {
    let h = harness(TestSessions::new(), vec![]);

    h.worker.process(scheduled_task(1, TaskKind::VillageSync)).await;

    let finalized = h.executions.finalized.lock();
    assert_eq!(finalized[0].1, ExecutionStatus::Error);
    assert!(finalized[0]
        .2
        .as_deref()
        .unwrap()
        .contains("no handler registered"));
}

#[tokio::test]
async fn test_shutdown_fails_in_flight_manual_task() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(StalledHandler(TaskKind::Scavenging))],
    );
    let receipt = h
        .queue
        .enqueue_manual(TaskKind::Scavenging, 1, serde_json::Value::Null);
    let queue = h.queue.clone();
    let executions = h.executions.clone();
    let worker = Arc::new(h.worker);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { worker.run(rx).await });

    // Wait until the worker has the task inside the critical section
    for _ in 0..100 {
        let running = queue
            .manual_task_status(receipt.task_id)
            .is_some_and(|t| t.status == ManualTaskStatus::Running);
        if running {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    tx.send(true).unwrap();
    handle.await.unwrap();

    let status = queue.manual_task_status(receipt.task_id).unwrap();
    assert_eq!(status.status, ManualTaskStatus::Failed);
    assert_eq!(status.error_message.as_deref(), Some("shutdown in progress"));
    assert!(queue.executing().is_none());

    // The interrupted run's audit row is closed instead of staying running
    let finalized = executions.finalized.lock();
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0].1, ExecutionStatus::Error);
    assert_eq!(finalized[0].2.as_deref(), Some("shutdown in progress"));
}

#[tokio::test]
async fn test_denied_retry_still_records_session_activity() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(
            TaskKind::Scavenging,
            vec![
                HandlerReport::with_outcome(HandlerOutcome::SessionInvalid),
                HandlerReport::with_outcome(HandlerOutcome::SessionInvalid),
                HandlerReport::with_outcome(HandlerOutcome::SessionInvalid),
            ],
        ))],
    );

    h.worker.process(scheduled_task(1, TaskKind::Scavenging)).await;
    h.worker.process(scheduled_task(1, TaskKind::Scavenging)).await;

    // Only the first run earned a relogin retry
    assert_eq!(*h.sessions.fresh_acquires.lock(), 1);
    // Both failed runs plus the relogin leave session traces
    let expired = h
        .activities
        .events()
        .iter()
        .filter(|e| **e == ActivityEventType::SessionExpired)
        .count();
    assert_eq!(expired, 3);
}

#[tokio::test]
async fn test_due_plan_without_handler_rearms_without_queueing() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(TaskKind::Scavenging, vec![]))],
    );
    h.plans.due.lock().push(ServerPlan::new(1, TaskKind::ArmyTraining));
    h.plans.due.lock().push(ServerPlan::new(1, TaskKind::Scavenging));

    let inserted = h.scheduler.pump_due(Utc::now()).await.unwrap();

    // The unserviceable kind keeps its cadence without an error run
    assert_eq!(inserted, 1);
    assert_eq!(h.queue.len(), 1);
    assert_eq!(*h.plans.advanced.lock(), vec![(1, TaskKind::ArmyTraining)]);
    assert!(h.executions.created.lock().is_empty());
}

#[tokio::test]
async fn test_manual_task_reaches_terminal_state() {
    let h = harness(
        TestSessions::new(),
        vec![Arc::new(ScriptedHandler::new(
            TaskKind::Scavenging,
            vec![HandlerReport::success()],
        ))],
    );

    let receipt = h
        .queue
        .enqueue_manual(TaskKind::Scavenging, 1, serde_json::Value::Null);
    let task = h.queue.try_dequeue().unwrap();
    h.worker.process(task).await;
    h.queue.finish_current();

    let status = h.queue.manual_task_status(receipt.task_id).unwrap();
    assert_eq!(status.status, ManualTaskStatus::Succeeded);
    // Manual runs never re-arm scheduled plans
    assert!(h.plans.advanced.lock().is_empty());
}

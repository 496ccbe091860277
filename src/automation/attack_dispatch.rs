// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::dispatch::{DispatchError, DispatchOrder, TroopDispatcher};
use crate::automation::session::GameSession;
use crate::automation::traits::{ActivityEvent, HandlerContext, HandlerOutcome, HandlerReport, TaskHandler};
use crate::domain::models::scheduled_attack::{AttackType, ScheduledAttack};
use crate::domain::models::task_kind::TaskKind;
use crate::domain::repositories::attack_repository::AttackRepository;
use crate::domain::repositories::village_config_repository::VillageConfigRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// 计划攻击派遣处理器
///
/// 每次运行做两件事：把Pending攻击确认为Scheduled，
/// 再把窗口包含当前时刻的Scheduled攻击按状态机派遣出去。
/// 每次状态转换都在执行动作前持久化，崩溃后不会重复派遣。
pub struct AttackDispatchHandler {
    attacks: Arc<dyn AttackRepository>,
    dispatcher: Arc<dyn TroopDispatcher>,
}

impl AttackDispatchHandler {
    /// 创建新的攻击派遣处理器
    pub fn new(attacks: Arc<dyn AttackRepository>, dispatcher: Arc<dyn TroopDispatcher>) -> Self {
        Self { attacks, dispatcher }
    }

    fn order_for(attack: &ScheduledAttack) -> DispatchOrder {
        DispatchOrder {
            village_id: attack.village_id,
            source_coordinates: attack.source_coordinates.clone(),
            target_coordinates: attack.target_coordinates.clone(),
            attack_type: attack.attack_type,
        }
    }
}

#[async_trait]
impl TaskHandler for AttackDispatchHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::SupportDispatch
    }

    async fn execute(&self, session: &GameSession, ctx: HandlerContext) -> HandlerReport {
        let mut report = HandlerReport::success();
        let now = Utc::now();

        // Phase 1: confirm freshly created attacks
        let pending = match self.attacks.find_pending(ctx.server_id).await {
            Ok(rows) => rows,
            Err(e) => return HandlerReport::error(format!("loading pending attacks: {e}")),
        };
        let mut confirmed = 0usize;
        for attack in pending {
            let scheduled = match attack.schedule() {
                Ok(a) => a,
                Err(e) => {
                    warn!(error = %e, "Skipping attack with impossible transition");
                    continue;
                }
            };
            if let Err(e) = self.attacks.update(&scheduled).await {
                return HandlerReport::error(format!("confirming attack: {e}"));
            }
            confirmed += 1;
        }

        // Phase 2: dispatch attacks whose window contains now
        let due = match self.attacks.find_dispatchable(ctx.server_id, now).await {
            Ok(rows) => rows,
            Err(e) => return HandlerReport::error(format!("loading dispatchable attacks: {e}")),
        };
        let mut dispatched = 0usize;
        for attack in due {
            let id = attack.id;
            let target = attack.target_coordinates.clone();
            let executing = match attack.begin_execution() {
                Ok(a) => a,
                Err(e) => {
                    warn!(attack_id = %id, error = %e, "Skipping attack with impossible transition");
                    continue;
                }
            };
            if let Err(e) = self.attacks.update(&executing).await {
                return HandlerReport::error(format!("marking attack executing: {e}"));
            }

            let order = Self::order_for(&executing);
            match self.dispatcher.dispatch(session, &order).await {
                Ok(()) => {
                    let completed = match executing.complete(Utc::now()) {
                        Ok(a) => a,
                        Err(e) => {
                            return HandlerReport::error(format!("completing attack: {e}"))
                        }
                    };
                    if let Err(e) = self.attacks.update(&completed).await {
                        return HandlerReport::error(format!("persisting attack result: {e}"));
                    }
                    dispatched += 1;
                    info!(attack_id = %id, target = %target, "Scheduled attack dispatched");
                    report = report.push_event(
                        ActivityEvent::success(format!("attack dispatched to {target}"))
                            .with_metadata(serde_json::json!({ "attack_id": id })),
                    );
                }
                Err(dispatch_err) => {
                    let failed = match executing.fail(dispatch_err.to_string()) {
                        Ok(a) => a,
                        Err(e) => return HandlerReport::error(format!("failing attack: {e}")),
                    };
                    if let Err(e) = self.attacks.update(&failed).await {
                        return HandlerReport::error(format!("persisting attack result: {e}"));
                    }
                    warn!(attack_id = %id, error = %dispatch_err, "Scheduled attack failed");
                    report.outcome = match dispatch_err {
                        DispatchError::AntiBotBlocked => HandlerOutcome::AntiBotBlocked,
                        DispatchError::SessionInvalid => HandlerOutcome::SessionInvalid,
                        DispatchError::Failed(msg) => HandlerOutcome::Error(msg),
                    };
                    return report.with_summary(format!(
                        "confirmed {confirmed}, dispatched {dispatched}, aborted on attack {id}"
                    ));
                }
            }
        }

        report.with_summary(format!("confirmed {confirmed}, dispatched {dispatched}"))
    }
}

/// 村庄小规模攻击处理器
///
/// 遍历服务器上配置了目标列表的村庄，对每个村庄打击
/// 轮询游标指向的目标，成功后前进游标并持久化。
pub struct MiniAttacksHandler {
    villages: Arc<dyn VillageConfigRepository>,
    dispatcher: Arc<dyn TroopDispatcher>,
}

impl MiniAttacksHandler {
    /// 创建新的小规模攻击处理器
    pub fn new(
        villages: Arc<dyn VillageConfigRepository>,
        dispatcher: Arc<dyn TroopDispatcher>,
    ) -> Self {
        Self { villages, dispatcher }
    }
}

#[async_trait]
impl TaskHandler for MiniAttacksHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::MiniAttacks
    }

    async fn execute(&self, session: &GameSession, ctx: HandlerContext) -> HandlerReport {
        let configs = match self.villages.find_by_server(ctx.server_id).await {
            Ok(rows) => rows,
            Err(e) => return HandlerReport::error(format!("loading village configs: {e}")),
        };

        let mut report = HandlerReport::success();
        let mut sent = 0usize;
        let mut failures = Vec::new();
        for mut config in configs {
            let Some(target) = config.current_target().map(|t| t.to_string()) else {
                continue;
            };
            let order = DispatchOrder {
                village_id: Some(config.village_id),
                source_coordinates: String::new(),
                target_coordinates: target.clone(),
                attack_type: AttackType::Off,
            };
            match self.dispatcher.dispatch(session, &order).await {
                Ok(()) => {
                    config.advance_cursor();
                    if let Err(e) = self.villages.update(&config).await {
                        return HandlerReport::error(format!("persisting raid cursor: {e}"));
                    }
                    sent += 1;
                    report = report.push_event(ActivityEvent::success(format!(
                        "raid sent from village {} to {target}",
                        config.village_id
                    )));
                }
                Err(DispatchError::AntiBotBlocked) => {
                    report.outcome = HandlerOutcome::AntiBotBlocked;
                    return report.with_summary(format!("{sent} raids sent before block"));
                }
                Err(DispatchError::SessionInvalid) => {
                    report.outcome = HandlerOutcome::SessionInvalid;
                    return report.with_summary(format!("{sent} raids sent before session loss"));
                }
                Err(DispatchError::Failed(msg)) => {
                    warn!(
                        village_id = config.village_id,
                        target = %target,
                        error = %msg,
                        "Raid dispatch failed"
                    );
                    failures.push(format!("village {}: {msg}", config.village_id));
                }
            }
        }

        if !failures.is_empty() {
            report.outcome = HandlerOutcome::Error(failures.join("; "));
        }
        report.with_summary(format!("{sent} raids sent"))
    }
}

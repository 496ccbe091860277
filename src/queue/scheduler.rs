// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::registry::HandlerRegistry;
use crate::domain::repositories::plan_repository::PlanRepository;
use crate::queue::task_queue::{CrawlerQueue, QueueError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// 计划调度器
///
/// 每个调度tick把到期的计划任务从计划存储拉入队列。
/// 实际的任务执行由Worker通过try_dequeue主动拉取。
pub struct PlanScheduler {
    /// 计划仓库
    plans: Arc<dyn PlanRepository>,
    /// 爬虫队列
    queue: Arc<CrawlerQueue>,
    /// 处理器注册表，没有处理器的计划不入队
    registry: Arc<HandlerRegistry>,
}

impl PlanScheduler {
    /// 创建新的计划调度器实例
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        queue: Arc<CrawlerQueue>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            plans,
            queue,
            registry,
        }
    }

    /// 把到期计划送入队列
    ///
    /// 先清除已过期的封锁标记，再按到期顺序入队。
    /// 队列内部去重保证每个计划最多一个未完成实例。
    /// 注册表服务不了的类型直接重新武装，不产生错误运行。
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 实际入队的任务数
    /// * `Err(QueueError)` - 仓库访问失败
    pub async fn pump_due(&self, now: DateTime<Utc>) -> Result<usize, QueueError> {
        self.plans.clear_expired_blocks(now).await?;

        let due = self.plans.get_due(now).await?;
        let mut inserted = 0;
        for plan in due {
            if self.registry.get(plan.task_kind).is_none() {
                debug!(
                    server_id = plan.server_id,
                    kind = %plan.task_kind,
                    "No handler registered for due plan, re-arming"
                );
                self.plans
                    .advance(plan.server_id, plan.task_kind, now)
                    .await?;
                continue;
            }
            if self.queue.offer_scheduled(plan.server_id, plan.task_kind) {
                inserted += 1;
            }
        }
        if inserted > 0 {
            debug!("Queued {} due scheduled tasks", inserted);
        }
        Ok(inserted)
    }

    /// 计算没有工作时的休眠截止时刻
    ///
    /// 取所有活跃未封锁计划中最近的到期时间，避免忙轮询
    pub async fn next_wakeup(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, QueueError> {
        Ok(self.plans.next_wakeup(now).await?)
    }
}

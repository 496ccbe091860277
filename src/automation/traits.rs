// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::session::GameSession;
use crate::domain::models::activity_log::ActivityEventType;
use crate::domain::models::task_kind::TaskKind;
use async_trait::async_trait;

/// 任务处理器的执行上下文
///
/// Worker在每次运行前组装，携带目标服务器与可选的手动载荷
#[derive(Debug, Clone, Default)]
pub struct HandlerContext {
    /// 目标服务器ID
    pub server_id: i32,
    /// 本次运行关联的村庄ID（如有）
    pub village_id: Option<i32>,
    /// 手动任务附带的载荷
    pub payload: Option<serde_json::Value>,
}

/// 处理器运行结果分类
///
/// 处理器把游戏端的反机器人拦截和会话失效作为一等结果上报，
/// 而不是笼统的错误，恢复策略据此决定封锁或重登
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// 运行成功
    Success,
    /// 游戏端弹出验证码，账号被反机器人拦截
    AntiBotBlocked,
    /// 会话已失效，响应跳转到登录页
    SessionInvalid,
    /// 其他错误
    Error(String),
}

/// 处理器产生的活动事件
///
/// Worker负责落库，处理器只声明发生了什么
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    /// 事件类型
    pub event_type: ActivityEventType,
    /// 事件消息
    pub message: String,
    /// 附加数据
    pub metadata: Option<serde_json::Value>,
}

impl ActivityEvent {
    /// 创建一条信息事件
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            event_type: ActivityEventType::Info,
            message: message.into(),
            metadata: None,
        }
    }

    /// 创建一条成功事件
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            event_type: ActivityEventType::Success,
            message: message.into(),
            metadata: None,
        }
    }

    /// 携带附加数据
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// 处理器运行报告
#[derive(Debug, Clone)]
pub struct HandlerReport {
    /// 运行结果
    pub outcome: HandlerOutcome,
    /// 运行期间的细粒度事件
    pub events: Vec<ActivityEvent>,
    /// 写入执行日志的摘要
    pub summary: Option<String>,
}

impl HandlerReport {
    /// 构造成功报告
    pub fn success() -> Self {
        Self {
            outcome: HandlerOutcome::Success,
            events: Vec::new(),
            summary: None,
        }
    }

    /// 构造错误报告
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            outcome: HandlerOutcome::Error(message.into()),
            events: Vec::new(),
            summary: None,
        }
    }

    /// 构造指定结果的报告
    pub fn with_outcome(outcome: HandlerOutcome) -> Self {
        Self {
            outcome,
            events: Vec::new(),
            summary: None,
        }
    }

    /// 追加活动事件
    pub fn push_event(mut self, event: ActivityEvent) -> Self {
        self.events.push(event);
        self
    }

    /// 设置摘要
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// 游戏自动化任务处理器特质
///
/// 每个任务类型对应一个处理器实现。处理器在给定会话上执行游戏内
/// 操作，不关心调度、重试或封锁，这些由Worker和恢复策略负责。
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// 处理器负责的任务类型
    fn kind(&self) -> TaskKind;

    /// 在给定会话上执行一次任务
    async fn execute(&self, session: &GameSession, ctx: HandlerContext) -> HandlerReport;
}

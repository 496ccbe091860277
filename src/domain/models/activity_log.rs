// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 活动日志实体
///
/// 一次运行内的细粒度事件，零或多条。只由Worker和恢复策略写入，
/// 按执行ID读取用于运行详情视图，超过保留窗口后被定期清理。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    /// 日志唯一标识符
    pub id: Uuid,
    /// 所属执行日志ID，部分事件不挂在具体运行下
    pub execution_log_id: Option<Uuid>,
    /// 服务器ID
    pub server_id: i32,
    /// 操作类型，通常是任务类型字符串
    pub operation_type: String,
    /// 事件类型
    pub event_type: ActivityEventType,
    /// 事件消息
    pub message: String,
    /// 自由格式的附加数据
    pub metadata: Option<serde_json::Value>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 活动事件类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventType {
    /// 会话失效，需要重新登录
    SessionExpired,
    /// 被反机器人验证码拦截
    RecaptchaBlocked,
    /// 成功事件
    Success,
    /// 错误事件
    Error,
    /// 信息事件
    Info,
}

impl fmt::Display for ActivityEventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActivityEventType::SessionExpired => write!(f, "session_expired"),
            ActivityEventType::RecaptchaBlocked => write!(f, "recaptcha_blocked"),
            ActivityEventType::Success => write!(f, "success"),
            ActivityEventType::Error => write!(f, "error"),
            ActivityEventType::Info => write!(f, "info"),
        }
    }
}

impl FromStr for ActivityEventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_expired" => Ok(ActivityEventType::SessionExpired),
            "recaptcha_blocked" => Ok(ActivityEventType::RecaptchaBlocked),
            "success" => Ok(ActivityEventType::Success),
            "error" => Ok(ActivityEventType::Error),
            "info" => Ok(ActivityEventType::Info),
            _ => Err(()),
        }
    }
}

impl ActivityLog {
    /// 创建一条活动记录
    pub fn new(
        execution_log_id: Option<Uuid>,
        server_id: i32,
        operation_type: impl Into<String>,
        event_type: ActivityEventType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            execution_log_id,
            server_id,
            operation_type: operation_type.into(),
            event_type,
            message: message.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// 附加自由格式数据
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

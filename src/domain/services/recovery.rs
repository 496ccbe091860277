// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CrawlerSettings;
use chrono::{DateTime, Duration, Utc};

/// 失败种类
///
/// Worker把处理器结果和抛出的失败归入这些类别后交给恢复策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 被反机器人验证码拦截
    RecaptchaBlocked,
    /// 会话失效（Cookie过期或登录被拒）
    SessionExpired,
    /// 处理器超时
    HandlerTimeout,
    /// 其他处理器错误
    HandlerError,
}

/// 恢复动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 封锁该服务器的全部计划直到给定时间
    BlockServer { until: DateTime<Utc> },
    /// 立即强制重新登录并重试一次
    RetryWithRelogin,
    /// 较长冷却，用于区分网络抖动与真实检测
    CooldownServer { until: DateTime<Utc> },
    /// 记录后继续循环
    Continue,
}

/// 恢复策略
///
/// 纯决策函数：(失败种类, 服务器连续失败计数) → 动作。
/// 不做任何IO，冷却时长来自配置。
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    recaptcha_cooldown: Duration,
    session_cooldown: Duration,
}

impl RecoveryPolicy {
    pub fn new(recaptcha_cooldown: Duration, session_cooldown: Duration) -> Self {
        Self {
            recaptcha_cooldown,
            session_cooldown,
        }
    }

    pub fn from_settings(settings: &CrawlerSettings) -> Self {
        Self::new(
            Duration::seconds(settings.recaptcha_cooldown_secs as i64),
            Duration::seconds(settings.session_cooldown_secs as i64),
        )
    }

    /// 决定恢复动作
    ///
    /// # 参数
    ///
    /// * `failure` - 失败种类
    /// * `consecutive_session_failures` - 该服务器此前的连续会话失败次数
    /// * `now` - 当前时间
    ///
    /// # 规则
    ///
    /// * RecaptchaBlocked：封锁整个服务器的调度一段冷却时间
    /// * SessionExpired：第一次立即强制重登重试；再次连续失败
    ///   升级为较长冷却而不是封锁，区分抖动与检测
    /// * 超时和其他错误：记录后继续，单个任务失败不影响Worker
    pub fn decide(
        &self,
        failure: FailureKind,
        consecutive_session_failures: u32,
        now: DateTime<Utc>,
    ) -> RecoveryAction {
        match failure {
            FailureKind::RecaptchaBlocked => RecoveryAction::BlockServer {
                until: now + self.recaptcha_cooldown,
            },
            FailureKind::SessionExpired => {
                if consecutive_session_failures == 0 {
                    RecoveryAction::RetryWithRelogin
                } else {
                    RecoveryAction::CooldownServer {
                        until: now + self.session_cooldown,
                    }
                }
            }
            FailureKind::HandlerTimeout | FailureKind::HandlerError => RecoveryAction::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RecoveryPolicy {
        RecoveryPolicy::new(Duration::minutes(30), Duration::minutes(10))
    }

    #[test]
    fn test_recaptcha_blocks_for_configured_cooldown() {
        let now = Utc::now();
        match policy().decide(FailureKind::RecaptchaBlocked, 0, now) {
            RecoveryAction::BlockServer { until } => {
                assert_eq!(until, now + Duration::minutes(30));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_first_session_failure_retries_with_relogin() {
        let action = policy().decide(FailureKind::SessionExpired, 0, Utc::now());
        assert_eq!(action, RecoveryAction::RetryWithRelogin);
    }

    #[test]
    fn test_second_consecutive_session_failure_escalates_to_cooldown() {
        let now = Utc::now();
        match policy().decide(FailureKind::SessionExpired, 1, now) {
            RecoveryAction::CooldownServer { until } => {
                assert_eq!(until, now + Duration::minutes(10));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_plain_errors_continue() {
        let now = Utc::now();
        assert_eq!(
            policy().decide(FailureKind::HandlerTimeout, 0, now),
            RecoveryAction::Continue
        );
        assert_eq!(
            policy().decide(FailureKind::HandlerError, 3, now),
            RecoveryAction::Continue
        );
    }
}

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::session::GameSession;
use crate::domain::models::scheduled_attack::AttackType;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// 派兵错误类型
///
/// 反机器人拦截和会话失效是独立的一等错误，
/// 上层据此映射到对应的恢复动作
#[derive(Error, Debug)]
pub enum DispatchError {
    /// 派兵界面被反机器人验证码拦截
    #[error("Dispatch blocked by anti-bot verification")]
    AntiBotBlocked,
    /// 会话已失效
    #[error("Session no longer valid")]
    SessionInvalid,
    /// 其他失败
    #[error("Dispatch failed: {0}")]
    Failed(String),
}

/// 一次派兵指令
#[derive(Debug, Clone)]
pub struct DispatchOrder {
    /// 出发村庄ID（如有）
    pub village_id: Option<i32>,
    /// 出发坐标
    pub source_coordinates: String,
    /// 目标坐标，格式 "x|y"
    pub target_coordinates: String,
    /// 攻击类型
    pub attack_type: AttackType,
}

/// 部队派遣器特质
///
/// 把一条派兵指令转换成游戏端操作。攻击派遣和小规模攻击
/// 处理器共用同一个派遣器实现。
#[async_trait]
pub trait TroopDispatcher: Send + Sync {
    /// 在给定会话上派遣一次部队
    async fn dispatch(
        &self,
        session: &GameSession,
        order: &DispatchOrder,
    ) -> Result<(), DispatchError>;
}

/// 解析 "x|y" 格式的坐标
pub fn parse_coordinates(raw: &str) -> Result<(i32, i32), DispatchError> {
    let (x, y) = raw
        .split_once('|')
        .ok_or_else(|| DispatchError::Failed(format!("malformed coordinates: {raw}")))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|_| DispatchError::Failed(format!("malformed coordinates: {raw}")))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|_| DispatchError::Failed(format!("malformed coordinates: {raw}")))?;
    Ok((x, y))
}

/// 基于HTTP的部队派遣器
///
/// 向集结点界面提交派兵表单，根据响应内容分类结果
pub struct HttpTroopDispatcher;

#[async_trait]
impl TroopDispatcher for HttpTroopDispatcher {
    async fn dispatch(
        &self,
        session: &GameSession,
        order: &DispatchOrder,
    ) -> Result<(), DispatchError> {
        let (x, y) = parse_coordinates(&order.target_coordinates)?;
        let url = session
            .screen_url("place")
            .map_err(|e| DispatchError::Failed(e.to_string()))?;

        let village = order.village_id.map(|v| v.to_string()).unwrap_or_default();
        let x = x.to_string();
        let y = y.to_string();
        let attack_type = order.attack_type.to_string();
        let form = [
            ("village", village.as_str()),
            ("x", x.as_str()),
            ("y", y.as_str()),
            ("attack_type", attack_type.as_str()),
        ];

        let response = session
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| DispatchError::Failed(e.to_string()))?;
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::Failed(e.to_string()))?;

        if body.contains("bot_check") || body.contains("recaptcha") {
            return Err(DispatchError::AntiBotBlocked);
        }
        if final_url.path().contains("login") || body.contains("login_form") {
            return Err(DispatchError::SessionInvalid);
        }
        if body.contains("error_box") {
            return Err(DispatchError::Failed(
                "rally point rejected the command".to_string(),
            ));
        }

        debug!(
            server_id = session.server_id,
            target = %order.target_coordinates,
            attack_type = %order.attack_type,
            "Troop command submitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_coordinates() {
        assert_eq!(parse_coordinates("512|483").unwrap(), (512, 483));
        assert_eq!(parse_coordinates(" 1 | 2 ").unwrap(), (1, 2));
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(parse_coordinates("512483").is_err());
        assert!(parse_coordinates("512|abc").is_err());
        assert!(parse_coordinates("").is_err());
    }
}

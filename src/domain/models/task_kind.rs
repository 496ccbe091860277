// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 任务类型枚举
///
/// 定义了爬虫支持的全部自动化作业类型。集合是封闭的：
/// 处理器注册表在启动时按类型填充，运行期不做反射查找。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 建筑队列管理，检查并排入下一个建筑升级
    ConstructionQueue,
    /// 采集派遣，把空闲部队送去采集
    Scavenging,
    /// 小规模攻击派遣，按轮询游标循环打击目标列表
    MiniAttacks,
    /// 部队训练，按模板补充兵营队列
    ArmyTraining,
    /// 外部攻击计划同步，从TW数据库拉取已计划的行动
    TwDatabaseSync,
    /// 支援派遣，在时间窗口内发送已计划的支援
    SupportDispatch,
    /// 村庄信息同步，刷新村庄资源与建筑等级
    VillageSync,
}

impl TaskKind {
    /// 所有任务类型，按固定顺序
    pub const ALL: [TaskKind; 7] = [
        TaskKind::ConstructionQueue,
        TaskKind::Scavenging,
        TaskKind::MiniAttacks,
        TaskKind::ArmyTraining,
        TaskKind::TwDatabaseSync,
        TaskKind::SupportDispatch,
        TaskKind::VillageSync,
    ];

    /// 默认调度间隔
    ///
    /// 服务器激活时用该表初始化ServerPlan，之后可按服务器独立覆盖
    pub fn default_interval(&self) -> Duration {
        match self {
            TaskKind::ConstructionQueue => Duration::milliseconds(600_000),
            TaskKind::Scavenging => Duration::milliseconds(300_000),
            TaskKind::MiniAttacks => Duration::milliseconds(900_000),
            TaskKind::ArmyTraining => Duration::milliseconds(1_200_000),
            TaskKind::TwDatabaseSync => Duration::milliseconds(3_600_000),
            TaskKind::SupportDispatch => Duration::milliseconds(120_000),
            TaskKind::VillageSync => Duration::milliseconds(1_800_000),
        }
    }

    /// 预期执行时长，用于队列等待时间估算
    pub fn expected_duration(&self) -> Duration {
        match self {
            TaskKind::ConstructionQueue => Duration::seconds(10),
            TaskKind::Scavenging => Duration::seconds(15),
            TaskKind::MiniAttacks => Duration::seconds(20),
            TaskKind::ArmyTraining => Duration::seconds(10),
            TaskKind::TwDatabaseSync => Duration::seconds(30),
            TaskKind::SupportDispatch => Duration::seconds(10),
            TaskKind::VillageSync => Duration::seconds(15),
        }
    }

    /// 处理器硬超时
    ///
    /// 每种任务类型必须有上限，单个失控处理器不能卡死唯一的Worker
    pub fn timeout(&self) -> std::time::Duration {
        match self {
            TaskKind::TwDatabaseSync => std::time::Duration::from_secs(300),
            _ => std::time::Duration::from_secs(120),
        }
    }

    /// 调度优先级，数值越大越先执行
    ///
    /// 攻击相关类型排在被动同步类型之前，用于到期时间相同时的确定性排序
    pub fn priority(&self) -> i32 {
        match self {
            TaskKind::SupportDispatch => 100,
            TaskKind::MiniAttacks => 90,
            TaskKind::ConstructionQueue => 50,
            TaskKind::Scavenging => 40,
            TaskKind::ArmyTraining => 30,
            TaskKind::VillageSync => 20,
            TaskKind::TwDatabaseSync => 10,
        }
    }

    /// 执行日志中的人类可读标题
    pub fn title(&self) -> &'static str {
        match self {
            TaskKind::ConstructionQueue => "Construction queue",
            TaskKind::Scavenging => "Scavenging",
            TaskKind::MiniAttacks => "Mini attacks",
            TaskKind::ArmyTraining => "Army training",
            TaskKind::TwDatabaseSync => "TW database sync",
            TaskKind::SupportDispatch => "Support dispatch",
            TaskKind::VillageSync => "Village sync",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskKind::ConstructionQueue => write!(f, "construction_queue"),
            TaskKind::Scavenging => write!(f, "scavenging"),
            TaskKind::MiniAttacks => write!(f, "mini_attacks"),
            TaskKind::ArmyTraining => write!(f, "army_training"),
            TaskKind::TwDatabaseSync => write!(f, "tw_database_sync"),
            TaskKind::SupportDispatch => write!(f, "support_dispatch"),
            TaskKind::VillageSync => write!(f, "village_sync"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "construction_queue" => Ok(TaskKind::ConstructionQueue),
            "scavenging" => Ok(TaskKind::Scavenging),
            "mini_attacks" => Ok(TaskKind::MiniAttacks),
            "army_training" => Ok(TaskKind::ArmyTraining),
            "tw_database_sync" => Ok(TaskKind::TwDatabaseSync),
            "support_dispatch" => Ok(TaskKind::SupportDispatch),
            "village_sync" => Ok(TaskKind::VillageSync),
            _ => Err(()),
        }
    }
}

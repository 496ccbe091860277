// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、服务器、爬虫调度、留存清理和游戏端点等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 爬虫调度配置
    pub crawler: CrawlerSettings,
    /// 日志留存配置
    pub retention: RetentionSettings,
    /// 游戏端点配置
    pub game: GameSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 指标配置设置
#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出器
    pub enabled: bool,
    /// 导出器监听端口
    pub port: u16,
}

/// 爬虫调度配置设置
///
/// 冷却时长是运营策略，必须可配置而非硬编码
#[derive(Debug, Deserialize, Clone)]
pub struct CrawlerSettings {
    /// 反机器人检测后的冷却时长（秒）
    pub recaptcha_cooldown_secs: u64,
    /// 连续会话失效后的冷却时长（秒）
    pub session_cooldown_secs: u64,
    /// 状态视图中即将到期任务的最大数量
    pub lookahead_limit: usize,
    /// 手动任务终态的保留时长（秒）
    pub manual_task_retention_secs: u64,
    /// 任务间随机延迟下限（毫秒）
    pub jitter_min_ms: u64,
    /// 任务间随机延迟上限（毫秒）
    pub jitter_max_ms: u64,
}

/// 日志留存配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct RetentionSettings {
    /// 活动日志保留天数
    pub activity_log_days: i64,
    /// 留存清理扫描间隔（秒）
    pub sweep_interval_secs: u64,
}

/// 游戏端点配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct GameSettings {
    /// 游戏世界域名后缀，如 "plemiona.pl"
    pub base_domain: String,
    /// HTTP请求超时时间（秒）
    pub request_timeout_secs: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default metrics settings
            .set_default("metrics.enabled", true)?
            .set_default("metrics.port", 9090)?
            // Default crawler settings
            .set_default("crawler.recaptcha_cooldown_secs", 1800)?
            .set_default("crawler.session_cooldown_secs", 600)?
            .set_default("crawler.lookahead_limit", 10)?
            .set_default("crawler.manual_task_retention_secs", 300)?
            .set_default("crawler.jitter_min_ms", 500)?
            .set_default("crawler.jitter_max_ms", 2500)?
            // Default retention settings
            .set_default("retention.activity_log_days", 7)?
            .set_default("retention.sweep_interval_secs", 3600)?
            // Default game settings
            .set_default("game.base_domain", "plemiona.pl")?
            .set_default("game.request_timeout_secs", 30)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("TWCRAWLER").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;

// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::credential_repository::CredentialRepository;
use crate::domain::repositories::plan_repository::RepositoryError;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::cookie::Jar;
use reqwest::header::SET_COOKIE;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 服务器没有配置凭据
    #[error("No credentials configured for server {0}")]
    MissingCredentials(i32),
    /// 登录被游戏端拒绝
    #[error("Authentication failed: {0}")]
    AuthFailure(String),
    /// 登录页被反机器人验证码拦截
    #[error("Login blocked by anti-bot verification")]
    RecaptchaBlocked,
    /// 网络错误
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// 游戏端点URL无效
    #[error("Invalid game endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    /// 凭据仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 已建立的游戏会话
///
/// Cookie保存在客户端内部的Jar里，任务处理器直接用`client`发请求
#[derive(Debug, Clone)]
pub struct GameSession {
    /// 服务器ID
    pub server_id: i32,
    /// 游戏世界标识
    pub world: String,
    /// 游戏世界根URL
    pub base_url: Url,
    /// 携带会话Cookie的HTTP客户端
    pub client: reqwest::Client,
    /// 会话建立时间
    pub established_at: DateTime<Utc>,
}

impl GameSession {
    /// 拼接游戏界面URL，如 `screen_url("place")`
    pub fn screen_url(&self, screen: &str) -> Result<Url, SessionError> {
        Ok(self.base_url.join(&format!("game.php?screen={screen}"))?)
    }
}

/// 会话获取结果
///
/// `via_relogin`标记本次获取是否触发了真实登录，
/// Worker据此写入会话失效活动记录
#[derive(Debug)]
pub struct AcquiredSession {
    /// 会话本体
    pub session: GameSession,
    /// 是否通过重新登录建立
    pub via_relogin: bool,
}

/// 会话提供者特质
///
/// Worker每次运行前取会话，会话失效时取新会话。
/// 实现负责缓存、Cookie快照和登录重试。
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// 获取服务器会话，优先复用缓存或Cookie快照
    async fn acquire(&self, server_id: i32) -> Result<AcquiredSession, SessionError>;

    /// 丢弃现有会话并强制重新登录
    async fn acquire_fresh(&self, server_id: i32) -> Result<AcquiredSession, SessionError>;

    /// 使服务器的缓存会话失效
    async fn invalidate(&self, server_id: i32);
}

/// 基于HTTP登录的会话提供者
///
/// 进程内缓存每个服务器至多一个会话。冷启动时先尝试数据库里的
/// Cookie快照，快照不可用再走登录流程。登录成功后把响应的
/// Set-Cookie头持久化为新快照，进程重启后可以不登录直接复用。
pub struct HttpSessionProvider {
    credentials: Arc<dyn CredentialRepository>,
    base_domain: String,
    request_timeout: Duration,
    cache: DashMap<i32, GameSession>,
    endpoint_override: Option<Url>,
}

impl HttpSessionProvider {
    /// 创建新的会话提供者
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        base_domain: String,
        request_timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            base_domain,
            request_timeout,
            cache: DashMap::new(),
            endpoint_override: None,
        }
    }

    /// 创建指向固定端点的会话提供者
    ///
    /// 所有世界共用同一个根URL，用于对接本地模拟服务
    pub fn with_endpoint(
        credentials: Arc<dyn CredentialRepository>,
        endpoint: Url,
        request_timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            base_domain: String::new(),
            request_timeout,
            cache: DashMap::new(),
            endpoint_override: Some(endpoint),
        }
    }

    fn world_url(&self, world: &str) -> Result<Url, SessionError> {
        match &self.endpoint_override {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!("https://{}.{}/", world, self.base_domain))?),
        }
    }

    fn build_client(&self, jar: Arc<Jar>) -> Result<reqwest::Client, SessionError> {
        Ok(reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(self.request_timeout)
            .build()?)
    }

    /// 把数据库快照里的Cookie预装进Jar
    fn preload_cookies(jar: &Jar, base_url: &Url, snapshot: &serde_json::Value) -> usize {
        let mut loaded = 0;
        if let Some(entries) = snapshot.as_array() {
            for entry in entries {
                if let Some(cookie) = entry.as_str() {
                    jar.add_cookie_str(cookie, base_url);
                    loaded += 1;
                }
            }
        }
        loaded
    }

    /// 从缓存或Cookie快照恢复会话，都不可用时返回None
    async fn try_restore(&self, server_id: i32) -> Result<Option<GameSession>, SessionError> {
        if let Some(cached) = self.cache.get(&server_id) {
            debug!(server_id, "Reusing cached game session");
            return Ok(Some(cached.clone()));
        }

        let creds = self
            .credentials
            .find(server_id)
            .await?
            .ok_or(SessionError::MissingCredentials(server_id))?;
        let Some(snapshot) = creds.cookies else {
            return Ok(None);
        };

        let base_url = self.world_url(&creds.world)?;
        let jar = Arc::new(Jar::default());
        let loaded = Self::preload_cookies(&jar, &base_url, &snapshot);
        if loaded == 0 {
            return Ok(None);
        }

        debug!(server_id, cookies = loaded, "Restored session from cookie snapshot");
        let session = GameSession {
            server_id,
            world: creds.world,
            base_url,
            client: self.build_client(jar)?,
            established_at: Utc::now(),
        };
        self.cache.insert(server_id, session.clone());
        Ok(Some(session))
    }

    /// 执行登录流程并持久化新的Cookie快照
    async fn login(&self, server_id: i32) -> Result<GameSession, SessionError> {
        let creds = self
            .credentials
            .find(server_id)
            .await?
            .ok_or(SessionError::MissingCredentials(server_id))?;

        let base_url = self.world_url(&creds.world)?;
        let jar = Arc::new(Jar::default());
        let client = self.build_client(jar)?;
        let login_url = base_url.join("login")?;
        let params = [
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
            ("world", creds.world.as_str()),
        ];

        // Connection-level failures are retried, everything else is final
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(5))
            .with_max_elapsed_time(Some(Duration::from_secs(20)))
            .build();
        let response = backoff::future::retry(policy, || {
            let request = client.post(login_url.clone()).form(&params);
            async move {
                request.send().await.map_err(|e| {
                    if e.is_timeout() || e.is_connect() {
                        backoff::Error::transient(SessionError::Network(e))
                    } else {
                        backoff::Error::permanent(SessionError::Network(e))
                    }
                })
            }
        })
        .await?;

        if !response.status().is_success() {
            return Err(SessionError::AuthFailure(format!(
                "login endpoint returned {}",
                response.status()
            )));
        }

        let cookie_snapshot: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .collect();

        let body = response.text().await?;
        if body.contains("bot_check") || body.contains("recaptcha") {
            warn!(server_id, "Login page answered with anti-bot verification");
            return Err(SessionError::RecaptchaBlocked);
        }
        if body.contains("login_error") {
            return Err(SessionError::AuthFailure(
                "credentials rejected by game server".to_string(),
            ));
        }

        if !cookie_snapshot.is_empty() {
            self.credentials
                .save_cookies(server_id, serde_json::json!(cookie_snapshot))
                .await?;
        }

        info!(server_id, world = %creds.world, "Established fresh game session");
        let session = GameSession {
            server_id,
            world: creds.world,
            base_url,
            client,
            established_at: Utc::now(),
        };
        self.cache.insert(server_id, session.clone());
        Ok(session)
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn acquire(&self, server_id: i32) -> Result<AcquiredSession, SessionError> {
        if let Some(session) = self.try_restore(server_id).await? {
            return Ok(AcquiredSession {
                session,
                via_relogin: false,
            });
        }
        let session = self.login(server_id).await?;
        Ok(AcquiredSession {
            session,
            via_relogin: true,
        })
    }

    async fn acquire_fresh(&self, server_id: i32) -> Result<AcquiredSession, SessionError> {
        self.invalidate(server_id).await;
        self.credentials.clear_cookies(server_id).await?;
        let session = self.login(server_id).await?;
        Ok(AcquiredSession {
            session,
            via_relogin: true,
        })
    }

    async fn invalidate(&self, server_id: i32) {
        self.cache.remove(&server_id);
    }
}

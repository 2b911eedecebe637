//! Caller-owned client settings.
//!
//! A `ClientConfig` is consumed when building a transport, so changing it
//! never affects requests that are already in flight.

use std::env;
use std::time::Duration;

pub mod defaults {
    use std::time::Duration;

    pub const BASE: &str = "http://127.0.0.1:8888";
    pub const USER_AGENT: &str = concat!("graphite-api-client/", env!("CARGO_PKG_VERSION"));
    pub const TIMEOUT: Duration = Duration::from_secs(5);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
    pub const POOL_MAX_IDLE_PER_HOST: usize = 5;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub user_agent: String,
    /// Sent on every request, in insertion order. Repeated keys are kept.
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            headers: Vec::new(),
            timeout: defaults::TIMEOUT,
            connect_timeout: defaults::CONNECT_TIMEOUT,
            pool_max_idle_per_host: defaults::POOL_MAX_IDLE_PER_HOST,
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `GRAPHITE_TIMEOUT_SECS` and
    /// `GRAPHITE_USER_AGENT` when they are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env::var("GRAPHITE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(user_agent) = env::var("GRAPHITE_USER_AGENT") {
            if !user_agent.is_empty() {
                config.user_agent = user_agent;
            }
        }
        config
    }

    /// Adds a header sent with every request. A `User-Agent` key replaces the
    /// user agent instead.
    pub fn add_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key.eq_ignore_ascii_case("user-agent") {
            self.user_agent = value.into();
        } else {
            self.headers.push((key, value.into()));
        }
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }
}

/// HTTP Basic credentials for the render endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `GRAPHITE_USERNAME` / `GRAPHITE_PASSWORD`. None when no username
    /// is set.
    pub fn from_env() -> Option<Self> {
        let username = env::var("GRAPHITE_USERNAME").unwrap_or_default();
        if username.is_empty() {
            return None;
        }
        let password = env::var("GRAPHITE_PASSWORD").unwrap_or_default();
        Some(Self::new(username, password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use super::{auth::AccessTokenKey, services::GuildServices};

pub const DEFAULT_JSON_BODY_LIMIT_BYTES: usize = 1_048_576;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RATE_LIMIT_REQUESTS_PER_MINUTE: u32 = 60;
pub(crate) const METRICS_TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub(crate) static METRICS_STATE: OnceLock<MetricsState> = OnceLock::new();

#[derive(Default)]
pub(crate) struct MetricsState {
    pub(crate) guard_outcomes: Mutex<HashMap<&'static str, u64>>,
    pub(crate) upstream_failures: Mutex<HashMap<&'static str, u64>>,
    pub(crate) auth_failures: Mutex<HashMap<&'static str, u64>>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    pub rate_limit_requests_per_minute: u32,
    /// Base64 encoded 32 byte key for access tokens. A random key is used when unset.
    pub access_token_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_JSON_BODY_LIMIT_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            rate_limit_requests_per_minute: DEFAULT_RATE_LIMIT_REQUESTS_PER_MINUTE,
            access_token_key: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub(crate) services: GuildServices,
    pub(crate) token_key: Arc<AccessTokenKey>,
}

impl AppState {
    pub(crate) fn new(config: &AppConfig, services: GuildServices) -> anyhow::Result<Self> {
        let token_key = match &config.access_token_key {
            Some(encoded) => AccessTokenKey::from_base64(encoded)?,
            None => AccessTokenKey::generate()?,
        };
        Ok(Self {
            services,
            token_key: Arc::new(token_key),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: guildgate_core::UserId,
}

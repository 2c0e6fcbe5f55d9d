use std::env;

use agm_common::Secret;
use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_AGM_HOST: &str = "127.0.0.1";
const DEFAULT_AGM_PORT: u16 = 4600;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 50;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The size of the buffer on each notification channel. Dispatch is fire-and-forget, so a full buffer only
    /// ever delays publication, it never fails a request.
    pub event_buffer_size: usize,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_AGM_HOST.to_string(),
            port: DEFAULT_AGM_PORT,
            database_url: String::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("AGM_HOST").ok().unwrap_or_else(|| DEFAULT_AGM_HOST.into());
        let port = env::var("AGM_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for AGM_PORT. {e} Using the default, {DEFAULT_AGM_PORT}, instead."
                    );
                    DEFAULT_AGM_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_AGM_PORT);
        let database_url = env::var("AGM_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ AGM_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let event_buffer_size = env::var("AGM_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for AGM_EVENT_BUFFER_SIZE. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            warn!(
                "🪛️ AGM_JWT_SECRET is not set. A random signing secret has been generated for this run; access \
                 tokens will not survive a server restart."
            );
            AuthConfig::default()
        });
        Self { host, port, database_url, event_buffer_size, auth }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The symmetric secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Option<Self> {
        let secret = env::var("AGM_JWT_SECRET").ok().filter(|s| !s.trim().is_empty())?;
        let token_lifetime = env::var("AGM_TOKEN_LIFETIME_HOURS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for AGM_TOKEN_LIFETIME_HOURS. {e}"))
                    .ok()
            })
            .map(Duration::hours)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        Some(Self { jwt_secret: Secret::new(secret), token_lifetime })
    }
}

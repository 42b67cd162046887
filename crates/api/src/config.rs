//! Runtime configuration.
//!
//! The binary collects values (typed flags with environment fallbacks) into
//! [`RawConfig`]; [`AppConfig::from_raw`] applies defaults and validates them
//! once at startup.

use std::{fmt::Display, net::SocketAddr, time::Duration};

use secrecy::{ExposeSecret, SecretString};
use services::CalendarConfig;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_CAPACITY: usize = 512;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Settings as supplied, one field per environment variable. `None` means unset.
#[derive(Debug, Default, Clone)]
pub struct RawConfig {
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    pub auth_url: Option<String>,
    pub auth_anon_key: Option<String>,
    pub auth_service_role_key: Option<String>,
    pub auth_cookie_name: Option<String>,
    pub cookie_secure: Option<bool>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub google_refresh_token: Option<String>,
    pub bind: Option<SocketAddr>,
    pub analytics_cache_ttl_secs: Option<u64>,
    pub analytics_cache_capacity: Option<usize>,
    pub allowed_origins: Option<String>,
}

/// Validated configuration.
///
/// Holds secrets, so it is not `Clone`; share it behind an `Arc`.
#[derive(Debug)]
pub struct AppConfig {
    pub database_url: SecretString,
    pub db_max_connections: u32,
    pub auth_url: Url,
    pub auth_anon_key: SecretString,
    pub auth_service_role_key: Option<SecretString>,
    pub auth_cookie_name: String,
    pub cookie_secure: bool,
    pub bind: SocketAddr,
    pub analytics_cache_ttl: Duration,
    pub analytics_cache_capacity: usize,
    pub allowed_origins: Vec<String>,
    /// `None` when the Google client id, secret or redirect URI is missing.
    pub calendar: Option<CalendarConfig>,
}

impl AppConfig {
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let database_url = required(raw.database_url, "DATABASE_URL")?;
        let auth_url = required(raw.auth_url, "AUTH_URL")?;
        let auth_url = Url::parse(&auth_url).map_err(|e| ConfigError::Invalid {
            key: "AUTH_URL",
            message: e.to_string(),
        })?;
        let auth_anon_key = required(raw.auth_anon_key, "AUTH_ANON_KEY")?;

        let auth_cookie_name = match non_empty(raw.auth_cookie_name) {
            Some(name) => name,
            None => default_cookie_name(&auth_url),
        };

        let calendar = calendar_config(
            raw.google_client_id,
            raw.google_client_secret,
            raw.google_redirect_uri,
            raw.google_refresh_token,
        );

        let db_max_connections = at_least_one(or_default(
            raw.db_max_connections,
            "DB_MAX_CONNECTIONS",
            DEFAULT_DB_MAX_CONNECTIONS,
        ))
        .ok_or_else(|| positive("DB_MAX_CONNECTIONS"))?;
        let analytics_cache_capacity = at_least_one(or_default(
            raw.analytics_cache_capacity,
            "ANALYTICS_CACHE_CAPACITY",
            DEFAULT_CACHE_CAPACITY,
        ))
        .ok_or_else(|| positive("ANALYTICS_CACHE_CAPACITY"))?;

        Ok(Self {
            database_url: SecretString::new(database_url),
            db_max_connections,
            auth_url,
            auth_anon_key: SecretString::new(auth_anon_key),
            auth_service_role_key: non_empty(raw.auth_service_role_key).map(SecretString::new),
            auth_cookie_name,
            cookie_secure: or_default(raw.cookie_secure, "COOKIE_SECURE", true),
            bind: or_default(raw.bind, "BIND", SocketAddr::from(([0, 0, 0, 0], 3000))),
            analytics_cache_ttl: Duration::from_secs(or_default(
                raw.analytics_cache_ttl_secs,
                "ANALYTICS_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
            analytics_cache_capacity,
            allowed_origins: non_empty(raw.allowed_origins)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            calendar,
        })
    }

    /// Human-readable settings with every secret redacted.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let set = |present: bool| if present { "<set>" } else { "<unset>" }.to_owned();
        vec![
            ("DATABASE_URL", redact_url(self.database_url.expose_secret())),
            ("DB_MAX_CONNECTIONS", self.db_max_connections.to_string()),
            ("AUTH_URL", self.auth_url.to_string()),
            ("AUTH_ANON_KEY", set(true)),
            ("AUTH_SERVICE_ROLE_KEY", set(self.auth_service_role_key.is_some())),
            ("AUTH_COOKIE_NAME", self.auth_cookie_name.clone()),
            ("COOKIE_SECURE", self.cookie_secure.to_string()),
            ("BIND", self.bind.to_string()),
            (
                "ANALYTICS_CACHE_TTL_SECS",
                self.analytics_cache_ttl.as_secs().to_string(),
            ),
            (
                "ANALYTICS_CACHE_CAPACITY",
                self.analytics_cache_capacity.to_string(),
            ),
            ("ALLOWED_ORIGINS", self.allowed_origins.join(",")),
            (
                "GOOGLE_CALENDAR",
                match &self.calendar {
                    None => "disabled".to_owned(),
                    Some(c) if c.refresh_token.is_some() => "enabled".to_owned(),
                    Some(_) => "enabled (no refresh token)".to_owned(),
                },
            ),
        ]
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::Missing(key))
}

fn or_default<T: Display>(value: Option<T>, key: &'static str, default: T) -> T {
    value.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default
    })
}

fn at_least_one<T: PartialOrd + From<u8>>(value: T) -> Option<T> {
    (value >= T::from(1)).then_some(value)
}

fn positive(key: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: "must be at least 1".into(),
    }
}

fn calendar_config(
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    refresh_token: Option<String>,
) -> Option<CalendarConfig> {
    match (
        non_empty(client_id),
        non_empty(client_secret),
        non_empty(redirect_uri),
    ) {
        (Some(client_id), Some(client_secret), Some(redirect_uri)) => Some(CalendarConfig {
            client_id,
            client_secret: SecretString::new(client_secret),
            redirect_uri,
            refresh_token: non_empty(refresh_token).map(SecretString::new),
        }),
        (None, None, None) => None,
        _ => {
            warn!("Google calendar settings are incomplete, calendar integration disabled");
            None
        }
    }
}

/// `sb-<first host label>-auth-token`, the name the auth provider's browser
/// client uses for a project URL.
pub fn default_cookie_name(auth_url: &Url) -> String {
    let host = auth_url.host_str().unwrap_or("localhost");
    let label = host.split('.').next().unwrap_or(host);
    format!("sb-{label}-auth-token")
}

fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                // Only fails for URLs that cannot carry credentials.
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable>".to_owned(),
    }
}

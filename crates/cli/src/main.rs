//! `recruit-admin` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: start the HTTP API.
//! - `check-config`: validate settings and print them with secrets redacted.
//! - `gate`: show how the session gate treats a path.

use anyhow::Context;
use api::config::{AppConfig, RawConfig};
use auth::{GateDecision, RouteTable};
use std::net::SocketAddr;

use clap::{builder::BoolishValueParser, value_parser, ArgAction, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "recruit-admin",
    about = "Recruiting admin backend for schools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server.
    Serve(Settings),
    /// Validate the configuration and print it with secrets redacted.
    CheckConfig(Settings),
    /// Classify a request path and show the gate decision.
    Gate {
        /// Request path, e.g. `/dashboard/jobs`.
        path: String,
        /// Treat the request as carrying a valid session.
        #[arg(long)]
        signed_in: bool,
    },
}

/// Every setting as a flag with an environment fallback.
#[derive(Args)]
struct Settings {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
    #[arg(long, env = "DB_MAX_CONNECTIONS", value_parser = value_parser!(u32).range(1..))]
    db_max_connections: Option<u32>,
    #[arg(long, env = "AUTH_URL")]
    auth_url: Option<String>,
    #[arg(long, env = "AUTH_ANON_KEY", hide_env_values = true)]
    auth_anon_key: Option<String>,
    #[arg(long, env = "AUTH_SERVICE_ROLE_KEY", hide_env_values = true)]
    auth_service_role_key: Option<String>,
    #[arg(long, env = "AUTH_COOKIE_NAME")]
    auth_cookie_name: Option<String>,
    /// Accepts true/false, yes/no, on/off or 1/0.
    #[arg(long, env = "COOKIE_SECURE", action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    cookie_secure: Option<bool>,
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    google_client_id: Option<String>,
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    google_client_secret: Option<String>,
    #[arg(long, env = "GOOGLE_REDIRECT_URI")]
    google_redirect_uri: Option<String>,
    #[arg(long, env = "GOOGLE_REFRESH_TOKEN", hide_env_values = true)]
    google_refresh_token: Option<String>,
    #[arg(long, env = "BIND")]
    bind: Option<SocketAddr>,
    #[arg(long, env = "ANALYTICS_CACHE_TTL_SECS", value_parser = value_parser!(u64).range(1..))]
    analytics_cache_ttl_secs: Option<u64>,
    #[arg(long, env = "ANALYTICS_CACHE_CAPACITY")]
    analytics_cache_capacity: Option<usize>,
    /// Comma-separated origins allowed to call the API with credentials.
    #[arg(long, env = "ALLOWED_ORIGINS")]
    allowed_origins: Option<String>,
}

impl From<Settings> for RawConfig {
    fn from(s: Settings) -> Self {
        RawConfig {
            database_url: s.database_url,
            db_max_connections: s.db_max_connections,
            auth_url: s.auth_url,
            auth_anon_key: s.auth_anon_key,
            auth_service_role_key: s.auth_service_role_key,
            auth_cookie_name: s.auth_cookie_name,
            cookie_secure: s.cookie_secure,
            google_client_id: s.google_client_id,
            google_client_secret: s.google_client_secret,
            google_redirect_uri: s.google_redirect_uri,
            google_refresh_token: s.google_refresh_token,
            bind: s.bind,
            analytics_cache_ttl_secs: s.analytics_cache_ttl_secs,
            analytics_cache_capacity: s.analytics_cache_capacity,
            allowed_origins: s.allowed_origins,
        }
    }
}

fn load(settings: Settings) -> anyhow::Result<AppConfig> {
    AppConfig::from_raw(settings.into()).context("invalid configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(settings) => {
            let config = load(settings)?;
            info!("Starting API server on {}", config.bind);
            api::serve(config).await.context("server failed")?;
        }
        Command::CheckConfig(settings) => {
            let config = load(settings)?;
            for (key, value) in config.summary() {
                println!("{key:<26} {value}");
            }
        }
        Command::Gate { path, signed_in } => {
            let table = RouteTable::default();
            let class = table.classify(&path);
            match table.decide(&path, signed_in) {
                GateDecision::Pass => println!("{path}: {class:?}, pass"),
                GateDecision::Redirect(to) => println!("{path}: {class:?}, redirect to {to}"),
            }
        }
    }

    Ok(())
}

//! `api` crate — HTTP surface of the recruiting admin backend.
//!
//! Exposes (all JSON):
//!   GET    /api/health
//!   GET    /api/session, /api/session/redirect      POST /api/auth/signout
//!   GET|PUT /api/admin/profile
//!   POST   /api/schools, /api/schools/join          GET /api/schools/search
//!   GET|PUT /api/school
//!   /api/jobs[/:id[/status|/applications]]
//!   /api/applications[/:id[/status|/notes|/rating]]
//!   /api/interviews[/availability|/:id[/feedback|/calendar-sync]], /api/panelists
//!   /api/invitations[/:id|/token/:token|/accept]
//!   GET    /api/school-kpis, /api/analytics/*
//!   GET    /api/calendar/auth-url, /api/calendar/callback
//!
//! Every request passes through [`middleware::session_gate`].

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod params;
pub mod state;

#[cfg(test)]
mod handlers_tests;
#[cfg(test)]
mod test_support;

use std::{sync::Arc, time::Duration};

use auth::{CookieOptions, GoTrueClient, SessionBridge};
use axum::{
    http::{
        header::{CONTENT_TYPE, COOKIE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use db::{pool::create_lazy_pool, PgDirectory, PgProcedures};
use secrecy::{ExposeSecret, SecretString};
use services::{GoogleCalendar, ResponseCache};
use thiserror::Error;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    handlers::{
        admin, analytics, applications, calendar, interviews, invitations, jobs, schools, session,
    },
    state::AppState,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Db(#[from] db::DbError),

    #[error("auth provider: {0}")]
    Auth(#[from] auth::AuthError),

    #[error("calendar: {0}")]
    Calendar(#[from] services::CalendarError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// All routes, wrapped in the session middleware and request tracing.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/session", get(session::current))
        .route("/session/redirect", get(session::redirect))
        .route("/auth/signout", post(session::sign_out))
        .route(
            "/admin/profile",
            get(admin::profile).put(admin::update_profile),
        )
        .route("/schools", post(schools::create))
        .route("/schools/search", get(schools::search))
        .route("/schools/join", post(schools::join))
        .route("/school", get(schools::get).put(schools::update))
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route(
            "/jobs/:id",
            get(jobs::get).put(jobs::update).delete(jobs::delete),
        )
        .route("/jobs/:id/status", axum::routing::put(jobs::set_status))
        .route("/jobs/:id/applications", get(jobs::applications))
        .route("/applications", get(applications::list))
        .route("/applications/:id", get(applications::get))
        .route(
            "/applications/:id/status",
            axum::routing::put(applications::set_status),
        )
        .route("/applications/:id/notes", post(applications::add_note))
        .route("/applications/:id/rating", post(applications::rate))
        .route(
            "/interviews",
            get(interviews::list).post(interviews::schedule),
        )
        .route("/interviews/availability", post(interviews::availability))
        .route(
            "/interviews/:id",
            get(interviews::get)
                .put(interviews::reschedule)
                .delete(interviews::cancel),
        )
        .route("/interviews/:id/feedback", post(interviews::feedback))
        .route(
            "/interviews/:id/calendar-sync",
            post(interviews::calendar_sync),
        )
        .route("/panelists", get(interviews::panelists))
        .route(
            "/invitations",
            get(invitations::list).post(invitations::create),
        )
        .route("/invitations/accept", post(invitations::accept))
        .route("/invitations/token/:token", get(invitations::by_token))
        .route("/invitations/:id", delete(invitations::revoke))
        .route("/school-kpis", get(analytics::school_kpis))
        .route(
            "/analytics/application-distribution",
            get(analytics::application_distribution),
        )
        .route("/analytics/hiring-funnel", get(analytics::hiring_funnel))
        .route("/analytics/time-to-hire", get(analytics::time_to_hire))
        .route("/analytics/sources", get(analytics::sources))
        .route(
            "/analytics/recent-activity",
            get(analytics::recent_activity),
        )
        .route("/calendar/auth-url", get(calendar::auth_url))
        .route("/calendar/callback", get(calendar::callback));

    Router::new()
        .nest("/api", api)
        .layer(from_fn_with_state(state.clone(), middleware::session_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured admin UI origins; `None` when none are set.
pub fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("ignoring invalid origin {o}: {e}");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, COOKIE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(60 * 60)),
    )
}

/// Production state: Postgres, the auth server and (optionally) Google Calendar.
pub fn build_state(config: AppConfig) -> Result<AppState, StartupError> {
    let pool = create_lazy_pool(config.database_url.expose_secret(), config.db_max_connections)?;

    let provider = GoTrueClient::new(
        config.auth_url.as_str(),
        SecretString::new(config.auth_anon_key.expose_secret().clone()),
    )?;
    let cookie_options = CookieOptions {
        secure: config.cookie_secure,
        ..CookieOptions::default()
    };
    let sessions = SessionBridge::new(Arc::new(provider), config.auth_cookie_name, cookie_options);

    let mut state = AppState::new(
        Arc::new(PgProcedures::new(pool.clone())),
        Arc::new(PgDirectory::new(pool)),
        sessions,
    )
    .with_analytics_cache(ResponseCache::new(
        config.analytics_cache_ttl,
        config.analytics_cache_capacity,
    ));

    match config.calendar {
        Some(calendar) => state = state.with_google_calendar(GoogleCalendar::new(calendar)?),
        None => info!("calendar integration disabled"),
    }
    Ok(state)
}

/// Bind, serve until Ctrl+C / SIGTERM, then drain.
pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    let bind = config.bind;
    let cors = cors_layer(&config.allowed_origins);
    let state = build_state(config)?;

    let mut app = router(state);
    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    info!("Binding to {bind}");
    let listener = TcpListener::bind(bind).await?;
    info!("Server running on {bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

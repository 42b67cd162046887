//! HTTP error taxonomy. Every failure renders as `{ "error": message }`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use db::{DbError, ErrorClass};
use serde_json::{json, Value};
use services::CalendarError;
use thiserror::Error;
use tracing::error;

/// Message returned for every unexpected failure.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Requested panelists are busy; the conflicting rows go back to the caller.
    #[error("One or more panelists are unavailable for the selected time")]
    Conflicts(Value),

    #[error("Unauthorized")]
    Unauthorized,

    /// Signed in, but the caller's role does not allow the action.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Gone(String),

    #[error("{0} is not configured")]
    MissingConfig(&'static str),

    /// A remote call failed; its message is passed through.
    #[error("{0}")]
    Upstream(String),

    /// Anything unexpected. The detail is logged, never returned.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        Self::BadRequest(format!("Missing required field: {field}"))
    }

    pub fn no_school() -> Self {
        Self::NotFound("No school associated with this account".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Conflicts(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone(_) => StatusCode::GONE,
            Self::MissingConfig(_) | Self::Upstream(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::MissingConfig(what) => {
                error!("{what} is not configured");
                json!({ "error": self.to_string() })
            }
            Self::Upstream(message) => {
                error!("remote call failed: {message}");
                json!({ "error": message })
            }
            Self::Internal(detail) => {
                error!("internal error: {detail}");
                json!({ "error": INTERNAL_MESSAGE })
            }
            Self::Conflicts(conflicts) => json!({
                "error": self.to_string(),
                "conflicts": conflicts,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match (err.class(), err) {
            (_, DbError::Sqlx(e)) => Self::Internal(format!("database error: {e}")),
            (ErrorClass::NotFound, DbError::NotFound) => Self::NotFound("Not found".into()),
            (ErrorClass::NotFound, e) => Self::NotFound(e.to_string()),
            (ErrorClass::BadRequest, e) => Self::BadRequest(e.to_string()),
            (ErrorClass::Unauthorized, _) => Self::Unauthorized,
            (ErrorClass::Upstream, e) => Self::Upstream(e.to_string()),
        }
    }
}

impl From<auth::AuthError> for ApiError {
    fn from(err: auth::AuthError) -> Self {
        Self::Internal(format!("session resolution failed: {err}"))
    }
}

impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::NotConfigured => Self::MissingConfig("Calendar integration"),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

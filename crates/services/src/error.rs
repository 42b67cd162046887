//! Calendar error type.

use thiserror::Error;

/// Errors returned by a [`crate::CalendarProvider`].
///
/// The sync dispatcher uses the variant to decide retry behaviour:
/// - `Retryable` — the call is retried with exponential back-off.
/// - `Fatal`     — the attendee is reported as failed immediately.
#[derive(Debug, Error, Clone)]
pub enum CalendarError {
    /// No refresh token (or client credentials) configured.
    #[error("calendar integration is not configured")]
    NotConfigured,

    /// Transient failure; worth retrying.
    #[error("retryable calendar error: {0}")]
    Retryable(String),

    /// Permanent failure; no retry should be attempted.
    #[error("fatal calendar error: {0}")]
    Fatal(String),
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Fatal(err.to_string())
        } else {
            Self::Retryable(err.to_string())
        }
    }
}

//! Auth-level error type.

use thiserror::Error;

/// Errors returned while talking to the auth provider.
///
/// Rejections of a token are not errors: [`crate::AuthProvider::get_user`]
/// reports them as `Ok(None)` and a rejected refresh is `RefreshRejected`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider refused the refresh token (revoked, reused or expired).
    #[error("refresh token rejected: {0}")]
    RefreshRejected(String),

    /// The provider answered with an unexpected status.
    #[error("auth provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// Transport-level failure reaching the provider.
    #[error("auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider's response body could not be decoded.
    #[error("malformed auth provider response: {0}")]
    Malformed(String),
}

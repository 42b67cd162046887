//! The `AuthProvider` trait and the GoTrue HTTP client implementing it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{AuthError, AuthSession, User};

/// Remote identity operations the session bridge relies on.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the user owning `access_token`.
    ///
    /// Returns `Ok(None)` when the provider rejects the token.
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Revoke the session owning `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Client for a GoTrue-compatible auth server (`<base>/auth/v1/...`).
pub struct GoTrueClient {
    base_url: String,
    anon_key: SecretString,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueClient {
    /// Create a client for the auth server at `base_url`.
    pub fn new(base_url: impl Into<String>, anon_key: SecretString) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            anon_key,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn error_from(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let message = match response.json::<ProviderErrorBody>().await {
            Ok(body) => body
                .message
                .or(body.error)
                .unwrap_or_else(|| "no message".to_owned()),
            Err(_) => "unreadable error body".to_owned(),
        };
        AuthError::Provider { status, message }
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError> {
        let response = self
            .http
            .get(self.url("user"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let user = response
                    .json::<User>()
                    .await
                    .map_err(|e| AuthError::Malformed(e.to_string()))?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("access token rejected by auth provider");
                Ok(None)
            }
            _ => Err(Self::error_from(response).await),
        }
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .http
            .post(self.url("token?grant_type=refresh_token"))
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let session = response
                .json::<AuthSession>()
                .await
                .map_err(|e| AuthError::Malformed(e.to_string()))?;
            return Ok(session.normalize(chrono::Utc::now().timestamp()));
        }

        match Self::error_from(response).await {
            AuthError::Provider { message, .. }
                if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED =>
            {
                warn!("refresh token rejected: {message}");
                Err(AuthError::RefreshRejected(message))
            }
            other => Err(other),
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.url("logout"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;

        // An already-invalid token means the session is gone either way.
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(Self::error_from(response).await),
        }
    }
}

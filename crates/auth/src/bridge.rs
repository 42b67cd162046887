//! Session bridge — carries the caller's auth state between cookies and the provider.
//!
//! Every request goes through [`SessionBridge::resolve`]:
//! 1. Read (and reassemble) the auth cookie.
//! 2. Refresh the session through the provider if the access token is about
//!    to expire; the refreshed session comes back as `Set-Cookie`s that keep
//!    the same cookie name and options.
//! 3. Resolve the user owning the access token.
//!
//! Provider failures other than a rejected token are returned as errors and
//! fail the request.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::{
    AuthError, AuthProvider, AuthSession, User,
    cookies::{self, CookieOptions, SetCookie},
};

/// Refresh sessions whose access token expires within this many seconds.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

/// Outcome of resolving a request's session.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSession {
    /// The authenticated user, if the cookie carried a valid session.
    pub user: Option<User>,
    /// The (possibly refreshed) session.
    pub session: Option<AuthSession>,
    /// Cookies to copy onto the outgoing response.
    pub set_cookies: Vec<SetCookie>,
}

impl ResolvedSession {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Cookie-based session resolution against an [`AuthProvider`].
#[derive(Clone)]
pub struct SessionBridge {
    provider: Arc<dyn AuthProvider>,
    cookie_name: String,
    options: CookieOptions,
    refresh_margin_secs: i64,
}

impl SessionBridge {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        cookie_name: impl Into<String>,
        options: CookieOptions,
    ) -> Self {
        Self {
            provider,
            cookie_name: cookie_name.into(),
            options,
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS,
        }
    }

    pub fn with_refresh_margin(mut self, secs: i64) -> Self {
        self.refresh_margin_secs = secs;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Resolve the session carried by a `Cookie` header.
    pub async fn resolve(&self, cookie_header: Option<&str>) -> Result<ResolvedSession, AuthError> {
        self.resolve_at(cookie_header, chrono::Utc::now().timestamp())
            .await
    }

    /// [`Self::resolve`] with an explicit clock, in unix seconds.
    #[instrument(skip_all)]
    pub async fn resolve_at(
        &self,
        cookie_header: Option<&str>,
        now: i64,
    ) -> Result<ResolvedSession, AuthError> {
        let jar = cookies::parse_cookie_header(cookie_header.unwrap_or_default());
        let existing = cookies::stored_names(&jar, &self.cookie_name);

        let Some(raw) = cookies::read_chunked(&jar, &self.cookie_name) else {
            return Ok(ResolvedSession::default());
        };

        let Some(mut session) = cookies::decode_session(&raw) else {
            warn!("unreadable auth cookie, clearing it");
            return Ok(ResolvedSession {
                set_cookies: cookies::clear_all(&existing, &self.options),
                ..Default::default()
            });
        };

        let mut set_cookies = Vec::new();

        if session.expires_within(now, self.refresh_margin_secs) {
            debug!("access token expiring, refreshing session");
            match self.provider.refresh_session(&session.refresh_token).await {
                Ok(refreshed) => {
                    session = refreshed.normalize(now);
                    set_cookies = self.store(&session, &existing);
                    info!("session refreshed");
                }
                Err(AuthError::RefreshRejected(reason)) => {
                    info!("refresh rejected ({reason}), signing out");
                    return Ok(ResolvedSession {
                        set_cookies: cookies::clear_all(&existing, &self.options),
                        ..Default::default()
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let user = self.provider.get_user(&session.access_token).await?;
        if user.is_none() {
            debug!("access token rejected");
        }

        Ok(ResolvedSession {
            session: user.as_ref().map(|_| session),
            user,
            set_cookies,
        })
    }

    /// Cookies storing `session` under the configured name.
    pub fn store(&self, session: &AuthSession, existing: &[String]) -> Vec<SetCookie> {
        cookies::write_chunked(
            &self.cookie_name,
            &cookies::encode_session(session),
            &self.options,
            existing,
        )
    }

    /// Revoke the session at the provider and return cookies clearing it.
    ///
    /// Revocation is best effort: the cookies are cleared even when the
    /// provider call fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, cookie_header: Option<&str>) -> Vec<SetCookie> {
        let jar = cookies::parse_cookie_header(cookie_header.unwrap_or_default());
        let existing = cookies::stored_names(&jar, &self.cookie_name);

        if let Some(session) =
            cookies::read_chunked(&jar, &self.cookie_name).and_then(|raw| cookies::decode_session(&raw))
        {
            if let Err(e) = self.provider.sign_out(&session.access_token).await {
                warn!("provider sign-out failed: {e}");
            }
        }

        cookies::clear_all(&existing, &self.options)
    }
}

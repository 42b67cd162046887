//! Edge request gate — decides, per request path, whether to redirect.
//!
//! Paths are matched against three static prefix lists:
//! protected, auth-only and public. Decision table:
//! - protected AND no session AND not public → `/login?redirect=<path>`;
//! - auth-only AND session → `/`;
//! - otherwise → pass through.

use url::form_urlencoded;

/// Where unauthenticated visitors of protected pages are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where signed-in visitors of auth-only pages are sent.
pub const HOME_PATH: &str = "/";

/// Bucket a request path falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    AuthOnly,
    Public,
    Unlisted,
}

/// What the gate does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
}

/// The three prefix lists.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub protected: Vec<String>,
    pub auth_only: Vec<String>,
    pub public: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_owned()).collect();
        Self {
            protected: owned(&[
                "/",
                "/jobs",
                "/applications",
                "/candidates",
                "/interviews",
                "/analytics",
                "/settings",
                "/team",
            ]),
            auth_only: owned(&["/login", "/signup", "/forgot-password"]),
            public: owned(&[
                "/api",
                "/auth/callback",
                "/reset-password",
                "/invite",
                "/verify-email",
                "/health",
            ]),
        }
    }
}

/// `path` equals `prefix` or continues it with a `/` segment.
///
/// The root prefix only matches the root path itself.
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl RouteTable {
    fn any(list: &[String], path: &str) -> bool {
        list.iter().any(|prefix| matches_prefix(path, prefix))
    }

    pub fn is_protected(&self, path: &str) -> bool {
        Self::any(&self.protected, path)
    }

    pub fn is_auth_only(&self, path: &str) -> bool {
        Self::any(&self.auth_only, path)
    }

    pub fn is_public(&self, path: &str) -> bool {
        Self::any(&self.public, path)
    }

    /// The single bucket reported for diagnostics; public wins over the others.
    pub fn classify(&self, path: &str) -> PathClass {
        if self.is_public(path) {
            PathClass::Public
        } else if self.is_auth_only(path) {
            PathClass::AuthOnly
        } else if self.is_protected(path) {
            PathClass::Protected
        } else {
            PathClass::Unlisted
        }
    }

    /// Apply the decision table to a request for `path`.
    pub fn decide(&self, path: &str, has_session: bool) -> GateDecision {
        if self.is_protected(path) && !has_session && !self.is_public(path) {
            return GateDecision::Redirect(login_redirect(path));
        }
        if self.is_auth_only(path) && has_session {
            return GateDecision::Redirect(HOME_PATH.to_owned());
        }
        GateDecision::Pass
    }
}

/// `/login?redirect=<path>` with the original path percent-encoded.
pub fn login_redirect(path: &str) -> String {
    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", path)
        .finish();
    format!("{LOGIN_PATH}?{encoded}")
}

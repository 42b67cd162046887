//! Session middleware: resolves the cookie session once per request, gates
//! page navigations, and copies refreshed cookies onto every response.

use auth::{cookies::SetCookie, gate::matches_prefix, GateDecision};
use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use crate::{error::ApiError, extract::cookie_header, state::AppState};

/// Requests under this prefix are answered by handlers, never redirected.
pub const API_PREFIX: &str = "/api";

/// Liveness check; answered without touching the auth provider.
pub const HEALTH_PATH: &str = "/api/health";

pub async fn session_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.uri().path() == HEALTH_PATH {
        return Ok(next.run(request).await);
    }

    let header = cookie_header(request.headers());
    let resolved = state.sessions.resolve(header.as_deref()).await?;
    let refreshed = resolved.set_cookies.clone();
    let path = request.uri().path().to_owned();

    let decision = if matches_prefix(&path, API_PREFIX) {
        GateDecision::Pass
    } else {
        state.routes.decide(&path, resolved.is_authenticated())
    };

    let mut response = match decision {
        GateDecision::Pass => {
            request.extensions_mut().insert(resolved);
            next.run(request).await
        }
        GateDecision::Redirect(location) => {
            debug!("redirecting {path} to {location}");
            Redirect::temporary(&location).into_response()
        }
    };

    append_set_cookies(response.headers_mut(), &refreshed);
    Ok(response)
}

/// Append `cookies` as `Set-Cookie` headers.
///
/// Names the response already sets are skipped, so a handler that clears the
/// session is not overridden by a refresh from earlier in the request.
pub fn append_set_cookies(headers: &mut HeaderMap, cookies: &[SetCookie]) {
    let already: Vec<String> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split('=').next())
        .map(|name| name.trim().to_owned())
        .collect();

    for cookie in cookies.iter().filter(|c| !already.contains(&c.name)) {
        match HeaderValue::from_str(&cookie.header_value()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => warn!("dropping unencodable cookie {}: {e}", cookie.name),
        }
    }
}

use auth::{
    redirect::is_membership_exempt, FlowState, Membership, RedirectFlow, SessionView,
};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::{
    error::ApiError,
    extract::{cookie_header, ApiQuery, Caller, CurrentUser},
    middleware::append_set_cookies,
    state::AppState,
};

/// The signed-in user and their admin profile, if they have one.
pub async fn current(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let admin = state.directory.admin_for_user(user.id).await?;
    Ok(Json(json!({ "user": user, "admin": admin })))
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub path: Option<String>,
}

/// Where the admin UI should send the visitor after its session loads.
pub async fn redirect(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<RedirectQuery>,
) -> Json<Value> {
    let path = query.path.unwrap_or_else(|| "/".to_owned());
    let view = session_view(&state, caller, &path).await;

    let flow_state = FlowState::of(&view, &path);
    let redirect = RedirectFlow::new().evaluate(&view, &path);

    Json(json!({
        "state": flow_state_name(flow_state),
        "redirect": redirect,
    }))
}

async fn session_view(state: &AppState, caller: Caller, path: &str) -> SessionView {
    let Some(user) = caller.0 else {
        return SessionView::SignedOut;
    };
    if !user.is_verified() || is_membership_exempt(path) {
        return SessionView::SignedIn {
            user,
            membership: None,
        };
    }

    let membership = match state.directory.admin_for_user(user.id).await {
        Ok(Some(admin)) => admin
            .school_id
            .map_or(Membership::NoSchool, Membership::HasSchool),
        Ok(None) => Membership::NoSchool,
        Err(e) => {
            warn!("membership lookup for {} failed: {e}", user.id);
            Membership::Failed
        }
    };
    SessionView::SignedIn {
        user,
        membership: Some(membership),
    }
}

fn flow_state_name(state: FlowState) -> &'static str {
    match state {
        FlowState::Loading => "loading",
        FlowState::NoUser => "no_user",
        FlowState::Unverified => "unverified",
        FlowState::Exempt => "exempt",
        FlowState::NeedsSchool => "needs_school",
        FlowState::Ready => "ready",
    }
}

/// Revoke the session at the provider and clear the session cookies.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let header = cookie_header(&headers);
    let cleared = state.sessions.sign_out(header.as_deref()).await;

    let mut response = Json(json!({ "success": true })).into_response();
    append_set_cookies(response.headers_mut(), &cleared);
    response
}

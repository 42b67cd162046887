use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CACHE_CONTROL, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use services::GoogleCalendar;
use tracing::info;

use crate::{
    error::ApiError,
    extract::{ApiQuery, CurrentAdmin},
    params::require_text,
    state::AppState,
};

fn oauth(state: &AppState) -> Result<Arc<GoogleCalendar>, ApiError> {
    state
        .calendar_oauth
        .clone()
        .ok_or(ApiError::MissingConfig("Calendar integration"))
}

/// Google consent URL; the school id travels in `state`. Owners only.
pub async fn auth_url(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    tenant.ensure_owner()?;
    let calendar = oauth(&state)?;
    let url = calendar.authorization_url(Some(&tenant.school_id.to_string()))?;
    Ok(Json(json!({ "url": url })))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Exchange the consent code for a refresh token.
///
/// The token is shown once, to the school owner, so it can be stored as
/// `GOOGLE_REFRESH_TOKEN`; it is never persisted or logged by this service.
pub async fn callback(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Response, ApiError> {
    tenant.ensure_owner()?;
    if let Some(error) = query.error {
        return Err(ApiError::BadRequest(format!("Authorization failed: {error}")));
    }
    let code = require_text(query.code, "code")?;
    let calendar = oauth(&state)?;

    let grant = calendar.exchange_code(&code).await?;
    info!("calendar consent completed for school {}", tenant.school_id);

    let message = match &grant.refresh_token {
        Some(_) => "Store this value as GOOGLE_REFRESH_TOKEN",
        None => "Google did not return a refresh token; revoke access and try again",
    };
    let mut response = Json(json!({
        "refreshToken": grant.refresh_token,
        "message": message,
    }))
    .into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

use axum::{extract::State, Json};
use db::{models::AdminUserInfoRow, Procedure};
use serde::Deserialize;
use serde_json::{json, Value};

use super::call;
use crate::{
    error::ApiError,
    extract::{ApiJson, CurrentUser},
    params::optional_text,
    state::AppState,
};

pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AdminUserInfoRow>, ApiError> {
    state
        .directory
        .admin_for_user(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Admin profile not found".into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<UpdateProfileDto>,
) -> Result<Json<Value>, ApiError> {
    let first_name = optional_text(body.first_name);
    let last_name = optional_text(body.last_name);
    let avatar_url = optional_text(body.avatar_url);
    if first_name.is_none() && last_name.is_none() && avatar_url.is_none() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }

    let profile = call(
        &state,
        Procedure::UpdateAdminProfile,
        json!({
            "p_user_id": user.id,
            "p_first_name": first_name,
            "p_last_name": last_name,
            "p_avatar_url": avatar_url,
        }),
    )
    .await?;
    Ok(Json(profile))
}

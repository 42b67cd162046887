use axum::{extract::State, http::StatusCode, Json};
use db::{models::SchoolRow, Procedure};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::call;
use crate::{
    error::ApiError,
    extract::{ApiJson, ApiQuery, CurrentAdmin, CurrentUser},
    params::{bounded, optional_text, require_text, require_uuid},
    state::AppState,
};

pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const MAX_SEARCH_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct CreateSchoolDto {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
}

/// Create a school and make the caller its owner.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = require_text(body.name, "name")?;

    let school = call(
        &state,
        Procedure::CreateSchoolWithAdmin,
        json!({
            "p_user_id": user.id,
            "p_name": name,
            "p_city": optional_text(body.city),
            "p_country": optional_text(body.country),
            "p_website": optional_text(body.website),
        }),
    )
    .await?;

    info!("user {} created school '{name}'", user.id);
    Ok((StatusCode::CREATED, Json(school)))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let q = require_text(query.q, "q")?;
    let limit = bounded(query.limit, "limit", DEFAULT_SEARCH_LIMIT, 1, MAX_SEARCH_LIMIT)?;

    let schools = call(
        &state,
        Procedure::SearchSchools,
        json!({ "p_query": q, "p_limit": limit }),
    )
    .await?;
    Ok(Json(schools))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSchoolDto {
    pub school_id: Option<String>,
    pub message: Option<String>,
}

/// Ask to join an existing school.
pub async fn join(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<JoinSchoolDto>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let school_id = require_uuid(body.school_id, "schoolId")?;

    let request = call(
        &state,
        Procedure::RequestSchoolMembership,
        json!({
            "p_user_id": user.id,
            "p_school_id": school_id,
            "p_message": optional_text(body.message),
        }),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// The caller's school.
pub async fn get(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<SchoolRow>, ApiError> {
    match state.directory.school(tenant.school_id).await {
        Ok(school) => Ok(Json(school)),
        Err(db::DbError::NotFound) => Err(ApiError::NotFound("School not found".into())),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchoolDto {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<UpdateSchoolDto>,
) -> Result<Json<Value>, ApiError> {
    let params = json!({
        "p_school_id": tenant.school_id,
        "p_name": optional_text(body.name),
        "p_city": optional_text(body.city),
        "p_country": optional_text(body.country),
        "p_website": optional_text(body.website),
        "p_logo_url": optional_text(body.logo_url),
    });
    let nothing_to_update = params
        .as_object()
        .is_some_and(|p| p.iter().filter(|(k, _)| *k != "p_school_id").all(|(_, v)| v.is_null()));
    if nothing_to_update {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }

    let school = call(&state, Procedure::UpdateSchoolProfile, params).await?;
    Ok(Json(school))
}

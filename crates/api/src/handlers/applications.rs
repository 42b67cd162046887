use axum::{extract::State, http::StatusCode, Json};
use db::Procedure;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::call;
use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentAdmin},
    params::{found, one_of, optional_text, optional_uuid, require, require_text},
    state::AppState,
};

pub const APPLICATION_STATUSES: &[&str] = &[
    "applied",
    "screening",
    "shortlisted",
    "interview",
    "offered",
    "hired",
    "rejected",
    "withdrawn",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListApplicationsQuery {
    pub job_id: Option<String>,
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListApplicationsQuery>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let job_id = optional_uuid(query.job_id, "jobId")?;
    let status = optional_text(query.status)
        .map(|s| one_of(s, "status", APPLICATION_STATUSES))
        .transpose()?;

    let applications = call(
        &state,
        Procedure::GetSchoolApplications,
        json!({
            "p_school_id": tenant.school_id,
            "p_job_id": job_id,
            "p_status": status,
        }),
    )
    .await?;
    Ok(Json(applications))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(application_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let application = call(
        &state,
        Procedure::GetApplicationDetails,
        json!({
            "p_school_id": tenant.school_id,
            "p_application_id": application_id,
        }),
    )
    .await?;
    Ok(Json(found(application, "Application")?))
}

#[derive(Debug, Deserialize)]
pub struct StatusDto {
    pub status: Option<String>,
}

pub async fn set_status(
    State(state): State<AppState>,
    ApiPath(application_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<StatusDto>,
) -> Result<Json<Value>, ApiError> {
    let status = one_of(
        require_text(body.status, "status")?,
        "status",
        APPLICATION_STATUSES,
    )?;

    let application = call(
        &state,
        Procedure::UpdateApplicationStatus,
        json!({
            "p_school_id": tenant.school_id,
            "p_application_id": application_id,
            "p_status": status,
            "p_changed_by": tenant.admin.id,
        }),
    )
    .await?;

    let application = found(application, "Application")?;
    state.invalidate_analytics(tenant.school_id);
    Ok(Json(application))
}

#[derive(Debug, Deserialize)]
pub struct NoteDto {
    pub note: Option<String>,
}

pub async fn add_note(
    State(state): State<AppState>,
    ApiPath(application_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<NoteDto>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let note = require_text(body.note, "note")?;

    let created = call(
        &state,
        Procedure::AddApplicationNote,
        json!({
            "p_school_id": tenant.school_id,
            "p_application_id": application_id,
            "p_author_id": tenant.admin.id,
            "p_note": note,
        }),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(found(created, "Application")?)))
}

#[derive(Debug, Deserialize)]
pub struct RatingDto {
    pub rating: Option<i64>,
}

pub async fn rate(
    State(state): State<AppState>,
    ApiPath(application_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<RatingDto>,
) -> Result<Json<Value>, ApiError> {
    let rating = require(body.rating, "rating")?;
    if !(1..=5).contains(&rating) {
        return Err(ApiError::BadRequest("rating must be between 1 and 5".into()));
    }

    let rated = call(
        &state,
        Procedure::RateApplication,
        json!({
            "p_school_id": tenant.school_id,
            "p_application_id": application_id,
            "p_rater_id": tenant.admin.id,
            "p_rating": rating,
        }),
    )
    .await?;
    Ok(Json(found(rated, "Application")?))
}

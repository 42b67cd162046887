use axum::{extract::State, http::StatusCode, Json};
use db::Procedure;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::call;
use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentAdmin},
    params::{
        bounded, found, one_of, optional_text, require_object, require_text, DEFAULT_PAGE_SIZE,
        MAX_PAGE_SIZE,
    },
    state::AppState,
};

pub const JOB_STATUSES: &[&str] = &["draft", "open", "paused", "closed"];

/// Fields a job body must carry when it is created.
const REQUIRED_JOB_FIELDS: &[&str] = &["title", "description"];

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// One page of the school's jobs.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListJobsQuery>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let status = optional_text(query.status)
        .map(|s| one_of(s, "status", JOB_STATUSES))
        .transpose()?;
    let offset = bounded(query.offset, "offset", 0, 0, i64::from(i32::MAX))?;
    let limit = bounded(query.limit, "limit", DEFAULT_PAGE_SIZE, 1, MAX_PAGE_SIZE)?;

    let page = call(
        &state,
        Procedure::GetSchoolJobs,
        json!({
            "p_school_id": tenant.school_id,
            "p_status": status,
            "p_offset": offset,
            "p_limit": limit,
        }),
    )
    .await?;

    // `{ jobs, total }`; an empty school has no page at all.
    let page = if page.is_null() {
        json!({ "jobs": [], "total": 0 })
    } else {
        page
    };
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let job = require_object(body)?;
    for field in REQUIRED_JOB_FIELDS {
        let present = job
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.trim().is_empty());
        if !present {
            return Err(ApiError::missing_field(field));
        }
    }
    if let Some(status) = job.get("status").and_then(Value::as_str) {
        one_of(status.to_owned(), "status", JOB_STATUSES)?;
    }

    let created = call(
        &state,
        Procedure::CreateJob,
        json!({
            "p_school_id": tenant.school_id,
            "p_created_by": tenant.admin.id,
            "p_job": job,
        }),
    )
    .await?;

    state.invalidate_analytics(tenant.school_id);
    info!("school {} created a job", tenant.school_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let job = call(
        &state,
        Procedure::GetJobDetails,
        json!({ "p_school_id": tenant.school_id, "p_job_id": job_id }),
    )
    .await?;
    Ok(Json(found(job, "Job")?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    let changes = require_object(body)?;
    if let Some(status) = changes.get("status").and_then(Value::as_str) {
        one_of(status.to_owned(), "status", JOB_STATUSES)?;
    }

    let job = call(
        &state,
        Procedure::UpdateJob,
        json!({
            "p_school_id": tenant.school_id,
            "p_job_id": job_id,
            "p_job": changes,
        }),
    )
    .await?;

    let job = found(job, "Job")?;
    state.invalidate_analytics(tenant.school_id);
    Ok(Json(job))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let deleted = call(
        &state,
        Procedure::DeleteJob,
        json!({ "p_school_id": tenant.school_id, "p_job_id": job_id }),
    )
    .await?;

    found(deleted, "Job")?;
    state.invalidate_analytics(tenant.school_id);
    info!("school {} deleted job {job_id}", tenant.school_id);
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct StatusDto {
    pub status: Option<String>,
}

pub async fn set_status(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<StatusDto>,
) -> Result<Json<Value>, ApiError> {
    let status = one_of(require_text(body.status, "status")?, "status", JOB_STATUSES)?;

    let job = call(
        &state,
        Procedure::SetJobStatus,
        json!({
            "p_school_id": tenant.school_id,
            "p_job_id": job_id,
            "p_status": status,
        }),
    )
    .await?;

    let job = found(job, "Job")?;
    state.invalidate_analytics(tenant.school_id);
    Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct JobApplicationsQuery {
    pub status: Option<String>,
}

pub async fn applications(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<JobApplicationsQuery>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let applications = call(
        &state,
        Procedure::GetJobApplications,
        json!({
            "p_school_id": tenant.school_id,
            "p_job_id": job_id,
            "p_status": optional_text(query.status),
        }),
    )
    .await?;
    Ok(Json(applications))
}

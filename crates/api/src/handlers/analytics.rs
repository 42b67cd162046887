//! Dashboard analytics.
//!
//! Every endpoint names the school in its query string. The id must be the
//! caller's own school. Responses other than recent activity are cached per
//! school and query; mutations elsewhere invalidate the school's entries.

use axum::{extract::State, Json};
use db::{procedures::Returns, Procedure};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::call;
use crate::{
    error::ApiError,
    extract::{ApiQuery, Caller},
    params::{bounded, optional_uuid, require_uuid, Period},
    state::{AnalyticsKey, AppState},
};

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 10;
pub const MAX_ACTIVITY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub school_id: Option<String>,
    pub period: Option<String>,
    pub job_id: Option<String>,
    pub limit: Option<i64>,
}

/// Check the school id, then make sure it belongs to the caller.
async fn authorized_school(
    state: &AppState,
    caller: &Caller,
    raw_school_id: Option<String>,
) -> Result<Uuid, ApiError> {
    let school_id = require_uuid(raw_school_id, "schoolId")?;
    let tenant = caller.tenant(state).await?;
    tenant.ensure_school(school_id)?;
    Ok(school_id)
}

/// What a procedure's "nothing" looks like to the dashboard.
fn empty_result(procedure: Procedure) -> Value {
    match procedure.returns() {
        Returns::Scalar => Value::Object(Map::new()),
        Returns::Rows => Value::Array(Vec::new()),
    }
}

async fn cached(
    state: &AppState,
    school_id: Uuid,
    procedure: Procedure,
    variant: String,
    params: Value,
) -> Result<Json<Value>, ApiError> {
    let key = AnalyticsKey {
        school_id,
        procedure,
        variant,
    };
    let value = state
        .analytics
        .get_or_try_insert_with(key, || async move {
            let value = call(state, procedure, params).await?;
            Ok::<_, ApiError>(if value.is_null() {
                empty_result(procedure)
            } else {
                value
            })
        })
        .await?;
    Ok(Json(value))
}

/// Shared body of the per-period endpoints.
async fn by_period(
    state: AppState,
    caller: Caller,
    query: AnalyticsQuery,
    procedure: Procedure,
) -> Result<Json<Value>, ApiError> {
    let period = Period::from_query(query.period.as_deref())?;
    let school_id = authorized_school(&state, &caller, query.school_id).await?;

    cached(
        &state,
        school_id,
        procedure,
        period.to_string(),
        json!({ "p_school_id": school_id, "p_period": period.as_str() }),
    )
    .await
}

pub async fn school_kpis(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    by_period(state, caller, query, Procedure::GetSchoolKpis).await
}

pub async fn application_distribution(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    by_period(state, caller, query, Procedure::GetApplicationDistribution).await
}

pub async fn time_to_hire(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    by_period(state, caller, query, Procedure::GetTimeToHire).await
}

pub async fn sources(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    by_period(state, caller, query, Procedure::GetApplicationSources).await
}

pub async fn hiring_funnel(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    let job_id = optional_uuid(query.job_id, "jobId")?;
    let school_id = authorized_school(&state, &caller, query.school_id).await?;

    let variant = job_id.map(|id| id.to_string()).unwrap_or_default();
    cached(
        &state,
        school_id,
        Procedure::GetHiringFunnel,
        variant,
        json!({ "p_school_id": school_id, "p_job_id": job_id }),
    )
    .await
}

/// Latest events; never cached.
pub async fn recent_activity(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = bounded(query.limit, "limit", DEFAULT_ACTIVITY_LIMIT, 1, MAX_ACTIVITY_LIMIT)?;
    let school_id = authorized_school(&state, &caller, query.school_id).await?;

    let activity = call(
        &state,
        Procedure::GetRecentActivity,
        json!({ "p_school_id": school_id, "p_limit": limit }),
    )
    .await?;
    Ok(Json(if activity.is_null() {
        empty_result(Procedure::GetRecentActivity)
    } else {
        activity
    }))
}

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use db::Procedure;
use serde::Deserialize;
use serde_json::{json, Value};
use services::{sync_attendees, Attendee, InterviewSlot};
use tracing::{info, warn};
use uuid::Uuid;

use super::call;
use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentAdmin, OptionalJson},
    params::{
        ensure_ordered, found, one_of, optional_text, optional_time, optional_uuid, parse_uuid,
        require, require_text, require_time, require_uuid,
    },
    state::AppState,
};

pub const RECOMMENDATIONS: &[&str] = &["strong_yes", "yes", "no", "strong_no"];

#[derive(Debug, Deserialize)]
pub struct ListInterviewsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListInterviewsQuery>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let from = optional_time(query.from, "from")?;
    let to = optional_time(query.to, "to")?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ApiError::BadRequest("from must not be after to".into()));
        }
    }

    let interviews = call(
        &state,
        Procedure::GetSchoolInterviews,
        json!({
            "p_school_id": tenant.school_id,
            "p_from": from,
            "p_to": to,
        }),
    )
    .await?;
    Ok(Json(interviews))
}

/// A validated time slot with its panel.
struct Slot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    panelists: Vec<Uuid>,
}

impl Slot {
    fn parse(
        start: Option<String>,
        end: Option<String>,
        panelists: Option<Vec<String>>,
    ) -> Result<Self, ApiError> {
        let start = require_time(start, "startTime")?;
        let end = require_time(end, "endTime")?;
        ensure_ordered(start, end)?;

        let panelists = require(panelists, "panelistIds")?;
        if panelists.is_empty() {
            return Err(ApiError::BadRequest(
                "panelistIds must name at least one panelist".into(),
            ));
        }
        let mut ids = Vec::with_capacity(panelists.len());
        for raw in &panelists {
            let id = parse_uuid(raw, "panelistIds")?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        Ok(Self {
            start,
            end,
            panelists: ids,
        })
    }
}

/// Conflicting interviews of the slot's panelists.
async fn conflicts(
    state: &AppState,
    school_id: Uuid,
    slot: &Slot,
    exclude: Option<Uuid>,
) -> Result<Vec<Value>, ApiError> {
    let rows = call(
        state,
        Procedure::CheckPanelistAvailability,
        json!({
            "p_school_id": school_id,
            "p_panelist_ids": slot.panelists,
            "p_start_time": slot.start,
            "p_end_time": slot.end,
            "p_exclude_interview_id": exclude,
        }),
    )
    .await?;

    Ok(match rows {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

async fn ensure_available(
    state: &AppState,
    school_id: Uuid,
    slot: &Slot,
    exclude: Option<Uuid>,
) -> Result<(), ApiError> {
    let conflicts = conflicts(state, school_id, slot, exclude).await?;
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Conflicts(Value::Array(conflicts)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub application_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub panelist_ids: Option<Vec<String>>,
    pub location: Option<String>,
    pub interview_type: Option<String>,
    pub notes: Option<String>,
}

pub async fn schedule(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<ScheduleDto>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let application_id = require_uuid(body.application_id, "applicationId")?;
    let slot = Slot::parse(body.start_time, body.end_time, body.panelist_ids)?;

    ensure_available(&state, tenant.school_id, &slot, None).await?;

    let interview = call(
        &state,
        Procedure::ScheduleInterview,
        json!({
            "p_school_id": tenant.school_id,
            "p_application_id": application_id,
            "p_scheduled_by": tenant.admin.id,
            "p_start_time": slot.start,
            "p_end_time": slot.end,
            "p_panelist_ids": slot.panelists,
            "p_location": optional_text(body.location),
            "p_interview_type": optional_text(body.interview_type),
            "p_notes": optional_text(body.notes),
        }),
    )
    .await?;

    state.invalidate_analytics(tenant.school_id);
    info!(
        "scheduled interview for application {application_id} with {} panelist(s)",
        slot.panelists.len()
    );
    Ok((StatusCode::CREATED, Json(interview)))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(interview_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let interview = details(&state, tenant.school_id, interview_id).await?;
    Ok(Json(interview))
}

async fn details(state: &AppState, school_id: Uuid, interview_id: Uuid) -> Result<Value, ApiError> {
    let interview = call(
        state,
        Procedure::GetInterviewDetails,
        json!({ "p_school_id": school_id, "p_interview_id": interview_id }),
    )
    .await?;
    found(interview, "Interview")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleDto {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub panelist_ids: Option<Vec<String>>,
}

pub async fn reschedule(
    State(state): State<AppState>,
    ApiPath(interview_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<RescheduleDto>,
) -> Result<Json<Value>, ApiError> {
    let slot = Slot::parse(body.start_time, body.end_time, body.panelist_ids)?;

    ensure_available(&state, tenant.school_id, &slot, Some(interview_id)).await?;

    let interview = call(
        &state,
        Procedure::RescheduleInterview,
        json!({
            "p_school_id": tenant.school_id,
            "p_interview_id": interview_id,
            "p_start_time": slot.start,
            "p_end_time": slot.end,
            "p_panelist_ids": slot.panelists,
        }),
    )
    .await?;

    let interview = found(interview, "Interview")?;
    state.invalidate_analytics(tenant.school_id);
    Ok(Json(interview))
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelDto {
    pub reason: Option<String>,
}

pub async fn cancel(
    State(state): State<AppState>,
    ApiPath(interview_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    OptionalJson(body): OptionalJson<CancelDto>,
) -> Result<Json<Value>, ApiError> {
    let reason = body.and_then(|b| optional_text(b.reason));

    let cancelled = call(
        &state,
        Procedure::CancelInterview,
        json!({
            "p_school_id": tenant.school_id,
            "p_interview_id": interview_id,
            "p_reason": reason,
        }),
    )
    .await?;

    found(cancelled, "Interview")?;
    state.invalidate_analytics(tenant.school_id);
    info!("cancelled interview {interview_id}");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDto {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub panelist_ids: Option<Vec<String>>,
    pub exclude_interview_id: Option<String>,
}

pub async fn availability(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<AvailabilityDto>,
) -> Result<Json<Value>, ApiError> {
    let slot = Slot::parse(body.start_time, body.end_time, body.panelist_ids)?;
    let exclude = optional_uuid(body.exclude_interview_id, "excludeInterviewId")?;

    let conflicts = conflicts(&state, tenant.school_id, &slot, exclude).await?;
    Ok(Json(json!({
        "available": conflicts.is_empty(),
        "conflicts": conflicts,
    })))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackDto {
    pub rating: Option<i64>,
    pub recommendation: Option<String>,
    pub comments: Option<String>,
}

pub async fn feedback(
    State(state): State<AppState>,
    ApiPath(interview_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<FeedbackDto>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let rating = require(body.rating, "rating")?;
    if !(1..=5).contains(&rating) {
        return Err(ApiError::BadRequest("rating must be between 1 and 5".into()));
    }
    let recommendation = one_of(
        require_text(body.recommendation, "recommendation")?,
        "recommendation",
        RECOMMENDATIONS,
    )?;

    let submitted = call(
        &state,
        Procedure::SubmitInterviewFeedback,
        json!({
            "p_school_id": tenant.school_id,
            "p_interview_id": interview_id,
            "p_panelist_id": tenant.admin.id,
            "p_rating": rating,
            "p_recommendation": recommendation,
            "p_comments": optional_text(body.comments),
        }),
    )
    .await?;

    let submitted = found(submitted, "Interview")?;
    state.invalidate_analytics(tenant.school_id);
    Ok((StatusCode::CREATED, Json(submitted)))
}

pub async fn panelists(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let panelists = call(
        &state,
        Procedure::GetSchoolPanelists,
        json!({ "p_school_id": tenant.school_id }),
    )
    .await?;
    Ok(Json(panelists))
}

/// The interview fields needed to build calendar events.
#[derive(Debug, Deserialize)]
struct InterviewForSync {
    id: Uuid,
    #[serde(default)]
    job_title: Option<String>,
    #[serde(default)]
    candidate_name: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    attendees: Vec<Attendee>,
}

impl InterviewForSync {
    fn title(&self) -> String {
        match (&self.candidate_name, &self.job_title) {
            (Some(candidate), Some(job)) => format!("Interview: {candidate} - {job}"),
            (Some(candidate), None) => format!("Interview: {candidate}"),
            (None, Some(job)) => format!("Interview: {job}"),
            (None, None) => "Interview".to_owned(),
        }
    }
}

/// Create a calendar event for every attendee and record the result.
pub async fn calendar_sync(
    State(state): State<AppState>,
    ApiPath(interview_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let calendar = state
        .calendar
        .clone()
        .ok_or(ApiError::MissingConfig("Calendar integration"))?;

    let raw = details(&state, tenant.school_id, interview_id).await?;
    let interview: InterviewForSync = serde_json::from_value(raw)
        .map_err(|e| ApiError::Internal(format!("unexpected interview payload: {e}")))?;

    let slot = InterviewSlot {
        interview_id: interview.id,
        title: interview.title(),
        description: interview.notes.clone(),
        location: interview.location.clone(),
        start_time: interview.start_time,
        end_time: interview.end_time,
    };
    let attendee_count = interview.attendees.len();
    let report = sync_attendees(calendar, &slot, interview.attendees, &state.sync_options).await;

    if report.synced.is_empty() && attendee_count > 0 {
        let first = report
            .failed
            .first()
            .map(|f| f.error.clone())
            .unwrap_or_default();
        return Err(ApiError::Upstream(format!(
            "Calendar sync failed for every attendee: {first}"
        )));
    }
    if !report.is_complete() {
        warn!(
            "calendar sync for interview {interview_id}: {} attendee(s) failed",
            report.failed.len()
        );
    }

    let meeting_link = report.meeting_link().map(str::to_owned);
    let events: Vec<Value> = report
        .synced
        .iter()
        .map(|s| {
            json!({
                "attendee_id": s.attendee_id,
                "email": s.email,
                "event_id": s.event.event_id,
                "html_link": s.event.html_link,
            })
        })
        .collect();

    call(
        &state,
        Procedure::RecordCalendarSync,
        json!({
            "p_school_id": tenant.school_id,
            "p_interview_id": interview_id,
            "p_meeting_link": meeting_link,
            "p_events": events,
        }),
    )
    .await?;

    Ok(Json(json!({
        "meetingLink": meeting_link,
        "synced": report.synced,
        "failed": report.failed,
    })))
}

//! Resource handler tests: request validation, procedure parameters and
//! result mapping for jobs, applications, interviews, invitations, schools
//! and the calendar endpoints.

use std::{sync::Arc, time::Duration};

use axum::http::{Method, StatusCode};
use chrono::{Duration as ChronoDuration, Utc};
use db::{
    mock::{MockDirectory, MockProcedures},
    Procedure,
};
use serde_json::json;
use services::{
    mock::{MockBehaviour, MockCalendar},
    SyncOptions,
};
use uuid::Uuid;

use crate::test_support::*;

fn post(uri: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    request(Method::POST, uri, Some(body), true)
}

fn put(uri: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    request(Method::PUT, uri, Some(body), true)
}

// ---------------------------------------------------------------------------
// Tenancy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admins_without_a_school_get_404() {
    let h = Harness::with_directory(
        MockProcedures::new(),
        MockDirectory::new().with_admin(admin_row(None)),
    );
    let reply = h.send(get("/api/jobs", true)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error(), "No school associated with this account");
}

#[tokio::test]
async fn directory_outage_is_an_opaque_500() {
    let h = Harness::with_directory(MockProcedures::new(), MockDirectory::new().failing());
    let reply = h.send(get("/api/jobs", true)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error(), "Internal server error");
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn job_list_applies_paging_defaults_and_limits() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::GetSchoolJobs, json!({ "jobs": [], "total": 0 })),
    );

    let reply = h.send(get("/api/jobs?status=open", true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        h.procedures.last_params(Procedure::GetSchoolJobs),
        Some(json!({
            "p_school_id": SCHOOL_ID,
            "p_status": "open",
            "p_offset": 0,
            "p_limit": 20,
        }))
    );

    let reply = h.send(get("/api/jobs?limit=500", true)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let reply = h.send(get("/api/jobs?status=archived", true)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.procedures.call_count(Procedure::GetSchoolJobs), 1);
}

#[tokio::test]
async fn creating_a_job_requires_title_and_description() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::CreateJob, json!({ "id": Uuid::nil() })),
    );

    let reply = h.send(post("/api/jobs", json!({ "title": "Physics teacher" }))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "Missing required field: description");

    let body = json!({
        "title": "Physics teacher",
        "description": "KS4 and KS5 physics",
        "employment_type": "full_time",
    });
    let reply = h.send(post("/api/jobs", body.clone())).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(
        h.procedures.last_params(Procedure::CreateJob),
        Some(json!({
            "p_school_id": SCHOOL_ID,
            "p_created_by": ADMIN_ID,
            "p_job": body,
        }))
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let h = Harness::new(MockProcedures::new());
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/jobs")
        .header(axum::http::header::COOKIE, session_cookie())
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let reply = h.send(request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(!reply.error().is_empty());
}

#[tokio::test]
async fn missing_jobs_are_404() {
    let h = Harness::new(MockProcedures::new());
    let job = Uuid::new_v4();

    let reply = h.send(get(&format!("/api/jobs/{job}"), true)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error(), "Job not found");

    let reply = h
        .send(request(Method::DELETE, &format!("/api/jobs/{job}"), None, true))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = h.send(get("/api/jobs/not-a-uuid", true)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remote_not_found_maps_to_404() {
    let h = Harness::new(MockProcedures::new().failing_with_code(
        Procedure::UpdateJob,
        "P0002",
        "Job not found",
    ));
    let job = Uuid::new_v4();
    let reply = h
        .send(put(&format!("/api/jobs/{job}"), json!({ "title": "Chemistry" })))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error(), "Job not found");
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn application_status_and_rating_are_validated() {
    let h = Harness::new(
        MockProcedures::new()
            .returning(Procedure::UpdateApplicationStatus, json!({ "status": "shortlisted" }))
            .returning(Procedure::RateApplication, json!({ "rating": 4 })),
    );
    let app = Uuid::new_v4();

    let reply = h
        .send(put(&format!("/api/applications/{app}/status"), json!({ "status": "maybe" })))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h
        .send(put(
            &format!("/api/applications/{app}/status"),
            json!({ "status": "shortlisted" }),
        ))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        h.procedures.last_params(Procedure::UpdateApplicationStatus),
        Some(json!({
            "p_school_id": SCHOOL_ID,
            "p_application_id": app,
            "p_status": "shortlisted",
            "p_changed_by": ADMIN_ID,
        }))
    );

    let reply = h
        .send(post(&format!("/api/applications/{app}/rating"), json!({ "rating": 6 })))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let reply = h
        .send(post(&format!("/api/applications/{app}/rating"), json!({ "rating": 4 })))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn notes_are_created() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::AddApplicationNote, json!({ "id": 1 })),
    );
    let app = Uuid::new_v4();

    let reply = h
        .send(post(&format!("/api/applications/{app}/notes"), json!({ "note": "  " })))
        .await;
    assert_eq!(reply.error(), "Missing required field: note");

    let reply = h
        .send(post(
            &format!("/api/applications/{app}/notes"),
            json!({ "note": "Strong lesson plan" }),
        ))
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Interviews
// ---------------------------------------------------------------------------

fn schedule_body() -> serde_json::Value {
    json!({
        "applicationId": Uuid::new_v4(),
        "startTime": "2026-05-04T13:00:00Z",
        "endTime": "2026-05-04T14:00:00Z",
        "panelistIds": [ADMIN_ID],
        "interviewType": "video",
    })
}

#[tokio::test]
async fn scheduling_validates_the_slot() {
    let h = Harness::new(MockProcedures::new());

    let mut body = schedule_body();
    body["endTime"] = json!("2026-05-04T12:00:00Z");
    let reply = h.send(post("/api/interviews", body)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "endTime must be after startTime");

    let mut body = schedule_body();
    body["panelistIds"] = json!([]);
    let reply = h.send(post("/api/interviews", body)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let mut body = schedule_body();
    body.as_object_mut().unwrap().remove("applicationId");
    let reply = h.send(post("/api/interviews", body)).await;
    assert_eq!(reply.error(), "Missing required field: applicationId");

    assert_eq!(h.procedures.call_count(Procedure::CheckPanelistAvailability), 0);
}

#[tokio::test]
async fn conflicting_panelists_block_scheduling() {
    let conflict = json!({ "panelist_id": ADMIN_ID, "interview_id": Uuid::nil() });
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::CheckPanelistAvailability, json!([conflict])),
    );

    let reply = h.send(post("/api/interviews", schedule_body())).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["conflicts"], json!([conflict]));
    assert_eq!(h.procedures.call_count(Procedure::ScheduleInterview), 0);
}

#[tokio::test]
async fn free_panelists_are_scheduled() {
    let h = Harness::new(
        MockProcedures::new()
            .returning(Procedure::CheckPanelistAvailability, json!([]))
            .returning(Procedure::ScheduleInterview, json!({ "id": Uuid::nil() })),
    );

    let reply = h.send(post("/api/interviews", schedule_body())).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let params = h.procedures.last_params(Procedure::ScheduleInterview).unwrap();
    assert_eq!(params["p_scheduled_by"], json!(ADMIN_ID));
    assert_eq!(params["p_panelist_ids"], json!([ADMIN_ID]));
    assert_eq!(params["p_start_time"], json!("2026-05-04T13:00:00Z"));
}

#[tokio::test]
async fn rescheduling_excludes_the_interview_itself() {
    let h = Harness::new(
        MockProcedures::new()
            .returning(Procedure::CheckPanelistAvailability, json!([]))
            .returning(Procedure::RescheduleInterview, json!({ "id": 1 })),
    );
    let interview = Uuid::new_v4();

    let reply = h
        .send(put(
            &format!("/api/interviews/{interview}"),
            json!({
                "startTime": "2026-05-05T09:00:00Z",
                "endTime": "2026-05-05T10:00:00Z",
                "panelistIds": [ADMIN_ID],
            }),
        ))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let check = h
        .procedures
        .last_params(Procedure::CheckPanelistAvailability)
        .unwrap();
    assert_eq!(check["p_exclude_interview_id"], json!(interview));
}

#[tokio::test]
async fn availability_reports_conflicts_without_failing() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::CheckPanelistAvailability, json!([{ "id": 1 }])),
    );
    let mut body = schedule_body();
    body.as_object_mut().unwrap().remove("applicationId");

    let reply = h.send(post("/api/interviews/availability", body)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "available": false, "conflicts": [{ "id": 1 }] }));
}

#[tokio::test]
async fn cancelling_takes_an_optional_reason() {
    let h = Harness::new(MockProcedures::new().returning(Procedure::CancelInterview, json!(true)));
    let interview = Uuid::new_v4();

    let reply = h
        .send(request(
            Method::DELETE,
            &format!("/api/interviews/{interview}"),
            None,
            true,
        ))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        h.procedures.last_params(Procedure::CancelInterview).unwrap()["p_reason"],
        json!(null)
    );

    let reply = h
        .send(request(
            Method::DELETE,
            &format!("/api/interviews/{interview}"),
            Some(json!({ "reason": "Candidate withdrew" })),
            true,
        ))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        h.procedures.last_params(Procedure::CancelInterview).unwrap()["p_reason"],
        json!("Candidate withdrew")
    );
}

#[tokio::test]
async fn cancelling_with_a_malformed_body_is_rejected() {
    let h = Harness::new(MockProcedures::new().returning(Procedure::CancelInterview, json!(true)));
    let interview = Uuid::new_v4();
    let request = axum::http::Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/interviews/{interview}"))
        .header(axum::http::header::COOKIE, session_cookie())
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"reason\": "))
        .unwrap();

    let reply = h.send(request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.procedures.call_count(Procedure::CancelInterview), 0);
}

#[tokio::test]
async fn feedback_requires_a_known_recommendation() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::SubmitInterviewFeedback, json!({ "id": 1 })),
    );
    let interview = Uuid::new_v4();
    let uri = format!("/api/interviews/{interview}/feedback");

    let reply = h
        .send(post(&uri, json!({ "rating": 4, "recommendation": "perhaps" })))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h
        .send(post(&uri, json!({ "rating": 4, "recommendation": "strong_yes" })))
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(
        h.procedures
            .last_params(Procedure::SubmitInterviewFeedback)
            .unwrap()["p_panelist_id"],
        json!(ADMIN_ID)
    );
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

fn interview_payload(interview: Uuid, attendees: serde_json::Value) -> serde_json::Value {
    json!({
        "id": interview,
        "job_title": "Physics teacher",
        "candidate_name": "Sam Lee",
        "start_time": "2026-05-04T13:00:00Z",
        "end_time": "2026-05-04T14:00:00Z",
        "attendees": attendees,
    })
}

#[tokio::test]
async fn calendar_endpoints_need_configuration() {
    let h = Harness::new(MockProcedures::new());
    let interview = Uuid::new_v4();

    let reply = h
        .send(post(&format!("/api/interviews/{interview}/calendar-sync"), json!({})))
        .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error(), "Calendar integration is not configured");

    let reply = h.send(get("/api/calendar/auth-url", true)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error(), "Calendar integration is not configured");
}

#[tokio::test]
async fn calendar_consent_is_limited_to_owners() {
    let mut recruiter = admin_row(Some(SCHOOL_ID));
    recruiter.role = "recruiter".into();
    let h = Harness::with_directory(
        MockProcedures::new(),
        MockDirectory::new().with_admin(recruiter).with_school(school_row()),
    );

    let reply = h.send(get("/api/calendar/auth-url", true)).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = h.send(get("/api/calendar/callback?code=abc", true)).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.body.get("refreshToken").is_none());
}

#[tokio::test(start_paused = true)]
async fn calendar_sync_creates_events_and_records_them() {
    let interview = Uuid::new_v4();
    let candidate = Uuid::new_v4();
    let panelist = Uuid::new_v4();
    let procedures = MockProcedures::new()
        .returning(
            Procedure::GetInterviewDetails,
            interview_payload(
                interview,
                json!([
                    { "id": candidate, "name": "Sam Lee", "email": "sam@mail.test" },
                    { "id": panelist, "name": "Ada", "email": "flaky@school.test" },
                ]),
            ),
        )
        .returning(Procedure::RecordCalendarSync, json!(true));
    let calendar = MockCalendar::new().with_behaviour("flaky@school.test", MockBehaviour::FlakyTimes(1));

    let mut h = Harness::new(procedures);
    h.state = h
        .state
        .clone()
        .with_calendar(Arc::new(calendar.clone()))
        .with_sync_options(SyncOptions {
            max_concurrency: 2,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(10),
        });

    let reply = h
        .send(post(&format!("/api/interviews/{interview}/calendar-sync"), json!({})))
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    let link = format!("https://meet.example/{interview}-{candidate}");
    assert_eq!(reply.body["meetingLink"], json!(link));
    assert_eq!(reply.body["synced"].as_array().unwrap().len(), 2);
    assert_eq!(reply.body["failed"], json!([]));
    assert_eq!(calendar.call_count(), 3);

    let recorded = h.procedures.last_params(Procedure::RecordCalendarSync).unwrap();
    assert_eq!(recorded["p_meeting_link"], json!(link));
    assert_eq!(recorded["p_events"].as_array().unwrap().len(), 2);
    assert_eq!(
        calendar.calls.lock().unwrap()[0].summary,
        "Interview: Sam Lee - Physics teacher"
    );
}

#[tokio::test(start_paused = true)]
async fn calendar_sync_fails_when_no_attendee_could_be_synced() {
    let interview = Uuid::new_v4();
    let procedures = MockProcedures::new().returning(
        Procedure::GetInterviewDetails,
        interview_payload(
            interview,
            json!([{ "id": Uuid::new_v4(), "email": "bad@school.test" }]),
        ),
    );
    let calendar = MockCalendar::new()
        .with_behaviour("bad@school.test", MockBehaviour::FailFatal("invalid attendee".into()));

    let mut h = Harness::new(procedures);
    h.state = h.state.clone().with_calendar(Arc::new(calendar));

    let reply = h
        .send(post(&format!("/api/interviews/{interview}/calendar-sync"), json!({})))
        .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.error().contains("invalid attendee"));
    assert_eq!(h.procedures.call_count(Procedure::RecordCalendarSync), 0);
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invitation_tokens_map_to_404_and_410() {
    let unknown = Harness::new(MockProcedures::new());
    let reply = unknown.send(get("/api/invitations/token/nope", false)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let accepted = Harness::new(MockProcedures::new().returning(
        Procedure::GetInvitationByToken,
        json!({ "status": "accepted", "expires_at": null }),
    ));
    let reply = accepted.send(get("/api/invitations/token/t1", false)).await;
    assert_eq!(reply.status, StatusCode::GONE);

    let expired_at = Utc::now() - ChronoDuration::days(1);
    let expired = Harness::new(MockProcedures::new().returning(
        Procedure::GetInvitationByToken,
        json!({ "status": "pending", "expires_at": expired_at }),
    ));
    let reply = expired.send(get("/api/invitations/token/t2", false)).await;
    assert_eq!(reply.status, StatusCode::GONE);
    assert_eq!(reply.error(), "Invitation has expired");

    let pending = json!({
        "status": "pending",
        "expires_at": Utc::now() + ChronoDuration::days(6),
        "school_name": "Riverside Academy",
    });
    let valid = Harness::new(
        MockProcedures::new().returning(Procedure::GetInvitationByToken, pending.clone()),
    );
    let reply = valid.send(get("/api/invitations/token/t3", false)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, pending);
}

#[tokio::test]
async fn accepting_checks_the_token_first() {
    let h = Harness::new(
        MockProcedures::new()
            .returning(
                Procedure::GetInvitationByToken,
                json!({ "status": "revoked", "expires_at": null }),
            )
            .returning(Procedure::AcceptInvitation, json!({ "school_id": SCHOOL_ID })),
    );

    let reply = h
        .send(post("/api/invitations/accept", json!({ "token": "t1" })))
        .await;
    assert_eq!(reply.status, StatusCode::GONE);
    assert_eq!(h.procedures.call_count(Procedure::AcceptInvitation), 0);

    let reply = h
        .send(request(
            Method::POST,
            "/api/invitations/accept",
            Some(json!({ "token": "t1" })),
            false,
        ))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invitations_default_to_recruiter_and_never_owner() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::CreateInvitation, json!({ "id": 1 })),
    );

    let reply = h
        .send(post("/api/invitations", json!({ "email": "New@School.test" })))
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let params = h.procedures.last_params(Procedure::CreateInvitation).unwrap();
    assert_eq!(params["p_role"], json!("recruiter"));
    assert_eq!(params["p_email"], json!("new@school.test"));

    let reply = h
        .send(post(
            "/api/invitations",
            json!({ "email": "x@school.test", "role": "owner" }),
        ))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h
        .send(post("/api/invitations", json!({ "email": "not-an-email" })))
        .await;
    assert_eq!(reply.error(), "Invalid email address");
}

// ---------------------------------------------------------------------------
// Schools and profile
// ---------------------------------------------------------------------------

#[tokio::test]
async fn school_creation_only_needs_a_signed_in_user() {
    let h = Harness::with_directory(
        MockProcedures::new().returning(Procedure::CreateSchoolWithAdmin, json!({ "id": SCHOOL_ID })),
        MockDirectory::new(),
    );

    let reply = h
        .send(post("/api/schools", json!({ "name": "Riverside Academy", "city": "" })))
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(
        h.procedures.last_params(Procedure::CreateSchoolWithAdmin),
        Some(json!({
            "p_user_id": USER_ID,
            "p_name": "Riverside Academy",
            "p_city": null,
            "p_country": null,
            "p_website": null,
        }))
    );
}

#[tokio::test]
async fn school_profile_reads_and_updates() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::UpdateSchoolProfile, json!({ "name": "RA" })),
    );

    let reply = h.send(get("/api/school", true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["name"], json!("Riverside Academy"));

    let reply = h.send(put("/api/school", json!({}))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h.send(put("/api/school", json!({ "name": "RA" }))).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn search_requires_a_query() {
    let h = Harness::new(MockProcedures::new().returning(Procedure::SearchSchools, json!([])));

    let reply = h.send(get("/api/schools/search", true)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h.send(get("/api/schools/search?q=river", true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        h.procedures.last_params(Procedure::SearchSchools),
        Some(json!({ "p_query": "river", "p_limit": 20 }))
    );
}

#[tokio::test]
async fn admin_profile_is_returned_and_updated() {
    let h = Harness::new(
        MockProcedures::new().returning(Procedure::UpdateAdminProfile, json!({ "first_name": "Ada" })),
    );

    let reply = h.send(get("/api/admin/profile", true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["id"], json!(ADMIN_ID));

    let reply = h.send(put("/api/admin/profile", json!({}))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h
        .send(put("/api/admin/profile", json!({ "firstName": "Ada" })))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

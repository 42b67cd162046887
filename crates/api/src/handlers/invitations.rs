use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use db::{models::AdminRole, Procedure};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::call;
use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, CurrentAdmin, CurrentUser},
    params::{found, optional_text, require_text},
    state::AppState,
};

pub async fn list(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let invitations = call(
        &state,
        Procedure::GetSchoolInvitations,
        json!({ "p_school_id": tenant.school_id }),
    )
    .await?;
    Ok(Json(invitations))
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationDto {
    pub email: Option<String>,
    pub role: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentAdmin(tenant): CurrentAdmin,
    ApiJson(body): ApiJson<CreateInvitationDto>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = require_text(body.email, "email")?.to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    let role = match optional_text(body.role) {
        None => AdminRole::Recruiter,
        Some(raw) => raw.parse().map_err(ApiError::BadRequest)?,
    };
    if role == AdminRole::Owner {
        return Err(ApiError::BadRequest("Cannot invite another owner".into()));
    }

    let invitation = call(
        &state,
        Procedure::CreateInvitation,
        json!({
            "p_school_id": tenant.school_id,
            "p_invited_by": tenant.admin.id,
            "p_email": email,
            "p_role": role.to_string(),
        }),
    )
    .await?;

    info!("school {} invited a new {role}", tenant.school_id);
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn revoke(
    State(state): State<AppState>,
    ApiPath(invitation_id): ApiPath<Uuid>,
    CurrentAdmin(tenant): CurrentAdmin,
) -> Result<Json<Value>, ApiError> {
    let revoked = call(
        &state,
        Procedure::RevokeInvitation,
        json!({
            "p_school_id": tenant.school_id,
            "p_invitation_id": invitation_id,
        }),
    )
    .await?;

    found(revoked, "Invitation")?;
    Ok(Json(json!({ "success": true })))
}

/// Status and expiry fields of an invitation payload.
#[derive(Debug, Deserialize)]
struct InvitationState {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Look an invitation up by token and reject used or expired ones.
async fn usable_invitation(state: &AppState, token: &str, now: DateTime<Utc>) -> Result<Value, ApiError> {
    let invitation = call(
        state,
        Procedure::GetInvitationByToken,
        json!({ "p_token": token }),
    )
    .await?;
    let invitation = found(invitation, "Invitation")?;

    let fields: InvitationState = serde_json::from_value(invitation.clone())
        .map_err(|e| ApiError::Internal(format!("unexpected invitation payload: {e}")))?;
    match fields.status.as_deref() {
        Some("accepted") => return Err(ApiError::Gone("Invitation has already been accepted".into())),
        Some("revoked") => return Err(ApiError::Gone("Invitation has been revoked".into())),
        _ => {}
    }
    if fields.expires_at.is_some_and(|at| at < now) {
        return Err(ApiError::Gone("Invitation has expired".into()));
    }
    Ok(invitation)
}

/// Public lookup used by the invitation landing page.
pub async fn by_token(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    let invitation = usable_invitation(&state, token.trim(), Utc::now()).await?;
    Ok(Json(invitation))
}

#[derive(Debug, Deserialize)]
pub struct AcceptDto {
    pub token: Option<String>,
}

pub async fn accept(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<AcceptDto>,
) -> Result<Json<Value>, ApiError> {
    let token = require_text(body.token, "token")?;
    usable_invitation(&state, &token, Utc::now()).await?;

    let accepted = call(
        &state,
        Procedure::AcceptInvitation,
        json!({ "p_token": token, "p_user_id": user.id }),
    )
    .await?;

    info!("user {} accepted an invitation", user.id);
    Ok(Json(found(accepted, "Invitation")?))
}

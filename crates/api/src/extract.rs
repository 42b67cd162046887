//! Request extractors: the calling user, their tenant, and JSON/query/path
//! wrappers whose rejections render as [`ApiError`].

use auth::{ResolvedSession, User};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use db::models::{AdminRole, AdminUserInfoRow};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// A JSON body that may be left out entirely.
///
/// An empty body yields `None`; anything else must be valid JSON for `T`.
#[derive(Debug)]
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }
        serde_json::from_slice(&bytes)
            .map(|body| Self(Some(body)))
            .map_err(|e| ApiError::BadRequest(format!("Failed to parse the request body as JSON: {e}")))
    }
}

/// All `Cookie` headers of a request, joined into one.
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// Whoever sent the request, signed in or not.
///
/// Reuses the session resolved by the session middleware when present.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<User>);

impl Caller {
    pub fn user(&self) -> Result<&User, ApiError> {
        self.0.as_ref().ok_or(ApiError::Unauthorized)
    }

    /// The caller's admin profile and school.
    pub async fn tenant(&self, state: &AppState) -> Result<Tenant, ApiError> {
        let user = self.user()?.clone();
        let admin = state
            .directory
            .admin_for_user(user.id)
            .await?
            .ok_or_else(ApiError::no_school)?;
        let school_id = admin.school_id.ok_or_else(ApiError::no_school)?;
        Ok(Tenant {
            user,
            admin,
            school_id,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        if let Some(resolved) = parts.extensions.get::<ResolvedSession>() {
            return Ok(Self(resolved.user.clone()));
        }
        let header = cookie_header(&parts.headers);
        let resolved = state.sessions.resolve(header.as_deref()).await?;
        Ok(Self(resolved.user))
    }
}

/// A signed-in admin attached to a school.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub user: User,
    pub admin: AdminUserInfoRow,
    pub school_id: Uuid,
}

impl Tenant {
    /// Only the school's owner may continue.
    pub fn ensure_owner(&self) -> Result<(), ApiError> {
        if self.admin.role() == AdminRole::Owner {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Only the school owner can manage the calendar integration".into(),
            ))
        }
    }

    /// Reject requests naming a school other than the caller's.
    pub fn ensure_school(&self, school_id: Uuid) -> Result<(), ApiError> {
        if school_id == self.school_id {
            Ok(())
        } else {
            Err(ApiError::NotFound("School not found".into()))
        }
    }
}

/// Signed-in user; 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Caller(user) = Caller::from_request_parts(parts, state).await?;
        user.map(Self).ok_or(ApiError::Unauthorized)
    }
}

/// Signed-in admin with a school; 401 or 404 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub Tenant);

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let caller = Caller::from_request_parts(parts, state).await?;
        caller.tenant(state).await.map(Self)
    }
}

//! Fixtures for router tests: a signed-in admin, mock collaborators and
//! helpers to drive the router with `oneshot`.

use std::sync::Arc;

use auth::{
    cookies::encode_session, mock::MockAuthProvider, AuthSession, CookieOptions, SessionBridge,
    User,
};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use db::{
    mock::{MockDirectory, MockProcedures},
    models::{AdminUserInfoRow, SchoolRow},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{router, state::AppState};

pub const COOKIE_NAME: &str = "sb-test-auth-token";
pub const ACCESS_TOKEN: &str = "valid-access-token";

pub const SCHOOL_ID: Uuid = Uuid::from_u128(0x5c40_0000_0000_0000_0000_0000_0000_0001);
pub const USER_ID: Uuid = Uuid::from_u128(0x0005_e400_0000_0000_0000_0000_0000_0001);
pub const ADMIN_ID: Uuid = Uuid::from_u128(0x00ad_0000_0000_0000_0000_0000_0000_0001);

pub fn verified_user() -> User {
    User {
        id: USER_ID,
        email: Some("head@school.test".into()),
        email_confirmed_at: Some(Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()),
    }
}

pub fn admin_row(school_id: Option<Uuid>) -> AdminUserInfoRow {
    AdminUserInfoRow {
        id: ADMIN_ID,
        user_id: USER_ID,
        school_id,
        email: "head@school.test".into(),
        first_name: Some("Ada".into()),
        last_name: Some("Okafor".into()),
        role: "owner".into(),
        avatar_url: None,
        created_at: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
    }
}

pub fn school_row() -> SchoolRow {
    SchoolRow {
        id: SCHOOL_ID,
        name: "Riverside Academy".into(),
        city: Some("Leeds".into()),
        country: Some("UK".into()),
        website: None,
        logo_url: None,
        created_at: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
    }
}

/// `Cookie` header value carrying a long-lived session for [`ACCESS_TOKEN`].
pub fn session_cookie() -> String {
    let session = AuthSession {
        access_token: ACCESS_TOKEN.into(),
        refresh_token: "refresh-token".into(),
        expires_at: Some(4_000_000_000),
        expires_in: None,
        token_type: "bearer".into(),
        user: None,
    };
    format!("{COOKIE_NAME}={}", encode_session(&session))
}

/// Mock collaborators wired into an [`AppState`].
pub struct Harness {
    pub procedures: MockProcedures,
    pub directory: MockDirectory,
    pub auth: MockAuthProvider,
    pub state: AppState,
}

impl Harness {
    /// A verified admin of [`SCHOOL_ID`].
    pub fn new(procedures: MockProcedures) -> Self {
        let directory = MockDirectory::new()
            .with_admin(admin_row(Some(SCHOOL_ID)))
            .with_school(school_row());
        Self::with_directory(procedures, directory)
    }

    pub fn with_directory(procedures: MockProcedures, directory: MockDirectory) -> Self {
        let auth = MockAuthProvider::new().with_user(ACCESS_TOKEN, verified_user());
        Self::with_parts(procedures, directory, auth)
    }

    pub fn with_parts(
        procedures: MockProcedures,
        directory: MockDirectory,
        auth: MockAuthProvider,
    ) -> Self {
        let sessions = SessionBridge::new(
            Arc::new(auth.clone()),
            COOKIE_NAME,
            CookieOptions::default(),
        );
        let state = AppState::new(
            Arc::new(procedures.clone()),
            Arc::new(directory.clone()),
            sessions,
        );
        Self {
            procedures,
            directory,
            auth,
            state,
        }
    }

    pub fn app(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        send(self.app(), request).await
    }
}

/// Status, headers and decoded JSON body (`Null` when empty).
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_owned)
            .collect()
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Reply {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Reply {
        status,
        headers,
        body,
    }
}

pub fn request(method: Method, uri: &str, body: Option<Value>, signed_in: bool) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if signed_in {
        builder = builder.header(header::COOKIE, session_cookie());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str, signed_in: bool) -> Request<Body> {
    request(Method::GET, uri, None, signed_in)
}

//! Calendar provider — creates interview events with meeting links.
//!
//! [`GoogleCalendar`] talks to the Google Calendar v3 API using a long-lived
//! OAuth2 refresh token. Access tokens are minted on demand and cached until
//! shortly before they expire.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::CalendarError;

const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

/// Mint a new access token this long before the cached one expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// OAuth2 client settings for the calendar integration.
pub struct CalendarConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    /// Absent until the one-time consent flow has been completed.
    pub refresh_token: Option<SecretString>,
}

impl std::fmt::Debug for CalendarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarConfig")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// One calendar event to create, for a single attendee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendee_email: String,
    /// Idempotency key for the provider; retries reuse it.
    pub request_id: String,
    pub with_meeting_link: bool,
}

/// An event as created by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub event_id: String,
    pub html_link: Option<String>,
    pub meeting_link: Option<String>,
}

/// Tokens returned by the authorization-code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Creates calendar events.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CreatedEvent, CalendarError>;
}

// ---------------------------------------------------------------------------
// Google implementation
// ---------------------------------------------------------------------------

struct CachedToken {
    token: SecretString,
    expires_at: Instant,
}

pub struct GoogleCalendar {
    config: CalendarConfig,
    auth_url: String,
    token_url: String,
    api_base_url: String,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    id: String,
    #[serde(default)]
    html_link: Option<String>,
    #[serde(default)]
    hangout_link: Option<String>,
    #[serde(default)]
    conference_data: Option<ConferenceData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceData {
    #[serde(default)]
    entry_points: Vec<EntryPoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPoint {
    entry_point_type: String,
    uri: String,
}

impl EventResponse {
    fn into_created(self) -> CreatedEvent {
        let meeting_link = self.hangout_link.or_else(|| {
            self.conference_data.and_then(|data| {
                data.entry_points
                    .into_iter()
                    .find(|e| e.entry_point_type == "video")
                    .map(|e| e.uri)
            })
        });
        CreatedEvent {
            event_id: self.id,
            html_link: self.html_link,
            meeting_link,
        }
    }
}

impl GoogleCalendar {
    pub fn new(config: CalendarConfig) -> Result<Self, CalendarError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            config,
            auth_url: DEFAULT_AUTH_URL.to_owned(),
            token_url: DEFAULT_TOKEN_URL.to_owned(),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            http,
            token: Mutex::new(None),
        })
    }

    /// Point the client at different OAuth/API endpoints.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Consent URL for the one-time authorization that yields a refresh token.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String, CalendarError> {
        let mut url = url::Url::parse(&self.auth_url)
            .map_err(|e| CalendarError::Fatal(format!("invalid auth url: {e}")))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", CALENDAR_SCOPE)
                .append_pair("access_type", "offline")
                .append_pair("prompt", "consent");
            if let Some(state) = state {
                q.append_pair("state", state);
            }
        }
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, CalendarError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret().as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        let grant = response
            .json::<TokenGrant>()
            .await
            .map_err(|e| CalendarError::Fatal(format!("malformed token response: {e}")))?;
        info!("calendar authorization code exchanged");
        Ok(grant)
    }

    async fn access_token(&self) -> Result<SecretString, CalendarError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(SecretString::new(token.token.expose_secret().clone()));
            }
        }

        let refresh_token = self
            .config
            .refresh_token
            .as_ref()
            .ok_or(CalendarError::NotConfigured)?;

        debug!("minting calendar access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret().as_str()),
                ("refresh_token", refresh_token.expose_secret().as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| CalendarError::Fatal(format!("malformed token response: {e}")))?;

        let expires_at = Instant::now() + Duration::from_secs(body.expires_in.unwrap_or(3_600));
        *cached = Some(CachedToken {
            token: SecretString::new(body.access_token.clone()),
            expires_at,
        });
        Ok(SecretString::new(body.access_token))
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }
}

/// Google Calendar event body for one attendee.
pub fn event_body(event: &NewCalendarEvent) -> serde_json::Value {
    let mut body = json!({
        "summary": event.summary,
        "start": { "dateTime": event.start.to_rfc3339() },
        "end": { "dateTime": event.end.to_rfc3339() },
        "attendees": [{ "email": event.attendee_email }],
    });
    if let Some(description) = &event.description {
        body["description"] = json!(description);
    }
    if let Some(location) = &event.location {
        body["location"] = json!(location);
    }
    if event.with_meeting_link {
        body["conferenceData"] = json!({
            "createRequest": {
                "requestId": event.request_id,
                "conferenceSolutionKey": { "type": "hangoutsMeet" },
            }
        });
    }
    body
}

/// Map a non-success response to a retryable or fatal error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CalendarError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(classify_status(status, message))
}

pub(crate) fn classify_status(status: StatusCode, message: String) -> CalendarError {
    let message = format!("calendar provider returned {status}: {message}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        CalendarError::Retryable(message)
    } else {
        CalendarError::Fatal(message)
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendar {
    #[instrument(skip_all, fields(request_id = %event.request_id))]
    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CreatedEvent, CalendarError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{}/calendars/primary/events", self.api_base_url))
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .bearer_auth(token.expose_secret())
            .json(&event_body(event))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("calendar access token rejected, forgetting it");
            self.forget_token().await;
        }

        let response = check_status(response).await?;
        let created = response
            .json::<EventResponse>()
            .await
            .map_err(|e| CalendarError::Fatal(format!("malformed event response: {e}")))?
            .into_created();
        Ok(created)
    }
}

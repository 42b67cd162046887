//! Calendar sync — one calendar event per interview attendee.
//!
//! Attendees are dispatched concurrently, bounded by
//! [`SyncOptions::max_concurrency`]. Each call retries `Retryable` failures
//! with exponential back-off up to [`SyncOptions::max_retries`]; `Fatal`
//! failures are reported immediately. The outcome of every attendee is
//! collected into a [`SyncReport`], in input order.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{CalendarError, CalendarProvider, CreatedEvent, NewCalendarEvent};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the dispatcher.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub max_concurrency: usize,
    /// Maximum number of times a retryable failure will be retried.
    pub max_retries: u32,
    /// Base delay for exponential back-off between retries.
    pub retry_base_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// The interview being synced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSlot {
    pub interview_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One person invited to the interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncedAttendee {
    pub attendee_id: Uuid,
    pub email: String,
    pub event: CreatedEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedAttendee {
    pub attendee_id: Uuid,
    pub email: Option<String>,
    pub error: String,
}

/// Aggregated outcome of a sync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub synced: Vec<SyncedAttendee>,
    pub failed: Vec<FailedAttendee>,
}

impl SyncReport {
    /// First meeting link produced by any created event.
    pub fn meeting_link(&self) -> Option<&str> {
        self.synced
            .iter()
            .find_map(|s| s.event.meeting_link.as_deref())
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Outcome {
    Synced(SyncedAttendee),
    Failed(FailedAttendee),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Create one event per attendee and aggregate the results.
#[instrument(skip_all, fields(interview_id = %slot.interview_id, attendees = attendees.len()))]
pub async fn sync_attendees(
    provider: Arc<dyn CalendarProvider>,
    slot: &InterviewSlot,
    attendees: Vec<Attendee>,
    options: &SyncOptions,
) -> SyncReport {
    let permits = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let mut handles = Vec::with_capacity(attendees.len());

    for attendee in attendees {
        let Some(email) = attendee.email.clone().filter(|e| !e.trim().is_empty()) else {
            handles.push((
                attendee.id,
                None,
                Err(FailedAttendee {
                    attendee_id: attendee.id,
                    email: None,
                    error: "attendee has no email address".into(),
                }),
            ));
            continue;
        };

        let event = NewCalendarEvent {
            summary: slot.title.clone(),
            description: slot.description.clone(),
            location: slot.location.clone(),
            start: slot.start_time,
            end: slot.end_time,
            attendee_email: email.clone(),
            request_id: format!("{}-{}", slot.interview_id, attendee.id),
            with_meeting_link: true,
        };

        let provider = Arc::clone(&provider);
        let permits = Arc::clone(&permits);
        let options = options.clone();
        let attendee_id = attendee.id;

        let handle = tokio::spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();
            let result = create_with_retry(provider.as_ref(), &event, &options).await;
            match result {
                Ok(created) => Outcome::Synced(SyncedAttendee {
                    attendee_id,
                    email,
                    event: created,
                }),
                Err(e) => Outcome::Failed(FailedAttendee {
                    attendee_id,
                    email: Some(email),
                    error: e.to_string(),
                }),
            }
        });
        handles.push((attendee.id, attendee.email, Ok(handle)));
    }

    let mut report = SyncReport::default();
    for (attendee_id, email, handle) in handles {
        let outcome = match handle {
            Err(failed) => Outcome::Failed(failed),
            Ok(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!("calendar sync task for {attendee_id} aborted: {join_err}");
                    Outcome::Failed(FailedAttendee {
                        attendee_id,
                        email,
                        error: "calendar sync task aborted".into(),
                    })
                }
            },
        };
        match outcome {
            Outcome::Synced(s) => report.synced.push(s),
            Outcome::Failed(f) => report.failed.push(f),
        }
    }

    info!(
        "calendar sync finished: {} synced, {} failed",
        report.synced.len(),
        report.failed.len()
    );
    report
}

/// Upper bound on a single back-off sleep.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// `base * 2^(attempt - 1)`, saturating at [`MAX_RETRY_DELAY`].
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

async fn create_with_retry(
    provider: &dyn CalendarProvider,
    event: &NewCalendarEvent,
    options: &SyncOptions,
) -> Result<CreatedEvent, CalendarError> {
    let mut attempts = 0u32;

    loop {
        match provider.create_event(event).await {
            Ok(created) => return Ok(created),

            Err(CalendarError::Retryable(msg)) => {
                attempts += 1;
                if attempts > options.max_retries {
                    return Err(CalendarError::Retryable(format!(
                        "gave up after {attempts} attempts: {msg}"
                    )));
                }

                let delay = backoff_delay(options.retry_base_delay, attempts);

                warn!(
                    "calendar event for '{}' failed (attempt {}/{}), retrying in {:?}: {}",
                    event.attendee_email, attempts, options.max_retries, delay, msg
                );

                tokio::time::sleep(delay).await;
            }

            Err(other) => return Err(other),
        }
    }
}

//! `MockCalendar` — a test double for [`CalendarProvider`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{CalendarError, CalendarProvider, CreatedEvent, NewCalendarEvent};

/// Behaviour for events addressed to one attendee email.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Fail with a `Retryable` error this many times, then succeed.
    FlakyTimes(u32),
    /// Always fail with a `Fatal` error.
    FailFatal(String),
    /// Always fail with a `Retryable` error.
    FailRetryable(String),
}

/// A mock calendar that records every event it receives.
///
/// Attendees without a scripted behaviour succeed on the first call.
#[derive(Clone, Default)]
pub struct MockCalendar {
    behaviours: Arc<Mutex<HashMap<String, MockBehaviour>>>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
    /// All events seen by this calendar (in call order, retries included).
    pub calls: Arc<Mutex<Vec<NewCalendarEvent>>>,
    in_flight: Arc<Mutex<(usize, usize)>>,
    delay: Option<std::time::Duration>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour(self, email: impl Into<String>, behaviour: MockBehaviour) -> Self {
        self.behaviours.lock().unwrap().insert(email.into(), behaviour);
        self
    }

    /// Hold every call for `delay` so concurrency can be observed.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of calls that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().1
    }
}

#[async_trait]
impl CalendarProvider for MockCalendar {
    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CreatedEvent, CalendarError> {
        self.calls.lock().unwrap().push(event.clone());
        {
            let mut g = self.in_flight.lock().unwrap();
            g.0 += 1;
            g.1 = g.1.max(g.0);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.lock().unwrap().0 -= 1;

        let email = event.attendee_email.clone();
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(email.clone()).or_insert(0);
            *n += 1;
            *n
        };

        match self.behaviours.lock().unwrap().get(&email) {
            Some(MockBehaviour::FailFatal(msg)) => return Err(CalendarError::Fatal(msg.clone())),
            Some(MockBehaviour::FailRetryable(msg)) => {
                return Err(CalendarError::Retryable(msg.clone()))
            }
            Some(MockBehaviour::FlakyTimes(n)) if attempt <= *n => {
                return Err(CalendarError::Retryable(format!("attempt {attempt} failed")))
            }
            _ => {}
        }

        Ok(CreatedEvent {
            event_id: format!("evt-{}", event.request_id),
            html_link: None,
            meeting_link: Some(format!("https://meet.example/{}", event.request_id)),
        })
    }
}

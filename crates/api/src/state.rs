//! Shared application state handed to every handler.

use std::sync::Arc;

use auth::{RouteTable, SessionBridge};
use db::{Directory, Procedure, RemoteProcedures};
use serde_json::Value;
use services::{CalendarProvider, GoogleCalendar, ResponseCache, SyncOptions};
use uuid::Uuid;

/// Cache key for one analytics response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyticsKey {
    pub school_id: Uuid,
    pub procedure: Procedure,
    /// Remaining query parameters (period, job id) in a fixed order.
    pub variant: String,
}

pub type AnalyticsCache = ResponseCache<AnalyticsKey, Value>;

#[derive(Clone)]
pub struct AppState {
    pub procedures: Arc<dyn RemoteProcedures>,
    pub directory: Arc<dyn Directory>,
    pub sessions: SessionBridge,
    pub routes: Arc<RouteTable>,
    pub analytics: Arc<AnalyticsCache>,
    /// Event creation; `None` when calendar integration is not configured.
    pub calendar: Option<Arc<dyn CalendarProvider>>,
    /// Consent flow for obtaining a refresh token.
    pub calendar_oauth: Option<Arc<GoogleCalendar>>,
    pub sync_options: SyncOptions,
}

impl AppState {
    pub fn new(
        procedures: Arc<dyn RemoteProcedures>,
        directory: Arc<dyn Directory>,
        sessions: SessionBridge,
    ) -> Self {
        Self {
            procedures,
            directory,
            sessions,
            routes: Arc::new(RouteTable::default()),
            analytics: Arc::new(AnalyticsCache::default()),
            calendar: None,
            calendar_oauth: None,
            sync_options: SyncOptions::default(),
        }
    }

    pub fn with_analytics_cache(mut self, cache: AnalyticsCache) -> Self {
        self.analytics = Arc::new(cache);
        self
    }

    /// Use Google Calendar for both event creation and the consent flow.
    pub fn with_google_calendar(mut self, calendar: GoogleCalendar) -> Self {
        let calendar = Arc::new(calendar);
        let provider: Arc<dyn CalendarProvider> = calendar.clone();
        self.calendar = Some(provider);
        self.calendar_oauth = Some(calendar);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_sync_options(mut self, options: SyncOptions) -> Self {
        self.sync_options = options;
        self
    }

    /// Drop every cached analytics response of `school_id`.
    pub fn invalidate_analytics(&self, school_id: Uuid) {
        self.analytics.invalidate_where(|key| key.school_id == school_id);
    }
}

//! `MockAuthProvider` — a test double for [`AuthProvider`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{AuthError, AuthProvider, AuthSession, User};

/// Scripted auth provider: a fixed set of valid access tokens and refresh outcomes.
#[derive(Clone, Default)]
pub struct MockAuthProvider {
    users: Arc<Mutex<HashMap<String, User>>>,
    refreshes: Arc<Mutex<HashMap<String, AuthSession>>>,
    unreachable: Arc<Mutex<bool>>,
    pub get_user_calls: Arc<Mutex<usize>>,
    pub refresh_calls: Arc<Mutex<usize>>,
    pub sign_out_calls: Arc<Mutex<Vec<String>>>,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `access_token` as belonging to `user`.
    pub fn with_user(self, access_token: impl Into<String>, user: User) -> Self {
        self.users.lock().unwrap().insert(access_token.into(), user);
        self
    }

    /// Exchange `refresh_token` for `session`. Unlisted refresh tokens are rejected.
    pub fn with_refresh(self, refresh_token: impl Into<String>, session: AuthSession) -> Self {
        self.refreshes
            .lock()
            .unwrap()
            .insert(refresh_token.into(), session);
        self
    }

    /// Make every call fail as if the provider were down.
    pub fn unreachable(self) -> Self {
        *self.unreachable.lock().unwrap() = true;
        self
    }

    pub fn refresh_count(&self) -> usize {
        *self.refresh_calls.lock().unwrap()
    }

    fn check(&self) -> Result<(), AuthError> {
        if *self.unreachable.lock().unwrap() {
            return Err(AuthError::Provider {
                status: 503,
                message: "auth provider unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError> {
        *self.get_user_calls.lock().unwrap() += 1;
        self.check()?;
        Ok(self.users.lock().unwrap().get(access_token).cloned())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        *self.refresh_calls.lock().unwrap() += 1;
        self.check()?;
        self.refreshes
            .lock()
            .unwrap()
            .get(refresh_token)
            .cloned()
            .ok_or_else(|| AuthError::RefreshRejected("Invalid Refresh Token".into()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.check()?;
        self.sign_out_calls
            .lock()
            .unwrap()
            .push(access_token.to_owned());
        Ok(())
    }
}

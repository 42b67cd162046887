//! Test doubles for [`RemoteProcedures`] and [`Directory`].
//!
//! Useful in handler tests where a real Postgres connection is either
//! unavailable or irrelevant.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    DbError,
    directory::Directory,
    models::{AdminUserInfoRow, SchoolRow},
    procedures::{Procedure, RemoteProcedures},
};

/// Scripted outcome for one procedure.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return a specific JSON value.
    Return(Value),
    /// Fail with a remote error carrying this SQLSTATE and message.
    Fail { code: Option<String>, message: String },
}

/// A mock invoker that records every call and returns programmer-specified results.
///
/// Procedures without a scripted outcome return `Value::Null`.
#[derive(Clone, Default)]
pub struct MockProcedures {
    outcomes: Arc<Mutex<HashMap<Procedure, MockOutcome>>>,
    /// All calls seen by this mock (in call order).
    pub calls: Arc<Mutex<Vec<(Procedure, Value)>>>,
}

impl MockProcedures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `procedure` succeed with `value`.
    pub fn returning(self, procedure: Procedure, value: Value) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(procedure, MockOutcome::Return(value));
        self
    }

    /// Make `procedure` fail with an upstream error.
    pub fn failing(self, procedure: Procedure, message: impl Into<String>) -> Self {
        self.failing_with_code(procedure, "P0001", message)
    }

    /// Make `procedure` fail with a specific SQLSTATE.
    pub fn failing_with_code(
        self,
        procedure: Procedure,
        code: &str,
        message: impl Into<String>,
    ) -> Self {
        self.outcomes.lock().unwrap().insert(
            procedure,
            MockOutcome::Fail {
                code: Some(code.to_owned()),
                message: message.into(),
            },
        );
        self
    }

    /// Number of times `procedure` has been called.
    pub fn call_count(&self, procedure: Procedure) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| *p == procedure)
            .count()
    }

    /// Parameters of the most recent call to `procedure`.
    pub fn last_params(&self, procedure: Procedure) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| *p == procedure)
            .map(|(_, params)| params.clone())
    }
}

#[async_trait]
impl RemoteProcedures for MockProcedures {
    async fn call(&self, procedure: Procedure, params: Value) -> Result<Value, DbError> {
        procedure.check_params(&params)?;
        self.calls.lock().unwrap().push((procedure, params));

        match self.outcomes.lock().unwrap().get(&procedure) {
            Some(MockOutcome::Return(v)) => Ok(v.clone()),
            Some(MockOutcome::Fail { code, message }) => Err(DbError::Procedure {
                code: code.clone(),
                message: message.clone(),
            }),
            None => Ok(Value::Null),
        }
    }
}

/// In-memory directory of admins and schools.
#[derive(Clone, Default)]
pub struct MockDirectory {
    admins: Arc<Mutex<HashMap<Uuid, AdminUserInfoRow>>>,
    schools: Arc<Mutex<HashMap<Uuid, SchoolRow>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(self, admin: AdminUserInfoRow) -> Self {
        self.admins.lock().unwrap().insert(admin.user_id, admin);
        self
    }

    pub fn with_school(self, school: SchoolRow) -> Self {
        self.schools.lock().unwrap().insert(school.id, school);
        self
    }

    /// Make every lookup fail with a connection-level error.
    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    fn check(&self) -> Result<(), DbError> {
        if *self.fail.lock().unwrap() {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn admin_for_user(&self, user_id: Uuid) -> Result<Option<AdminUserInfoRow>, DbError> {
        self.check()?;
        Ok(self.admins.lock().unwrap().get(&user_id).cloned())
    }

    async fn school(&self, school_id: Uuid) -> Result<SchoolRow, DbError> {
        self.check()?;
        self.schools
            .lock()
            .unwrap()
            .get(&school_id)
            .cloned()
            .ok_or(DbError::NotFound)
    }
}

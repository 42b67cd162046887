//! Route handlers, one module per resource.
//!
//! Every handler follows the same shape: parse, check required fields,
//! resolve the caller and their school, call one remote procedure, map the
//! error and return JSON.

pub mod admin;
pub mod analytics;
pub mod applications;
pub mod calendar;
pub mod interviews;
pub mod invitations;
pub mod jobs;
pub mod schools;
pub mod session;

use axum::Json;
use db::Procedure;
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState};

/// Invoke `procedure` with `params`.
pub(crate) async fn call(
    state: &AppState,
    procedure: Procedure,
    params: Value,
) -> Result<Value, ApiError> {
    Ok(state.procedures.call(procedure, params).await?)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

//! Remote procedures — the named database functions that hold the business logic.
//!
//! Every procedure is called with a fixed set of named parameters. The whole
//! parameter object is bound once as `jsonb` and each argument is extracted
//! and cast to its declared type inside the statement, so the SQL text only
//! ever contains names from this module.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// SQL type a parameter is cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Uuid,
    Text,
    Int,
    Timestamptz,
    Jsonb,
    UuidArray,
}

impl ParamType {
    /// SQL expression extracting parameter `name` from the bound object `$1`.
    fn extract(self, name: &str) -> String {
        match self {
            Self::Uuid => format!("($1::jsonb ->> '{name}')::uuid"),
            Self::Text => format!("($1::jsonb ->> '{name}')"),
            Self::Int => format!("($1::jsonb ->> '{name}')::integer"),
            Self::Timestamptz => format!("($1::jsonb ->> '{name}')::timestamptz"),
            Self::Jsonb => format!("($1::jsonb -> '{name}')"),
            Self::UuidArray => {
                format!("ARRAY(SELECT jsonb_array_elements_text($1::jsonb -> '{name}'))::uuid[]")
            }
        }
    }

    /// Local shape check, so obviously malformed input never reaches the database.
    fn accepts(self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::Uuid => value.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok()),
            Self::Text | Self::Timestamptz => value.is_string(),
            Self::Int => value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
            Self::Jsonb => true,
            Self::UuidArray => value.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|v| v.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok()))
            }),
        }
    }
}

/// What a procedure returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// A single json/jsonb/scalar value (possibly NULL).
    Scalar,
    /// A set of rows, aggregated into a JSON array.
    Rows,
}

macro_rules! procedures {
    ($( $variant:ident => $name:literal, $returns:ident, [ $( $param:literal : $ty:ident ),* $(,)? ] );* $(;)?) => {
        /// Every remote procedure this service invokes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Procedure {
            $( $variant, )*
        }

        impl Procedure {
            /// All procedures, in declaration order.
            pub const ALL: &'static [Procedure] = &[ $( Procedure::$variant, )* ];

            /// SQL function name.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            /// Declared parameters, in call order.
            pub fn params(self) -> &'static [(&'static str, ParamType)] {
                match self {
                    $( Self::$variant => &[ $( ($param, ParamType::$ty), )* ], )*
                }
            }

            pub fn returns(self) -> Returns {
                match self {
                    $( Self::$variant => Returns::$returns, )*
                }
            }
        }
    };
}

procedures! {
    // analytics
    GetSchoolKpis => "get_school_kpis", Scalar,
        ["p_school_id": Uuid, "p_period": Text];
    GetApplicationDistribution => "get_application_distribution", Rows,
        ["p_school_id": Uuid, "p_period": Text];
    GetHiringFunnel => "get_hiring_funnel", Rows,
        ["p_school_id": Uuid, "p_job_id": Uuid];
    GetTimeToHire => "get_time_to_hire", Scalar,
        ["p_school_id": Uuid, "p_period": Text];
    GetApplicationSources => "get_application_sources", Rows,
        ["p_school_id": Uuid, "p_period": Text];
    GetRecentActivity => "get_recent_activity", Rows,
        ["p_school_id": Uuid, "p_limit": Int];

    // schools and admins
    CreateSchoolWithAdmin => "create_school_with_admin", Scalar,
        ["p_user_id": Uuid, "p_name": Text, "p_city": Text, "p_country": Text, "p_website": Text];
    SearchSchools => "search_schools", Rows,
        ["p_query": Text, "p_limit": Int];
    RequestSchoolMembership => "request_school_membership", Scalar,
        ["p_user_id": Uuid, "p_school_id": Uuid, "p_message": Text];
    UpdateSchoolProfile => "update_school_profile", Scalar,
        ["p_school_id": Uuid, "p_name": Text, "p_city": Text, "p_country": Text,
         "p_website": Text, "p_logo_url": Text];
    UpdateAdminProfile => "update_admin_profile", Scalar,
        ["p_user_id": Uuid, "p_first_name": Text, "p_last_name": Text, "p_avatar_url": Text];

    // jobs
    GetSchoolJobs => "get_school_jobs", Scalar,
        ["p_school_id": Uuid, "p_status": Text, "p_offset": Int, "p_limit": Int];
    CreateJob => "create_job", Scalar,
        ["p_school_id": Uuid, "p_created_by": Uuid, "p_job": Jsonb];
    GetJobDetails => "get_job_details", Scalar,
        ["p_school_id": Uuid, "p_job_id": Uuid];
    UpdateJob => "update_job", Scalar,
        ["p_school_id": Uuid, "p_job_id": Uuid, "p_job": Jsonb];
    DeleteJob => "delete_job", Scalar,
        ["p_school_id": Uuid, "p_job_id": Uuid];
    SetJobStatus => "set_job_status", Scalar,
        ["p_school_id": Uuid, "p_job_id": Uuid, "p_status": Text];
    GetJobApplications => "get_job_applications", Rows,
        ["p_school_id": Uuid, "p_job_id": Uuid, "p_status": Text];

    // applications
    GetSchoolApplications => "get_school_applications", Rows,
        ["p_school_id": Uuid, "p_job_id": Uuid, "p_status": Text];
    GetApplicationDetails => "get_application_details", Scalar,
        ["p_school_id": Uuid, "p_application_id": Uuid];
    UpdateApplicationStatus => "update_application_status", Scalar,
        ["p_school_id": Uuid, "p_application_id": Uuid, "p_status": Text, "p_changed_by": Uuid];
    AddApplicationNote => "add_application_note", Scalar,
        ["p_school_id": Uuid, "p_application_id": Uuid, "p_author_id": Uuid, "p_note": Text];
    RateApplication => "rate_application", Scalar,
        ["p_school_id": Uuid, "p_application_id": Uuid, "p_rater_id": Uuid, "p_rating": Int];

    // interviews
    GetSchoolInterviews => "get_school_interviews", Rows,
        ["p_school_id": Uuid, "p_from": Timestamptz, "p_to": Timestamptz];
    ScheduleInterview => "schedule_interview", Scalar,
        ["p_school_id": Uuid, "p_application_id": Uuid, "p_scheduled_by": Uuid,
         "p_start_time": Timestamptz, "p_end_time": Timestamptz, "p_panelist_ids": UuidArray,
         "p_location": Text, "p_interview_type": Text, "p_notes": Text];
    GetInterviewDetails => "get_interview_details", Scalar,
        ["p_school_id": Uuid, "p_interview_id": Uuid];
    RescheduleInterview => "reschedule_interview", Scalar,
        ["p_school_id": Uuid, "p_interview_id": Uuid, "p_start_time": Timestamptz,
         "p_end_time": Timestamptz, "p_panelist_ids": UuidArray];
    CancelInterview => "cancel_interview", Scalar,
        ["p_school_id": Uuid, "p_interview_id": Uuid, "p_reason": Text];
    CheckPanelistAvailability => "check_panelist_availability", Rows,
        ["p_school_id": Uuid, "p_panelist_ids": UuidArray, "p_start_time": Timestamptz,
         "p_end_time": Timestamptz, "p_exclude_interview_id": Uuid];
    SubmitInterviewFeedback => "submit_interview_feedback", Scalar,
        ["p_school_id": Uuid, "p_interview_id": Uuid, "p_panelist_id": Uuid, "p_rating": Int,
         "p_recommendation": Text, "p_comments": Text];
    GetSchoolPanelists => "get_school_panelists", Rows,
        ["p_school_id": Uuid];
    RecordCalendarSync => "record_calendar_sync", Scalar,
        ["p_school_id": Uuid, "p_interview_id": Uuid, "p_meeting_link": Text, "p_events": Jsonb];

    // invitations
    GetSchoolInvitations => "get_school_invitations", Rows,
        ["p_school_id": Uuid];
    CreateInvitation => "create_invitation", Scalar,
        ["p_school_id": Uuid, "p_invited_by": Uuid, "p_email": Text, "p_role": Text];
    RevokeInvitation => "revoke_invitation", Scalar,
        ["p_school_id": Uuid, "p_invitation_id": Uuid];
    GetInvitationByToken => "get_invitation_by_token", Scalar,
        ["p_token": Text];
    AcceptInvitation => "accept_invitation", Scalar,
        ["p_token": Text, "p_user_id": Uuid];
}

impl std::fmt::Display for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Procedure {
    /// Check `params` against the declared signature.
    ///
    /// Unknown keys and values of the wrong shape are rejected. Declared
    /// parameters that are absent are passed as SQL NULL.
    pub fn check_params(self, params: &Value) -> Result<(), DbError> {
        let obj: &Map<String, Value> = params.as_object().ok_or_else(|| {
            DbError::InvalidParams(format!("{self}: parameters must be a JSON object"))
        })?;

        let declared = self.params();
        for (key, value) in obj {
            let Some((_, ty)) = declared.iter().find(|(name, _)| name == key) else {
                return Err(DbError::InvalidParams(format!(
                    "{self}: unknown parameter '{key}'"
                )));
            };
            if !ty.accepts(value) {
                return Err(DbError::InvalidParams(format!(
                    "{self}: parameter '{key}' is not a valid {ty:?}"
                )));
            }
        }
        Ok(())
    }

    /// The SELECT statement invoking this procedure.
    pub fn sql(self) -> String {
        let args = self
            .params()
            .iter()
            .map(|(name, ty)| format!("{name} => {}", ty.extract(name)))
            .collect::<Vec<_>>()
            .join(", ");

        match self.returns() {
            Returns::Scalar => format!("SELECT to_jsonb({}({args})) AS result", self.name()),
            Returns::Rows => format!(
                "SELECT COALESCE(jsonb_agg(to_jsonb(r)), '[]'::jsonb) AS result FROM {}({args}) r",
                self.name()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

/// Invokes remote procedures by name.
///
/// Handlers depend on this trait rather than on a pool so they can be tested
/// against [`crate::mock::MockProcedures`].
#[async_trait]
pub trait RemoteProcedures: Send + Sync {
    /// Call `procedure` with a JSON object of named parameters.
    ///
    /// A NULL scalar result is returned as `Value::Null`; set-returning
    /// procedures always yield an array.
    async fn call(&self, procedure: Procedure, params: Value) -> Result<Value, DbError>;
}

/// Production invoker backed by the Postgres pool.
#[derive(Clone)]
pub struct PgProcedures {
    pool: PgPool,
}

impl PgProcedures {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteProcedures for PgProcedures {
    #[instrument(skip(self, params), fields(procedure = %procedure))]
    async fn call(&self, procedure: Procedure, params: Value) -> Result<Value, DbError> {
        procedure.check_params(&params)?;

        let sql = procedure.sql();
        debug!("calling remote procedure");

        let result: Option<Value> = sqlx::query_scalar(&sql)
            .bind(&params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = DbError::from_procedure(e);
                warn!("remote procedure failed: {err}");
                err
            })?;

        Ok(result.unwrap_or(Value::Null))
    }
}

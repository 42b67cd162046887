//! Typed error type for the db crate.

use thiserror::Error;

pub use sqlx::Error as SqlxError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    /// The remote procedure raised an error inside the database.
    #[error("{message}")]
    Procedure {
        /// Five-character SQLSTATE, when Postgres reported one.
        code: Option<String>,
        message: String,
    },

    /// The parameters passed to a remote procedure do not match its signature.
    #[error("invalid procedure parameters: {0}")]
    InvalidParams(String),
}

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    BadRequest,
    Unauthorized,
    Upstream,
}

impl DbError {
    /// Build a `Procedure` error from a raw sqlx error, keeping the SQLSTATE.
    pub fn from_procedure(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => Self::Procedure {
                code: db_err.code().map(|c| c.into_owned()),
                message: db_err.message().to_owned(),
            },
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::Sqlx(other),
        }
    }

    /// Classify this error by SQLSTATE class.
    ///
    /// `P0002` (no_data_found) is the only remote error treated as a missing
    /// row; every unclassified failure is an upstream failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound => ErrorClass::NotFound,
            Self::InvalidParams(_) => ErrorClass::BadRequest,
            Self::Procedure { code: Some(code), .. } => match code.as_str() {
                "P0002" => ErrorClass::NotFound,
                "42501" => ErrorClass::Unauthorized,
                c if c.starts_with("22") || c.starts_with("23") => ErrorClass::BadRequest,
                c if c.starts_with("28") => ErrorClass::Unauthorized,
                _ => ErrorClass::Upstream,
            },
            Self::Procedure { code: None, .. } | Self::Sqlx(_) => ErrorClass::Upstream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procedure(code: &str) -> DbError {
        DbError::Procedure {
            code: Some(code.to_owned()),
            message: "boom".into(),
        }
    }

    #[test]
    fn sqlstate_classes_map_to_error_classes() {
        assert_eq!(procedure("P0002").class(), ErrorClass::NotFound);
        assert_eq!(procedure("22P02").class(), ErrorClass::BadRequest);
        assert_eq!(procedure("23505").class(), ErrorClass::BadRequest);
        assert_eq!(procedure("28000").class(), ErrorClass::Unauthorized);
        assert_eq!(procedure("42501").class(), ErrorClass::Unauthorized);
        assert_eq!(procedure("P0001").class(), ErrorClass::Upstream);
        assert_eq!(procedure("42883").class(), ErrorClass::Upstream);
    }

    #[test]
    fn local_errors_are_classified() {
        assert_eq!(DbError::NotFound.class(), ErrorClass::NotFound);
        assert_eq!(
            DbError::InvalidParams("x".into()).class(),
            ErrorClass::BadRequest
        );
        assert_eq!(
            DbError::Procedure { code: None, message: "m".into() }.class(),
            ErrorClass::Upstream
        );
    }

    #[test]
    fn procedure_message_is_displayed_verbatim() {
        let err = DbError::Procedure {
            code: Some("P0001".into()),
            message: "Job is already closed".into(),
        };
        assert_eq!(err.to_string(), "Job is already closed");
    }
}

//! `db` crate — persistence layer and remote-procedure invoker.
//!
//! Provides a connection pool, typed row structs for the tables read
//! directly, tenant lookups, and the [`RemoteProcedures`] seam through which
//! all business operations reach the database. No business logic lives here.

pub mod directory;
pub mod error;
pub mod mock;
pub mod models;
pub mod pool;
pub mod procedures;
pub mod repository;

pub use directory::{Directory, PgDirectory};
pub use error::{DbError, ErrorClass};
pub use pool::DbPool;
pub use procedures::{PgProcedures, Procedure, RemoteProcedures};

//! Repository functions — one function per direct table read.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! No business logic here; writes go through remote procedures.

pub mod admins;
pub mod schools;

//! Tenant resolution: which admin profile and school a caller belongs to.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    DbError, DbPool,
    models::{AdminUserInfoRow, SchoolRow},
    repository,
};

/// Read access to the admin and school tables.
#[async_trait]
pub trait Directory: Send + Sync {
    /// The admin profile owned by `user_id`, if any.
    async fn admin_for_user(&self, user_id: Uuid) -> Result<Option<AdminUserInfoRow>, DbError>;

    /// A school by id. Returns `DbError::NotFound` when it does not exist.
    async fn school(&self, school_id: Uuid) -> Result<SchoolRow, DbError>;
}

/// Directory backed by the Postgres pool.
#[derive(Clone)]
pub struct PgDirectory {
    pool: DbPool,
}

impl PgDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn admin_for_user(&self, user_id: Uuid) -> Result<Option<AdminUserInfoRow>, DbError> {
        repository::admins::get_admin_by_user_id(&self.pool, user_id).await
    }

    async fn school(&self, school_id: Uuid) -> Result<SchoolRow, DbError> {
        repository::schools::get_school(&self.pool, school_id).await
    }
}

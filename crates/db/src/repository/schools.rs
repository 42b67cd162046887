//! `schools` lookups.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::SchoolRow};

/// Fetch a single school by its primary key.
pub async fn get_school(pool: &PgPool, id: Uuid) -> Result<SchoolRow, DbError> {
    let row = sqlx::query_as::<_, SchoolRow>(
        r#"SELECT id, name, city, country, website, logo_url, created_at FROM schools WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

//! `admin_user_info` lookups.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::AdminUserInfoRow};

/// Fetch the admin profile owned by an auth identity, if one exists.
pub async fn get_admin_by_user_id(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<AdminUserInfoRow>, DbError> {
    let row = sqlx::query_as::<_, AdminUserInfoRow>(
        r#"
        SELECT id, user_id, school_id, email, first_name, last_name, role, avatar_url, created_at
        FROM admin_user_info
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

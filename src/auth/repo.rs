use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub tz_offset_minutes: i32,
    pub preferences: serde_json::Value,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, tz_offset_minutes, preferences, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, tz_offset_minutes, preferences, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        tz_offset_minutes: i32,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, tz_offset_minutes)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, tz_offset_minutes, preferences, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(tz_offset_minutes)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Users are never hard-deleted; preference updates are the only mutation.
    pub async fn update_preferences(
        db: &PgPool,
        id: Uuid,
        tz_offset_minutes: Option<i32>,
        preferences: Option<&serde_json::Value>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET tz_offset_minutes = COALESCE($2, tz_offset_minutes),
                preferences = COALESCE($3, preferences)
            WHERE id = $1
            RETURNING id, email, password_hash, tz_offset_minutes, preferences, created_at
            "#,
        )
        .bind(id)
        .bind(tz_offset_minutes)
        .bind(preferences)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Timezone offset used for day-window computations; unknown users get UTC.
    pub async fn tz_offset(db: &PgPool, id: Uuid) -> anyhow::Result<i32> {
        let row: Option<(i32,)> =
            sqlx::query_as(r#"SELECT tz_offset_minutes FROM users WHERE id = $1"#)
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(row.map(|r| r.0).unwrap_or(0))
    }
}

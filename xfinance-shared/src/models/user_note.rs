/// Free-text notes, private to their author

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserNote {
    pub async fn create(pool: &PgPool, user_id: Uuid, content: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserNote>(
            r#"
            INSERT INTO user_notes (user_id, content)
            VALUES ($1, $2)
            RETURNING id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    /// The user's notes, most recently edited first
    pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserNote>(
            r#"
            SELECT id, user_id, content, created_at, updated_at
            FROM user_notes
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, user_id: Uuid, id: Uuid, content: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserNote>(
            r#"
            UPDATE user_notes
            SET content = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(content)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

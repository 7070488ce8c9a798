/// Per-user key/value settings (task-pane preferences)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSetting {
    pub user_id: Uuid,
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

impl UserSetting {
    pub async fn get(pool: &PgPool, user_id: Uuid, key: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserSetting>(
            "SELECT user_id, key, value, updated_at FROM user_settings WHERE user_id = $1 AND key = $2",
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserSetting>(
            "SELECT user_id, key, value, updated_at FROM user_settings WHERE user_id = $1 ORDER BY key",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn upsert(pool: &PgPool, user_id: Uuid, key: &str, value: &Value) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserSetting>(
            r#"
            INSERT INTO user_settings (user_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING user_id, key, value, updated_at
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_settings WHERE user_id = $1 AND key = $2")
            .bind(user_id)
            .bind(key)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

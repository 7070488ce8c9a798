/// Audit log
///
/// Business events (logins, admin edits, recorded journal entries) are kept
/// in the `logs` table next to the tracing output, so administrators can
/// review them from the add-in. The worker trims rows past the retention
/// window.
///
/// # Example
///
/// ```no_run
/// use xfinance_shared::models::log::{AuditLog, LogLevel, NewLog};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// AuditLog::record(&pool, NewLog::info("auth.login", "User logged in").by(user_id)).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

/// Default and maximum page size of `AuditLog::list`
pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "log_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: i64,

    /// Acting user, `None` for anonymous or system events
    pub user_id: Option<Uuid>,

    pub level: LogLevel,

    /// Dotted event name, e.g. "accounts.create"
    pub action: String,

    pub message: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Event to record
#[derive(Debug, Clone)]
pub struct NewLog {
    pub user_id: Option<Uuid>,
    pub level: LogLevel,
    pub action: String,
    pub message: String,
    pub metadata: Value,
}

impl NewLog {
    pub fn new(level: LogLevel, action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: None,
            level,
            action: action.into(),
            message: message.into(),
            metadata: json!({}),
        }
    }

    pub fn info(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, action, message)
    }

    pub fn warn(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, action, message)
    }

    /// Attributes the event to a user
    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Filter for `AuditLog::list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    pub level: Option<LogLevel>,
    pub user_id: Option<Uuid>,
    pub action: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl LogFilter {
    fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

impl AuditLog {
    /// Appends an event
    pub async fn record(pool: &PgPool, entry: NewLog) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO logs (user_id, level, action, message, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, level, action, message, metadata, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.level)
        .bind(entry.action)
        .bind(entry.message)
        .bind(entry.metadata)
        .fetch_one(pool)
        .await
    }

    /// Appends an event, logging instead of failing
    ///
    /// For request handlers whose main work already succeeded.
    pub async fn record_quietly(pool: &PgPool, entry: NewLog) {
        let action = entry.action.clone();
        if let Err(e) = Self::record(pool, entry).await {
            tracing::warn!(error = %e, action = %action, "Failed to write audit log");
        }
    }

    /// Newest events first
    pub async fn list(pool: &PgPool, filter: &LogFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, level, action, message, metadata, created_at
            FROM logs
            WHERE ($1::log_level IS NULL OR level = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::text IS NULL OR action = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(filter.level)
        .bind(filter.user_id)
        .bind(filter.action.as_deref())
        .bind(filter.since)
        .bind(filter.effective_limit())
        .fetch_all(pool)
        .await
    }

    /// Deletes events older than `cutoff`, returns how many went
    pub async fn delete_older_than(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

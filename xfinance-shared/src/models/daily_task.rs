/// Daily task notes
///
/// A small per-user to-do list keyed by day. Every query is scoped by
/// `user_id`, so one user can never read or change another user's tasks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_date: NaiveDate,
    pub title: String,
    pub note: Option<String>,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDailyTask {
    pub user_id: Uuid,
    pub task_date: NaiveDate,
    pub title: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDailyTask {
    pub task_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub note: Option<String>,
    pub is_done: Option<bool>,
}

impl DailyTask {
    pub async fn create(pool: &PgPool, data: CreateDailyTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, DailyTask>(
            r#"
            INSERT INTO daily_tasks (user_id, task_date, title, note)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, task_date, title, note, is_done, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.task_date)
        .bind(data.title)
        .bind(data.note)
        .fetch_one(pool)
        .await
    }

    /// Tasks between two days, inclusive
    pub async fn list_range(
        pool: &PgPool,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, DailyTask>(
            r#"
            SELECT id, user_id, task_date, title, note, is_done, created_at, updated_at
            FROM daily_tasks
            WHERE user_id = $1 AND task_date BETWEEN $2 AND $3
            ORDER BY task_date, created_at
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateDailyTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, DailyTask>(
            r#"
            UPDATE daily_tasks
            SET task_date = COALESCE($3, task_date),
                title = COALESCE($4, title),
                note = COALESCE($5, note),
                is_done = COALESCE($6, is_done),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, task_date, title, note, is_done, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.task_date)
        .bind(data.title)
        .bind(data.note)
        .bind(data.is_done)
        .fetch_optional(pool)
        .await
    }

    /// Flips `is_done`
    pub async fn toggle(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, DailyTask>(
            r#"
            UPDATE daily_tasks
            SET is_done = NOT is_done, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, task_date, title, note, is_done, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM daily_tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

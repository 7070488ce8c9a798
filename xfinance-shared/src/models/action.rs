/// Numeric action codes
///
/// An action code gates one bookkeeping feature (edit accounts, record a
/// journal entry, ...). The add-in asks for the caller's codes at login and
/// hides what the user cannot do; the API checks the same codes again.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::ADMIN_ROLE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Action {
    pub code: i32,
    pub name: String,
    pub description: Option<String>,
}

impl Action {
    pub async fn create(pool: &PgPool, data: Action) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            INSERT INTO actions (code, name, description)
            VALUES ($1, $2, $3)
            RETURNING code, name, description
            "#,
        )
        .bind(data.code)
        .bind(data.name.trim())
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Action>("SELECT code, name, description FROM actions ORDER BY code")
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_role(pool: &PgPool, role_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            SELECT a.code, a.name, a.description
            FROM actions a
            JOIN role_actions ra ON ra.action_code = a.code
            WHERE ra.role_id = $1
            ORDER BY a.code
            "#,
        )
        .bind(role_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, code: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM actions WHERE code = $1")
            .bind(code)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any of the user's roles grants the code
    pub async fn user_has(pool: &PgPool, user_id: Uuid, code: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles ur
                JOIN role_actions ra ON ra.role_id = ur.role_id
                WHERE ur.user_id = $1 AND ra.action_code = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_one(pool)
        .await
    }

    /// Codes the user may use, ascending; admins get all of them
    pub async fn codes_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT a.code
            FROM actions a
            WHERE EXISTS (
                SELECT 1 FROM user_roles ur JOIN roles r ON r.id = ur.role_id
                WHERE ur.user_id = $1 AND r.name = $2
            )
            OR EXISTS (
                SELECT 1 FROM user_roles ur
                JOIN role_actions ra ON ra.role_id = ur.role_id
                WHERE ur.user_id = $1 AND ra.action_code = a.code
            )
            ORDER BY a.code
            "#,
        )
        .bind(user_id)
        .bind(ADMIN_ROLE)
        .fetch_all(pool)
        .await
    }
}

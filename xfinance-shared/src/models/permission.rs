/// Named permissions
///
/// Permissions gate the admin screens (users, roles, companies, settings,
/// logs). They reach users through `role_permissions` and `user_roles`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::ADMIN_ROLE;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: Uuid,

    /// e.g. "users:manage"
    pub name: String,

    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub name: String,
    pub description: Option<String>,
}

impl Permission {
    pub async fn create(pool: &PgPool, data: CreatePermission) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(data.name.trim())
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_role(pool: &PgPool, role_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.description, p.created_at
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any of the user's roles grants the permission
    pub async fn user_has(pool: &PgPool, user_id: Uuid, name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles ur
                JOIN role_permissions rp ON rp.role_id = ur.role_id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE ur.user_id = $1 AND p.name = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Names of every permission the user effectively holds
    ///
    /// Admins get every permission.
    pub async fn names_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM permissions p
            WHERE EXISTS (
                SELECT 1 FROM user_roles ur JOIN roles r ON r.id = ur.role_id
                WHERE ur.user_id = $1 AND r.name = $2
            )
            OR EXISTS (
                SELECT 1 FROM user_roles ur
                JOIN role_permissions rp ON rp.role_id = ur.role_id
                WHERE ur.user_id = $1 AND rp.permission_id = p.id
            )
            ORDER BY p.name
            "#,
        )
        .bind(user_id)
        .bind(ADMIN_ROLE)
        .fetch_all(pool)
        .await
    }
}

/// Roles and their links to permissions and action codes
///
/// A user holds any number of roles. The role named `admin` is seeded by the
/// migrations and passes every authorization check.
///
/// # Example
///
/// ```no_run
/// use xfinance_shared::models::role::{CreateRole, Role};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let role = Role::create(&pool, CreateRole {
///     name: "accountant".to_string(),
///     description: Some("Day-to-day bookkeeping".to_string()),
/// }).await?;
///
/// // Replace the role's action codes in one transaction
/// Role::set_actions(&pool, role.id, &[100, 200, 400]).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::ADMIN_ROLE;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Role {
    pub async fn create(pool: &PgPool, data: CreateRole) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(data.name.trim())
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at, updated_at FROM roles ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    /// Roles held by a user
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, r.updated_at
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Whether the user holds the admin role
    pub async fn user_is_admin(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles ur
                JOIN roles r ON r.id = ur.role_id
                WHERE ur.user_id = $1 AND r.name = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(ADMIN_ROLE)
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateRole) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name.map(|n| n.trim().to_string()))
        .bind(data.description)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the role's permissions in one transaction
    pub async fn set_permissions(pool: &PgPool, role_id: Uuid, permission_ids: &[Uuid]) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        if !permission_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, permission_id FROM UNNEST($2::uuid[]) AS t(permission_id)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(%role_id, count = permission_ids.len(), "Role permissions replaced");
        Ok(())
    }

    /// Replaces the role's action codes in one transaction
    pub async fn set_actions(pool: &PgPool, role_id: Uuid, codes: &[i32]) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM role_actions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        if !codes.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO role_actions (role_id, action_code)
                SELECT $1, action_code FROM UNNEST($2::int4[]) AS t(action_code)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(codes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(%role_id, count = codes.len(), "Role actions replaced");
        Ok(())
    }
}

/// Company model
///
/// Every account, customer and CF item belongs to a company; deleting a
/// company cascades to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: Uuid,

    /// Display name (unique)
    pub name: String,

    /// State registration number
    pub register_number: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub register_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCompany {
    pub name: Option<String>,
    pub register_number: Option<Option<String>>,
}

impl Company {
    pub async fn create(pool: &PgPool, data: CreateCompany) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, register_number)
            VALUES ($1, $2)
            RETURNING id, name, register_number, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.register_number)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, register_number, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, register_number, created_at, updated_at
            FROM companies
            ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateCompany) -> Result<Option<Self>, sqlx::Error> {
        // register_number is nullable, so "leave as is" travels as a flag
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = COALESCE($2, name),
                register_number = CASE WHEN $3 THEN $4 ELSE register_number END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, register_number, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.register_number.is_some())
        .bind(data.register_number.flatten())
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the company exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM companies WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_company_deserialize() {
        let update: UpdateCompany = serde_json::from_str(r#"{"name": "Tsetsen LLC"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("Tsetsen LLC"));
        assert!(update.register_number.is_none());
    }
}

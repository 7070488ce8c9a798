/// Customers and suppliers of a company
///
/// The journal sheet references customers by `code`, unique per company.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub register_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub register_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub code: Option<String>,
    pub name: Option<String>,
    pub register_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Customer {
    pub async fn create(pool: &PgPool, data: CreateCustomer) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (company_id, code, name, register_number, phone, email)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, company_id, code, name, register_number, phone, email,
                      created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.code.trim())
        .bind(data.name)
        .bind(data.register_number)
        .bind(data.phone)
        .bind(data.email)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, company_id, code, name, register_number, phone, email,
                   created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a company's customers, optionally filtered by a code/name fragment
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, company_id, code, name, register_number, phone, email,
                   created_at, updated_at
            FROM customers
            WHERE company_id = $1
              AND ($2::text IS NULL OR code ILIKE $2 OR name ILIKE $2)
            ORDER BY code
            "#,
        )
        .bind(company_id)
        .bind(pattern)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateCustomer) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                register_number = COALESCE($4, register_number),
                phone = COALESCE($5, phone),
                email = COALESCE($6, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, company_id, code, name, register_number, phone, email,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.code.map(|c| c.trim().to_string()))
        .bind(data.name)
        .bind(data.register_number)
        .bind(data.phone)
        .bind(data.email)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Cash-flow items
///
/// A CF item tags a transaction with the cash-flow statement line it feeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cf_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CfDirection {
    Inflow,
    Outflow,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CfItem {
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub direction: CfDirection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCfItem {
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub direction: CfDirection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCfItem {
    pub code: Option<String>,
    pub name: Option<String>,
    pub direction: Option<CfDirection>,
}

impl CfItem {
    pub async fn create(pool: &PgPool, data: CreateCfItem) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CfItem>(
            r#"
            INSERT INTO cf_items (company_id, code, name, direction)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, code, name, direction, created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.code.trim())
        .bind(data.name)
        .bind(data.direction)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CfItem>(
            r#"
            SELECT id, company_id, code, name, direction, created_at, updated_at
            FROM cf_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_code(pool: &PgPool, company_id: Uuid, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CfItem>(
            r#"
            SELECT id, company_id, code, name, direction, created_at, updated_at
            FROM cf_items
            WHERE company_id = $1 AND code = $2
            "#,
        )
        .bind(company_id)
        .bind(code.trim())
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CfItem>(
            r#"
            SELECT id, company_id, code, name, direction, created_at, updated_at
            FROM cf_items
            WHERE company_id = $1
            ORDER BY code
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateCfItem) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CfItem>(
            r#"
            UPDATE cf_items
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                direction = COALESCE($4, direction),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, company_id, code, name, direction, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.code.map(|c| c.trim().to_string()))
        .bind(data.name)
        .bind(data.direction)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cf_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serde() {
        assert_eq!(serde_json::to_string(&CfDirection::Inflow).unwrap(), "\"inflow\"");
        let parsed: CreateCfItem = serde_json::from_value(serde_json::json!({
            "company_id": Uuid::nil(),
            "code": "CF01",
            "name": "Receipts from customers",
            "direction": "inflow"
        }))
        .unwrap();
        assert_eq!(parsed.direction, CfDirection::Inflow);
    }
}

/// Chart of accounts
///
/// Account numbers are unique per company. `create` refuses a duplicate
/// number while `upsert` (used by the bulk import) overwrites the existing
/// account in place.
///
/// # Example
///
/// ```no_run
/// use xfinance_shared::models::account::{Account, AccountType, CreateAccount};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, company_id: Uuid) -> Result<(), sqlx::Error> {
/// let cash = Account::create(&pool, CreateAccount {
///     company_id,
///     account_number: "1101".to_string(),
///     name: "Cash on hand".to_string(),
///     account_type: AccountType::Asset,
///     currency: None,
/// }).await?;
///
/// assert_eq!(cash.currency, "MNT");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::ledger::BASE_CURRENCY;

/// Account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Income => "income",
            AccountType::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub company_id: Uuid,

    /// Code used in the journal sheet, e.g. "1101"
    pub account_number: String,

    pub name: String,
    pub account_type: AccountType,

    /// ISO 4217 code
    pub currency: String,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub company_id: Uuid,
    pub account_number: String,
    pub name: String,
    pub account_type: AccountType,

    /// Defaults to MNT
    pub currency: Option<String>,
}

impl CreateAccount {
    fn currency_code(&self) -> String {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(BASE_CURRENCY)
            .to_uppercase()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccount {
    pub account_number: Option<String>,
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
}

impl Account {
    /// Creates an account
    ///
    /// # Errors
    ///
    /// Unique violation on `accounts_company_number_key` if the company
    /// already has this account number
    pub async fn create(pool: &PgPool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let currency = data.currency_code();

        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (company_id, account_number, name, account_type, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_id, account_number, name, account_type, currency,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.account_number.trim())
        .bind(data.name)
        .bind(data.account_type)
        .bind(currency)
        .fetch_one(pool)
        .await
    }

    /// Inserts the account or overwrites the one with the same number
    ///
    /// Takes any executor so `import` can run it inside its transaction.
    pub async fn upsert<'c, E>(executor: E, data: CreateAccount) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'c>,
    {
        let currency = data.currency_code();

        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (company_id, account_number, name, account_type, currency)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (company_id, account_number) DO UPDATE
            SET name = EXCLUDED.name,
                account_type = EXCLUDED.account_type,
                currency = EXCLUDED.currency,
                is_active = TRUE,
                updated_at = NOW()
            RETURNING id, company_id, account_number, name, account_type, currency,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.account_number.trim())
        .bind(data.name)
        .bind(data.account_type)
        .bind(currency)
        .fetch_one(executor)
        .await
    }

    /// Upserts a batch in one transaction
    pub async fn import(pool: &PgPool, rows: Vec<CreateAccount>) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut accounts = Vec::with_capacity(rows.len());

        for data in rows {
            accounts.push(Self::upsert(&mut *tx, data).await?);
        }

        tx.commit().await?;
        Ok(accounts)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, company_id, account_number, name, account_type, currency,
                   is_active, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_number(
        pool: &PgPool,
        company_id: Uuid,
        account_number: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, company_id, account_number, name, account_type, currency,
                   is_active, created_at, updated_at
            FROM accounts
            WHERE company_id = $1 AND account_number = $2
            "#,
        )
        .bind(company_id)
        .bind(account_number.trim())
        .fetch_optional(pool)
        .await
    }

    /// Lists a company's accounts ordered by number
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, company_id, account_number, name, account_type, currency,
                   is_active, created_at, updated_at
            FROM accounts
            WHERE company_id = $1 AND (is_active OR $2)
            ORDER BY account_number
            "#,
        )
        .bind(company_id)
        .bind(include_inactive)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateAccount) -> Result<Option<Self>, sqlx::Error> {
        let currency = data.currency.map(|c| c.trim().to_uppercase());

        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET account_number = COALESCE($2, account_number),
                name = COALESCE($3, name),
                account_type = COALESCE($4, account_type),
                currency = COALESCE($5, currency),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, company_id, account_number, name, account_type, currency,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.account_number.map(|n| n.trim().to_string()))
        .bind(data.name)
        .bind(data.account_type)
        .bind(currency)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
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
    fn test_account_type_serde() {
        assert_eq!(serde_json::to_string(&AccountType::Liability).unwrap(), "\"liability\"");
        let parsed: AccountType = serde_json::from_str("\"expense\"").unwrap();
        assert_eq!(parsed, AccountType::Expense);
        assert_eq!(parsed.as_str(), "expense");
    }

    #[test]
    fn test_create_account_currency_default() {
        let mut data = CreateAccount {
            company_id: Uuid::new_v4(),
            account_number: "1101".to_string(),
            name: "Cash".to_string(),
            account_type: AccountType::Asset,
            currency: None,
        };
        assert_eq!(data.currency_code(), "MNT");

        data.currency = Some(" usd ".to_string());
        assert_eq!(data.currency_code(), "USD");

        data.currency = Some("".to_string());
        assert_eq!(data.currency_code(), "MNT");
    }
}

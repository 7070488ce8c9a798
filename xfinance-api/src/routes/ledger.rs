/// Ledger endpoints
///
/// The workbook posts the raw cell values of its journal sheet and gets
/// the computed report back; nothing about the journal is stored.
///
/// # Endpoints
///
/// - `POST /api/ledger` - account ledger with running balance
/// - `POST /api/ledger/trial-balance` - opening, turnover and closing per account
/// - `POST /api/journal/prepare` - check a typed transaction and render its sheet row
///
/// # Example
///
/// ```text
/// POST /api/ledger
///
/// {
///   "account_code": "1101",
///   "date_from": "2024-01-01",
///   "date_to": "2024-01-31",
///   "rows": [[45292, "1101", "3101", "MNT", 1000, "Capital"]]
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::ensure_company,
};
use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use xfinance_shared::{
    auth::{
        authorization::{actions, require_action},
        middleware::AuthContext,
    },
    ledger::{
        balance::{self, LedgerQuery, LedgerReport, TrialBalance},
        journal::{parse_rows, ColumnLayout, JournalEntry},
        rates::RateTable,
        LedgerError,
    },
    models::{
        account::Account,
        cf_item::CfItem,
        log::{AuditLog, NewLog},
    },
};

#[derive(Debug, Deserialize)]
pub struct LedgerRequest {
    #[serde(flatten)]
    pub query: LedgerQuery,

    /// Journal sheet cells, one array per row
    pub rows: Vec<Vec<Value>>,

    #[serde(default)]
    pub layout: ColumnLayout,
}

#[derive(Debug, Deserialize)]
pub struct TrialBalanceRequest {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub rows: Vec<Vec<Value>>,

    #[serde(default)]
    pub layout: ColumnLayout,
}

#[derive(Debug, Deserialize)]
pub struct PrepareJournalRequest {
    pub company_id: Uuid,
    pub entry: JournalEntry,

    /// Rate sheet cells, `[date, currency, rate]` per row
    #[serde(default)]
    pub rates: Vec<Vec<Value>>,
}

/// Row ready to append to the journal sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRow {
    pub row: Vec<Value>,
    pub rate: f64,

    /// Amount in MNT
    pub base_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct PrepareJournalResponse {
    #[serde(flatten)]
    pub prepared: PreparedRow,
    pub debit_account_name: String,
    pub credit_account_name: String,
}

/// Account ledger over the posted journal rows
pub async fn ledger(
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<LedgerRequest>,
) -> ApiResult<Json<LedgerReport>> {
    let journal = parse_rows(&req.rows, &req.layout);
    let report = balance::reconstruct(&journal, &req.query)?;

    tracing::debug!(
        user_id = %auth.user_id,
        account = %report.account_code,
        entries = report.entries.len(),
        skipped = report.skipped_rows,
        "Ledger built"
    );

    Ok(Json(report))
}

/// Trial balance over the posted journal rows
pub async fn trial_balance(
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TrialBalanceRequest>,
) -> ApiResult<Json<TrialBalance>> {
    let journal = parse_rows(&req.rows, &req.layout);
    let report = balance::trial_balance(&journal, req.date_from, req.date_to)?;

    tracing::debug!(
        user_id = %auth.user_id,
        accounts = report.lines.len(),
        skipped = report.skipped_rows,
        "Trial balance built"
    );

    Ok(Json(report))
}

/// Validates the entry and converts it with the rate sheet
fn prepare_row(entry: &JournalEntry, rates: &RateTable) -> Result<PreparedRow, LedgerError> {
    entry.validate()?;

    let rate = rates.rate_on(&entry.currency_code(), entry.date)?;

    Ok(PreparedRow {
        row: entry.to_cells(rate),
        rate,
        base_amount: entry.amount * rate,
    })
}

async fn active_account(state: &AppState, company_id: Uuid, number: &str) -> ApiResult<Account> {
    match Account::find_by_number(&state.db, company_id, number).await? {
        Some(account) if account.is_active => Ok(account),
        Some(_) => Err(ApiError::BadRequest(format!("Account {} is inactive", number.trim()))),
        None => Err(ApiError::BadRequest(format!("Unknown account {}", number.trim()))),
    }
}

/// Checks a "record transaction" form and renders the journal row
///
/// Needs the `JOURNAL_RECORD` action.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid entry, unknown or inactive account, unknown
///   CF item, or no rate for the currency on that date
/// - `404 Not Found`: Company does not exist
pub async fn prepare_journal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PrepareJournalRequest>,
) -> ApiResult<Json<PrepareJournalResponse>> {
    require_action(&state.db, &auth, actions::JOURNAL_RECORD).await?;
    req.entry.validate()?;
    ensure_company(&state, req.company_id).await?;

    let debit = active_account(&state, req.company_id, &req.entry.debit_account).await?;
    let credit = active_account(&state, req.company_id, &req.entry.credit_account).await?;

    if let Some(code) = req.entry.cf_item.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        if CfItem::find_by_code(&state.db, req.company_id, code).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown CF item {}", code)));
        }
    }

    let rates = RateTable::from_rows(&req.rates);
    let prepared = prepare_row(&req.entry, &rates)?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info(
            "journal.record",
            format!(
                "{} Dr {} Cr {} {} {}",
                req.entry.date,
                debit.account_number,
                credit.account_number,
                req.entry.amount,
                req.entry.currency_code()
            ),
        )
        .by(auth.user_id)
        .with_metadata(json!({
            "company_id": req.company_id,
            "rate": prepared.rate,
            "base_amount": prepared.base_amount,
        })),
    )
    .await;

    Ok(Json(PrepareJournalResponse {
        prepared,
        debit_account_name: debit.name,
        credit_account_name: credit.name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(currency: &str, amount: f64) -> JournalEntry {
        JournalEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            debit_account: "1102".to_string(),
            credit_account: "3101".to_string(),
            currency: currency.to_string(),
            amount,
            description: "Capital in USD".to_string(),
            customer: None,
            related_account: None,
            cf_item: None,
        }
    }

    fn rates() -> RateTable {
        RateTable::from_rows(&[
            vec![json!("Date"), json!("Currency"), json!("Rate")],
            vec![json!("2024-03-01"), json!("USD"), json!(3400.0)],
            vec![json!("2024-03-20"), json!("USD"), json!(3450.0)],
        ])
    }

    #[test]
    fn test_prepare_row_converts_with_latest_rate() {
        let prepared = prepare_row(&entry("usd", 100.0), &rates()).unwrap();

        assert_eq!(prepared.rate, 3400.0);
        assert_eq!(prepared.base_amount, 340_000.0);
        assert_eq!(prepared.row.len(), 11);
        assert_eq!(prepared.row[3], json!("USD"));
        assert_eq!(prepared.row[9], json!(340_000.0));
    }

    #[test]
    fn test_prepare_row_base_currency_needs_no_rate() {
        let prepared = prepare_row(&entry("MNT", 5000.0), &RateTable::new()).unwrap();
        assert_eq!(prepared.rate, 1.0);
        assert_eq!(prepared.base_amount, 5000.0);
    }

    #[test]
    fn test_prepare_row_missing_rate() {
        let err = prepare_row(&entry("EUR", 10.0), &rates()).unwrap_err();
        assert!(matches!(err, LedgerError::MissingRate { ref currency, .. } if currency == "EUR"));
    }

    #[test]
    fn test_prepare_row_rejects_invalid_entry() {
        let err = prepare_row(&entry("USD", 0.0), &rates()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidEntry(_)));
    }

    #[test]
    fn test_ledger_request_shape() {
        let req: LedgerRequest = serde_json::from_value(json!({
            "account_code": "1101",
            "date_from": "2024-01-01",
            "date_to": "2024-01-31",
            "rows": [[45292, "1101", "3101", "MNT", 1000]],
        }))
        .unwrap();

        assert_eq!(req.query.account_code, "1101");
        assert!(req.query.currency.is_none());
        assert_eq!(req.layout, ColumnLayout::default());
        assert_eq!(req.rows.len(), 1);
    }
}

/// Ledger engine for journal sheets
///
/// The workbook keeps its journal as a plain range of cells: one row per
/// transaction with a date, a debit account, a credit account, a currency and
/// an amount. This module turns such a range into typed rows and derives
/// account ledgers and trial balances from it. Nothing here touches the
/// database; callers post the raw cell values and get a report back.
///
/// # Modules
///
/// - `serial_date`: Excel serial day numbers <-> calendar dates
/// - `journal`: raw cell parsing and the "record a transaction" entry
/// - `balance`: ledger reconstruction and trial balance
/// - `rates`: exchange rate lookup from the rate sheet
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use serde_json::json;
/// use xfinance_shared::ledger::{balance::{reconstruct, LedgerQuery}, journal::{parse_rows, ColumnLayout}};
///
/// let cells = vec![
///     vec![json!("Date"), json!("Debit"), json!("Credit"), json!("Cur"), json!("Amount")],
///     vec![json!(45292), json!(1101), json!(3101), json!("MNT"), json!(1000)],
/// ];
/// let journal = parse_rows(&cells, &ColumnLayout::default());
/// let report = reconstruct(&journal, &LedgerQuery {
///     account_code: "1101".to_string(),
///     date_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     date_to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
///     currency: None,
/// }).unwrap();
/// assert_eq!(report.closing_balance, 1000.0);
/// ```

pub mod balance;
pub mod journal;
pub mod rates;
pub mod serial_date;

use chrono::NaiveDate;

/// Functional currency of the books
pub const BASE_CURRENCY: &str = "MNT";

/// Error type for ledger operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// Date range is inverted
    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// No account code was given
    #[error("Account code is required")]
    MissingAccountCode,

    /// Journal entry failed validation
    #[error("Invalid journal entry: {0}")]
    InvalidEntry(String),

    /// Rate sheet has no rate for the currency on or before the date
    #[error("No {currency} rate on or before {date}")]
    MissingRate { currency: String, date: NaiveDate },
}

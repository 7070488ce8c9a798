/// Ledger reconstruction
///
/// Rebuilds an account's ledger from the journal: the opening balance is the
/// signed sum of every row dated strictly before the range, and each row
/// inside `[date_from, date_to]` carries the running balance after it is
/// applied. Debit adds, credit subtracts.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use serde_json::json;
/// use xfinance_shared::ledger::balance::{reconstruct, LedgerQuery};
/// use xfinance_shared::ledger::journal::{parse_rows, ColumnLayout};
///
/// let cells = vec![
///     vec![json!("2023-12-31"), json!("1101"), json!("3101"), json!("MNT"), json!(500)],
///     vec![json!("2024-01-10"), json!("5101"), json!("1101"), json!("MNT"), json!(120)],
/// ];
/// let journal = parse_rows(&cells, &ColumnLayout::default());
///
/// let report = reconstruct(&journal, &LedgerQuery {
///     account_code: "1101".to_string(),
///     date_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     date_to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
///     currency: None,
/// }).unwrap();
///
/// assert_eq!(report.opening_balance, 500.0);
/// assert_eq!(report.closing_balance, 380.0);
/// ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::journal::{JournalRow, ParsedJournal};
use super::LedgerError;

/// What ledger to build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub account_code: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,

    /// Only rows in this currency count when set
    #[serde(default)]
    pub currency: Option<String>,
}

impl LedgerQuery {
    fn validate(&self) -> Result<(), LedgerError> {
        if self.account_code.trim().is_empty() {
            return Err(LedgerError::MissingAccountCode);
        }
        check_range(self.date_from, self.date_to)
    }
}

fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), LedgerError> {
    if from > to {
        return Err(LedgerError::InvalidRange { from, to });
    }
    Ok(())
}

/// One ledger line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub row_index: usize,
    pub date: NaiveDate,
    pub debit_account: String,
    pub credit_account: String,
    pub counter_account: String,
    pub currency: String,
    pub amount: f64,
    pub debit: f64,
    pub credit: f64,
    pub description: String,
    pub customer: String,
    pub related_account: String,

    /// Balance after this line
    pub balance: f64,
}

/// Ledger of one account over a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerReport {
    pub account_code: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub currency: Option<String>,
    pub opening_balance: f64,
    pub closing_balance: f64,
    pub total_debit: f64,
    pub total_credit: f64,
    pub entries: Vec<LedgerEntry>,
    pub skipped_rows: usize,
}

/// Builds the ledger of `query.account_code`
///
/// In-range rows are ordered by date (sheet order breaks ties) before the
/// running balance is applied, so every line's balance follows from the one
/// above it. An account with no rows yields an empty ledger with zero
/// balances.
///
/// # Errors
///
/// - `LedgerError::MissingAccountCode` for a blank code
/// - `LedgerError::InvalidRange` when `date_from > date_to`
pub fn reconstruct(journal: &ParsedJournal, query: &LedgerQuery) -> Result<LedgerReport, LedgerError> {
    query.validate()?;

    let code = query.account_code.trim();
    let currency = query
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase);

    let mut opening_balance = 0.0;
    let mut in_range: Vec<&JournalRow> = Vec::new();

    for row in &journal.rows {
        if !row.touches(code) {
            continue;
        }
        if let Some(ref currency) = currency {
            if &row.currency != currency {
                continue;
            }
        }

        if row.date < query.date_from {
            opening_balance += row.signed_amount_for(code);
        } else if row.date <= query.date_to {
            in_range.push(row);
        }
    }

    in_range.sort_by_key(|row| (row.date, row.row_index));

    let mut balance = opening_balance;
    let mut total_debit = 0.0;
    let mut total_credit = 0.0;

    let entries: Vec<LedgerEntry> = in_range
        .into_iter()
        .map(|row| {
            let (debit, credit) = row.sides_for(code);
            balance += debit - credit;
            total_debit += debit;
            total_credit += credit;

            LedgerEntry {
                row_index: row.row_index,
                date: row.date,
                debit_account: row.debit_account.clone(),
                credit_account: row.credit_account.clone(),
                counter_account: row.counter_account(code).to_string(),
                currency: row.currency.clone(),
                amount: row.amount,
                debit,
                credit,
                description: row.description.clone(),
                customer: row.customer.clone(),
                related_account: row.related_account.clone(),
                balance,
            }
        })
        .collect();

    tracing::debug!(
        account_code = code,
        entries = entries.len(),
        skipped_rows = journal.skipped_rows,
        "Ledger reconstructed"
    );

    Ok(LedgerReport {
        account_code: code.to_string(),
        date_from: query.date_from,
        date_to: query.date_to,
        currency,
        opening_balance,
        closing_balance: balance,
        total_debit,
        total_credit,
        entries,
        skipped_rows: journal.skipped_rows,
    })
}

/// Per-account line of a trial balance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrialBalanceLine {
    pub account_code: String,
    pub opening_balance: f64,
    pub debit_turnover: f64,
    pub credit_turnover: f64,
    pub closing_balance: f64,
}

/// Opening, turnover and closing of every account in the journal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialBalance {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub lines: Vec<TrialBalanceLine>,
    pub total_debit_turnover: f64,
    pub total_credit_turnover: f64,
    pub skipped_rows: usize,
}

/// Builds a trial balance over `[date_from, date_to]`
///
/// Every account posted on or before `date_to` gets a line, sorted by code.
/// Rows after the range are ignored.
pub fn trial_balance(
    journal: &ParsedJournal,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<TrialBalance, LedgerError> {
    check_range(date_from, date_to)?;

    let mut lines: BTreeMap<&str, TrialBalanceLine> = BTreeMap::new();

    for row in journal.rows.iter().filter(|row| row.date <= date_to) {
        let before = row.date < date_from;

        for (code, is_debit) in [(&row.debit_account, true), (&row.credit_account, false)] {
            if code.is_empty() {
                continue;
            }

            let line = lines.entry(code.as_str()).or_insert_with(|| TrialBalanceLine {
                account_code: code.clone(),
                ..Default::default()
            });

            match (before, is_debit) {
                (true, true) => line.opening_balance += row.amount,
                (true, false) => line.opening_balance -= row.amount,
                (false, true) => line.debit_turnover += row.amount,
                (false, false) => line.credit_turnover += row.amount,
            }
        }
    }

    let lines: Vec<TrialBalanceLine> = lines
        .into_values()
        .map(|mut line| {
            line.closing_balance = line.opening_balance + line.debit_turnover - line.credit_turnover;
            line
        })
        .collect();

    let total_debit_turnover = lines.iter().map(|l| l.debit_turnover).sum();
    let total_credit_turnover = lines.iter().map(|l| l.credit_turnover).sum();

    Ok(TrialBalance {
        date_from,
        date_to,
        lines,
        total_debit_turnover,
        total_credit_turnover,
        skipped_rows: journal.skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::journal::{parse_rows, ColumnLayout};
    use serde_json::{json, Value};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(d: &str, debit: &str, credit: &str, currency: &str, amount: f64) -> Vec<Value> {
        vec![
            json!(d),
            json!(debit),
            json!(credit),
            json!(currency),
            json!(amount),
            json!(format!("{} -> {}", credit, debit)),
            json!(""),
            json!(""),
        ]
    }

    fn sample_journal() -> ParsedJournal {
        let cells = vec![
            vec![json!("Date"), json!("Debit"), json!("Credit"), json!("Currency"), json!("Amount")],
            row("2023-12-15", "1101", "3101", "MNT", 1000.0),
            row("2023-12-20", "5101", "1101", "MNT", 250.0),
            row("2024-01-20", "1101", "4101", "MNT", 400.0),
            row("2024-01-05", "5201", "1101", "MNT", 100.0),
            row("2024-01-31", "1101", "1201", "USD", 50.0),
            row("2024-02-01", "5101", "1101", "MNT", 75.0),
            row("2024-01-10", "5101", "2101", "MNT", 60.0),
        ];
        parse_rows(&cells, &ColumnLayout::default())
    }

    fn january(code: &str) -> LedgerQuery {
        LedgerQuery {
            account_code: code.to_string(),
            date_from: date(2024, 1, 1),
            date_to: date(2024, 1, 31),
            currency: None,
        }
    }

    #[test]
    fn test_opening_and_closing_balances() {
        let report = reconstruct(&sample_journal(), &january("1101")).unwrap();

        assert_eq!(report.opening_balance, 750.0);
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.total_debit, 450.0);
        assert_eq!(report.total_credit, 100.0);
        assert_eq!(report.closing_balance, 1100.0);
        assert_eq!(report.skipped_rows, 1);
    }

    #[test]
    fn test_closing_is_opening_plus_in_range_sum() {
        let journal = sample_journal();
        for code in ["1101", "3101", "5101", "1201", "4101", "2101", "9999"] {
            let report = reconstruct(&journal, &january(code)).unwrap();

            let before: f64 = journal
                .rows
                .iter()
                .filter(|r| r.date < date(2024, 1, 1))
                .map(|r| r.signed_amount_for(code))
                .sum();
            let within: f64 = journal
                .rows
                .iter()
                .filter(|r| r.date >= date(2024, 1, 1) && r.date <= date(2024, 1, 31))
                .map(|r| r.signed_amount_for(code))
                .sum();

            assert_eq!(report.opening_balance, before, "opening for {}", code);
            assert_eq!(report.closing_balance, before + within, "closing for {}", code);
        }
    }

    #[test]
    fn test_entries_sorted_with_running_balance() {
        let report = reconstruct(&sample_journal(), &january("1101")).unwrap();

        let dates: Vec<NaiveDate> = report.entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 1, 20), date(2024, 1, 31)]);

        let balances: Vec<f64> = report.entries.iter().map(|e| e.balance).collect();
        assert_eq!(balances, vec![650.0, 1050.0, 1100.0]);

        let first = &report.entries[0];
        assert_eq!(first.counter_account, "5201");
        assert_eq!(first.debit, 0.0);
        assert_eq!(first.credit, 100.0);
        assert_eq!(first.row_index, 4);
    }

    #[test]
    fn test_same_day_rows_keep_sheet_order() {
        let cells = vec![
            row("2024-01-02", "1101", "3101", "MNT", 10.0),
            row("2024-01-01", "5101", "1101", "MNT", 3.0),
            row("2024-01-02", "5101", "1101", "MNT", 4.0),
        ];
        let journal = parse_rows(&cells, &ColumnLayout::default());
        let report = reconstruct(&journal, &january("1101")).unwrap();

        let order: Vec<usize> = report.entries.iter().map(|e| e.row_index).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert_eq!(report.entries.last().unwrap().balance, 3.0);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let cells = vec![
            row("2024-01-01", "1101", "3101", "MNT", 1.0),
            row("2024-01-31", "1101", "3101", "MNT", 2.0),
            row("2023-12-31", "1101", "3101", "MNT", 4.0),
            row("2024-02-01", "1101", "3101", "MNT", 8.0),
        ];
        let journal = parse_rows(&cells, &ColumnLayout::default());
        let report = reconstruct(&journal, &january("1101")).unwrap();

        assert_eq!(report.opening_balance, 4.0);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.closing_balance, 7.0);
    }

    #[test]
    fn test_no_matching_rows() {
        let report = reconstruct(&sample_journal(), &january("7777")).unwrap();
        assert!(report.entries.is_empty());
        assert_eq!(report.opening_balance, 0.0);
        assert_eq!(report.closing_balance, 0.0);
    }

    #[test]
    fn test_currency_filter() {
        let mut query = january("1101");
        query.currency = Some("usd".to_string());

        let report = reconstruct(&sample_journal(), &query).unwrap();
        assert_eq!(report.currency.as_deref(), Some("USD"));
        assert_eq!(report.opening_balance, 0.0);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.closing_balance, 50.0);
    }

    #[test]
    fn test_account_code_is_trimmed() {
        let report = reconstruct(&sample_journal(), &january(" 1101 ")).unwrap();
        assert_eq!(report.account_code, "1101");
        assert_eq!(report.entries.len(), 3);
    }

    #[test]
    fn test_invalid_queries() {
        let mut inverted = january("1101");
        inverted.date_from = date(2024, 2, 1);
        assert!(matches!(
            reconstruct(&sample_journal(), &inverted),
            Err(LedgerError::InvalidRange { .. })
        ));

        assert_eq!(
            reconstruct(&sample_journal(), &january("  ")),
            Err(LedgerError::MissingAccountCode)
        );
    }

    #[test]
    fn test_trial_balance() {
        let tb = trial_balance(&sample_journal(), date(2024, 1, 1), date(2024, 1, 31)).unwrap();

        let codes: Vec<&str> = tb.lines.iter().map(|l| l.account_code.as_str()).collect();
        assert_eq!(codes, vec!["1101", "1201", "2101", "3101", "4101", "5101", "5201"]);

        let cash = &tb.lines[0];
        assert_eq!(cash.opening_balance, 750.0);
        assert_eq!(cash.debit_turnover, 450.0);
        assert_eq!(cash.credit_turnover, 100.0);
        assert_eq!(cash.closing_balance, 1100.0);

        let expenses = tb.lines.iter().find(|l| l.account_code == "5101").unwrap();
        assert_eq!(expenses.opening_balance, 250.0);
        assert_eq!(expenses.debit_turnover, 60.0);
        assert_eq!(expenses.closing_balance, 310.0);

        // Double entry: turnovers and closing balances both net out
        assert_eq!(tb.total_debit_turnover, tb.total_credit_turnover);
        let net: f64 = tb.lines.iter().map(|l| l.closing_balance).sum();
        assert_eq!(net, 0.0);
    }

    #[test]
    fn test_trial_balance_matches_ledger() {
        let journal = sample_journal();
        let tb = trial_balance(&journal, date(2024, 1, 1), date(2024, 1, 31)).unwrap();

        for line in &tb.lines {
            let report = reconstruct(&journal, &january(&line.account_code)).unwrap();
            assert_eq!(report.opening_balance, line.opening_balance);
            assert_eq!(report.closing_balance, line.closing_balance);
        }
    }

    #[test]
    fn test_trial_balance_rejects_inverted_range() {
        let result = trial_balance(&sample_journal(), date(2024, 2, 1), date(2024, 1, 1));
        assert!(result.is_err());
    }
}

/// Journal sheet rows
///
/// A journal sheet is an append-only range of transactions. Each row names
/// the debited and the credited account, so one row moves `amount` from the
/// credit side to the debit side. Cell values arrive exactly as the
/// spreadsheet host reports them: numbers, strings, booleans or empty
/// strings, so every reader here is lenient about the cell type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{serial_date, LedgerError, BASE_CURRENCY};

static EMPTY_CELL: Value = Value::Null;

/// Column positions of the journal fields inside a row
///
/// Defaults follow the sheet template: date, debit, credit, currency,
/// amount, description, customer, related account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub date: usize,
    pub debit: usize,
    pub credit: usize,
    pub currency: usize,
    pub amount: usize,
    pub description: usize,
    pub customer: usize,
    pub related_account: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: 0,
            debit: 1,
            credit: 2,
            currency: 3,
            amount: 4,
            description: 5,
            customer: 6,
            related_account: 7,
        }
    }
}

/// One parsed journal row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalRow {
    /// Zero-based position of the row inside the posted range
    pub row_index: usize,
    pub date: NaiveDate,
    pub debit_account: String,
    pub credit_account: String,
    pub currency: String,
    pub amount: f64,
    pub description: String,
    pub customer: String,
    pub related_account: String,
}

impl JournalRow {
    /// Parses a raw row
    ///
    /// Returns `None` for rows that are not transactions: header rows, blank
    /// rows, rows whose date or amount cannot be read, and rows with neither
    /// a debit nor a credit account.
    pub fn from_cells(row_index: usize, cells: &[Value], layout: &ColumnLayout) -> Option<Self> {
        let cell = |idx: usize| cells.get(idx).unwrap_or(&EMPTY_CELL);

        let date = serial_date::parse_cell_date(cell(layout.date))?;
        let amount = cell_amount(cell(layout.amount))?;
        let debit_account = cell_text(cell(layout.debit));
        let credit_account = cell_text(cell(layout.credit));

        if debit_account.is_empty() && credit_account.is_empty() {
            return None;
        }

        let currency = match cell_text(cell(layout.currency)) {
            c if c.is_empty() => BASE_CURRENCY.to_string(),
            c => c.to_uppercase(),
        };

        Some(Self {
            row_index,
            date,
            debit_account,
            credit_account,
            currency,
            amount,
            description: cell_text(cell(layout.description)),
            customer: cell_text(cell(layout.customer)),
            related_account: cell_text(cell(layout.related_account)),
        })
    }

    /// Whether the account appears on either side of the row
    pub fn touches(&self, code: &str) -> bool {
        self.debit_account == code || self.credit_account == code
    }

    /// Amount this row adds to the account's balance
    ///
    /// Debit adds, credit subtracts. A row posting the account against
    /// itself nets to zero.
    pub fn signed_amount_for(&self, code: &str) -> f64 {
        let (debit, credit) = self.sides_for(code);
        debit - credit
    }

    /// Debit and credit amounts this row posts to the account
    pub fn sides_for(&self, code: &str) -> (f64, f64) {
        let debit = if self.debit_account == code { self.amount } else { 0.0 };
        let credit = if self.credit_account == code { self.amount } else { 0.0 };
        (debit, credit)
    }

    /// The other side of the row relative to `code`
    pub fn counter_account(&self, code: &str) -> &str {
        if self.debit_account == code {
            &self.credit_account
        } else {
            &self.debit_account
        }
    }
}

/// Parsed journal range
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedJournal {
    pub rows: Vec<JournalRow>,

    /// Rows that were not transactions (headers, blanks, unreadable)
    pub skipped_rows: usize,
}

/// Parses every row of a posted range
pub fn parse_rows(cells: &[Vec<Value>], layout: &ColumnLayout) -> ParsedJournal {
    let mut journal = ParsedJournal::default();

    for (idx, row) in cells.iter().enumerate() {
        match JournalRow::from_cells(idx, row, layout) {
            Some(parsed) => journal.rows.push(parsed),
            None => journal.skipped_rows += 1,
        }
    }

    journal
}

/// Renders a cell as trimmed text
///
/// Integral numbers lose their fractional part so an account code typed as
/// the number `1101` matches the string `"1101"`.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Reads an amount out of a cell
///
/// Strings may carry thousands separators (`"1,250.50"`) or spaces.
pub fn cell_amount(cell: &Value) -> Option<f64> {
    let value = match cell {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };

    value.is_finite().then_some(value)
}

/// A transaction typed into the "record transaction" form
///
/// Validated, converted to the base currency with the rate sheet, and
/// rendered as the row to append to the journal sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: NaiveDate,
    pub debit_account: String,
    pub credit_account: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    pub amount: f64,

    #[serde(default)]
    pub description: String,

    pub customer: Option<String>,
    pub related_account: Option<String>,

    /// Cash-flow item code the transaction is tagged with
    pub cf_item: Option<String>,
}

fn default_currency() -> String {
    BASE_CURRENCY.to_string()
}

impl JournalEntry {
    /// Checks the entry can be posted
    pub fn validate(&self) -> Result<(), LedgerError> {
        let debit = self.debit_account.trim();
        let credit = self.credit_account.trim();

        if debit.is_empty() || credit.is_empty() {
            return Err(LedgerError::InvalidEntry(
                "Both debit and credit accounts are required".to_string(),
            ));
        }

        if debit == credit {
            return Err(LedgerError::InvalidEntry(
                "Debit and credit accounts must differ".to_string(),
            ));
        }

        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(LedgerError::InvalidEntry(
                "Amount must be greater than zero".to_string(),
            ));
        }

        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LedgerError::InvalidEntry(format!(
                "Unknown currency code: {}",
                self.currency
            )));
        }

        Ok(())
    }

    /// Currency code in canonical form
    pub fn currency_code(&self) -> String {
        self.currency.trim().to_uppercase()
    }

    /// Row to append to the journal sheet
    ///
    /// The first eight cells follow [`ColumnLayout::default`], then the
    /// rate, the base-currency amount and the cash-flow item.
    pub fn to_cells(&self, rate: f64) -> Vec<Value> {
        vec![
            json!(serial_date::to_serial(self.date)),
            json!(self.debit_account.trim()),
            json!(self.credit_account.trim()),
            json!(self.currency_code()),
            json!(self.amount),
            json!(self.description),
            json!(self.customer.as_deref().unwrap_or("")),
            json!(self.related_account.as_deref().unwrap_or("")),
            json!(rate),
            json!(self.amount * rate),
            json!(self.cf_item.as_deref().unwrap_or("")),
        ]
    }
}

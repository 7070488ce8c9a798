/// Exchange rates from the rate sheet
///
/// The rate sheet lists `[date, currency, rate]` rows where `rate` is the
/// number of MNT per unit of the currency. A lookup uses the latest rate
/// published on or before the transaction date.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

use super::journal::{cell_amount, cell_text};
use super::{serial_date, LedgerError, BASE_CURRENCY};

/// Rates per currency, each list sorted by date
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<String, Vec<(NaiveDate, f64)>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from raw sheet rows
    ///
    /// Rows with an unreadable date, a blank currency or a rate that is not a
    /// positive number are skipped (header rows included).
    pub fn from_rows(rows: &[Vec<Value>]) -> Self {
        let mut table = Self::new();

        for cells in rows {
            let [date, currency, rate, ..] = cells.as_slice() else {
                continue;
            };

            let Some(date) = serial_date::parse_cell_date(date) else {
                continue;
            };
            let currency = cell_text(currency).to_uppercase();
            if currency.is_empty() {
                continue;
            }
            match cell_amount(rate) {
                Some(rate) if rate > 0.0 => table.insert(&currency, date, rate),
                _ => continue,
            }
        }

        table
    }

    /// Adds a rate, replacing any rate already set for that day
    pub fn insert(&mut self, currency: &str, date: NaiveDate, rate: f64) {
        let series = self.rates.entry(currency.to_uppercase()).or_default();
        match series.binary_search_by_key(&date, |(d, _)| *d) {
            Ok(idx) => series[idx].1 = rate,
            Err(idx) => series.insert(idx, (date, rate)),
        }
    }

    /// Rate of `currency` in force on `date`
    ///
    /// # Errors
    ///
    /// `LedgerError::MissingRate` when nothing was published on or before
    /// `date`. The base currency always converts at 1.
    pub fn rate_on(&self, currency: &str, date: NaiveDate) -> Result<f64, LedgerError> {
        let currency = currency.trim().to_uppercase();
        if currency == BASE_CURRENCY {
            return Ok(1.0);
        }

        let missing = || LedgerError::MissingRate {
            currency: currency.clone(),
            date,
        };

        let series = self.rates.get(&currency).ok_or_else(missing)?;
        let idx = series.partition_point(|(d, _)| *d <= date);
        if idx == 0 {
            return Err(missing());
        }
        Ok(series[idx - 1].1)
    }

    /// Number of currencies in the table
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

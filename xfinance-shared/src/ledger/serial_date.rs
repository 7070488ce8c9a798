/// Excel serial dates
///
/// Spreadsheet ranges hand dates over as serial day numbers counted from
/// 1899-12-30 (the epoch that absorbs Excel's phantom 1900-02-29). The
/// fractional part is the time of day and is dropped here.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Days from 0001-01-01 (CE day 1) to 1899-12-30
const EXCEL_EPOCH_CE_DAYS: i32 = 693_594;

/// Largest serial Excel accepts (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

/// Converts a serial day number into a date
///
/// Returns `None` for non-finite values and anything outside
/// `1..=2958465` (serial 0 is Excel's "1900-01-00" and never a real
/// transaction date).
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial >= MAX_SERIAL + 1.0 {
        return None;
    }

    let days = serial.floor() as i32;
    NaiveDate::from_num_days_from_ce_opt(EXCEL_EPOCH_CE_DAYS + days)
}

/// Converts a date into its serial day number
pub fn to_serial(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - EXCEL_EPOCH_CE_DAYS)
}

/// Parses a date written as text
///
/// Accepts `YYYY-MM-DD`, `YYYY.MM.DD` and `YYYY/MM/DD`, optionally followed
/// by a time part (`2024-01-05 10:30` or `2024-01-05T10:30:00`), and plain
/// serial numbers such as `"45292"`.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let date_part = raw
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(raw);

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date);
        }
    }

    raw.parse::<f64>().ok().and_then(from_serial)
}

/// Reads a date out of a raw cell value
pub fn parse_cell_date(cell: &Value) -> Option<NaiveDate> {
    match cell {
        Value::Number(n) => n.as_f64().and_then(from_serial),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_known_serials() {
        assert_eq!(from_serial(1.0), Some(date(1899, 12, 31)));
        assert_eq!(from_serial(25569.0), Some(date(1970, 1, 1)));
        assert_eq!(from_serial(45292.0), Some(date(2024, 1, 1)));
        assert_eq!(from_serial(MAX_SERIAL), Some(date(9999, 12, 31)));
    }

    #[test]
    fn test_time_fraction_is_dropped() {
        assert_eq!(from_serial(45292.75), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_out_of_range_serials() {
        assert_eq!(from_serial(0.0), None);
        assert_eq!(from_serial(-5.0), None);
        assert_eq!(from_serial(f64::NAN), None);
        assert_eq!(from_serial(MAX_SERIAL + 1.0), None);
    }

    #[test]
    fn test_to_serial_inverts_from_serial() {
        assert_eq!(to_serial(date(2024, 1, 1)), 45292.0);
        assert_eq!(to_serial(date(1970, 1, 1)), 25569.0);
        let d = date(2023, 7, 14);
        assert_eq!(from_serial(to_serial(d)), Some(d));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date_str("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_str("2024.03.05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_str("2024/03/05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_str(" 2024-03-05 10:15 "), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_str("2024-03-05T10:15:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_str("45292"), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_parse_date_rejects_text() {
        assert_eq!(parse_date_str("Date"), None);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("2024-13-01"), None);
    }

    #[test]
    fn test_parse_cell_date() {
        assert_eq!(parse_cell_date(&json!(45292)), Some(date(2024, 1, 1)));
        assert_eq!(parse_cell_date(&json!("2024-01-01")), Some(date(2024, 1, 1)));
        assert_eq!(parse_cell_date(&json!(null)), None);
        assert_eq!(parse_cell_date(&json!(true)), None);
    }
}

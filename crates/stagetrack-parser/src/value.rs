//! Loose value normalization
//!
//! Source spreadsheets deliver dates and percentages in mixed encodings.
//! Everything is normalized here, once, into `Option<NaiveDate>` /
//! `Option<f64>`. Unparseable input is missing, never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Placeholders that mean "no value"
const MISSING_MARKERS: &[&str] = &["", "-", "N/D", "ND", "N/A", "NA", "NAN", "NAT", "NONE", "NULL"];

/// Whether a trimmed string is an explicit "no value" marker
pub fn is_missing_marker(text: &str) -> bool {
    let upper = text.trim().to_uppercase();
    MISSING_MARKERS.contains(&upper.as_str())
}

/// Parse a date in one of the accepted shapes:
/// `YYYY-MM-DD`, `DD/MM/YYYY`, `DD/MM/YY`, RFC 3339, or
/// `YYYY-MM-DD HH:MM:SS` (time part dropped).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if is_missing_marker(text) {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }

    if text.contains('/') {
        let year_digits = text.rsplit('/').next().map_or(0, str::len);
        let format = if year_digits == 2 { "%d/%m/%y" } else { "%d/%m/%Y" };
        return NaiveDate::parse_from_str(text, format).ok();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

/// Parse a percentage: `"85"`, `"85%"`, `"0,85"`, `"0.85"`.
///
/// Returns the value on its observed scale; scale detection happens in
/// the aggregator.
pub fn parse_percent(text: &str) -> Option<f64> {
    let text = text.trim();
    if is_missing_marker(text) {
        return None;
    }
    let cleaned = text.trim_end_matches('%').trim().replace(',', ".");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether a JSON value carries something (not null, not a missing marker)
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !is_missing_marker(s),
        _ => true,
    }
}

/// Date from a JSON value; only strings can hold dates
pub fn date_from_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

/// Percentage from a JSON number or string
pub fn percent_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_percent(s),
        _ => None,
    }
}

/// Non-empty trimmed text from a JSON string or number
pub fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!is_missing_marker(trimmed)).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn dates_in_all_shapes() {
        assert_eq!(parse_date("2024-02-28"), Some(date(2024, 2, 28)));
        assert_eq!(parse_date(" 28/02/2024 "), Some(date(2024, 2, 28)));
        assert_eq!(parse_date("28/02/24"), Some(date(2024, 2, 28)));
        assert_eq!(parse_date("2024-02-28T10:30:00Z"), Some(date(2024, 2, 28)));
        assert_eq!(parse_date("2024-02-28T10:30:00-03:00"), Some(date(2024, 2, 28)));
        assert_eq!(parse_date("2024-02-28 00:00:00"), Some(date(2024, 2, 28)));
    }

    #[test]
    fn malformed_dates_are_missing() {
        assert_eq!(parse_date("-"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("n/d"), None);
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("next week"), None);
        assert_eq!(date_from_value(&json!(45000)), None);
        assert_eq!(date_from_value(&Value::Null), None);
    }

    #[test]
    fn percentages_in_all_shapes() {
        assert_eq!(parse_percent("85%"), Some(85.0));
        assert_eq!(parse_percent("0,85"), Some(0.85));
        assert_eq!(parse_percent(" 100 "), Some(100.0));
        assert_eq!(percent_from_value(&json!(0.5)), Some(0.5));
        assert_eq!(percent_from_value(&json!("40 %")), Some(40.0));
    }

    #[test]
    fn malformed_percentages_are_missing() {
        assert_eq!(parse_percent("abc"), None);
        assert_eq!(parse_percent("-"), None);
        assert_eq!(parse_percent("NaN"), None);
        assert_eq!(percent_from_value(&json!(true)), None);
    }

    #[test]
    fn text_values() {
        assert_eq!(text_from_value(&json!("  Alpha ")), Some("Alpha".to_string()));
        assert_eq!(text_from_value(&json!(42)), Some("42".to_string()));
        assert_eq!(text_from_value(&json!("N/D")), None);
        assert!(!is_present(&json!("")));
        assert!(is_present(&json!("garbage")));
    }
}

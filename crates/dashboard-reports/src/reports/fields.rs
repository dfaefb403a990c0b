use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::source::Record;

/// Field as text. JSON numbers and booleans keep their literal form;
/// `null` and missing fields yield `None`.
pub(crate) fn text(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn text_or(record: &Record, key: &str, default: &str) -> String {
    text(record, key).unwrap_or_else(|| default.to_string())
}

/// Field as a finite number. Numeric strings are accepted; `"NaN"`,
/// `"inf"` and anything else non-numeric is `None`.
pub(crate) fn number(record: &Record, key: &str) -> Option<f64> {
    let value = match record.get(key)? {
        Value::Number(value) => value.as_f64(),
        Value::String(value) => value.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

pub(crate) fn number_or_zero(record: &Record, key: &str) -> f64 {
    number(record, key).unwrap_or(0.0)
}

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`
/// (both read as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_loose_values() {
        let record = json!({
            "id": 42,
            "name": "Roof repair",
            "revenue": "1250.5",
            "email": null,
            "flag": true
        });
        let record = record.as_object().unwrap();

        assert_eq!(text(record, "id").as_deref(), Some("42"));
        assert_eq!(text(record, "flag").as_deref(), Some("true"));
        assert_eq!(text(record, "email"), None);
        assert_eq!(text_or(record, "phone", ""), "");
        assert_eq!(number(record, "revenue"), Some(1250.5));
        assert_eq!(number(record, "name"), None);
        assert_eq!(number_or_zero(record, "missing"), 0.0);
    }

    #[test]
    fn non_finite_strings_count_as_missing() {
        let record = json!({ "a": "NaN", "b": "inf", "c": "-Infinity", "d": " 12 " });
        let record = record.as_object().unwrap();

        assert_eq!(number(record, "a"), None);
        assert_eq!(number(record, "b"), None);
        assert_eq!(number_or_zero(record, "c"), 0.0);
        assert_eq!(number(record, "d"), Some(12.0));
    }

    #[test]
    fn parses_supported_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("next tuesday"), None);
        assert_eq!(parse_timestamp("  "), None);
    }
}

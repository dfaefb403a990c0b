//! en-US presentation helpers shared by document naming and the renderers.

use chrono::{DateTime, NaiveDate, Utc};

pub fn format_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y %H:%M:%S UTC").to_string()
}

/// Shortest round-trip text for a finite value (`150`, `12.5`).
pub fn plain_number(value: f64) -> String {
    value.to_string()
}

/// [`plain_number`] with the integer digits grouped in threes. The fraction
/// digits are left exactly as `plain_number` prints them.
pub fn group_thousands(value: f64) -> String {
    let magnitude = value.abs();
    let digits = plain_number(magnitude);

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    if value < 0.0 && magnitude > 0.0 {
        grouped.push('-');
    }
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

pub fn format_currency(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", group_thousands(value.abs()))
    } else {
        format!("${}", group_thousands(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dates_use_month_day_year() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(date), "1/5/2024");
        let at = Utc.with_ymd_and_hms(2024, 11, 20, 8, 5, 0).unwrap();
        assert_eq!(format_timestamp(at), "11/20/2024 08:05:00 UTC");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
        assert_eq!(group_thousands(1234.5), "1,234.5");
        assert_eq!(group_thousands(1250.8), "1,250.8");
        assert_eq!(group_thousands(0.25), "0.25");
        assert_eq!(group_thousands(-98765.0), "-98,765");
    }

    #[test]
    fn currency_prefixes_dollar_sign() {
        assert_eq!(format_currency(150.0), "$150");
        assert_eq!(format_currency(25000.0), "$25,000");
        assert_eq!(format_currency(-1200.0), "-$1,200");
    }

    #[test]
    fn plain_numbers_drop_trailing_zero_fraction() {
        assert_eq!(plain_number(150.0), "150");
        assert_eq!(plain_number(12.5), "12.5");
    }
}

//! Recurring send-time arithmetic. All functions are pure.
//!
//! Monthly cadence keeps the day of month and lets days that do not exist
//! in the target month overflow into the next one, so January 31st
//! advances to March 2nd in a leap year and March 3rd otherwise.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc};

use super::domain::{DeliveryTime, Frequency};

/// Next send after `from`: its UTC date advanced by one cadence step, at
/// `delivery_time` (09:00:00 when absent). Always strictly after `from`.
pub fn next_send(
    frequency: Frequency,
    delivery_time: Option<DeliveryTime>,
    from: DateTime<Utc>,
) -> DateTime<Utc> {
    let time = delivery_time.unwrap_or_default();
    let date = advance(frequency, from.date_naive());
    Utc.from_utc_datetime(&date.and_time(time.as_naive()))
}

/// [`next_send`] anchored at the previous send rather than the current
/// time, so a late trigger does not shift the cadence.
pub fn next_send_from_anchor(
    frequency: Frequency,
    delivery_time: Option<DeliveryTime>,
    last_sent: DateTime<Utc>,
) -> DateTime<Utc> {
    next_send(frequency, delivery_time, last_sent)
}

fn advance(frequency: Frequency, date: NaiveDate) -> NaiveDate {
    match frequency {
        Frequency::Daily => date + Days::new(1),
        Frequency::Weekly => date + Days::new(7),
        Frequency::Monthly => add_month_with_overflow(date),
    }
}

fn add_month_with_overflow(date: NaiveDate) -> NaiveDate {
    let overflow_days = u64::from(date.day0());
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|first| first.checked_add_days(Days::new(overflow_days)))
        .unwrap_or(date + Days::new(31))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn month_overflow_rule() {
        let cases = [
            ((2024, 1, 31), (2024, 3, 2)),
            ((2023, 1, 31), (2023, 3, 3)),
            ((2024, 3, 31), (2024, 5, 1)),
            ((2024, 1, 30), (2024, 3, 1)),
            ((2024, 1, 29), (2024, 2, 29)),
            ((2024, 12, 15), (2025, 1, 15)),
            ((2024, 12, 31), (2025, 1, 31)),
        ];
        for ((y, m, d), (ey, em, ed)) in cases {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            assert_eq!(
                add_month_with_overflow(date),
                NaiveDate::from_ymd_opt(ey, em, ed).unwrap(),
                "advancing {date}"
            );
        }
    }

    #[test]
    fn late_evening_anchor_still_moves_forward() {
        let from = at(2024, 6, 10, 23, 59, 59);
        let time = DeliveryTime::from_hms(0, 0, 0);
        assert_eq!(next_send(Frequency::Daily, time, from), at(2024, 6, 11, 0, 0, 0));
    }
}

mod common;

use chrono::{Datelike, Duration, Timelike};
use common::at;
use dashboard_reports::reports::schedule::{
    next_send, next_send_from_anchor, DeliveryTime, Frequency,
};

fn delivery_times() -> Vec<DeliveryTime> {
    ["00:00:00", "06:15:30", "09:00:00", "12:00:01", "23:59:59"]
        .iter()
        .map(|raw| raw.parse().expect("valid delivery time"))
        .collect()
}

#[test]
fn time_of_day_always_matches_delivery_time() {
    let anchors = [
        at(2024, 1, 15, 0, 0, 0),
        at(2024, 2, 29, 23, 59, 59),
        at(2023, 12, 31, 12, 30, 0),
        at(2024, 7, 4, 9, 0, 0),
    ];

    for frequency in Frequency::ordered() {
        for time in delivery_times() {
            for from in anchors {
                let next = next_send(frequency, Some(time), from);
                assert_eq!(
                    next.time(),
                    time.as_naive(),
                    "{frequency} at {time} from {from}"
                );
                assert!(next > from, "{frequency} at {time} from {from} moved backwards");
            }
        }
    }
}

#[test]
fn daily_advances_one_day() {
    let next = next_send(
        Frequency::Daily,
        DeliveryTime::from_hms(9, 0, 0),
        at(2024, 1, 15, 0, 0, 0),
    );
    assert_eq!(next, at(2024, 1, 16, 9, 0, 0));
}

#[test]
fn missing_delivery_time_defaults_to_nine() {
    let next = next_send(Frequency::Daily, None, at(2024, 1, 15, 17, 45, 0));
    assert_eq!(next, at(2024, 1, 16, 9, 0, 0));
}

#[test]
fn weekly_is_seven_calendar_days_later() {
    let time = DeliveryTime::from_hms(14, 30, 0).unwrap();
    let mut from = at(2024, 2, 20, 8, 0, 0);
    for _ in 0..60 {
        let next = next_send(Frequency::Weekly, Some(time), from);
        assert_eq!(next.date_naive(), from.date_naive() + Duration::days(7));
        assert_eq!((next.hour(), next.minute(), next.second()), (14, 30, 0));
        from += Duration::hours(37);
    }
}

#[test]
fn monthly_from_january_31st_lands_on_march_2nd_in_leap_year() {
    let next = next_send(
        Frequency::Monthly,
        DeliveryTime::from_hms(9, 0, 0),
        at(2024, 1, 31, 0, 0, 0),
    );
    assert_eq!(next, at(2024, 3, 2, 9, 0, 0));
}

#[test]
fn monthly_keeps_day_of_month_when_it_exists() {
    let next = next_send(Frequency::Monthly, None, at(2024, 11, 15, 10, 0, 0));
    assert_eq!(next, at(2024, 12, 15, 9, 0, 0));
    let next = next_send(Frequency::Monthly, None, at(2024, 12, 15, 10, 0, 0));
    assert_eq!((next.year(), next.month(), next.day()), (2025, 1, 15));
}

#[test]
fn anchor_variant_matches_now_variant() {
    let last_sent = at(2024, 5, 31, 9, 0, 4);
    let time = DeliveryTime::from_hms(9, 0, 0);
    for frequency in Frequency::ordered() {
        assert_eq!(
            next_send_from_anchor(frequency, time, last_sent),
            next_send(frequency, time, last_sent)
        );
    }
    assert_eq!(
        next_send_from_anchor(Frequency::Monthly, time, last_sent),
        at(2024, 7, 1, 9, 0, 0)
    );
}

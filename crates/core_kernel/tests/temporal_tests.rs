//! Tests for clocks and timestamp formatting

use chrono::{Duration, TimeZone, Utc};
use core_kernel::{format_timestamp, parse_timestamp, Clock, ManualClock, SystemClock};

#[test]
fn test_manual_clock_custom_step() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let clock = ManualClock::with_step(start, Duration::minutes(5));

    assert_eq!(clock.now(), start);
    assert_eq!(clock.now(), start + Duration::minutes(5));
    assert_eq!(clock.peek(), start + Duration::minutes(10));
}

#[test]
fn test_manual_clock_set() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    clock.set(later);
    assert_eq!(clock.now(), later);
}

#[test]
fn test_system_clock_is_close_to_now() {
    let before = Utc::now();
    let observed = SystemClock.now();
    assert!(observed >= before);
}

#[test]
fn test_parse_round_trips_formatted_timestamp() {
    let instant = Utc.with_ymd_and_hms(2024, 11, 30, 23, 59, 58).unwrap();
    let parsed = parse_timestamp(&format_timestamp(instant)).unwrap();
    assert_eq!(parsed, instant);
}

#[test]
fn test_parse_normalizes_offsets_to_utc() {
    let parsed = parse_timestamp("2024-05-01T10:00:00+02:00").unwrap();
    assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
}

#[test]
fn test_formatted_timestamps_sort_chronologically() {
    let earlier = format_timestamp(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap());
    let later = format_timestamp(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
    assert!(earlier < later);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_timestamp("yesterday").is_err());
}

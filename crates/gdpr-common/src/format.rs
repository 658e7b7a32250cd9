//! Date, time and file name formatting shared by all producers.
//!
//! These are plain functions over explicit values; nothing here reads the
//! system time zone or any global configuration.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Date-only ISO form used in file names, e.g. `2024-01-05`.
pub fn filename_date(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// ISO date-time used in log rows, e.g. `2024-01-05T10:15:30`.
///
/// Fractional seconds are only printed when non-zero, with as few digits
/// as needed (`10:15:30.25`).
pub fn content_datetime(value: &NaiveDateTime) -> String {
    format!(
        "{}{}",
        value.format("%Y-%m-%dT%H:%M:%S"),
        fraction(value.nanosecond())
    )
}

/// ISO time-of-day, e.g. `00:02:05`.
pub fn time_of_day(value: &NaiveTime) -> String {
    format!("{}{}", value.format("%H:%M:%S"), fraction(value.nanosecond()))
}

fn fraction(nanos: u32) -> String {
    // leap seconds carry nanos >= 1e9; the extra second is already printed as :60
    let nanos = nanos % 1_000_000_000;
    if nanos == 0 {
        return String::new();
    }
    let digits = format!("{:09}", nanos);
    format!(".{}", digits.trim_end_matches('0'))
}

/// Make a record-derived value safe to use as one path component.
///
/// Separators are replaced so the resulting name always stays inside the
/// directory it is joined onto.
pub fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_milli_opt(h, m, s, milli)
            .unwrap()
    }

    #[test]
    fn test_filename_date() {
        assert_eq!(filename_date(&at(23, 59, 59, 0)), "2024-01-05");
    }

    #[test]
    fn test_content_datetime() {
        assert_eq!(content_datetime(&at(10, 15, 30, 0)), "2024-01-05T10:15:30");
        assert_eq!(
            content_datetime(&at(10, 15, 30, 250)),
            "2024-01-05T10:15:30.25"
        );
        assert_eq!(
            content_datetime(&at(10, 15, 30, 7)),
            "2024-01-05T10:15:30.007"
        );
    }

    #[test]
    fn test_time_of_day() {
        let t = NaiveTime::from_hms_opt(0, 2, 5).unwrap();
        assert_eq!(time_of_day(&t), "00:02:05");
        let t = NaiveTime::from_hms_micro_opt(0, 2, 5, 500_100).unwrap();
        assert_eq!(time_of_day(&t), "00:02:05.5001");
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("ISO19139"), "ISO19139");
        assert_eq!(sanitize_component("../etc"), ".._etc");
        assert_eq!(sanitize_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component(""), "_");
    }
}

//! Time utilities

use chrono::{Local, TimeZone};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Local calendar-day bounds `[start, end)` in millis for the day
/// containing `ts_millis`.
///
/// Used by the order number allocator to scope its query to "orders
/// created today" in the device's timezone.
pub fn local_day_bounds(ts_millis: i64) -> (i64, i64) {
    let day = Local
        .timestamp_millis_opt(ts_millis)
        .single()
        .unwrap_or_else(Local::now)
        .date_naive();
    let start = Local
        .from_local_datetime(&day.and_hms_opt(0, 0, 0).expect("midnight is valid"))
        .single()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(ts_millis);
    (start, start + 86_400_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_contain_timestamp() {
        let now = now_millis();
        let (start, end) = local_day_bounds(now);
        assert!(start <= now);
        assert!(now < end);
        assert_eq!(end - start, 86_400_000);
    }

    #[test]
    fn day_bounds_are_stable_within_a_day() {
        let now = now_millis();
        let (start, _) = local_day_bounds(now);
        // Any timestamp inside the same local day maps to the same bounds
        let (start2, _) = local_day_bounds(start + 1);
        assert_eq!(start, start2);
    }
}

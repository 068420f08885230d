use chrono::{DateTime, Duration, Utc};

/// Whole seconds until the next UTC midnight, floored. Exactly at midnight this
/// is a full day, never zero.
pub fn seconds_until_next_utc_midnight(now: DateTime<Utc>) -> u64 {
    let next_midnight = (now.date_naive() + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc());
    match next_midnight {
        Some(target) => (target - now).num_seconds().max(0) as u64,
        None => 0,
    }
}

/// `HH:MM:SS`, or `--:--:--` for negative values.
pub fn format_hms(total_seconds: i64) -> String {
    if total_seconds < 0 {
        return "--:--:--".to_string();
    }
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

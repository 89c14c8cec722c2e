use chrono::NaiveDateTime;

use crate::retention::dates::parse_snapshot_timestamp;

const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];

/// `1536` → `1.5K`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}P", size)
}

/// Coarse age of a snapshot relative to `now`; empty for unparsable names.
pub fn format_age(timestamp: &str, now: NaiveDateTime) -> String {
    let Some(created) = parse_snapshot_timestamp(timestamp) else {
        return String::new();
    };
    let days = (now - created).num_days();
    match days {
        d if d <= 0 => "today".to_string(),
        1 => "1 day".to_string(),
        d if d < 7 => format!("{} days", d),
        d if d < 30 => format!("{} wk", d / 7),
        d => format!("{} mo", d / 30),
    }
}

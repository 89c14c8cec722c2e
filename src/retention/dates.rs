//! Conversions between the human date forms operators type and the machine
//! form snapshot directories are named with.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

use super::SelectionError;

pub const MACHINE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";
pub const MACHINE_DATE: &str = "%Y%m%d";
pub const HUMAN_TIMESTAMP: &str = "%d.%m.%Y %H:%M:%S";
pub const HUMAN_DATE: &str = "%d.%m.%Y";

/// Shortest normalized date that still names a full day.
const MIN_DATE_LEN: usize = 8;

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Normalizes a `--before`/`--after` bound.
///
/// Accepts `YYYYMMDD` (passed through), `dd.mm.yyyy`, `dd.mm.yyyy HH:MM:SS` and
/// `dd.mm` (completed with `current_year`). Anything that ends up shorter than
/// a full date is rejected.
pub fn normalize_date(input: &str, current_year: i32) -> Result<String, SelectionError> {
    let trimmed = input.trim();

    let normalized = if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, HUMAN_TIMESTAMP) {
        dt.format(MACHINE_TIMESTAMP).to_string()
    } else if let Ok(d) = NaiveDate::parse_from_str(trimmed, HUMAN_DATE) {
        d.format(MACHINE_DATE).to_string()
    } else if let Some(d) = parse_day_month(trimmed, current_year) {
        d.format(MACHINE_DATE).to_string()
    } else {
        trimmed.to_string()
    };

    if normalized.chars().count() < MIN_DATE_LEN {
        return Err(SelectionError::InvalidDate(input.to_string()));
    }
    Ok(normalized)
}

/// Normalizes an exact snapshot timestamp (`--at`).
pub fn normalize_timestamp(input: &str) -> Result<String, SelectionError> {
    let trimmed = input.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, HUMAN_TIMESTAMP) {
        return Ok(dt.format(MACHINE_TIMESTAMP).to_string());
    }
    if trimmed.contains('_') && trimmed.replace('_', "").chars().count() == 14 {
        return Ok(trimmed.to_string());
    }
    Err(SelectionError::InvalidTimestamp(input.to_string()))
}

/// `20260207_143022` → `07.02.2026 14:30:22`; unparsable input is returned as is.
pub fn machine_to_human(machine: &str) -> String {
    if machine.contains('_') {
        NaiveDateTime::parse_from_str(machine, MACHINE_TIMESTAMP)
            .map(|dt| dt.format(HUMAN_TIMESTAMP).to_string())
            .unwrap_or_else(|_| machine.to_string())
    } else {
        NaiveDate::parse_from_str(machine, MACHINE_DATE)
            .map(|d| d.format(HUMAN_DATE).to_string())
            .unwrap_or_else(|_| machine.to_string())
    }
}

pub fn parse_snapshot_timestamp(name: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(name, MACHINE_TIMESTAMP).ok()
}

fn parse_day_month(input: &str, year: i32) -> Option<NaiveDate> {
    let digits = input.replace('.', "");
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{}.{}", input, year), HUMAN_DATE).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_date_uses_current_year() {
        assert_eq!(normalize_date("01.02", 2031).unwrap(), "20310201");
    }

    #[test]
    fn test_full_human_date() {
        assert_eq!(normalize_date("01.02.2026", 2031).unwrap(), "20260201");
    }

    #[test]
    fn test_machine_date_passes_through() {
        assert_eq!(normalize_date("20260201", 2031).unwrap(), "20260201");
        assert_eq!(normalize_date(" 20260201 ", 2031).unwrap(), "20260201");
    }

    #[test]
    fn test_human_timestamp_as_bound() {
        assert_eq!(
            normalize_date("07.02.2026 14:30:22", 2031).unwrap(),
            "20260207_143022"
        );
    }

    #[test]
    fn test_short_input_rejected() {
        assert!(matches!(
            normalize_date("2026", 2031),
            Err(SelectionError::InvalidDate(_))
        ));
        // 31.02 is not a real day, so it is not completed and stays short
        assert!(normalize_date("31.02", 2031).is_err());
        assert!(normalize_date("", 2031).is_err());
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(
            normalize_timestamp("07.02.2026 14:30:22").unwrap(),
            "20260207_143022"
        );
        assert_eq!(
            normalize_timestamp("20260208_183432").unwrap(),
            "20260208_183432"
        );
        assert!(normalize_timestamp("20260208").is_err());
        assert!(normalize_timestamp("07.02.2026").is_err());
    }

    #[test]
    fn test_machine_to_human() {
        assert_eq!(machine_to_human("20260207_143022"), "07.02.2026 14:30:22");
        assert_eq!(machine_to_human("20260207"), "07.02.2026");
        assert_eq!(machine_to_human("garbage"), "garbage");
    }
}

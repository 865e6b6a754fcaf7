// tutorchat Engine — Relative date labels for dashboards.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const NO_DATE: &str = "無";
pub const INVALID_DATE: &str = "無效日期";

const SECS_PER_DAY: i64 = 86_400;

/// Parse the timestamp formats the backend emits. Naive values are UTC
/// (SQLite `CURRENT_TIMESTAMP`).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `今天` / `昨天` / `N天前` within a week, otherwise a zh-TW short date.
pub fn relative_date(raw: &str, now: DateTime<Utc>) -> String {
    if raw.trim().is_empty() {
        return NO_DATE.to_string();
    }
    let Some(date) = parse_timestamp(raw) else {
        return INVALID_DATE.to_string();
    };
    let days = (now - date).num_seconds().abs() / SECS_PER_DAY;
    match days {
        0 => "今天".to_string(),
        1 => "昨天".to_string(),
        2..=6 => format!("{}天前", days),
        _ => date.format("%Y/%-m/%-d").to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_and_invalid() {
        assert_eq!(relative_date("", now()), "無");
        assert_eq!(relative_date("   ", now()), "無");
        assert_eq!(relative_date("next tuesday", now()), "無效日期");
    }

    #[test]
    fn relative_buckets() {
        assert_eq!(relative_date("2026-10-14 08:30:00", now()), "今天");
        assert_eq!(relative_date("2026-10-13T10:00:00Z", now()), "昨天");
        assert_eq!(relative_date("2026-10-10", now()), "4天前");
        assert_eq!(relative_date("2026-10-01 12:00:00", now()), "2026/10/1");
    }

    #[test]
    fn future_dates_use_absolute_difference() {
        assert_eq!(relative_date("2026-10-16 12:00:00", now()), "2天前");
    }

    #[test]
    fn http_date_format() {
        let dt = parse_timestamp("Wed, 07 Oct 2026 09:15:00 GMT").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 10, 7, 9, 15, 0).unwrap());
        assert_eq!(relative_date("Wed, 07 Oct 2026 09:15:00 GMT", now()), "2026/10/7");
    }

    #[test]
    fn fractional_seconds() {
        assert!(parse_timestamp("2026-10-14 08:30:00.123456").is_some());
    }
}

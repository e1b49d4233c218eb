use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses a backend timestamp. Naive timestamps (no offset) are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Short age label: "5m", "3h", "2d", then the date ("Mar 04").
/// Empty for unparseable input.
pub fn format_relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(ts) = parse_timestamp(timestamp) else {
        return String::new();
    };

    let diff = (now - ts).num_seconds();
    if diff < 60 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86_400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604_800 {
        return format!("{}d", diff / 86_400);
    }
    ts.format("%b %d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_naive_and_offset_timestamps() {
        let naive = parse_timestamp("2024-03-20T11:00:00.123456").unwrap();
        let offset = parse_timestamp("2024-03-20T13:00:00+02:00").unwrap();
        assert_eq!(naive.timestamp() / 60, offset.timestamp() / 60);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn relative_labels() {
        assert_eq!(format_relative_time("2024-03-20T11:59:30", now()), "now");
        assert_eq!(format_relative_time("2024-03-20T11:15:00", now()), "45m");
        assert_eq!(format_relative_time("2024-03-20 02:00:00", now()), "10h");
        assert_eq!(format_relative_time("2024-03-17T12:00:00Z", now()), "3d");
        assert_eq!(format_relative_time("2024-03-04T12:00:00Z", now()), "Mar 04");
        assert_eq!(format_relative_time("", now()), "");
    }

    #[test]
    fn future_timestamps_are_now() {
        assert_eq!(format_relative_time("2024-03-21T00:00:00Z", now()), "now");
    }
}

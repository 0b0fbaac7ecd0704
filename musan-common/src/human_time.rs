//! Human-readable duration formatting
//!
//! Provides consistent duration display for summary tables and track rows.

/// Format a listening total as `H:MM:SS`
///
/// Hours are not wrapped at 24: a year of listening renders as e.g.
/// `1234:05:09`.
///
/// # Examples
///
/// ```
/// use musan_common::human_time::format_hms;
///
/// assert_eq!(format_hms(0), "0:00:00");
/// assert_eq!(format_hms(3661), "1:01:01");
/// assert_eq!(format_hms(90000), "25:00:00");
/// ```
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, mins, secs)
}

/// Format a single track duration as `M:SS`
///
/// # Examples
///
/// ```
/// use musan_common::human_time::format_track_duration;
///
/// assert_eq!(format_track_duration(215), "3:35");
/// assert_eq!(format_track_duration(59), "0:59");
/// ```
pub fn format_track_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Format an optional duration, `None` when the value is unknown
pub fn format_track_duration_opt(seconds: Option<u64>) -> Option<String> {
    seconds.map(format_track_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hms_format() {
        assert_eq!(format_hms(59), "0:00:59");
        assert_eq!(format_hms(60), "0:01:00");
        assert_eq!(format_hms(7200), "2:00:00");
        assert_eq!(format_hms(86399), "23:59:59");
    }

    #[test]
    fn test_hms_does_not_wrap_days() {
        assert_eq!(format_hms(31_536_000), "8760:00:00");
    }

    #[test]
    fn test_track_duration_format() {
        assert_eq!(format_track_duration(0), "0:00");
        assert_eq!(format_track_duration(61), "1:01");
        assert_eq!(format_track_duration(3600), "60:00");
    }

    #[test]
    fn test_option_handling() {
        assert_eq!(format_track_duration_opt(Some(125)), Some("2:05".to_string()));
        assert_eq!(format_track_duration_opt(None), None);
    }
}

//! Utility functions.
//!
//! Collection of helper functions used across the bot.

pub mod target;

pub use target::get_target_from_msg;

/// Escape special characters for HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Format a duration for display (largest two units).
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{} second(s)", secs)
    } else if secs < 3600 {
        format!("{} minute(s)", secs / 60)
    } else if secs < 86400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins > 0 {
            format!("{} hour(s) {} minute(s)", hours, mins)
        } else {
            format!("{} hour(s)", hours)
        }
    } else {
        let days = secs / 86400;
        let hours = (secs % 86400) / 3600;
        if hours > 0 {
            format!("{} day(s) {} hour(s)", days, hours)
        } else {
            format!("{} day(s)", days)
        }
    }
}

/// Parse a duration string (e.g., "1h", "30m", "1d").
///
/// Supported units:
/// - m: minutes
/// - h: hours
/// - d: days
/// - w: weeks
///
/// A bare number is treated as seconds.
pub fn parse_duration(input: &str) -> Option<std::time::Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(secs) = input.parse::<u64>() {
        return Some(std::time::Duration::from_secs(secs));
    }

    let (digits, unit) = input.split_at(input.len() - 1);
    let amount: u64 = digits.parse().ok()?;

    let seconds = match unit {
        "m" => amount * 60,
        "h" => amount * 3600,
        "d" => amount * 86400,
        "w" => amount * 604800,
        _ => return None,
    };

    Some(std::time::Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30m").unwrap().as_secs(), 1800);
        assert_eq!(parse_duration("2h").unwrap().as_secs(), 7200);
        assert_eq!(parse_duration("1d").unwrap().as_secs(), 86400);
        assert_eq!(parse_duration("1w").unwrap().as_secs(), 604800);
        assert_eq!(parse_duration("90").unwrap().as_secs(), 90);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_none());
        assert!(parse_duration("h").is_none());
        assert!(parse_duration("10x").is_none());
        assert!(parse_duration("-5m").is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45 second(s)");
        assert_eq!(format_duration(1800), "30 minute(s)");
        assert_eq!(format_duration(3600), "1 hour(s)");
        assert_eq!(format_duration(5400), "1 hour(s) 30 minute(s)");
        assert_eq!(format_duration(90000), "1 day(s) 1 hour(s)");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }
}

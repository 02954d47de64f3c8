//! Human-written durations for the poll interval and request timeout.

use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier. `ms` and `min` must be tried before
/// `s` and `m`.
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("min", 60_000.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
];

/// Parse duration strings like "62s", "1.5m", "500ms", "2min".
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, millis) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration must be a non-negative number: {}", s);
            }
            return Ok(Duration::from_secs_f64(val * millis / 1_000.0));
        }
    }

    bail!("Unknown duration format (expected ms, s or m): {}", s)
}

/// Format a duration for display: "500ms", "62s", "1.5s", "5m".
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        "0s".to_string()
    } else if d < Duration::from_secs(1) {
        format!("{}ms", d.as_millis())
    } else if d.as_secs() < 120 || d.as_secs() % 60 != 0 || d.subsec_nanos() != 0 {
        format!("{}s", trim_float(d.as_secs_f64()))
    } else {
        format!("{}m", d.as_secs() / 60)
    }
}

fn trim_float(v: f64) -> String {
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_interval_and_timeout() {
        assert_eq!(parse_duration("62s").unwrap(), Duration::from_secs(62));
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration(" 30 s ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1.5min").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_milliseconds() {
        assert_eq!(parse_duration("2500ms").unwrap(), Duration::from_millis(2500));
        assert_eq!(parse_duration("0.5s").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("62").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("1h").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs(62)), "62s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(300)), "5m");
    }
}

//! Time-span notation for [`Duration`] values.
//!
//! Accepted forms (all components decimal, surrounding whitespace ignored):
//!
//! ```text
//! d                    whole days
//! hh:mm                hours and minutes
//! hh:mm:ss             ... and seconds
//! d.hh:mm:ss           days prefix
//! hh:mm:ss.fffffff     fraction of a second, up to 7 digits (100 ns ticks)
//! ```
//!
//! Hours must be below 24, minutes and seconds below 60.  Negative spans have
//! no [`Duration`] representation and are rejected.

use std::time::Duration;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const MAX_FRACTION_DIGITS: usize = 7;
const NANOS_PER_TICK: u32 = 100;

/// Parses time-span notation into a [`Duration`].
///
/// # Errors
///
/// Returns a human-readable reason when the text is not a valid span.
pub fn parse(raw: &str) -> Result<Duration, String> {
    let text = raw.trim();
    if text.starts_with('-') {
        return Err("negative time spans are not supported".to_string());
    }

    if !text.contains(':') {
        let days = component(text, "days", None)?;
        return days
            .checked_mul(SECS_PER_DAY)
            .map(Duration::from_secs)
            .ok_or_else(|| "day count overflows".to_string());
    }

    let mut parts = text.split(':');
    let head = parts.next().unwrap_or_default();
    let minutes = parts.next().ok_or("missing minutes")?;
    let seconds = parts.next();
    if parts.next().is_some() {
        return Err("too many ':'-separated components".to_string());
    }

    let (days, hours) = match head.split_once('.') {
        Some((days, hours)) => (component(days, "days", None)?, hours),
        None => (0, head),
    };
    let hours = component(hours, "hours", Some(24))?;
    let minutes = component(minutes, "minutes", Some(60))?;

    let (seconds, nanos) = match seconds {
        None => (0, 0),
        Some(sec) => match sec.split_once('.') {
            Some((whole, fraction)) => (component(whole, "seconds", Some(60))?, fraction_nanos(fraction)?),
            None => (component(sec, "seconds", Some(60))?, 0),
        },
    };

    let total = days
        .checked_mul(SECS_PER_DAY)
        .and_then(|d| d.checked_add(hours * SECS_PER_HOUR + minutes * SECS_PER_MINUTE + seconds))
        .ok_or_else(|| "time span overflows".to_string())?;
    Ok(Duration::new(total, nanos))
}

/// Formats a [`Duration`] in the notation [`parse`] reads.
///
/// The days prefix and the fraction are only written when non-zero; the
/// fraction is truncated to 100 ns ticks.
pub fn format(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / SECS_PER_DAY;
    let hours = (total % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = total % SECS_PER_MINUTE;
    let ticks = duration.subsec_nanos() / NANOS_PER_TICK;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}

fn component(text: &str, what: &str, below: Option<u64>) -> Result<u64, String> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{what} component '{text}' is not a decimal number"));
    }
    let value: u64 = text
        .parse()
        .map_err(|e| format!("{what} component '{text}': {e}"))?;
    match below {
        Some(limit) if value >= limit => Err(format!("{what} must be below {limit}, got {value}")),
        _ => Ok(value),
    }
}

fn fraction_nanos(fraction: &str) -> Result<u32, String> {
    if fraction.is_empty()
        || fraction.len() > MAX_FRACTION_DIGITS
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(format!(
            "fraction '{fraction}' must be 1 to {MAX_FRACTION_DIGITS} decimal digits"
        ));
    }
    // Right-pad to seven digits so "5" means 5_000_000 ticks.
    let ticks: u32 = format!("{fraction:0<7}")
        .parse()
        .map_err(|e| format!("fraction '{fraction}': {e}"))?;
    Ok(ticks * NANOS_PER_TICK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours_minutes_seconds() {
        assert_eq!(parse("01:02:03"), Ok(Duration::from_secs(3723)));
    }

    #[test]
    fn test_parse_hours_minutes_only() {
        assert_eq!(parse("00:30"), Ok(Duration::from_secs(1800)));
    }

    #[test]
    fn test_parse_bare_days() {
        assert_eq!(parse("2"), Ok(Duration::from_secs(2 * SECS_PER_DAY)));
    }

    #[test]
    fn test_parse_days_prefix_and_fraction() {
        // Arrange
        let expected = Duration::new(SECS_PER_DAY + 5, 500_000_000);

        // Act
        let parsed = parse(" 1.00:00:05.5 ");

        // Assert
        assert_eq!(parsed, Ok(expected));
    }

    #[test]
    fn test_parse_rejects_out_of_range_components() {
        assert!(parse("24:00:00").is_err());
        assert!(parse("00:60:00").is_err());
        assert!(parse("00:00:60").is_err());
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert!(parse("-00:00:01").is_err());
        assert!(parse("soon").is_err());
        assert!(parse("1:2:3:4").is_err());
        assert!(parse("00:00:01.12345678").is_err());
        assert!(parse("+1").is_err());
    }

    #[test]
    fn test_format_omits_zero_days_and_fraction() {
        assert_eq!(format(Duration::from_secs(90)), "00:01:30");
    }

    #[test]
    fn test_format_writes_days_and_ticks() {
        let span = Duration::new(SECS_PER_DAY * 3 + 3661, 1_234_500);
        assert_eq!(format(span), "3.01:01:01.0012345");
    }

    #[test]
    fn test_format_output_parses_back() {
        let span = Duration::new(SECS_PER_DAY + 59, 100);
        assert_eq!(parse(&format(span)), Ok(span));
    }
}

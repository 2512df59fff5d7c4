//! Schedule time parsing
//!
//! Parses the human-readable time expressions accepted by the CLIs into a
//! concrete publication instant.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CrierError, Result};

/// Parse a schedule time expression into a UTC instant
///
/// Supported forms:
/// - "now"
/// - Relative durations, with or without a leading '+': "2h", "+30m",
///   "1 day"
/// - RFC 3339 timestamps: "2026-09-01T15:00:00Z"
/// - Natural language: "tomorrow 3pm", "next friday"
///
/// # Errors
///
/// Returns `InvalidInput` if the expression cannot be parsed.
pub fn parse_at(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CrierError::InvalidInput(
            "Schedule time cannot be empty".to_string(),
        ));
    }

    if input.eq_ignore_ascii_case("now") {
        return Ok(Utc::now());
    }

    // Relative durations, "+2h" and bare "2h" alike
    let bare = input.strip_prefix('+').unwrap_or(input);
    if let Ok(std_duration) = humantime::parse_duration(bare) {
        let seconds = std_duration.as_secs() as i64;
        let duration = Duration::try_seconds(seconds).ok_or_else(|| {
            CrierError::InvalidInput("Duration out of range".to_string())
        })?;
        return Ok(Utc::now() + duration);
    }

    // Absolute timestamps
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Natural language
    if let Ok(dt) = chrono_english::parse_date_string(input, Utc::now(), chrono_english::Dialect::Us)
    {
        return Ok(dt);
    }

    Err(CrierError::InvalidInput(format!(
        "Could not parse schedule time: {}",
        input
    )))
}

//! Due date parsing module
//!
//! Supports various date formats:
//! - ISO dates: "2026-01-25"
//! - Dated human forms: "Jan 25 2026", "25 January 2026", "01/25/2026"
//! - Relative: "today", "tomorrow", "monday", "next friday"
//! - Offset: "in 3 days", "in 1 week"
//!
//! Relative forms resolve against a caller-supplied `today` so results
//! never depend on the wall clock.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{CoreError, Result};

/// Parse a due date string.
///
/// Blank input means "no deadline" and yields `Ok(None)`. Anything that is
/// not blank and not a recognised date is a validation error on `due_date`.
pub fn parse_due_date(input: &str, today: NaiveDate) -> Result<Option<NaiveDate>> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Ok(None);
    }

    if let Ok(date) = NaiveDate::parse_from_str(&input, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    if let Some(date) = try_parse_relative(&input, today) {
        return Ok(Some(date));
    }

    if let Some(date) = try_parse_weekday(&input, today) {
        return Ok(Some(date));
    }

    if let Some(date) = try_parse_offset(&input, today) {
        return Ok(Some(date));
    }

    let formats = [
        "%b %d %Y", // Jan 25 2026
        "%B %d %Y", // January 25 2026
        "%m/%d/%Y", // 01/25/2026
        "%d %b %Y", // 25 Jan 2026
        "%d %B %Y", // 25 January 2026
    ];

    for format in &formats {
        if let Ok(date) = NaiveDate::parse_from_str(&input, format) {
            return Ok(Some(date));
        }
    }

    Err(CoreError::validation(
        "due_date",
        format!(
            "Invalid date format '{}'. Try formats like: '2026-01-25', 'tomorrow', 'next monday', 'in 3 days'",
            input
        ),
    ))
}

/// Parse a strict `YYYY-MM-DD` due date; blank input means no deadline
pub fn parse_iso_date(input: &str) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            CoreError::validation(
                "due_date",
                format!("Invalid date format '{}'. Use YYYY-MM-DD", input),
            )
        })
}

fn try_parse_relative(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    match input {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        "yesterday" => today.checked_sub_days(Days::new(1)),
        _ => None,
    }
}

fn try_parse_weekday(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let weekday_str = input.strip_prefix("next ").unwrap_or(input);

    let target_weekday = match weekday_str {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };

    // Always the next occurrence strictly after today
    let days = (target_weekday.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64
        + 7)
        % 7;
    let days_until = if days == 0 { 7 } else { days as u64 };

    today.checked_add_days(Days::new(days_until))
}

fn try_parse_offset(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let rest = input.strip_prefix("in ")?.trim();
    let parts: Vec<&str> = rest.split_whitespace().collect();

    if parts.len() != 2 {
        return None;
    }

    let num: u64 = parts[0].parse().ok()?;

    match parts[1] {
        "day" | "days" => today.checked_add_days(Days::new(num)),
        "week" | "weeks" => today.checked_add_days(Days::new(num.checked_mul(7)?)),
        _ => None,
    }
}

/// Format a due date for human-readable display relative to `today`
///
/// Returns strings like: "Today", "Tomorrow", "Mon Jan 27", "Overdue (3 days ago)"
pub fn format_due_human(date: NaiveDate, today: NaiveDate) -> String {
    let diff = date.signed_duration_since(today).num_days();

    match diff {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        2..=6 => date.format("%a %b %d").to_string(),
        7..=365 => date.format("%b %d").to_string(),
        _ if diff < 0 => format!("Overdue ({} days ago)", -diff),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

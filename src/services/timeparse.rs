use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDateTime};
use regex::Regex;

/// Hour used when the user names a day but no time ("tomorrow", "today").
const DEFAULT_HOUR: u32 = 9;

const WEEKDAYS: &[(&str, u32)] = &[
    ("monday", 0),
    ("tuesday", 1),
    ("wednesday", 2),
    ("thursday", 3),
    ("friday", 4),
    ("saturday", 5),
    ("sunday", 6),
];

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)?").unwrap())
}

/// Resolves a natural-language time phrase against `now`.
///
/// Priority: weekday name + clock time, then "today", "tomorrow", "now".
/// A named weekday always lands strictly in the future; naming today's
/// weekday means next week, never later today. Returns `None` for anything
/// unparseable, it never fails.
pub fn resolve(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text.to_lowercase();

    if let Some(dt) = resolve_weekday_time(&text, now) {
        return Some(dt);
    }

    if text.contains("today") {
        return now.date().and_hms_opt(DEFAULT_HOUR, 0, 0);
    }
    if text.contains("tomorrow") {
        return (now.date() + Duration::days(1)).and_hms_opt(DEFAULT_HOUR, 0, 0);
    }
    if text.contains("now") {
        return Some(now);
    }

    None
}

fn resolve_weekday_time(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let target = WEEKDAYS
        .iter()
        .find(|(name, _)| text.contains(name))
        .map(|(_, num)| *num)?;

    let caps = time_regex().captures(text)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    match caps.get(3).map(|m| m.as_str()) {
        Some("pm") if hour != 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    // Today's weekday rolls a full week forward; a named day is never today.
    let mut days_ahead = i64::from(target) - i64::from(now.weekday().num_days_from_monday());
    if days_ahead <= 0 {
        days_ahead += 7;
    }

    (now.date() + Duration::days(days_ahead)).and_hms_opt(hour, minute, 0)
}

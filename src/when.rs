//! Reminder time parsing and display helpers.

use std::fmt::Write;

use chrono::{
    DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};

/// Errors from [`parse_reminder_input`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReminderParseError {
    #[error("unrecognised reminder time {0:?} (try \"in 10m\", \"tomorrow 09:00\" or \"2026-05-04 18:30\")")]
    Unrecognised(String),

    /// The local time does not exist, e.g. inside a DST gap.
    #[error("{0} does not exist in the local time zone")]
    NonexistentLocalTime(NaiveDateTime),
}

/// Hour used when only a date is given.
const DEFAULT_HOUR: u32 = 9;

/// Parse human-readable reminder input relative to `now`.
///
/// Supports:
/// - "", "none", "clear", "-" (no reminder)
/// - "now"
/// - "in 10m", "in 2h", "in 3d" (the "in " is optional)
/// - "HH:MM", "today HH:MM", "tomorrow HH:MM"
/// - "YYYY-MM-DD HH:MM" or "YYYY-MM-DDTHH:MM" in local time
/// - "YYYY-MM-DD" (09:00 local)
/// - RFC 3339
pub fn parse_reminder_input(
    s: &str,
    now: DateTime<Local>,
) -> Result<Option<DateTime<Utc>>, ReminderParseError> {
    let raw = s.trim();
    let s = raw.to_lowercase();
    let unrecognised = || ReminderParseError::Unrecognised(s.clone());

    match s.as_str() {
        "" | "none" | "clear" | "-" => return Ok(None),
        "now" => return Ok(Some(now.with_timezone(&Utc))),
        _ => {}
    }

    let offset_src = s.strip_prefix("in ").unwrap_or(&s).trim();
    if let Some(offset) = parse_offset(offset_src) {
        let at = offset
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(unrecognised)?;
        return Ok(Some(at.with_timezone(&Utc)));
    }

    let today = now.date_naive();
    for (prefix, date) in [("today ", today), ("tomorrow ", today + Duration::days(1))] {
        if let Some(rest) = s.strip_prefix(prefix) {
            let time = parse_time(rest.trim()).ok_or_else(unrecognised)?;
            return local_to_utc(date.and_time(time)).map(Some);
        }
    }
    if s == "tomorrow" {
        return local_to_utc(day_default(today + Duration::days(1))).map(Some);
    }
    if let Some(time) = parse_time(&s) {
        return local_to_utc(today.and_time(time)).map(Some);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dt%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dt%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return local_to_utc(naive).map(Some);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return local_to_utc(day_default(date)).map(Some);
    }

    Err(unrecognised())
}

/// Outer `None`: not an offset at all. Inner `None`: an offset too large to apply.
fn parse_offset(s: &str) -> Option<Option<TimeDelta>> {
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    if split == 0 {
        return None;
    }
    let (amount, unit) = s.split_at(split);
    let make: fn(i64) -> Option<TimeDelta> = match unit.trim() {
        "s" | "sec" | "secs" => TimeDelta::try_seconds,
        "m" | "min" | "mins" => TimeDelta::try_minutes,
        "h" | "hr" | "hrs" | "hour" | "hours" => TimeDelta::try_hours,
        "d" | "day" | "days" => TimeDelta::try_days,
        "w" | "week" | "weeks" => TimeDelta::try_weeks,
        _ => return None,
    };
    Some(amount.parse().ok().and_then(make))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

fn day_default(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN))
}

fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>, ReminderParseError> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(ReminderParseError::NonexistentLocalTime(naive))
}

/// Format a reminder relative to `now` ("in 5m", "3h ago", "now", "-").
pub fn format_reminder_relative(reminder: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = reminder else {
        return "-".into();
    };
    let delta = at - now;
    let secs = delta.num_seconds().abs();
    if secs < 60 {
        return "now".into();
    }
    let span = if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    };
    if delta.num_seconds() > 0 {
        format!("in {span}")
    } else {
        format!("{span} ago")
    }
}

/// Format a reminder as local wall-clock time using `fmt`.
///
/// An invalid `fmt` renders as "?" instead of panicking.
pub fn format_reminder_absolute(reminder: Option<DateTime<Utc>>, fmt: &str) -> String {
    let Some(at) = reminder else {
        return "-".into();
    };
    let mut out = String::new();
    match write!(out, "{}", at.with_timezone(&Local).format(fmt)) {
        Ok(()) => out,
        Err(_) => "?".into(),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn blank_and_none_clear_the_reminder() {
        for s in ["", "  ", "none", "Clear", "-"] {
            assert_eq!(parse_reminder_input(s, noon()), Ok(None), "{s:?}");
        }
    }

    #[test]
    fn relative_offsets() {
        let now = noon();
        let utc = now.with_timezone(&Utc);
        assert_eq!(parse_reminder_input("now", now), Ok(Some(utc)));
        assert_eq!(parse_reminder_input("in 10m", now), Ok(Some(utc + Duration::minutes(10))));
        assert_eq!(parse_reminder_input("2h", now), Ok(Some(utc + Duration::hours(2))));
        assert_eq!(parse_reminder_input("in 3 days", now), Ok(Some(utc + Duration::days(3))));
    }

    #[test]
    fn clock_times() {
        assert_eq!(parse_reminder_input("18:30", noon()), Ok(Some(local(2026, 3, 10, 18, 30))));
        assert_eq!(parse_reminder_input("today 08:00", noon()), Ok(Some(local(2026, 3, 10, 8, 0))));
        assert_eq!(
            parse_reminder_input("tomorrow 07:15", noon()),
            Ok(Some(local(2026, 3, 11, 7, 15)))
        );
        assert_eq!(parse_reminder_input("tomorrow", noon()), Ok(Some(local(2026, 3, 11, 9, 0))));
    }

    #[test]
    fn absolute_dates() {
        assert_eq!(
            parse_reminder_input("2026-05-04 18:30", noon()),
            Ok(Some(local(2026, 5, 4, 18, 30)))
        );
        assert_eq!(
            parse_reminder_input("2026-05-04T18:30", noon()),
            Ok(Some(local(2026, 5, 4, 18, 30)))
        );
        assert_eq!(parse_reminder_input("2026-05-04", noon()), Ok(Some(local(2026, 5, 4, 9, 0))));
        assert_eq!(
            parse_reminder_input("2026-05-04T18:30:00Z", noon()),
            Ok(Some(Utc.with_ymd_and_hms(2026, 5, 4, 18, 30, 0).unwrap()))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        for s in ["soonish", "in 5 fortnights", "today 25:00", "2026-13-01"] {
            assert!(
                matches!(parse_reminder_input(s, noon()), Err(ReminderParseError::Unrecognised(_))),
                "{s:?}"
            );
        }
    }

    #[test]
    fn out_of_range_offsets_are_rejected() {
        for s in ["in 999999999999999m", "in 99999999d", "in 99999999999999999999s"] {
            assert!(
                matches!(parse_reminder_input(s, noon()), Err(ReminderParseError::Unrecognised(_))),
                "{s:?}"
            );
        }
    }

    #[test]
    fn relative_formatting() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_reminder_relative(None, now), "-");
        assert_eq!(format_reminder_relative(Some(now + Duration::seconds(20)), now), "now");
        assert_eq!(format_reminder_relative(Some(now + Duration::minutes(5)), now), "in 5m");
        assert_eq!(format_reminder_relative(Some(now - Duration::minutes(3)), now), "3m ago");
        assert_eq!(format_reminder_relative(Some(now + Duration::hours(2)), now), "in 2h");
        assert_eq!(format_reminder_relative(Some(now - Duration::days(4)), now), "4d ago");
    }

    #[test]
    fn absolute_formatting_survives_bad_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_reminder_absolute(None, "%H:%M"), "-");
        assert_eq!(format_reminder_absolute(Some(at), "%Q"), "?");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long task title", 8), "a long …");
    }
}

//! Weekly reminder calendar link.
//!
//! Pure, deterministic functions of an injected `now`: callers pass
//! `Utc::now()`, tests pass fixed dates. The reminder slot is the next
//! Friday strictly in the future at 16:00; a Friday "today" rolls a full
//! week regardless of the time of day.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use reqwest::Url;

const EVENT_TITLE: &str = "Weekly Career Journal";
const EVENT_DESCRIPTION: &str =
    "Take 20 minutes to reflect on your career progress, wins, challenges, and learnings.";
const REMINDER_WEEKDAY: Weekday = Weekday::Fri;
const REMINDER_HOUR: u32 = 16;
const EVENT_DURATION_MINUTES: i64 = 20;
const RECURRENCE_RULE: &str = "RRULE:FREQ=WEEKLY;BYDAY=FR";
const CALENDAR_BASE_URL: &str = "https://calendar.google.com/calendar/render";

/// Next occurrence of the reminder slot strictly after `now`'s date.
pub fn next_reminder_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.weekday().num_days_from_monday() as i64;
    let target = REMINDER_WEEKDAY.num_days_from_monday() as i64;
    let mut days_ahead = (target - today).rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    (now.date_naive() + Duration::days(days_ahead))
        .and_hms_opt(REMINDER_HOUR, 0, 0)
        .expect("fixed reminder time is a valid time of day")
        .and_utc()
}

/// Calendar event-creation URL for the weekly reminder: title, description,
/// a 20-minute slot in UTC basic format, and a weekly recurrence rule.
pub fn reminder_link(now: DateTime<Utc>) -> Url {
    let start = next_reminder_start(now);
    let end = start + Duration::minutes(EVENT_DURATION_MINUTES);
    let dates = format!("{}/{}", basic_format(start), basic_format(end));

    Url::parse_with_params(
        CALENDAR_BASE_URL,
        &[
            ("action", "TEMPLATE"),
            ("text", EVENT_TITLE),
            ("details", EVENT_DESCRIPTION),
            ("dates", dates.as_str()),
            ("recur", RECURRENCE_RULE),
        ],
    )
    .expect("calendar base url is valid")
}

/// UTC basic format: YYYYMMDDThhmmssZ.
fn basic_format(t: DateTime<Utc>) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_saturday_rolls_to_friday_six_days_later() {
        // 2025-01-04 is a Saturday.
        let now = utc(2025, 1, 4, 12, 0);
        assert_eq!(now.weekday(), Weekday::Sat);

        let start = next_reminder_start(now);
        assert_eq!(start, utc(2025, 1, 10, 16, 0));
        assert_eq!(start.weekday(), Weekday::Fri);
        assert_eq!((start.date_naive() - now.date_naive()).num_days(), 6);
    }

    #[test]
    fn test_friday_morning_rolls_a_full_week() {
        // 2025-01-03 is a Friday; 09:00 is before the slot, but the rule is
        // strictly-future by date, never same-day.
        let now = utc(2025, 1, 3, 9, 0);
        assert_eq!(now.weekday(), Weekday::Fri);

        let start = next_reminder_start(now);
        assert_eq!(start, utc(2025, 1, 10, 16, 0));
    }

    #[test]
    fn test_friday_evening_also_rolls_a_full_week() {
        let now = utc(2025, 1, 3, 23, 30);
        assert_eq!(next_reminder_start(now), utc(2025, 1, 10, 16, 0));
    }

    #[test]
    fn test_midweek_finds_the_coming_friday() {
        // 2025-01-01 is a Wednesday.
        let now = utc(2025, 1, 1, 8, 0);
        assert_eq!(now.weekday(), Weekday::Wed);
        assert_eq!(next_reminder_start(now), utc(2025, 1, 3, 16, 0));
    }

    #[test]
    fn test_event_is_exactly_twenty_minutes() {
        let url = reminder_link(utc(2025, 1, 4, 12, 0));
        let dates = query_param(&url, "dates");
        let (start, end) = dates.split_once('/').expect("dates has start/end");
        assert_eq!(start, "20250110T160000Z");
        assert_eq!(end, "20250110T162000Z");
    }

    #[test]
    fn test_link_carries_weekly_friday_recurrence() {
        let url = reminder_link(utc(2025, 1, 4, 12, 0));
        assert_eq!(query_param(&url, "recur"), "RRULE:FREQ=WEEKLY;BYDAY=FR");
        assert_eq!(query_param(&url, "action"), "TEMPLATE");
        assert_eq!(query_param(&url, "text"), EVENT_TITLE);
        assert_eq!(query_param(&url, "details"), EVENT_DESCRIPTION);
        assert!(url.as_str().starts_with(CALENDAR_BASE_URL));
    }

    #[test]
    fn test_link_is_deterministic_for_a_fixed_now() {
        let now = utc(2025, 6, 2, 7, 45);
        assert_eq!(reminder_link(now), reminder_link(now));
    }

    fn query_param(url: &Url, key: &str) -> String {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_else(|| panic!("missing query param {key}"))
    }
}

// src/app/utils.rs
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;

/// Badge colour classes, mirroring the backend's web UI palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Badge {
    Info,
    Warning,
    Secondary,
    Primary,
    Success,
    Danger,
    Dark,
}

// Filter-reason codes are an open set: anything not listed here is shown raw.
const FILTER_REASONS: [(&str, &str, Badge); 7] = [
    ("already_downloaded", "Already Downloaded", Badge::Info),
    ("unwanted_tags", "Unwanted Tags", Badge::Warning),
    ("studio_filter", "Studio Filter", Badge::Secondary),
    ("date_range", "Date Range", Badge::Primary),
    ("duration_filter", "Duration Filter", Badge::Success),
    ("rating_filter", "Rating Filter", Badge::Danger),
    ("custom_rules", "Custom Rules", Badge::Dark),
];

pub fn known_filter_reasons() -> impl Iterator<Item = (&'static str, &'static str)> {
    FILTER_REASONS.iter().map(|(code, label, _)| (*code, *label))
}

pub fn format_filter_reason(code: &str) -> String {
    FILTER_REASONS
        .iter()
        .find(|(c, _, _)| *c == code)
        .map_or_else(|| code.to_string(), |(_, label, _)| (*label).to_string())
}

pub fn filter_reason_badge(code: &str) -> Badge {
    FILTER_REASONS
        .iter()
        .find(|(c, _, _)| *c == code)
        .map_or(Badge::Secondary, |(_, _, badge)| *badge)
}

/// Backend timestamps are either RFC 3339 or naive ISO strings in UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().with_timezone(&Local));
        }
    }
    None
}

pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return "—".into();
    };
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

pub fn format_datetime(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return "—".into();
    };
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// First two performers joined, plus how many were left out.
pub fn performers_summary(performers: &[String]) -> (String, usize) {
    if performers.is_empty() {
        return ("Unknown".into(), 0);
    }
    let shown = performers.iter().take(2).join(", ");
    (shown, performers.len().saturating_sub(2))
}

pub fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|s| !s.trim().is_empty()).unwrap_or("Unknown")
}

/// Default expiry offered for temporary exceptions: 30 days out, minute precision.
pub fn default_expiry(now: DateTime<Local>) -> String {
    (now + Duration::days(30)).format("%Y-%m-%dT%H:%M").to_string()
}

pub fn export_filename(day: NaiveDate) -> String {
    format!("filtered-scenes-{}.csv", day.format("%Y-%m-%d"))
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

use chrono::{DateTime, NaiveDate, Utc};

/// Parse a calendar day out of a client-entered date string.
///
/// Stay dates arrive from the document store as free-form strings: plain ISO
/// dates from the booking form, full RFC 3339 timestamps from older clients.
/// Returns `None` when the value fits neither shape; the caller decides
/// whether that fails open or closed.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    None
}

/// Whole hours elapsed between `since` and `now`. Negative when `since` is
/// in the future.
pub fn hours_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_hours()
}

/// Whole days from `today` until `day`. Negative when `day` already passed.
pub fn days_until(day: NaiveDate, today: NaiveDate) -> i64 {
    (day - today).num_days()
}

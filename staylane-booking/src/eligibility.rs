use crate::models::{Booking, BookingStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staylane_core::dates;

/// Refund request window. Operators tune these through the `policy` config
/// section; the defaults match the marketplace terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefundPolicy {
    /// A refund may only be requested this many hours after booking.
    pub max_hours_since_booking: i64,
    /// And only while check-in is at least this many days away.
    pub min_days_before_check_in: i64,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            max_hours_since_booking: 24,
            min_days_before_check_in: 7,
        }
    }
}

/// True when the stay's check-out day lies strictly before today.
///
/// Missing or unparseable check-out dates resolve to "not past": a broken
/// record must not hide a booking from the guest's active list.
pub fn is_past(booking: &Booking, now: DateTime<Utc>) -> bool {
    match booking.check_out.as_deref().and_then(dates::parse_day) {
        Some(day) => day < now.date_naive(),
        None => false,
    }
}

/// Refund window check, independent of booking state.
///
/// The admin override wins outright. Date parse failures resolve to "not
/// eligible" — a malformed record must never grant money back.
pub fn is_refund_eligible(booking: &Booking, policy: &RefundPolicy, now: DateTime<Utc>) -> bool {
    if booking.refund_allowed == Some(false) {
        return false;
    }
    if dates::hours_since(booking.created_at, now) > policy.max_hours_since_booking {
        return false;
    }
    match booking.check_in.as_deref() {
        // No check-in on record: treated as infinitely far away.
        None => true,
        Some(raw) => match dates::parse_day(raw) {
            Some(day) => dates::days_until(day, now.date_naive()) >= policy.min_days_before_check_in,
            None => false,
        },
    }
}

/// A guest may ask to cancel while the stay is upcoming, the booking is
/// confirmed or paid, and no request is already in flight.
pub fn can_request_cancellation(booking: &Booking, now: DateTime<Utc>) -> bool {
    !is_past(booking, now)
        && booking.status.is_active_stay()
        && !booking.status.is_request_pending()
        && !booking.cancellation_requested
}

/// Refund requests are strictly narrower than cancellation requests.
pub fn can_request_refund(booking: &Booking, policy: &RefundPolicy, now: DateTime<Utc>) -> bool {
    can_request_cancellation(booking, now) && is_refund_eligible(booking, policy, now)
}

pub fn can_chat(booking: &Booking) -> bool {
    booking.status.is_active_stay()
}

pub fn can_check_in(booking: &Booking, now: DateTime<Utc>) -> bool {
    !is_past(booking, now) && booking.status.is_active_stay()
}

/// Evaluated action set for one booking, as rendered in list views.
#[derive(Debug, Clone, Serialize)]
pub struct BookingActions {
    pub status_label: &'static str,
    pub is_past: bool,
    pub can_cancel: bool,
    pub can_refund: bool,
    pub can_chat: bool,
    pub can_check_in: bool,
}

pub fn evaluate(booking: &Booking, policy: &RefundPolicy, now: DateTime<Utc>) -> BookingActions {
    BookingActions {
        status_label: booking.status.display_label(),
        is_past: is_past(booking, now),
        can_cancel: can_request_cancellation(booking, now),
        can_refund: can_request_refund(booking, policy, now),
        can_chat: can_chat(booking),
        can_check_in: can_check_in(booking, now),
    }
}

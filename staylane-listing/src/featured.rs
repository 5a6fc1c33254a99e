use crate::models::Listing;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// The single authoritative featured-window predicate.
///
/// Used identically for badge rendering and for ranking so the two can never
/// drift. The expiry comparison is strict: at the instant `now` reaches the
/// expiry the promotion is already over.
pub fn is_featured_active(listing: &Listing, now: DateTime<Utc>) -> bool {
    if !listing.sponsored || !listing.featured {
        return false;
    }
    if listing.status.suppresses_promotion() {
        return false;
    }
    listing
        .sponsored_until
        .as_ref()
        .and_then(|stamp| stamp.as_millis())
        .is_some_and(|until_ms| until_ms > now.timestamp_millis())
}

/// "Premium first" ordering: featured-active listings before the rest; among
/// the active ones the later expiry wins; remaining ties break by newest
/// creation time.
pub fn premium_cmp(a: &Listing, b: &Listing, now: DateTime<Utc>) -> Ordering {
    let a_active = is_featured_active(a, now);
    let b_active = is_featured_active(b, now);

    b_active
        .cmp(&a_active)
        .then_with(|| {
            if a_active && b_active {
                let a_until = expiry_or_min(a);
                let b_until = expiry_or_min(b);
                b_until.cmp(&a_until)
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

pub fn sort_premium_first(listings: &mut [Listing], now: DateTime<Utc>) {
    listings.sort_by(|a, b| premium_cmp(a, b, now));
}

fn expiry_or_min(listing: &Listing) -> i64 {
    listing
        .sponsored_until
        .as_ref()
        .and_then(|stamp| stamp.as_millis())
        .unwrap_or(i64::MIN)
}

use crate::models::{Booking, BookingStatus, RevealSwitch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staylane_core::pii::Masked;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shown when a party never filled in a contact field, or when the identity
/// provider could not be reached.
pub const CONTACT_PLACEHOLDER: &str = "not provided";

/// Raw profile fields resolved from the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyProfile {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Lookup into the hosted identity provider, keyed by party id.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn lookup(&self, party_id: &str) -> Result<Option<PartyProfile>, BoxError>;
}

/// Contact payload released to the counterparty once the reveal policy
/// passes. Masked so a stray `{:?}` in a log line stays clean.
#[derive(Debug, Clone, Serialize)]
pub struct ContactCard {
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

impl ContactCard {
    fn from_profile(profile: Option<PartyProfile>) -> Self {
        let profile = profile.unwrap_or(PartyProfile {
            email: None,
            phone: None,
        });
        Self {
            email: Masked(profile.email.unwrap_or_else(|| CONTACT_PLACEHOLDER.to_string())),
            phone: Masked(profile.phone.unwrap_or_else(|| CONTACT_PLACEHOLDER.to_string())),
        }
    }
}

/// Full reveal decision for one booking. Reveal timestamps are always
/// included so clients can render "unlocks in 2 days" for ineligible sides.
#[derive(Debug, Clone, Serialize)]
pub struct ContactReveal {
    pub can_see_host: bool,
    pub can_see_guest: bool,
    pub host: Option<ContactCard>,
    pub guest: Option<ContactCard>,
    pub reveal_host_at: Option<DateTime<Utc>>,
    pub reveal_guest_at: Option<DateTime<Utc>>,
}

/// One side of the reveal rule.
///
/// Disclosure needs a confirmed booking and an elapsed reveal timestamp; an
/// absent switch stays permissive while an explicit revocation is a hard
/// block.
pub fn side_eligible(
    status: BookingStatus,
    reveal_at: Option<DateTime<Utc>>,
    switch: RevealSwitch,
    now: DateTime<Utc>,
) -> bool {
    status == BookingStatus::Confirmed
        && reveal_at.is_some_and(|at| at <= now)
        && switch.allows()
}

/// Resolve the reveal decision plus contact payloads for both sides.
///
/// A directory failure for one party degrades that side to placeholders
/// instead of failing the whole request.
pub async fn resolve_contacts(
    directory: &dyn ContactDirectory,
    booking: &Booking,
    now: DateTime<Utc>,
) -> ContactReveal {
    let can_see_host = side_eligible(
        booking.status,
        booking.reveal_host_at,
        booking.host_contact_revealed,
        now,
    );
    let can_see_guest = side_eligible(
        booking.status,
        booking.reveal_guest_at,
        booking.guest_contact_revealed,
        now,
    );

    let host = if can_see_host {
        Some(lookup_or_placeholder(directory, &booking.host_id).await)
    } else {
        None
    };
    let guest = if can_see_guest {
        Some(lookup_or_placeholder(directory, &booking.guest_id).await)
    } else {
        None
    };

    ContactReveal {
        can_see_host,
        can_see_guest,
        host,
        guest,
        reveal_host_at: booking.reveal_host_at,
        reveal_guest_at: booking.reveal_guest_at,
    }
}

async fn lookup_or_placeholder(directory: &dyn ContactDirectory, party_id: &str) -> ContactCard {
    match directory.lookup(party_id).await {
        Ok(profile) => ContactCard::from_profile(profile),
        Err(e) => {
            tracing::warn!(party_id, error = %e, "contact lookup failed, degrading to placeholders");
            ContactCard::from_profile(None)
        }
    }
}

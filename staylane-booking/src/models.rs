use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Paid,
    Cancelled,
    CancelRequest,
    RefundRequested,
    Refunded,
}

impl BookingStatus {
    /// Confirmed and paid stays behave the same for guest-facing actions.
    pub fn is_active_stay(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Paid)
    }

    /// A cancellation or refund request is already in flight.
    pub fn is_request_pending(&self) -> bool {
        matches!(
            self,
            BookingStatus::CancelRequest | BookingStatus::RefundRequested
        )
    }

    /// Label shown to guests. Paid collapses into "confirmed", both request
    /// states collapse into "cancel requested".
    pub fn display_label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed | BookingStatus::Paid => "confirmed",
            BookingStatus::CancelRequest | BookingStatus::RefundRequested => "cancel requested",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }
}

/// Three-state disclosure switch for contact reveal.
///
/// The document store historically carried an optional bool where an absent
/// field meant "allowed" and an explicit `false` was an operator
/// kill-switch. The enum keeps "never set" and "intentionally revoked"
/// distinguishable while staying wire-compatible with the optional bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealSwitch {
    #[default]
    Unset,
    Granted,
    Revoked,
}

impl RevealSwitch {
    /// Only an explicit revocation blocks disclosure.
    pub fn allows(&self) -> bool {
        !matches!(self, RevealSwitch::Revoked)
    }
}

impl Serialize for RevealSwitch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RevealSwitch::Unset => serializer.serialize_none(),
            RevealSwitch::Granted => serializer.serialize_bool(true),
            RevealSwitch::Revoked => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for RevealSwitch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<bool>::deserialize(deserializer)? {
            None => RevealSwitch::Unset,
            Some(true) => RevealSwitch::Granted,
            Some(false) => RevealSwitch::Revoked,
        })
    }
}

/// A reservation linking a guest, a host's listing, and a stay window.
///
/// Stay dates are kept as the raw strings clients entered; the eligibility
/// evaluator parses them leniently so one malformed record never breaks a
/// list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub listing_id: String,
    pub guest_id: String,
    pub host_id: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cancellation_requested: bool,
    /// Admin override: `Some(false)` blocks refund requests outright.
    #[serde(rename = "can_request_refund", default)]
    pub refund_allowed: Option<bool>,
    #[serde(default)]
    pub reveal_host_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reveal_guest_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub host_contact_revealed: RevealSwitch,
    #[serde(default)]
    pub guest_contact_revealed: RevealSwitch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Booking {
        Booking {
            id: "bk-1".into(),
            listing_id: "ls-1".into(),
            guest_id: "guest-1".into(),
            host_id: "host-1".into(),
            status: BookingStatus::Confirmed,
            check_in: Some("2026-09-01".into()),
            check_out: Some("2026-09-08".into()),
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
            cancellation_requested: false,
            refund_allowed: None,
            reveal_host_at: None,
            reveal_guest_at: None,
            host_contact_revealed: RevealSwitch::Unset,
            guest_contact_revealed: RevealSwitch::Unset,
        }
    }

    #[test]
    fn status_labels_collapse_as_displayed() {
        assert_eq!(BookingStatus::Paid.display_label(), "confirmed");
        assert_eq!(BookingStatus::Confirmed.display_label(), "confirmed");
        assert_eq!(
            BookingStatus::RefundRequested.display_label(),
            "cancel requested"
        );
        assert_eq!(
            BookingStatus::CancelRequest.display_label(),
            "cancel requested"
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::CancelRequest).unwrap(),
            "\"cancel_request\""
        );
        assert_eq!(
            serde_json::from_str::<BookingStatus>("\"refund_requested\"").unwrap(),
            BookingStatus::RefundRequested
        );
    }

    #[test]
    fn reveal_switch_round_trips_optional_bool() {
        let doc = serde_json::json!({
            "id": "bk-1", "listing_id": "ls-1", "guest_id": "g", "host_id": "h",
            "status": "confirmed",
            "check_in": null, "check_out": null,
            "created_at": "2026-08-01T09:00:00Z",
            "host_contact_revealed": false,
            "reveal_host_at": null, "reveal_guest_at": null
        });
        let booking: Booking = serde_json::from_value(doc).unwrap();
        assert_eq!(booking.host_contact_revealed, RevealSwitch::Revoked);
        // absent field
        assert_eq!(booking.guest_contact_revealed, RevealSwitch::Unset);
        assert!(booking.guest_contact_revealed.allows());
        assert!(!booking.host_contact_revealed.allows());

        let back = serde_json::to_value(&booking).unwrap();
        assert_eq!(back["host_contact_revealed"], serde_json::json!(false));
        assert_eq!(back["guest_contact_revealed"], serde_json::Value::Null);
    }

    #[test]
    fn refund_override_uses_wire_name() {
        let mut booking = sample();
        booking.refund_allowed = Some(false);
        let doc = serde_json::to_value(&booking).unwrap();
        assert_eq!(doc["can_request_refund"], serde_json::json!(false));
    }
}

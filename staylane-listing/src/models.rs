use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Sponsorship expiry as stored in the document store.
///
/// Three encodings coexist in the data: native epoch millis written by the
/// admin tool, ISO-8601 strings from imports, and `{seconds, nanoseconds}`
/// timestamp objects written by the store SDK. All normalize to epoch
/// millis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExpiryStamp {
    Millis(i64),
    Iso(String),
    Stamp {
        seconds: i64,
        #[serde(default, alias = "nanos")]
        nanoseconds: u32,
    },
}

impl ExpiryStamp {
    /// Epoch millis, or `None` when the value doesn't parse. An unreadable
    /// expiry means no promotion, never a promotion that can't end.
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            ExpiryStamp::Millis(ms) => Some(*ms),
            ExpiryStamp::Iso(raw) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|t| t.timestamp_millis()),
            ExpiryStamp::Stamp {
                seconds,
                nanoseconds,
            } => seconds
                .checked_mul(1000)
                .and_then(|ms| ms.checked_add(i64::from(*nanoseconds) / 1_000_000)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingVisibility {
    #[default]
    Active,
    Inactive,
    Hidden,
    #[serde(other)]
    Unknown,
}

impl ListingVisibility {
    /// Inactive and hidden listings never surface a promotion.
    pub fn suppresses_promotion(&self) -> bool {
        matches!(self, ListingVisibility::Inactive | ListingVisibility::Hidden)
    }
}

/// The promotional subset of a listing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub host_id: String,
    pub title: String,
    #[serde(default)]
    pub sponsored: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sponsored_until: Option<ExpiryStamp>,
    #[serde(default)]
    pub status: ListingVisibility,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn get_listing(&self, id: &str) -> Result<Option<Listing>, BoxError>;

    async fn list_listings(&self) -> Result<Vec<Listing>, BoxError>;

    async fn insert_listing(&self, listing: &Listing) -> Result<(), BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_encodings_normalize_to_the_same_instant() {
        // 2030-01-01T00:00:00Z
        let millis = ExpiryStamp::Millis(1_893_456_000_000);
        let iso = ExpiryStamp::Iso("2030-01-01T00:00:00Z".into());
        let stamp = ExpiryStamp::Stamp {
            seconds: 1_893_456_000,
            nanoseconds: 0,
        };
        assert_eq!(millis.as_millis(), Some(1_893_456_000_000));
        assert_eq!(iso.as_millis(), millis.as_millis());
        assert_eq!(stamp.as_millis(), millis.as_millis());
    }

    #[test]
    fn unparseable_iso_yields_none() {
        assert_eq!(ExpiryStamp::Iso("sometime in 2030".into()).as_millis(), None);
    }

    #[test]
    fn out_of_range_stamp_yields_none() {
        // A corrupt seconds value must not wrap or panic.
        let stamp = ExpiryStamp::Stamp {
            seconds: i64::MAX,
            nanoseconds: 0,
        };
        assert_eq!(stamp.as_millis(), None);

        let stamp = ExpiryStamp::Stamp {
            seconds: i64::MIN,
            nanoseconds: 999_999_999,
        };
        assert_eq!(stamp.as_millis(), None);
    }

    #[test]
    fn untagged_deserialization_picks_the_right_shape() {
        assert_eq!(
            serde_json::from_value::<ExpiryStamp>(serde_json::json!(1_893_456_000_000i64)).unwrap(),
            ExpiryStamp::Millis(1_893_456_000_000)
        );
        assert_eq!(
            serde_json::from_value::<ExpiryStamp>(serde_json::json!("2030-01-01T00:00:00Z"))
                .unwrap(),
            ExpiryStamp::Iso("2030-01-01T00:00:00Z".into())
        );
        assert_eq!(
            serde_json::from_value::<ExpiryStamp>(
                serde_json::json!({"seconds": 1_893_456_000i64, "nanoseconds": 500_000_000u32})
            )
            .unwrap(),
            ExpiryStamp::Stamp {
                seconds: 1_893_456_000,
                nanoseconds: 500_000_000
            }
        );
    }

    #[test]
    fn unknown_status_strings_are_tolerated() {
        let listing: Listing = serde_json::from_value(serde_json::json!({
            "id": "ls-1", "host_id": "h-1", "title": "Loft",
            "status": "under_review",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(listing.status, ListingVisibility::Unknown);
        assert!(!listing.status.suppresses_promotion());
    }
}

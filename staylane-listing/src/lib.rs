pub mod featured;
pub mod models;

pub use featured::{is_featured_active, premium_cmp, sort_premium_first};
pub use models::{ExpiryStamp, Listing, ListingRepository, ListingVisibility};

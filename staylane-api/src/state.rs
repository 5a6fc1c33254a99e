use staylane_booking::cancel::{BookingRepository, StatusMirror};
use staylane_booking::contact::ContactDirectory;
use staylane_booking::eligibility::RefundPolicy;
use staylane_chat::thread::ThreadRepository;
use staylane_listing::models::ListingRepository;
use std::sync::Arc;

/// Token verification uses only the shared secret; expiry enforcement comes
/// from the token's own `exp` claim.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub mirror: Arc<dyn StatusMirror>,
    pub threads: Arc<dyn ThreadRepository>,
    pub listings: Arc<dyn ListingRepository>,
    pub directory: Arc<dyn ContactDirectory>,
    pub policy: RefundPolicy,
    pub auth: AuthConfig,
}

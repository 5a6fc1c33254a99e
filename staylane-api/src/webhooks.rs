use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use staylane_booking::models::BookingStatus;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub booking_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/webhooks/payments", post(handle_payment_webhook))
}

/// POST /api/webhooks/payments
/// Payment collaborator pushes settlement results; only the two recognized
/// event types transition a booking, everything else is acknowledged and
/// dropped.
async fn handle_payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentWebhook>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!(
        "Received webhook: {} for booking {}",
        payload.type_,
        payload.booking_id
    );

    let status = match payload.type_.as_str() {
        "payment.succeeded" => BookingStatus::Paid,
        "payment.refunded" => BookingStatus::Refunded,
        _ => return Ok(StatusCode::OK),
    };

    let booking = state
        .bookings
        .get_booking(&payload.booking_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if booking.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    state
        .bookings
        .update_status(&payload.booking_id, status)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(
        "Booking {} marked as {:?} via webhook {}",
        payload.booking_id,
        status,
        payload.id
    );

    Ok(StatusCode::OK)
}

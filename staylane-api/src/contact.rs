use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use staylane_booking::contact::{resolve_contacts, ContactReveal};

use crate::bookings::load_booking;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ContactResponse {
    ok: bool,
    #[serde(flatten)]
    reveal: ContactReveal,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/contact/{booking_id}", get(booking_contacts))
}

/// GET /api/contact/{booking_id}
/// Reveal decision plus contact payloads for both booking parties. The raw
/// reveal timestamps always come back so clients can render countdowns.
async fn booking_contacts(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<Json<ContactResponse>, AppError> {
    let booking = load_booking(&state, &booking_id).await?;
    let reveal = resolve_contacts(state.directory.as_ref(), &booking, Utc::now()).await;
    Ok(Json(ContactResponse { ok: true, reveal }))
}

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use staylane_booking::cancel::{self, CancelError};
use staylane_booking::eligibility::{self, BookingActions};
use staylane_booking::models::{Booking, BookingStatus, RevealSwitch};
use tracing::info;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct BookingView {
    #[serde(flatten)]
    booking: Booking,
    actions: BookingActions,
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    listing_id: String,
    host_id: String,
    check_in: Option<String>,
    check_out: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookingStatusResponse {
    booking_id: String,
    status: BookingStatus,
    status_label: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/{id}/cancel", post(cancel_booking))
        .route("/api/bookings/{id}/refund", post(refund_booking))
        .route("/api/bookings/{id}/confirm", post(confirm_booking))
}

/// GET /api/bookings
/// Caller's bookings with their evaluated action sets.
async fn list_bookings(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;

    let bookings = if claims.role == "host" {
        state.bookings.list_for_host(&claims.sub).await
    } else {
        state.bookings.list_for_guest(&claims.sub).await
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let now = Utc::now();
    let views = bookings
        .into_iter()
        .map(|booking| BookingView {
            actions: eligibility::evaluate(&booking, &state.policy, now),
            booking,
        })
        .collect();

    Ok(Json(views))
}

/// POST /api/bookings
/// Guest reserves a stay; the booking starts out pending host confirmation.
async fn create_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingStatusResponse>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;

    if req.listing_id.is_empty() {
        return Err(AppError::Validation("listing_id is required".to_string()));
    }
    if req.host_id.is_empty() {
        return Err(AppError::Validation("host_id is required".to_string()));
    }

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        listing_id: req.listing_id,
        guest_id: claims.sub,
        host_id: req.host_id,
        status: BookingStatus::Pending,
        check_in: req.check_in,
        check_out: req.check_out,
        created_at: Utc::now(),
        cancellation_requested: false,
        refund_allowed: None,
        reveal_host_at: None,
        reveal_guest_at: None,
        host_contact_revealed: RevealSwitch::Unset,
        guest_contact_revealed: RevealSwitch::Unset,
    };

    state
        .bookings
        .insert_booking(&booking)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(booking_id = %booking.id, "booking created");

    Ok(Json(BookingStatusResponse {
        booking_id: booking.id,
        status: booking.status,
        status_label: booking.status.display_label(),
    }))
}

/// POST /api/bookings/{id}/cancel
/// Guest asks to cancel; the counterparty view is mirrored best-effort.
async fn cancel_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingStatusResponse>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;
    require_guest(&state, &booking_id, &claims.sub).await?;

    let status = cancel::request_cancellation(
        state.bookings.as_ref(),
        state.mirror.as_ref(),
        &booking_id,
        Utc::now(),
    )
    .await
    .map_err(map_cancel_error)?;

    Ok(Json(BookingStatusResponse {
        booking_id,
        status,
        status_label: status.display_label(),
    }))
}

/// POST /api/bookings/{id}/refund
async fn refund_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingStatusResponse>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;
    require_guest(&state, &booking_id, &claims.sub).await?;

    let status = cancel::request_refund(
        state.bookings.as_ref(),
        state.mirror.as_ref(),
        &state.policy,
        &booking_id,
        Utc::now(),
    )
    .await
    .map_err(map_cancel_error)?;

    Ok(Json(BookingStatusResponse {
        booking_id,
        status,
        status_label: status.display_label(),
    }))
}

/// POST /api/bookings/{id}/confirm
/// Host accepts a pending reservation. Confirmation stamps both contact
/// reveal timestamps with server time.
async fn confirm_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingStatusResponse>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;

    let booking = load_booking(&state, &booking_id).await?;
    if booking.host_id != claims.sub {
        return Err(AppError::Authorization(
            "Only the host can confirm a booking".to_string(),
        ));
    }

    let status = cancel::confirm(state.bookings.as_ref(), &booking_id, Utc::now())
        .await
        .map_err(map_cancel_error)?;

    info!(booking_id = %booking_id, "booking confirmed by host");

    Ok(Json(BookingStatusResponse {
        booking_id,
        status,
        status_label: status.display_label(),
    }))
}

pub(crate) async fn load_booking(state: &AppState, id: &str) -> Result<Booking, AppError> {
    state
        .bookings
        .get_booking(id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Booking {id} not found")))
}

async fn require_guest(state: &AppState, booking_id: &str, party: &str) -> Result<(), AppError> {
    let booking = load_booking(state, booking_id).await?;
    if booking.guest_id != party {
        return Err(AppError::Authorization(
            "Booking belongs to another guest".to_string(),
        ));
    }
    Ok(())
}

fn map_cancel_error(err: CancelError) -> AppError {
    match err {
        CancelError::NotFound(id) => AppError::NotFound(format!("Booking {id} not found")),
        CancelError::NotEligible(_, reason) => AppError::Conflict(reason.to_string()),
        CancelError::Store(msg) => AppError::Internal(msg),
    }
}

use crate::eligibility::{self, RefundPolicy};
use crate::models::{Booking, BookingStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Primary booking store access.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking(&self, id: &str) -> Result<Option<Booking>, BoxError>;

    async fn list_for_guest(&self, guest_id: &str) -> Result<Vec<Booking>, BoxError>;

    async fn list_for_host(&self, host_id: &str) -> Result<Vec<Booking>, BoxError>;

    async fn insert_booking(&self, booking: &Booking) -> Result<(), BoxError>;

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<(), BoxError>;

    /// Stamp both reveal timestamps at host confirmation time.
    async fn set_reveal_at(&self, id: &str, at: DateTime<Utc>) -> Result<(), BoxError>;
}

/// Request annotation mirrored alongside a status change so the counterparty
/// view can explain what happened and when.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRequestTag {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub state: &'static str,
    pub at: DateTime<Utc>,
}

impl StatusRequestTag {
    pub fn cancel(at: DateTime<Utc>) -> Self {
        Self {
            kind: "cancel",
            state: "requested",
            at,
        }
    }

    pub fn refund(at: DateTime<Utc>) -> Self {
        Self {
            kind: "refund",
            state: "requested",
            at,
        }
    }
}

/// Secondary, best-effort replication of a status change into the store the
/// counterparty reads. Independent of the primary write; no atomicity
/// between the two.
#[async_trait]
pub trait StatusMirror: Send + Sync {
    async fn mirror_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        request: &StatusRequestTag,
    ) -> Result<(), BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Booking {0} is not eligible: {1}")]
    NotEligible(String, &'static str),

    #[error("Store error: {0}")]
    Store(String),
}

/// Guest asks to cancel a booking.
///
/// The status transition is the primary operation and its failure propagates
/// to the caller. The mirror write is fire-and-forget: a failure is logged
/// and the request still counts as accepted, the mirrored view catches up
/// later.
pub async fn request_cancellation(
    bookings: &dyn BookingRepository,
    mirror: &dyn StatusMirror,
    booking_id: &str,
    now: DateTime<Utc>,
) -> Result<BookingStatus, CancelError> {
    let booking = load(bookings, booking_id).await?;

    if !eligibility::can_request_cancellation(&booking, now) {
        return Err(CancelError::NotEligible(
            booking_id.to_string(),
            "cancellation window closed or request already recorded",
        ));
    }

    transition_and_mirror(
        bookings,
        mirror,
        booking_id,
        BookingStatus::CancelRequest,
        StatusRequestTag::cancel(now),
    )
    .await
}

/// Guest asks for a refund. Same shape as cancellation with the narrower
/// refund gate.
pub async fn request_refund(
    bookings: &dyn BookingRepository,
    mirror: &dyn StatusMirror,
    policy: &RefundPolicy,
    booking_id: &str,
    now: DateTime<Utc>,
) -> Result<BookingStatus, CancelError> {
    let booking = load(bookings, booking_id).await?;

    if !eligibility::can_request_refund(&booking, policy, now) {
        return Err(CancelError::NotEligible(
            booking_id.to_string(),
            "outside the refund window",
        ));
    }

    transition_and_mirror(
        bookings,
        mirror,
        booking_id,
        BookingStatus::RefundRequested,
        StatusRequestTag::refund(now),
    )
    .await
}

/// Host accepts a pending reservation.
///
/// The reveal stamp is written before the status flip. A stamped booking
/// that stays pending reveals nothing (disclosure also requires the
/// confirmed status), while a confirmed booking without stamps would keep
/// contacts locked forever.
pub async fn confirm(
    bookings: &dyn BookingRepository,
    booking_id: &str,
    now: DateTime<Utc>,
) -> Result<BookingStatus, CancelError> {
    let booking = load(bookings, booking_id).await?;

    if booking.status != BookingStatus::Pending {
        return Err(CancelError::NotEligible(
            booking_id.to_string(),
            "only pending bookings can be confirmed",
        ));
    }

    bookings
        .set_reveal_at(booking_id, now)
        .await
        .map_err(|e| CancelError::Store(e.to_string()))?;
    bookings
        .update_status(booking_id, BookingStatus::Confirmed)
        .await
        .map_err(|e| CancelError::Store(e.to_string()))?;

    tracing::info!(booking_id, "booking confirmed");
    Ok(BookingStatus::Confirmed)
}

async fn load(bookings: &dyn BookingRepository, id: &str) -> Result<Booking, CancelError> {
    bookings
        .get_booking(id)
        .await
        .map_err(|e| CancelError::Store(e.to_string()))?
        .ok_or_else(|| CancelError::NotFound(id.to_string()))
}

async fn transition_and_mirror(
    bookings: &dyn BookingRepository,
    mirror: &dyn StatusMirror,
    booking_id: &str,
    status: BookingStatus,
    tag: StatusRequestTag,
) -> Result<BookingStatus, CancelError> {
    bookings
        .update_status(booking_id, status)
        .await
        .map_err(|e| CancelError::Store(e.to_string()))?;

    if let Err(e) = mirror.mirror_status(booking_id, status, &tag).await {
        tracing::warn!(
            booking_id,
            error = %e,
            "mirror write failed, counterparty view will lag"
        );
    }

    tracing::info!(booking_id, request = tag.kind, "status request recorded");
    Ok(status)
}

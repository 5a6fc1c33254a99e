use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::Utc;
use serde::Deserialize;
use staylane_booking::eligibility;
use staylane_chat::thread::{
    get_or_create_thread, record_message, ChatThread, Message, ThreadError, ThreadKey,
    ThreadOutcome,
};

use crate::auth::authenticate;
use crate::bookings::load_booking;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    text: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings/{id}/thread", post(open_thread))
        .route("/api/chats", get(list_threads))
        .route(
            "/api/chats/{thread_id}/messages",
            get(list_messages).post(send_message),
        )
}

/// POST /api/bookings/{id}/thread
/// Open (or lazily create) the conversation for a booking. Idempotent:
/// both parties can call this concurrently and land on the same thread.
async fn open_thread(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<String>,
) -> Result<Json<ThreadOutcome>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;

    let booking = load_booking(&state, &booking_id).await?;
    if booking.guest_id != claims.sub && booking.host_id != claims.sub {
        return Err(AppError::Authorization(
            "Not a party of this booking".to_string(),
        ));
    }
    if !eligibility::can_chat(&booking) {
        return Err(AppError::Conflict(
            "Chat is unavailable until the booking is confirmed".to_string(),
        ));
    }

    let key = ThreadKey::new(
        booking.id.clone(),
        booking.listing_id.clone(),
        booking.guest_id.clone(),
        booking.host_id.clone(),
    )
    .map_err(|e| AppError::Validation(e.to_string()))?;

    // Thread title falls back to the booking id when the listing is gone.
    let title = match state.listings.get_listing(&booking.listing_id).await {
        Ok(Some(listing)) => listing.title,
        _ => format!("Booking {}", booking.id),
    };

    let outcome = get_or_create_thread(state.threads.as_ref(), &key, &title, Utc::now())
        .await
        .map_err(map_thread_error)?;

    Ok(Json(outcome))
}

/// GET /api/chats
/// Caller's threads, newest activity first.
async fn list_threads(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<ChatThread>>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;
    let threads = state
        .threads
        .list_for_party(&claims.sub)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(threads))
}

/// GET /api/chats/{thread_id}/messages
async fn list_messages(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;

    let thread = state
        .threads
        .get_thread(&thread_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Thread {thread_id} not found")))?;
    if !thread.is_participant(&claims.sub) {
        return Err(AppError::Authorization(
            "Not a participant of this thread".to_string(),
        ));
    }

    let messages = state
        .threads
        .list_messages(&thread_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(messages))
}

/// POST /api/chats/{thread_id}/messages
/// Append a message; the thread's last-message snapshot follows along.
async fn send_message(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(thread_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>, AppError> {
    let claims = authenticate(&bearer, &state.auth.secret)?;

    if req.text.trim().is_empty() {
        return Err(AppError::Validation("Message text is empty".to_string()));
    }

    let message = record_message(
        state.threads.as_ref(),
        &thread_id,
        &claims.sub,
        &req.text,
        Utc::now(),
    )
    .await
    .map_err(map_thread_error)?;

    Ok(Json(message))
}

fn map_thread_error(err: ThreadError) -> AppError {
    match err {
        ThreadError::MissingIdentifier(field) => {
            AppError::Validation(format!("Missing required identifier: {field}"))
        }
        ThreadError::NotFound(id) => AppError::NotFound(format!("Thread {id} not found")),
        ThreadError::NotParticipant(_, _) => {
            AppError::Authorization("Not a participant of this thread".to_string())
        }
        ThreadError::Store(msg) => AppError::Internal(msg),
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use staylane_api::auth::Claims;
use staylane_api::state::{AppState, AuthConfig};
use staylane_api::app;
use staylane_booking::cancel::BookingRepository;
use staylane_booking::contact::PartyProfile;
use staylane_booking::eligibility::RefundPolicy;
use staylane_booking::models::{Booking, BookingStatus, RevealSwitch};
use staylane_listing::models::{ExpiryStamp, Listing, ListingRepository, ListingVisibility};
use staylane_store::{
    MemoryBookings, MemoryDirectory, MemoryListings, MemoryMirror, MemoryThreads,
};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        role: role.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn confirmed_booking(id: &str) -> Booking {
    let now = Utc::now();
    Booking {
        id: id.to_string(),
        listing_id: "ls-1".to_string(),
        guest_id: "guest-1".to_string(),
        host_id: "host-1".to_string(),
        status: BookingStatus::Confirmed,
        check_in: Some((now + Duration::days(10)).date_naive().to_string()),
        check_out: Some((now + Duration::days(14)).date_naive().to_string()),
        created_at: now - Duration::hours(2),
        cancellation_requested: false,
        refund_allowed: None,
        reveal_host_at: Some(now - Duration::hours(1)),
        reveal_guest_at: Some(now + Duration::days(2)),
        host_contact_revealed: RevealSwitch::Unset,
        guest_contact_revealed: RevealSwitch::Unset,
    }
}

async fn seeded_state() -> AppState {
    let bookings = Arc::new(MemoryBookings::new());
    bookings
        .insert_booking(&confirmed_booking("bk-1"))
        .await
        .unwrap();

    let directory = Arc::new(MemoryDirectory::new());
    directory
        .upsert(
            "host-1",
            PartyProfile {
                email: Some("host@example.com".to_string()),
                phone: Some("+31 6 1234 5678".to_string()),
            },
        )
        .await;

    let listings = Arc::new(MemoryListings::new());
    let now = Utc::now();
    listings
        .insert_listing(&Listing {
            id: "ls-1".to_string(),
            host_id: "host-1".to_string(),
            title: "Canal-side loft".to_string(),
            sponsored: true,
            featured: true,
            sponsored_until: Some(ExpiryStamp::Millis(
                (now + Duration::days(30)).timestamp_millis(),
            )),
            status: ListingVisibility::Active,
            created_at: now - Duration::days(50),
        })
        .await
        .unwrap();
    listings
        .insert_listing(&Listing {
            id: "ls-2".to_string(),
            host_id: "host-2".to_string(),
            title: "Garden studio".to_string(),
            sponsored: false,
            featured: false,
            sponsored_until: None,
            status: ListingVisibility::Active,
            created_at: now - Duration::days(5),
        })
        .await
        .unwrap();

    AppState {
        bookings,
        mirror: Arc::new(MemoryMirror::new()),
        threads: Arc::new(MemoryThreads::new()),
        listings,
        directory,
        policy: RefundPolicy::default(),
        auth: AuthConfig {
            secret: SECRET.to_string(),
        },
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, bearer: Option<&str>, json: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match json {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn contact_endpoint_reveals_the_elapsed_side_only() {
    let app = app(seeded_state().await);

    let response = app.oneshot(get("/api/contact/bk-1", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["can_see_host"], true);
    assert_eq!(body["can_see_guest"], false);
    assert_eq!(body["host"]["email"], "host@example.com");
    assert_eq!(body["guest"], Value::Null);
    // Raw timestamps are always present for countdown rendering.
    assert!(body["reveal_guest_at"].is_string());
}

#[tokio::test]
async fn contact_endpoint_404s_on_unknown_booking() {
    let app = app(seeded_state().await);
    let response = app
        .oneshot(get("/api/contact/bk-missing", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bookings_list_carries_evaluated_actions() {
    let app = app(seeded_state().await);
    let response = app
        .oneshot(get("/api/bookings", Some(&token("guest-1", "guest"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let booking = &body[0];
    assert_eq!(booking["id"], "bk-1");
    assert_eq!(booking["actions"]["can_cancel"], true);
    assert_eq!(booking["actions"]["can_refund"], true);
    assert_eq!(booking["actions"]["can_chat"], true);
    assert_eq!(booking["actions"]["status_label"], "confirmed");
}

#[tokio::test]
async fn bookings_list_requires_a_valid_token() {
    let app = app(seeded_state().await);
    let response = app
        .clone()
        .oneshot(get("/api/bookings", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cancel_transitions_once_then_conflicts() {
    let app = app(seeded_state().await);
    let guest = token("guest-1", "guest");

    let response = app
        .clone()
        .oneshot(post("/api/bookings/bk-1/cancel", Some(&guest), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "cancel_request");
    assert_eq!(body["status_label"], "cancel requested");

    // A second request finds the booking already in a request state.
    let response = app
        .oneshot(post("/api/bookings/bk-1/cancel", Some(&guest), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_is_forbidden_for_the_wrong_guest() {
    let app = app(seeded_state().await);
    let response = app
        .oneshot(post(
            "/api/bookings/bk-1/cancel",
            Some(&token("guest-2", "guest")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn thread_open_is_idempotent_across_both_parties() {
    let app = app(seeded_state().await);

    let response = app
        .clone()
        .oneshot(post(
            "/api/bookings/bk-1/thread",
            Some(&token("guest-1", "guest")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["created"], true);

    let response = app
        .oneshot(post(
            "/api/bookings/bk-1/thread",
            Some(&token("host-1", "host")),
            None,
        ))
        .await
        .unwrap();
    let second = body_json(response).await;
    assert_eq!(second["created"], false);
    assert_eq!(first["thread_id"], second["thread_id"]);
    assert_eq!(first["thread_id"], "b:bk-1::g:guest-1::h:host-1");
}

#[tokio::test]
async fn messages_flow_between_participants() {
    let app = app(seeded_state().await);
    let guest = token("guest-1", "guest");

    let response = app
        .clone()
        .oneshot(post("/api/bookings/bk-1/thread", Some(&guest), None))
        .await
        .unwrap();
    let thread_id = body_json(response).await["thread_id"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/api/chats/{thread_id}/messages");
    let response = app
        .clone()
        .oneshot(post(
            &uri,
            Some(&guest),
            Some(serde_json::json!({"text": "What's the door code?"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // An outsider can neither read nor write.
    let stranger = token("guest-9", "guest");
    let response = app
        .clone()
        .oneshot(post(
            &uri,
            Some(&stranger),
            Some(serde_json::json!({"text": "hi"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.oneshot(get(&uri, Some(&guest))).await.unwrap();
    let messages = body_json(response).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["text"], "What's the door code?");
}

#[tokio::test]
async fn premium_sort_puts_the_boosted_listing_first() {
    let app = app(seeded_state().await);
    let response = app
        .oneshot(get("/api/listings?sort=premium", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body[0]["id"], "ls-1");
    assert_eq!(body[0]["featured_active"], true);
    assert_eq!(body[1]["id"], "ls-2");
    assert_eq!(body[1]["featured_active"], false);
}

#[tokio::test]
async fn payment_webhook_marks_the_booking_paid() {
    let state = seeded_state().await;
    let bookings = state.bookings.clone();
    let app = app(state);

    let response = app
        .oneshot(post(
            "/api/webhooks/payments",
            None,
            Some(serde_json::json!({
                "id": "evt-1",
                "type": "payment.succeeded",
                "booking_id": "bk-1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let booking = bookings.get_booking("bk-1").await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Paid);
}

#[tokio::test]
async fn full_reservation_lifecycle() {
    let state = seeded_state().await;
    let app = app(state);
    let guest = token("guest-7", "guest");
    let host = token("host-1", "host");

    // Guest reserves.
    let response = app
        .clone()
        .oneshot(post(
            "/api/bookings",
            Some(&guest),
            Some(serde_json::json!({
                "listing_id": "ls-1",
                "host_id": "host-1",
                "check_in": "2027-05-01",
                "check_out": "2027-05-08"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["status"], "pending");
    let booking_id = created["booking_id"].as_str().unwrap().to_string();

    // Pending: contacts still locked.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/contact/{booking_id}"), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["can_see_host"], false);

    // Host confirms; reveal timestamps get stamped with server time.
    let response = app
        .clone()
        .oneshot(post(
            &format!("/api/bookings/{booking_id}/confirm"),
            Some(&host),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/api/contact/{booking_id}"), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["can_see_host"], true);
    assert_eq!(body["host"]["email"], "host@example.com");
}

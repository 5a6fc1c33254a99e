use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use staylane_listing::featured::{is_featured_active, sort_premium_first};
use staylane_listing::models::Listing;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ListingsQuery {
    sort: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListingView {
    #[serde(flatten)]
    listing: Listing,
    featured_active: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/listings", get(list_listings))
        .route("/api/listings/{id}", get(get_listing))
}

/// GET /api/listings?sort=premium
/// Listings with their featured badge state; `sort=premium` applies the
/// premium-first ordering used on the search surface.
async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<Vec<ListingView>>, AppError> {
    let now = Utc::now();
    let mut listings = state
        .listings
        .list_listings()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if query.sort.as_deref() == Some("premium") {
        sort_premium_first(&mut listings, now);
    }

    let views = listings
        .into_iter()
        .map(|listing| ListingView {
            featured_active: is_featured_active(&listing, now),
            listing,
        })
        .collect();
    Ok(Json(views))
}

/// GET /api/listings/{id}
async fn get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> Result<Json<ListingView>, AppError> {
    let listing = state
        .listings
        .get_listing(&listing_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;

    Ok(Json(ListingView {
        featured_active: is_featured_active(&listing, Utc::now()),
        listing,
    }))
}

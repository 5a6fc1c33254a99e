use crate::error::AppError;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims minted by the hosted auth provider. `sub` is the party id used as
/// guest/host identifier throughout the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

pub fn authenticate(bearer: &Bearer, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Authentication(e.to_string()))
}

use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, models::ActorKind, state::AppState};

/// Anything that made an authenticated request.
pub trait Actor: Send + Sync {
    fn id(&self) -> Uuid;
    fn kind(&self) -> ActorKind;
}

#[derive(Debug, Clone, Copy)]
pub struct AuthBuyer {
    pub buyer_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct AuthSeller {
    pub seller_id: Uuid,
}

impl Actor for AuthBuyer {
    fn id(&self) -> Uuid {
        self.buyer_id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Buyer
    }
}

impl Actor for AuthSeller {
    fn id(&self) -> Uuid {
        self.seller_id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Seller
    }
}

fn authenticate(
    parts: &axum::http::request::Parts,
    secret: &str,
) -> Result<(Uuid, ActorKind), AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
        .trim();

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid subject in token".into()))?;

    Ok((id, decoded.claims.kind))
}

impl FromRequestParts<AppState> for AuthBuyer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, &state.config.jwt_secret)? {
            (buyer_id, ActorKind::Buyer) => Ok(AuthBuyer { buyer_id }),
            _ => Err(AppError::forbidden("Access denied: buyers only")),
        }
    }
}

impl FromRequestParts<AppState> for AuthSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, &state.config.jwt_secret)? {
            (seller_id, ActorKind::Seller) => Ok(AuthSeller { seller_id }),
            _ => Err(AppError::forbidden("Access denied: sellers only")),
        }
    }
}

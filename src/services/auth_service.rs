use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    db::DbPool,
    domain::verification::{VerificationToken, hash_token, is_expired},
    dto::auth::{
        BuyerSignupRequest, Claims, LoginRequest, LoginResponse, SellerSignupRequest,
        UpdateSellerProfileRequest, VerificationSent,
    },
    entity::{
        buyers::{self, Entity as Buyers},
        sellers::{self, Column as SellerCol, Entity as Sellers},
    },
    error::{AppError, AppResult},
    middleware::auth::{Actor, AuthBuyer, AuthSeller},
    models::{ActorKind, Buyer, Seller},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
}

fn actor_table(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Buyer => "buyers",
        ActorKind::Seller => "sellers",
    }
}

fn require(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    require(email, "email")?;
    require(password, "password")?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

async fn ensure_email_free(pool: &DbPool, kind: ActorKind, email: &str) -> AppResult<()> {
    let query = format!("SELECT id FROM {} WHERE email = $1", actor_table(kind));
    let exist: Option<(Uuid,)> = sqlx::query_as(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::bad_request("Email is already taken"));
    }
    Ok(())
}

/// A concurrent signup can pass `ensure_email_free` and still lose on the
/// unique index; report that the same way.
fn email_taken(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::bad_request("Email is already taken")
        }
        _ => AppError::OrmError(err),
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Sign a bearer token for the given actor.
pub fn issue_token(config: &AppConfig, id: Uuid, kind: ActorKind) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: id.to_string(),
        kind,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_buyer(
    state: &AppState,
    payload: BuyerSignupRequest,
) -> AppResult<ApiResponse<Buyer>> {
    let BuyerSignupRequest {
        email,
        full_name,
        password,
    } = payload;
    validate_credentials(&email, &password)?;
    require(&full_name, "fullName")?;
    ensure_email_free(&state.pool, ActorKind::Buyer, &email).await?;

    let buyer = buyers::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        full_name: Set(full_name),
        password_hash: Set(hash_password(&password)?),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(email_taken)?;

    let actor = AuthBuyer { buyer_id: buyer.id };
    audit::record(
        &state.pool,
        Some(&actor),
        "buyer_register",
        "buyers",
        serde_json::json!({ "buyer_id": buyer.id }),
    )
    .await;

    Ok(ApiResponse::success("Buyer created", Buyer::from(buyer), None))
}

pub async fn register_seller(
    state: &AppState,
    payload: SellerSignupRequest,
) -> AppResult<ApiResponse<Seller>> {
    let SellerSignupRequest {
        email,
        full_name,
        password,
        business_name,
        description,
    } = payload;
    validate_credentials(&email, &password)?;
    require(&full_name, "fullName")?;
    require(&business_name, "businessName")?;
    ensure_email_free(&state.pool, ActorKind::Seller, &email).await?;

    let seller = sellers::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        full_name: Set(full_name),
        password_hash: Set(hash_password(&password)?),
        business_name: Set(business_name),
        description: Set(description.unwrap_or_default()),
        verified: Set(false),
        verification_token_hash: Set(None),
        verification_expires_at: Set(None),
        rating: Set(0.0),
        total_reviews: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(email_taken)?;

    let actor = AuthSeller {
        seller_id: seller.id,
    };
    audit::record(
        &state.pool,
        Some(&actor),
        "seller_register",
        "sellers",
        serde_json::json!({ "seller_id": seller.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Seller created",
        Seller::from(seller),
        None,
    ))
}

/// Shared login for both actor kinds; only the table differs.
pub async fn login(
    state: &AppState,
    kind: ActorKind,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    require(&email, "email")?;
    require(&password, "password")?;

    let query = format!(
        "SELECT id, password_hash FROM {} WHERE email = $1",
        actor_table(kind)
    );
    let row: Option<CredentialRow> = sqlx::query_as::<_, CredentialRow>(&query)
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::bad_request("Invalid email or password")),
    };

    let parsed_hash = PasswordHash::new(&row.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::bad_request("Invalid email or password"));
    }

    let token = issue_token(&state.config, row.id, kind)?;
    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        kind,
    };

    let (buyer, seller) = (
        AuthBuyer { buyer_id: row.id },
        AuthSeller { seller_id: row.id },
    );
    let actor: &dyn Actor = match kind {
        ActorKind::Buyer => &buyer,
        ActorKind::Seller => &seller,
    };
    audit::record(
        &state.pool,
        Some(actor),
        &format!("{}_login", kind.as_str()),
        actor_table(kind),
        serde_json::json!({ "id": row.id }),
    )
    .await;

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn current_buyer(state: &AppState, buyer: &AuthBuyer) -> AppResult<ApiResponse<Buyer>> {
    let model = Buyers::find_by_id(buyer.buyer_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Buyer not found"))?;
    Ok(ApiResponse::success("OK", Buyer::from(model), None))
}

pub async fn current_seller(
    state: &AppState,
    seller: &AuthSeller,
) -> AppResult<ApiResponse<Seller>> {
    let model = Sellers::find_by_id(seller.seller_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Seller not found"))?;
    Ok(ApiResponse::success("OK", Seller::from(model), None))
}

pub async fn update_seller_profile(
    state: &AppState,
    seller: &AuthSeller,
    payload: UpdateSellerProfileRequest,
) -> AppResult<ApiResponse<Seller>> {
    let existing = Sellers::find_by_id(seller.seller_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Seller not found"))?;

    let mut active: sellers::ActiveModel = existing.into();
    if let Some(business_name) = payload.business_name.filter(|b| !b.trim().is_empty()) {
        active.business_name = Set(business_name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(seller),
        "seller_profile_update",
        "sellers",
        serde_json::json!({ "seller_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated successfully",
        Seller::from(updated),
        Some(Meta::empty()),
    ))
}

/// Issue a fresh verification token, replacing any earlier one, and hand the
/// plain token to the mailer. Only its hash is stored.
pub async fn request_verification(
    state: &AppState,
    seller: &AuthSeller,
) -> AppResult<ApiResponse<VerificationSent>> {
    let existing = Sellers::find_by_id(seller.seller_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Seller not found"))?;
    if existing.verified {
        return Err(AppError::bad_request("Seller already verified"));
    }

    let email = existing.email.clone();
    let token = VerificationToken::issue(Utc::now());
    let mut active: sellers::ActiveModel = existing.into();
    active.verification_token_hash = Set(Some(token.hash.clone()));
    active.verification_expires_at = Set(Some(token.expires_at.into()));
    active.update(&state.orm).await?;

    state
        .mailer
        .send_verification(&email, &token.plain)
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(seller_id = %seller.seller_id, expires_at = %token.expires_at, "verification requested");
    audit::record(
        &state.pool,
        Some(seller),
        "seller_verification_request",
        "sellers",
        serde_json::json!({ "seller_id": seller.seller_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Verification email sent successfully",
        VerificationSent {
            expires_at: token.expires_at,
        },
        Some(Meta::empty()),
    ))
}

/// Mark the seller holding `token` as verified. The token is single use.
pub async fn verify_seller(
    state: &AppState,
    token: Option<String>,
) -> AppResult<ApiResponse<Seller>> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Token is required"))?;

    let invalid = || AppError::bad_request("Invalid or expired token");
    let existing = Sellers::find()
        .filter(SellerCol::VerificationTokenHash.eq(hash_token(token.trim())))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;
    let expires_at = existing
        .verification_expires_at
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(invalid)?;
    if is_expired(expires_at, Utc::now()) {
        return Err(invalid());
    }

    let mut active: sellers::ActiveModel = existing.into();
    active.verified = Set(true);
    active.verification_token_hash = Set(None);
    active.verification_expires_at = Set(None);
    let updated = active.update(&state.orm).await?;

    let actor = AuthSeller {
        seller_id: updated.id,
    };
    tracing::info!(seller_id = %updated.id, "seller verified");
    audit::record(
        &state.pool,
        Some(&actor),
        "seller_verify",
        "sellers",
        serde_json::json!({ "seller_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Email verified successfully",
        Seller::from(updated),
        Some(Meta::empty()),
    ))
}

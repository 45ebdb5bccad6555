use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post, put},
};

use crate::{
    dto::auth::{
        BuyerSignupRequest, LoginRequest, LoginResponse, SellerSignupRequest,
        UpdateSellerProfileRequest, VerificationSent, VerifyQuery,
    },
    error::AppResult,
    middleware::auth::{AuthBuyer, AuthSeller},
    models::{ActorKind, Buyer, Seller},
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn buyer_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(buyer_signup))
        .route("/login", post(buyer_login))
        .route("/me", get(buyer_me))
}

pub fn seller_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(seller_signup))
        .route("/login", post(seller_login))
        .route("/me", get(seller_me))
        .route("/profile", put(update_profile))
        .route("/verification", post(request_verification))
        .route("/verify", get(verify_seller))
}

#[utoipa::path(
    post,
    path = "/api/buyers/signup",
    request_body = BuyerSignupRequest,
    responses(
        (status = 200, description = "Buyer registered", body = ApiResponse<Buyer>),
        (status = 400, description = "Invalid input or email taken"),
    ),
    tag = "Buyers"
)]
pub async fn buyer_signup(
    State(state): State<AppState>,
    Json(payload): Json<BuyerSignupRequest>,
) -> AppResult<Json<ApiResponse<Buyer>>> {
    let resp = auth_service::register_buyer(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/buyers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid email or password"),
    ),
    tag = "Buyers"
)]
pub async fn buyer_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, ActorKind::Buyer, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/buyers/me",
    responses(
        (status = 200, description = "Current buyer", body = ApiResponse<Buyer>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Buyers"
)]
pub async fn buyer_me(
    State(state): State<AppState>,
    buyer: AuthBuyer,
) -> AppResult<Json<ApiResponse<Buyer>>> {
    let resp = auth_service::current_buyer(&state, &buyer).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sellers/signup",
    request_body = SellerSignupRequest,
    responses(
        (status = 200, description = "Seller registered", body = ApiResponse<Seller>),
        (status = 400, description = "Invalid input or email taken"),
    ),
    tag = "Sellers"
)]
pub async fn seller_signup(
    State(state): State<AppState>,
    Json(payload): Json<SellerSignupRequest>,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let resp = auth_service::register_seller(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sellers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid email or password"),
    ),
    tag = "Sellers"
)]
pub async fn seller_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, ActorKind::Seller, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/me",
    responses(
        (status = 200, description = "Current seller", body = ApiResponse<Seller>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn seller_me(
    State(state): State<AppState>,
    seller: AuthSeller,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let resp = auth_service::current_seller(&state, &seller).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/sellers/profile",
    request_body = UpdateSellerProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Seller>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Sellers only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    seller: AuthSeller,
    Json(payload): Json<UpdateSellerProfileRequest>,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let resp = auth_service::update_seller_profile(&state, &seller, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sellers/verification",
    responses(
        (status = 200, description = "Verification link sent", body = ApiResponse<VerificationSent>),
        (status = 400, description = "Seller already verified"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Sellers only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn request_verification(
    State(state): State<AppState>,
    seller: AuthSeller,
) -> AppResult<Json<ApiResponse<VerificationSent>>> {
    let resp = auth_service::request_verification(&state, &seller).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/verify",
    params(("token" = Option<String>, Query, description = "Token from the verification link")),
    responses(
        (status = 200, description = "Seller verified", body = ApiResponse<Seller>),
        (status = 400, description = "Missing, invalid or expired token"),
    ),
    tag = "Sellers"
)]
pub async fn verify_seller(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let resp = auth_service::verify_seller(&state, query.token).await?;
    Ok(Json(resp))
}

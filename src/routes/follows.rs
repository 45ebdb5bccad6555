use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::follows::{FollowedSellers, FollowersView},
    error::AppResult,
    middleware::auth::AuthBuyer,
    response::ApiResponse,
    routes::params::Pagination,
    services::follow_service,
    state::AppState,
};

/// Mounted under `/buyers`.
pub fn buyer_router() -> Router<AppState> {
    Router::new().route("/me/follows", get(list_follows))
}

/// Mounted under `/sellers`.
pub fn seller_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/follow", post(follow_seller).delete(unfollow_seller))
        .route("/{id}/followers", get(followers))
}

#[utoipa::path(
    post,
    path = "/api/sellers/{id}/follow",
    params(("id" = Uuid, Path, description = "Seller ID")),
    responses(
        (status = 200, description = "Now following", body = ApiResponse<FollowersView>),
        (status = 400, description = "Already following"),
        (status = 404, description = "Seller not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Follows"
)]
pub async fn follow_seller(
    State(state): State<AppState>,
    buyer: AuthBuyer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FollowersView>>> {
    let resp = follow_service::follow_seller(&state.pool, &buyer, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/sellers/{id}/follow",
    params(("id" = Uuid, Path, description = "Seller ID")),
    responses(
        (status = 200, description = "No longer following", body = ApiResponse<FollowersView>),
        (status = 400, description = "Not following"),
        (status = 404, description = "Seller not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Follows"
)]
pub async fn unfollow_seller(
    State(state): State<AppState>,
    buyer: AuthBuyer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FollowersView>>> {
    let resp = follow_service::unfollow_seller(&state.pool, &buyer, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/{id}/followers",
    params(("id" = Uuid, Path, description = "Seller ID")),
    responses(
        (status = 200, description = "Followers of a seller", body = ApiResponse<FollowersView>),
        (status = 404, description = "Seller not found"),
    ),
    tag = "Follows"
)]
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FollowersView>>> {
    let resp = follow_service::followers(&state.pool, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/buyers/me/follows",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Followed sellers", body = ApiResponse<FollowedSellers>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Follows"
)]
pub async fn list_follows(
    State(state): State<AppState>,
    buyer: AuthBuyer,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<FollowedSellers>>> {
    let resp = follow_service::list_follows(&state.pool, &buyer, pagination).await?;
    Ok(Json(resp))
}

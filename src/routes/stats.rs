use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::stats::{CategorySales, SellerSales},
    error::AppResult,
    response::ApiResponse,
    services::stats_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(category_sales))
        .route("/sales", get(seller_sales))
}

#[utoipa::path(
    get,
    path = "/api/stats/categories",
    responses((status = 200, description = "Sales per category", body = ApiResponse<Vec<CategorySales>>)),
    tag = "Stats"
)]
pub async fn category_sales(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<CategorySales>>>> {
    let resp = stats_service::category_sales(&state.pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stats/sales",
    responses((status = 200, description = "Sales per seller", body = ApiResponse<Vec<SellerSales>>)),
    tag = "Stats"
)]
pub async fn seller_sales(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<SellerSales>>>> {
    let resp = stats_service::seller_sales(&state.pool).await?;
    Ok(Json(resp))
}

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    pub category: String,
    pub total_sales: i64,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerSales {
    pub seller: String,
    pub total_sales: i64,
    pub total_quantity: i64,
}

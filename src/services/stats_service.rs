use crate::{
    db::DbPool,
    dto::stats::{CategorySales, SellerSales},
    error::AppResult,
    response::ApiResponse,
};

/// Sales per product category over every order line, best sellers first.
///
/// Lines whose product has since been deleted drop out of the join.
pub async fn category_sales(pool: &DbPool) -> AppResult<ApiResponse<Vec<CategorySales>>> {
    let stats = sqlx::query_as::<_, CategorySales>(
        r#"
        SELECT p.category AS category,
               COALESCE(SUM(oi.price * oi.quantity), 0)::BIGINT AS total_sales,
               COALESCE(SUM(oi.quantity), 0)::BIGINT AS total_quantity
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        GROUP BY p.category
        ORDER BY total_sales DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success("OK", stats, None))
}

pub async fn seller_sales(pool: &DbPool) -> AppResult<ApiResponse<Vec<SellerSales>>> {
    let stats = sqlx::query_as::<_, SellerSales>(
        r#"
        SELECT s.business_name AS seller,
               COALESCE(SUM(oi.price * oi.quantity), 0)::BIGINT AS total_sales,
               COALESCE(SUM(oi.quantity), 0)::BIGINT AS total_quantity
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        JOIN sellers s ON s.id = p.seller_id
        GROUP BY s.id, s.business_name
        ORDER BY total_sales DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success("OK", stats, None))
}

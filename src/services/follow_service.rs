use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::follows::{FollowedSellers, FollowersView},
    error::{AppError, AppResult},
    middleware::auth::AuthBuyer,
    models::Seller,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

// Both directions of the relation are read from the one `seller_follows` row,
// so follow and unfollow are single statements and cannot leave the two
// sides disagreeing.

pub async fn follow_seller(
    pool: &DbPool,
    buyer: &AuthBuyer,
    seller_id: Uuid,
) -> AppResult<ApiResponse<FollowersView>> {
    ensure_seller(pool, seller_id).await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO seller_follows (buyer_id, seller_id)
        VALUES ($1, $2)
        ON CONFLICT (buyer_id, seller_id) DO NOTHING
        "#,
    )
    .bind(buyer.buyer_id)
    .bind(seller_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 0 {
        return Err(AppError::bad_request("Already following this seller"));
    }

    tracing::info!(buyer_id = %buyer.buyer_id, %seller_id, "seller followed");
    audit::record(
        pool,
        Some(buyer),
        "seller_follow",
        "seller_follows",
        serde_json::json!({ "seller_id": seller_id }),
    )
    .await;

    let view = load_followers(pool, seller_id).await?;
    Ok(ApiResponse::success(
        "Seller followed successfully",
        view,
        Some(Meta::empty()),
    ))
}

pub async fn unfollow_seller(
    pool: &DbPool,
    buyer: &AuthBuyer,
    seller_id: Uuid,
) -> AppResult<ApiResponse<FollowersView>> {
    ensure_seller(pool, seller_id).await?;

    let removed = sqlx::query("DELETE FROM seller_follows WHERE buyer_id = $1 AND seller_id = $2")
        .bind(buyer.buyer_id)
        .bind(seller_id)
        .execute(pool)
        .await?
        .rows_affected();

    if removed == 0 {
        return Err(AppError::bad_request("Not following this seller"));
    }

    tracing::info!(buyer_id = %buyer.buyer_id, %seller_id, "seller unfollowed");
    audit::record(
        pool,
        Some(buyer),
        "seller_unfollow",
        "seller_follows",
        serde_json::json!({ "seller_id": seller_id }),
    )
    .await;

    let view = load_followers(pool, seller_id).await?;
    Ok(ApiResponse::success(
        "Seller unfollowed successfully",
        view,
        Some(Meta::empty()),
    ))
}

/// Sellers the buyer follows, most recent first.
pub async fn list_follows(
    pool: &DbPool,
    buyer: &AuthBuyer,
    pagination: Pagination,
) -> AppResult<ApiResponse<FollowedSellers>> {
    let (page, limit, offset) = pagination.normalize();
    let sellers = sqlx::query_as::<_, Seller>(
        r#"
        SELECT s.*
        FROM seller_follows f
        JOIN sellers s ON s.id = f.seller_id
        WHERE f.buyer_id = $1
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(buyer.buyer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seller_follows WHERE buyer_id = $1")
        .bind(buyer.buyer_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        FollowedSellers { items: sellers },
        Some(meta),
    ))
}

pub async fn followers(pool: &DbPool, seller_id: Uuid) -> AppResult<ApiResponse<FollowersView>> {
    ensure_seller(pool, seller_id).await?;
    let view = load_followers(pool, seller_id).await?;
    Ok(ApiResponse::success("OK", view, None))
}

async fn ensure_seller(pool: &DbPool, seller_id: Uuid) -> AppResult<()> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM sellers WHERE id = $1")
        .bind(seller_id)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::not_found("Seller not found"));
    }
    Ok(())
}

async fn load_followers(pool: &DbPool, seller_id: Uuid) -> AppResult<FollowersView> {
    let follower_ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT buyer_id FROM seller_follows WHERE seller_id = $1 ORDER BY created_at",
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(FollowersView {
        seller_id,
        followers_count: follower_ids.len() as i64,
        follower_ids,
    })
}

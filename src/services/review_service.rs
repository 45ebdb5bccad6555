use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::rating::{Rating, RatingSummary, ReviewTarget},
    dto::reviews::{CreateReviewRequest, ReviewList, ReviewWithAuthor},
    entity::{
        buyers::Entity as Buyers,
        products::{self, Entity as Products},
        reviews::{self, Column as ReviewCol, Entity as Reviews},
        sellers::{self, Entity as Sellers},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthBuyer,
    models::Review,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Create a review and fold its rating into the target's running mean.
///
/// The target row is locked `FOR UPDATE` for the whole transaction, so two
/// reviews of the same product or seller apply one after the other.
pub async fn create_review(
    state: &AppState,
    buyer: &AuthBuyer,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let raw_rating = payload
        .rating
        .ok_or_else(|| AppError::bad_request("Rating and productId or sellerId are required"))?;
    let target = ReviewTarget::resolve(payload.product_id, payload.seller_id)
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    let rating = Rating::try_from(raw_rating).map_err(|e| AppError::bad_request(e.to_string()))?;

    let txn = state.orm.begin().await?;
    let current = lock_target(&txn, target).await?;

    let mut duplicate = Reviews::find().filter(ReviewCol::BuyerId.eq(buyer.buyer_id));
    duplicate = match target {
        ReviewTarget::Product(id) => duplicate.filter(ReviewCol::ProductId.eq(id)),
        ReviewTarget::Seller(id) => duplicate.filter(ReviewCol::SellerId.eq(id)),
    };
    if duplicate.one(&txn).await?.is_some() {
        return Err(AppError::bad_request(format!(
            "You have already reviewed this {}",
            target.resource()
        )));
    }

    let (product_id, seller_id) = match target {
        ReviewTarget::Product(id) => (Some(id), None),
        ReviewTarget::Seller(id) => (None, Some(id)),
    };
    let review = reviews::ActiveModel {
        id: Set(Uuid::new_v4()),
        buyer_id: Set(buyer.buyer_id),
        product_id: Set(product_id),
        seller_id: Set(seller_id),
        rating: Set(rating.value()),
        comment: Set(payload.comment.unwrap_or_default()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let summary = current.record(rating);
    store_summary(&txn, target, summary).await?;
    txn.commit().await?;

    tracing::info!(
        review_id = %review.id,
        target = target.resource(),
        target_id = %target.id(),
        average = summary.average,
        count = summary.count,
        "review recorded"
    );
    audit::record(
        &state.pool,
        Some(buyer),
        "review_create",
        "reviews",
        serde_json::json!({
            "review_id": review.id,
            "target": target.resource(),
            "target_id": target.id(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review added successfully",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

/// Delete a review and rebuild the target's aggregate from what remains.
pub async fn delete_review(
    state: &AppState,
    buyer: &AuthBuyer,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let review = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Review not found"))?;
    if review.buyer_id != buyer.buyer_id {
        return Err(AppError::forbidden("Only the author may delete this review"));
    }
    let target = ReviewTarget::resolve(review.product_id, review.seller_id).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("review {} has no valid target: {e}", review.id))
    })?;

    let txn = state.orm.begin().await?;
    lock_target(&txn, target).await?;
    Reviews::delete_by_id(id).exec(&txn).await?;
    let remaining = target_ratings(&txn, target).await?;
    let summary = RatingSummary::from_ratings(remaining);
    store_summary(&txn, target, summary).await?;
    txn.commit().await?;

    tracing::info!(
        review_id = %id,
        target = target.resource(),
        average = summary.average,
        count = summary.count,
        "review deleted"
    );
    audit::record(
        &state.pool,
        Some(buyer),
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id, "target_id": target.id() }),
    )
    .await;

    Ok(ApiResponse::message_only("Review deleted successfully"))
}

pub async fn list_product_reviews(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    list_reviews(state, ReviewTarget::Product(product_id)).await
}

pub async fn list_seller_reviews(
    state: &AppState,
    seller_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    list_reviews(state, ReviewTarget::Seller(seller_id)).await
}

async fn list_reviews(state: &AppState, target: ReviewTarget) -> AppResult<ApiResponse<ReviewList>> {
    let finder = match target {
        ReviewTarget::Product(id) => Reviews::find().filter(ReviewCol::ProductId.eq(id)),
        ReviewTarget::Seller(id) => Reviews::find().filter(ReviewCol::SellerId.eq(id)),
    };

    let items = finder
        .order_by_desc(ReviewCol::CreatedAt)
        .find_also_related(Buyers)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(review, author)| ReviewWithAuthor {
            id: review.id,
            buyer_id: review.buyer_id,
            author_name: author.map(|b| b.full_name),
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.with_timezone(&chrono::Utc),
        })
        .collect();

    Ok(ApiResponse::success("OK", ReviewList { items }, None))
}

async fn lock_target(txn: &DatabaseTransaction, target: ReviewTarget) -> AppResult<RatingSummary> {
    match target {
        ReviewTarget::Product(id) => Products::find_by_id(id)
            .lock(LockType::Update)
            .one(txn)
            .await?
            .map(|p| RatingSummary::new(p.rating, p.total_reviews))
            .ok_or_else(|| AppError::not_found("Product not found")),
        ReviewTarget::Seller(id) => Sellers::find_by_id(id)
            .lock(LockType::Update)
            .one(txn)
            .await?
            .map(|s| RatingSummary::new(s.rating, s.total_reviews))
            .ok_or_else(|| AppError::not_found("Seller not found")),
    }
}

async fn target_ratings(txn: &DatabaseTransaction, target: ReviewTarget) -> AppResult<Vec<i32>> {
    let finder = match target {
        ReviewTarget::Product(id) => Reviews::find().filter(ReviewCol::ProductId.eq(id)),
        ReviewTarget::Seller(id) => Reviews::find().filter(ReviewCol::SellerId.eq(id)),
    };
    let ratings = finder
        .select_only()
        .column(ReviewCol::Rating)
        .into_tuple::<i32>()
        .all(txn)
        .await?;
    Ok(ratings)
}

async fn store_summary(
    txn: &DatabaseTransaction,
    target: ReviewTarget,
    summary: RatingSummary,
) -> AppResult<()> {
    match target {
        ReviewTarget::Product(id) => {
            products::ActiveModel {
                id: Set(id),
                rating: Set(summary.average),
                total_reviews: Set(summary.count),
                ..Default::default()
            }
            .update(txn)
            .await?;
        }
        ReviewTarget::Seller(id) => {
            sellers::ActiveModel {
                id: Set(id),
                rating: Set(summary.average),
                total_reviews: Set(summary.count),
                ..Default::default()
            }
            .update(txn)
            .await?;
        }
    }
    Ok(())
}

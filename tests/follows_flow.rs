mod common;

use artisan_market_api::{
    error::AppError, routes::params::Pagination, services::follow_service,
};
use uuid::Uuid;

#[tokio::test]
async fn follow_and_unfollow_are_symmetric() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Followed Studio").await?;
    let buyer = common::create_buyer(&state, "Frances").await?;

    let view = follow_service::follow_seller(&state.pool, &buyer, seller.seller_id)
        .await?
        .data
        .expect("followers");
    assert_eq!(view.followers_count, 1);
    assert_eq!(view.follower_ids, vec![buyer.buyer_id]);

    let follows = follow_service::list_follows(&state.pool, &buyer, Pagination::default())
        .await?
        .data
        .expect("follows");
    assert_eq!(follows.items.len(), 1);
    assert_eq!(follows.items[0].id, seller.seller_id);

    let err = follow_service::follow_seller(&state.pool, &buyer, seller.seller_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    let view = follow_service::followers(&state.pool, seller.seller_id)
        .await?
        .data
        .expect("followers");
    assert_eq!(view.followers_count, 1);

    let view = follow_service::unfollow_seller(&state.pool, &buyer, seller.seller_id)
        .await?
        .data
        .expect("followers");
    assert_eq!(view.followers_count, 0);
    assert!(view.follower_ids.is_empty());

    let follows = follow_service::list_follows(&state.pool, &buyer, Pagination::default())
        .await?
        .data
        .expect("follows");
    assert!(follows.items.is_empty());

    let err = follow_service::unfollow_seller(&state.pool, &buyer, seller.seller_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn following_an_unknown_seller_is_not_found() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let buyer = common::create_buyer(&state, "Lost").await?;

    let err = follow_service::follow_seller(&state.pool, &buyer, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let err = follow_service::followers(&state.pool, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    Ok(())
}

mod common;

use artisan_market_api::{
    dto::reviews::CreateReviewRequest,
    entity::{products::Entity as Products, sellers::Entity as Sellers},
    error::AppError,
    services::review_service,
};
use sea_orm::EntityTrait;
use uuid::Uuid;

fn product_review(product_id: Uuid, rating: i32) -> CreateReviewRequest {
    CreateReviewRequest {
        product_id: Some(product_id),
        seller_id: None,
        rating: Some(rating),
        comment: None,
    }
}

fn seller_review(seller_id: Uuid, rating: i32) -> CreateReviewRequest {
    CreateReviewRequest {
        product_id: None,
        seller_id: Some(seller_id),
        rating: Some(rating),
        comment: Some("Lovely work".into()),
    }
}

#[tokio::test]
async fn product_rating_is_a_running_mean() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Rated Goods").await?;
    let mug = common::create_product(&state, &seller, "Mug", 2800, 10).await?;

    let mut averages = Vec::new();
    for (name, rating) in [("R1", 5), ("R2", 3), ("R3", 4)] {
        let buyer = common::create_buyer(&state, name).await?;
        review_service::create_review(&state, &buyer, product_review(mug.id, rating)).await?;
        let product = Products::find_by_id(mug.id).one(&state.orm).await?.expect("product");
        averages.push((product.rating, product.total_reviews));
    }

    assert_eq!(averages, vec![(5.0, 1), (4.0, 2), (4.0, 3)]);

    let listed = review_service::list_product_reviews(&state, mug.id)
        .await?
        .data
        .expect("reviews");
    assert_eq!(listed.items.len(), 3);
    assert!(listed.items.iter().all(|r| r.author_name.is_some()));
    Ok(())
}

#[tokio::test]
async fn one_review_per_buyer_and_target() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Unique Reviews").await?;
    let buyer = common::create_buyer(&state, "Ruth").await?;
    let bowl = common::create_product(&state, &seller, "Bowl", 6400, 5).await?;

    review_service::create_review(&state, &buyer, product_review(bowl.id, 4)).await?;
    review_service::create_review(&state, &buyer, seller_review(seller.seller_id, 5)).await?;

    let err = review_service::create_review(&state, &buyer, product_review(bowl.id, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let err = review_service::create_review(&state, &buyer, seller_review(seller.seller_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let product = Products::find_by_id(bowl.id).one(&state.orm).await?.expect("product");
    assert_eq!((product.rating, product.total_reviews), (4.0, 1));
    let maker = Sellers::find_by_id(seller.seller_id).one(&state.orm).await?.expect("seller");
    assert_eq!((maker.rating, maker.total_reviews), (5.0, 1));
    Ok(())
}

#[tokio::test]
async fn malformed_reviews_are_rejected() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Picky").await?;
    let buyer = common::create_buyer(&state, "Dorothy").await?;
    let spoon = common::create_product(&state, &seller, "Spoon", 2200, 5).await?;

    let cases = [
        CreateReviewRequest { rating: None, ..product_review(spoon.id, 3) },
        CreateReviewRequest { seller_id: Some(seller.seller_id), ..product_review(spoon.id, 3) },
        CreateReviewRequest { product_id: None, ..product_review(spoon.id, 3) },
        product_review(spoon.id, 0),
        product_review(spoon.id, 6),
    ];
    for case in cases {
        let err = review_service::create_review(&state, &buyer, case).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    }

    let err = review_service::create_review(&state, &buyer, product_review(Uuid::new_v4(), 3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn deleting_a_review_recomputes_the_aggregate() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Second Thoughts").await?;
    let vase = common::create_product(&state, &seller, "Vase", 9000, 5).await?;
    let harsh = common::create_buyer(&state, "Harsh").await?;
    let kind = common::create_buyer(&state, "Kind").await?;

    let review = review_service::create_review(&state, &harsh, product_review(vase.id, 1))
        .await?
        .data
        .expect("review");
    review_service::create_review(&state, &kind, product_review(vase.id, 5)).await?;

    let err = review_service::delete_review(&state, &kind, review.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    review_service::delete_review(&state, &harsh, review.id).await?;
    let product = Products::find_by_id(vase.id).one(&state.orm).await?.expect("product");
    assert_eq!((product.rating, product.total_reviews), (5.0, 1));

    // The buyer may review again once the old review is gone.
    review_service::create_review(&state, &harsh, product_review(vase.id, 3)).await?;
    let product = Products::find_by_id(vase.id).one(&state.orm).await?.expect("product");
    assert_eq!((product.rating, product.total_reviews), (4.0, 2));
    Ok(())
}

#[tokio::test]
async fn concurrent_reviews_do_not_lose_updates() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Busy Stall").await?;
    let mug = common::create_product(&state, &seller, "Mug", 2800, 5).await?;
    let a = common::create_buyer(&state, "A").await?;
    let b = common::create_buyer(&state, "B").await?;

    let (ra, rb) = tokio::join!(
        review_service::create_review(&state, &a, product_review(mug.id, 2)),
        review_service::create_review(&state, &b, product_review(mug.id, 4)),
    );
    ra?;
    rb?;

    let product = Products::find_by_id(mug.id).one(&state.orm).await?.expect("product");
    assert_eq!((product.rating, product.total_reviews), (3.0, 2));
    Ok(())
}

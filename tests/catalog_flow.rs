mod common;

use artisan_market_api::{
    dto::{
        cart::AddToCartRequest,
        products::{CreateProductRequest, UpdateProductRequest},
        reviews::CreateReviewRequest,
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        reviews::{Column as ReviewCol, Entity as Reviews},
    },
    error::AppError,
    middleware::auth::AuthSeller,
    models::Product,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{cart_service, product_service, review_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

async fn listed(
    state: &AppState,
    category: &str,
    build: impl FnOnce(&mut ProductQuery),
) -> anyhow::Result<Vec<String>> {
    let mut query = ProductQuery {
        category: Some(category.to_string()),
        ..Default::default()
    };
    build(&mut query);
    let resp = product_service::list_products(state, query).await?;
    Ok(resp
        .data
        .expect("products")
        .items
        .into_iter()
        .map(|p| p.title)
        .collect())
}

async fn stock_item(
    state: &AppState,
    seller: &AuthSeller,
    category: &str,
    title: &str,
    price: i64,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        seller,
        CreateProductRequest {
            title: title.into(),
            description: format!("{title}, made by hand"),
            price,
            stock: 5,
            category: Some(category.into()),
            tags: vec!["handmade".into()],
        },
    )
    .await?;
    Ok(resp.data.expect("product"))
}

#[tokio::test]
async fn listing_filters_sorts_and_pages_active_products() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Catalog Kiln").await?;
    let category = format!("ceramics-{}", Uuid::new_v4().simple());

    stock_item(&state, &seller, &category, "Teal Bowl", 3000).await?;
    stock_item(&state, &seller, &category, "Amber Vase", 9000).await?;
    stock_item(&state, &seller, &category, "Blue Plate", 1500).await?;
    let hidden = stock_item(&state, &seller, &category, "Blue Jug", 4000).await?;
    product_service::update_product(
        &state,
        &seller,
        hidden.id,
        UpdateProductRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let by_price = listed(&state, &category, |q| {
        q.sort_by = Some(ProductSortBy::Price);
        q.sort_order = Some(SortOrder::Asc);
    })
    .await?;
    assert_eq!(by_price, ["Blue Plate", "Teal Bowl", "Amber Vase"]);

    let by_title_desc = listed(&state, &category, |q| {
        q.sort_by = Some(ProductSortBy::Title);
        q.sort_order = Some(SortOrder::Desc);
    })
    .await?;
    assert_eq!(by_title_desc, ["Teal Bowl", "Blue Plate", "Amber Vase"]);

    let search = listed(&state, &category, |q| q.q = Some("blue".into())).await?;
    assert_eq!(search, ["Blue Plate"]);

    let mid_range = listed(&state, &category, |q| {
        q.min_price = Some(2000);
        q.max_price = Some(9000);
        q.sort_by = Some(ProductSortBy::Price);
        q.sort_order = Some(SortOrder::Asc);
    })
    .await?;
    assert_eq!(mid_range, ["Teal Bowl", "Amber Vase"]);

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            category: Some(category.clone()),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        },
    )
    .await?;
    let meta = resp.meta.clone().expect("meta");
    assert_eq!((meta.page, meta.per_page, meta.total), (Some(2), Some(2), Some(3)));
    assert_eq!(meta.total_pages, Some(2));
    let titles: Vec<String> = resp.data.expect("products").items.into_iter().map(|p| p.title).collect();
    assert_eq!(titles, ["Amber Vase"]);

    // Inactive products are still reachable directly.
    let direct = product_service::get_product(&state, hidden.id).await?.data.expect("product");
    assert!(!direct.is_active);
    Ok(())
}

#[tokio::test]
async fn create_applies_defaults_and_rejects_bad_amounts() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Defaults").await?;

    let product = product_service::create_product(
        &state,
        &seller,
        CreateProductRequest {
            title: "Spoon".into(),
            description: String::new(),
            price: 900,
            stock: 0,
            category: None,
            tags: vec![],
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.category, product_service::DEFAULT_CATEGORY);
    assert!(product.is_active);

    let err = product_service::create_product(
        &state,
        &seller,
        CreateProductRequest {
            title: "Negative".into(),
            description: String::new(),
            price: -1,
            stock: 1,
            category: None,
            tags: vec![],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let err = product_service::create_product(
        &state,
        &seller,
        CreateProductRequest {
            title: "   ".into(),
            description: String::new(),
            price: 100,
            stock: 1,
            category: None,
            tags: vec![],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn only_the_owner_may_change_a_product() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let owner = common::create_seller(&state, "Owner Works").await?;
    let rival = common::create_seller(&state, "Rival Works").await?;
    let stool = common::create_product(&state, &owner, "Stool", 7000, 2).await?;

    let err = product_service::update_product(
        &state,
        &rival,
        stool.id,
        UpdateProductRequest {
            price: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let err = product_service::delete_product(&state, &rival, stool.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let unchanged = product_service::get_product(&state, stool.id).await?.data.expect("product");
    assert_eq!(unchanged.price, 7000);

    let updated = product_service::update_product(
        &state,
        &owner,
        stool.id,
        UpdateProductRequest {
            price: Some(7500),
            stock: Some(4),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!((updated.price, updated.stock), (7500, 4));

    let err = product_service::get_product(&state, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn deleting_a_product_removes_its_cart_lines_and_reviews() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let seller = common::create_seller(&state, "Short Run").await?;
    let buyer = common::create_buyer(&state, "Lin").await?;
    let lamp = common::create_product(&state, &seller, "Lamp", 5200, 3).await?;

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest { product_id: lamp.id, quantity: Some(1) },
    )
    .await?;
    review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            product_id: Some(lamp.id),
            seller_id: None,
            rating: Some(5),
            comment: Some("Warm light".into()),
        },
    )
    .await?;

    product_service::delete_product(&state, &seller, lamp.id).await?;

    let lines = CartItems::find()
        .filter(CartItemCol::ProductId.eq(lamp.id))
        .count(&state.orm)
        .await?;
    let reviews = Reviews::find()
        .filter(ReviewCol::ProductId.eq(lamp.id))
        .count(&state.orm)
        .await?;
    assert_eq!((lines, reviews), (0, 0));

    let err = product_service::get_product(&state, lamp.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    Ok(())
}

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        cart::{CartLine, cart_total},
        checkout::RequestedLine,
    },
    dto::{
        cart::{AddToCartRequest, CartLineView, CartView, UpdateCartItemRequest},
        orders::{CheckoutCartRequest, PlacedOrder},
    },
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::{self, Column as CartCol, Entity as Carts},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthBuyer,
    response::{ApiResponse, Meta},
    services::order_service,
    state::AppState,
};

pub async fn get_cart(state: &AppState, buyer: &AuthBuyer) -> AppResult<ApiResponse<CartView>> {
    let cart = ensure_cart(&state.orm, buyer.buyer_id).await?;
    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    buyer: &AuthBuyer,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let quantity = match payload.quantity {
        None => 1,
        Some(q) if q > 0 => q,
        Some(_) => {
            return Err(AppError::bad_request("quantity must be greater than 0"));
        }
    };

    let product_exists = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .is_some();
    if !product_exists {
        return Err(AppError::not_found("Product not found"));
    }

    ensure_cart(&state.orm, buyer.buyer_id).await?;

    let txn = state.orm.begin().await?;
    let cart = lock_cart(&txn, buyer.buyer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    let existing = CartItems::find_by_id((buyer.buyer_id, payload.product_id))
        .one(&txn)
        .await?;
    match existing {
        Some(item) => {
            let new_quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| AppError::bad_request("Cart quantity is too large"))?;
            let mut active: cart_items::ActiveModel = item.into();
            active.quantity = Set(new_quantity);
            active.update(&txn).await?;
        }
        None => {
            cart_items::ActiveModel {
                buyer_id: Set(buyer.buyer_id),
                product_id: Set(payload.product_id),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    let cart = recompute_total(&txn, cart).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(buyer),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": quantity }),
    )
    .await;

    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn update_cart_item(
    state: &AppState,
    buyer: &AuthBuyer,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::bad_request("quantity must be greater than 0"));
    }

    let txn = state.orm.begin().await?;
    let cart = lock_cart(&txn, buyer.buyer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    let item = CartItems::find_by_id((buyer.buyer_id, payload.product_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product not in cart"))?;

    let mut active: cart_items::ActiveModel = item.into();
    active.quantity = Set(payload.quantity);
    active.update(&txn).await?;

    let cart = recompute_total(&txn, cart).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(buyer),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    state: &AppState,
    buyer: &AuthBuyer,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let txn = state.orm.begin().await?;
    let cart = lock_cart(&txn, buyer.buyer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    let result = CartItems::delete_by_id((buyer.buyer_id, product_id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product not in cart"));
    }

    let cart = recompute_total(&txn, cart).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(buyer),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success("Removed from cart", view, Some(Meta::empty())))
}

pub async fn clear_cart(state: &AppState, buyer: &AuthBuyer) -> AppResult<ApiResponse<CartView>> {
    let txn = state.orm.begin().await?;
    let cart = lock_cart(&txn, buyer.buyer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    let cart = empty_cart(&txn, cart).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(buyer),
        "cart_clear",
        "carts",
        serde_json::json!({}),
    )
    .await;

    let view = cart_view(&state.orm, cart).await?;
    Ok(ApiResponse::success(
        "Cart cleared successfully",
        view,
        Some(Meta::empty()),
    ))
}

/// Turn the cart into an order. Prices are read again here, so the order
/// total can differ from the cart's cached total.
pub async fn checkout_cart(
    state: &AppState,
    buyer: &AuthBuyer,
    payload: CheckoutCartRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    let shipping_address = order_service::require_shipping_address(payload.shipping_address)?;
    let payment_method = payload.payment_method.unwrap_or_default();

    let txn = state.orm.begin().await?;
    let cart = lock_cart(&txn, buyer.buyer_id)
        .await?
        .ok_or_else(|| AppError::bad_request("Cart is empty"))?;

    let lines = load_lines(&txn, buyer.buyer_id).await?;
    if lines.is_empty() {
        return Err(AppError::bad_request("Cart is empty"));
    }

    let requested: Vec<RequestedLine> = lines
        .iter()
        .map(|line| RequestedLine::new(line.product_id, Some(line.quantity)))
        .collect();

    let placed = order_service::create_order_in_txn(
        &txn,
        buyer.buyer_id,
        &requested,
        shipping_address,
        payment_method,
    )
    .await?;
    empty_cart(&txn, cart).await?;
    txn.commit().await?;

    order_service::log_placed(state, buyer, &placed).await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        placed,
        Some(Meta::empty()),
    ))
}

/// Fetch the buyer's cart, creating an empty one on first access.
async fn ensure_cart<C: ConnectionTrait>(conn: &C, buyer_id: Uuid) -> AppResult<carts::Model> {
    Carts::insert(carts::ActiveModel {
        buyer_id: Set(buyer_id),
        total_amount: Set(0),
        updated_at: NotSet,
    })
    .on_conflict(OnConflict::column(CartCol::BuyerId).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    Carts::find_by_id(buyer_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for {buyer_id} vanished")))
}

/// Row lock on the cart serializes every mutation for one buyer.
async fn lock_cart<C: ConnectionTrait>(conn: &C, buyer_id: Uuid) -> AppResult<Option<carts::Model>> {
    let cart = Carts::find_by_id(buyer_id)
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(cart)
}

async fn load_lines<C: ConnectionTrait>(conn: &C, buyer_id: Uuid) -> AppResult<Vec<CartLine>> {
    let lines = CartItems::find()
        .filter(CartItemCol::BuyerId.eq(buyer_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(|item| CartLine {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();
    Ok(lines)
}

async fn load_products<C: ConnectionTrait>(
    conn: &C,
    lines: &[CartLine],
) -> AppResult<HashMap<Uuid, ProductModel>> {
    if lines.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    Ok(products)
}

/// Re-read every line's current price and store the sum as the cart total.
async fn recompute_total<C: ConnectionTrait>(conn: &C, cart: carts::Model) -> AppResult<carts::Model> {
    let lines = load_lines(conn, cart.buyer_id).await?;
    let prices: HashMap<Uuid, i64> = load_products(conn, &lines)
        .await?
        .into_iter()
        .map(|(id, p)| (id, p.price))
        .collect();
    let total = cart_total(&lines, &prices)
        .ok_or_else(|| AppError::bad_request("Cart total is too large"))?;
    tracing::debug!(buyer_id = %cart.buyer_id, lines = lines.len(), total, "cart total recomputed");

    let mut active: carts::ActiveModel = cart.into();
    active.total_amount = Set(total);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

async fn empty_cart<C: ConnectionTrait>(conn: &C, cart: carts::Model) -> AppResult<carts::Model> {
    CartItems::delete_many()
        .filter(CartItemCol::BuyerId.eq(cart.buyer_id))
        .exec(conn)
        .await?;

    let mut active: carts::ActiveModel = cart.into();
    active.total_amount = Set(0);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

async fn cart_view<C: ConnectionTrait>(conn: &C, cart: carts::Model) -> AppResult<CartView> {
    let lines = load_lines(conn, cart.buyer_id).await?;
    let products = load_products(conn, &lines).await?;

    let items = lines
        .iter()
        .filter_map(|line| {
            products.get(&line.product_id).map(|p| CartLineView {
                product_id: p.id,
                title: p.title.clone(),
                price: p.price,
                is_active: p.is_active,
                quantity: line.quantity,
            })
        })
        .collect();

    Ok(CartView {
        buyer_id: cart.buyer_id,
        items,
        total_amount: cart.total_amount,
        updated_at: cart.updated_at.with_timezone(&Utc),
    })
}

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::checkout::{
        OrderPlan, OutOfStockItem, PlanError, PlannedLine, ProductSnapshot, RequestedLine,
        plan_order,
    },
    dto::orders::{
        OrderList, OrderSummary, OrderWithItems, PlaceOrderRequest, PlacedOrder,
        UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthBuyer, AuthSeller},
    models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn place_order(
    state: &AppState,
    buyer: &AuthBuyer,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    let shipping_address = require_shipping_address(payload.shipping_address)?;
    let payment_method = payload.payment_method.unwrap_or_default();
    let requested: Vec<RequestedLine> = payload
        .products
        .iter()
        .map(|line| RequestedLine::new(line.product_id, line.quantity))
        .collect();

    let txn = state.orm.begin().await?;
    let placed = create_order_in_txn(
        &txn,
        buyer.buyer_id,
        &requested,
        shipping_address,
        payment_method,
    )
    .await?;
    txn.commit().await?;

    log_placed(state, buyer, &placed).await;

    Ok(ApiResponse::success(
        "Order created successfully",
        placed,
        Some(Meta::empty()),
    ))
}

pub(crate) fn require_shipping_address(address: String) -> AppResult<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AppError::bad_request("Shipping address is required"));
    }
    Ok(address.to_string())
}

pub(crate) async fn log_placed(state: &AppState, buyer: &AuthBuyer, placed: &PlacedOrder) {
    tracing::info!(
        order_id = %placed.order.id,
        buyer_id = %buyer.buyer_id,
        items = placed.summary.total_items,
        total_amount = placed.summary.total_amount,
        "order placed"
    );
    audit::record(
        &state.pool,
        Some(buyer),
        "order_place",
        "orders",
        serde_json::json!({
            "order_id": placed.order.id,
            "total_amount": placed.summary.total_amount,
        }),
    )
    .await;
}

/// Validate, price and persist an order inside the caller's transaction.
///
/// Stock is taken with a conditional `UPDATE ... WHERE stock >= quantity`, so a
/// concurrent order that drained the product in the meantime turns into an
/// out-of-stock error and the caller's transaction is rolled back.
pub(crate) async fn create_order_in_txn(
    txn: &DatabaseTransaction,
    buyer_id: Uuid,
    requested: &[RequestedLine],
    shipping_address: String,
    payment_method: PaymentMethod,
) -> AppResult<PlacedOrder> {
    if requested.is_empty() {
        return Err(PlanError::NoValidProducts.into());
    }

    let ids: Vec<Uuid> = requested.iter().map(|line| line.product_id).collect();
    let catalog: HashMap<Uuid, ProductSnapshot> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(txn)
        .await?
        .into_iter()
        .map(|p| {
            (
                p.id,
                ProductSnapshot {
                    id: p.id,
                    title: p.title,
                    price: p.price,
                    stock: p.stock,
                    is_active: p.is_active,
                },
            )
        })
        .collect();

    let plan = plan_order(requested, &catalog)?;

    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        buyer_id: Set(buyer_id),
        total_amount: Set(plan.total_amount),
        shipping_address: Set(shipping_address),
        payment_method: Set(payment_method),
        // Payment starts pending for every method; only a seller status update moves it.
        payment_status: Set(PaymentStatus::Pending),
        order_status: Set(OrderStatus::Pending),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(txn)
    .await?;

    // Rows are locked in id order so orders over the same products in a
    // different request order cannot deadlock.
    let mut by_product: Vec<&PlannedLine> = plan.lines.iter().collect();
    by_product.sort_by_key(|line| line.product_id);
    for line in by_product {
        let taken = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::Stock.gte(line.quantity))
            .exec(txn)
            .await?;

        if taken.rows_affected == 0 {
            let available = Products::find_by_id(line.product_id)
                .one(txn)
                .await?
                .map(|p| p.stock)
                .unwrap_or(0);
            let title = catalog
                .get(&line.product_id)
                .map(|p| p.title.clone())
                .unwrap_or_default();
            tracing::warn!(
                product_id = %line.product_id,
                requested = line.quantity,
                available,
                "stock taken by a concurrent order"
            );
            return Err(AppError::OutOfStock(vec![OutOfStockItem {
                product_id: line.product_id,
                title,
                requested: line.quantity,
                available,
            }]));
        }
    }

    let mut items: Vec<OrderItem> = Vec::with_capacity(plan.lines.len());
    for line in &plan.lines {
        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    Ok(PlacedOrder {
        summary: summarize(&plan),
        order: Order::from(order),
        items,
    })
}

fn summarize(plan: &OrderPlan) -> OrderSummary {
    OrderSummary {
        total_items: plan.lines.len(),
        total_quantity: plan.total_quantity(),
        total_amount: plan.total_amount,
    }
}

pub async fn list_orders(
    state: &AppState,
    buyer: &AuthBuyer,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::BuyerId.eq(buyer.buyer_id));
    paginate_orders(state, condition, query).await
}

pub async fn list_all_orders(
    state: &AppState,
    _seller: &AuthSeller,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    paginate_orders(state, Condition::all(), query).await
}

async fn paginate_orders(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.order_status {
        condition = condition.add(OrderCol::OrderStatus.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder: Select<Orders> = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    buyer: &AuthBuyer,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_order(state, id).await?;
    if order.buyer_id != buyer.buyer_id {
        return Err(AppError::forbidden("Access denied"));
    }

    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Partial status update. Any status may follow any other.
pub async fn update_order_status(
    state: &AppState,
    seller: &AuthSeller,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let existing = find_order(state, id).await?;

    let mut active: orders::ActiveModel = existing.into();
    if let Some(order_status) = payload.order_status {
        active.order_status = Set(order_status);
    }
    if let Some(payment_status) = payload.payment_status {
        active.payment_status = Set(payment_status);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(seller),
        "order_status_update",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "order_status": order.order_status,
            "payment_status": order.payment_status,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated successfully",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    seller: &AuthSeller,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Order not found"));
    }

    audit::record(
        &state.pool,
        Some(seller),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::message_only("Order deleted successfully"))
}

async fn find_order(state: &AppState, id: Uuid) -> AppResult<orders::Model> {
    Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))
}

async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    Ok(items)
}

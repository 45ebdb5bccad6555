use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Quantity used when a requested line has none, or a non-positive one.
pub const DEFAULT_QUANTITY: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedLine {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
}

impl RequestedLine {
    pub fn new(product_id: Uuid, quantity: Option<i32>) -> Self {
        Self {
            product_id,
            quantity,
        }
    }

    pub fn effective_quantity(&self) -> i32 {
        match self.quantity {
            Some(quantity) if quantity > 0 => quantity,
            _ => DEFAULT_QUANTITY,
        }
    }
}

/// The catalog fields order planning looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub title: String,
    pub price: i64,
    pub stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

impl PlannedLine {
    /// `None` when price times quantity does not fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPlan {
    pub lines: Vec<PlannedLine>,
    pub total_amount: i64,
}

impl OrderPlan {
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutOfStockItem {
    pub product_id: Uuid,
    pub title: String,
    pub requested: i32,
    pub available: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Product {title} is not available")]
    Inactive { product_id: Uuid, title: String },

    #[error("Some products were not found")]
    NotFound(Vec<Uuid>),

    #[error("Some products are out of stock")]
    OutOfStock(Vec<OutOfStockItem>),

    #[error("No valid products in order")]
    NoValidProducts,

    #[error("Order total is too large")]
    AmountOverflow,
}

/// Validate requested lines against a catalog snapshot and price the order.
///
/// Lines are checked in request order. An inactive product aborts at once.
/// Missing and short-stocked products are collected, and the missing ones are
/// reported first. Prices come from the snapshot, so the plan records what
/// each product cost at the moment of the call.
pub fn plan_order(
    requested: &[RequestedLine],
    catalog: &HashMap<Uuid, ProductSnapshot>,
) -> Result<OrderPlan, PlanError> {
    let mut plan = OrderPlan::default();
    let mut not_found = Vec::new();
    let mut out_of_stock = Vec::new();

    for line in requested {
        let quantity = line.effective_quantity();

        let Some(product) = catalog.get(&line.product_id) else {
            not_found.push(line.product_id);
            continue;
        };

        if !product.is_active {
            return Err(PlanError::Inactive {
                product_id: product.id,
                title: product.title.clone(),
            });
        }

        if product.stock < quantity {
            out_of_stock.push(OutOfStockItem {
                product_id: product.id,
                title: product.title.clone(),
                requested: quantity,
                available: product.stock,
            });
            continue;
        }

        let planned = PlannedLine {
            product_id: product.id,
            quantity,
            unit_price: product.price,
        };
        plan.total_amount = planned
            .line_total()
            .and_then(|line_total| plan.total_amount.checked_add(line_total))
            .ok_or(PlanError::AmountOverflow)?;
        plan.lines.push(planned);
    }

    if !not_found.is_empty() {
        return Err(PlanError::NotFound(not_found));
    }
    if !out_of_stock.is_empty() {
        return Err(PlanError::OutOfStock(out_of_stock));
    }
    if plan.lines.is_empty() {
        return Err(PlanError::NoValidProducts);
    }

    Ok(plan)
}

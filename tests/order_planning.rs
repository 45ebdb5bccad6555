use std::collections::HashMap;

use artisan_market_api::domain::checkout::{
    DEFAULT_QUANTITY, PlanError, ProductSnapshot, RequestedLine, plan_order,
};
use uuid::Uuid;

fn product(title: &str, price: i64, stock: i32, is_active: bool) -> ProductSnapshot {
    ProductSnapshot {
        id: Uuid::new_v4(),
        title: title.to_string(),
        price,
        stock,
        is_active,
    }
}

fn catalog(products: &[ProductSnapshot]) -> HashMap<Uuid, ProductSnapshot> {
    products.iter().map(|p| (p.id, p.clone())).collect()
}

#[test]
fn prices_every_line_from_the_snapshot() {
    let mug = product("Mug", 2800, 10, true);
    let bowl = product("Bowl", 6400, 3, true);
    let requested = [
        RequestedLine::new(mug.id, Some(2)),
        RequestedLine::new(bowl.id, Some(3)),
    ];

    let plan = plan_order(&requested, &catalog(&[mug.clone(), bowl.clone()])).unwrap();

    assert_eq!(plan.lines.len(), 2);
    assert_eq!(plan.total_amount, 2 * 2800 + 3 * 6400);
    assert_eq!(plan.total_quantity(), 5);
    assert_eq!(plan.lines[0].unit_price, 2800);
    assert_eq!(plan.lines[1].line_total(), Some(3 * 6400));
}

#[test]
fn missing_or_non_positive_quantity_defaults_to_one() {
    let spoon = product("Spoon", 2200, 5, true);
    let towel = product("Towel", 1500, 5, true);
    let knife = product("Knife", 4000, 5, true);
    let requested = [
        RequestedLine::new(spoon.id, None),
        RequestedLine::new(towel.id, Some(0)),
        RequestedLine::new(knife.id, Some(-4)),
    ];

    let plan = plan_order(&requested, &catalog(&[spoon, towel, knife])).unwrap();

    assert!(plan.lines.iter().all(|l| l.quantity == DEFAULT_QUANTITY));
    assert_eq!(plan.total_amount, 2200 + 1500 + 4000);
}

#[test]
fn stock_exactly_equal_to_quantity_is_accepted() {
    let vase = product("Vase", 9000, 2, true);
    let plan = plan_order(&[RequestedLine::new(vase.id, Some(2))], &catalog(&[vase])).unwrap();
    assert_eq!(plan.total_amount, 18000);
}

#[test]
fn not_found_is_reported_before_out_of_stock() {
    let scarce = product("Scarce", 100, 1, true);
    let ghost = Uuid::new_v4();
    let requested = [
        RequestedLine::new(scarce.id, Some(5)),
        RequestedLine::new(ghost, Some(1)),
    ];

    let err = plan_order(&requested, &catalog(&[scarce])).unwrap_err();

    assert_eq!(err, PlanError::NotFound(vec![ghost]));
}

#[test]
fn every_short_product_is_listed() {
    let a = product("A", 100, 1, true);
    let b = product("B", 200, 0, true);
    let c = product("C", 300, 10, true);
    let requested = [
        RequestedLine::new(a.id, Some(2)),
        RequestedLine::new(b.id, Some(1)),
        RequestedLine::new(c.id, Some(1)),
    ];

    let err = plan_order(&requested, &catalog(&[a.clone(), b.clone(), c])).unwrap_err();

    let PlanError::OutOfStock(items) = err else {
        panic!("expected out of stock, got {err:?}");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product_id, a.id);
    assert_eq!((items[0].requested, items[0].available), (2, 1));
    assert_eq!(items[1].product_id, b.id);
    assert_eq!((items[1].requested, items[1].available), (1, 0));
}

#[test]
fn inactive_product_fails_fast() {
    let ghost = Uuid::new_v4();
    let retired = product("Retired", 100, 10, false);
    let requested = [
        RequestedLine::new(ghost, Some(1)),
        RequestedLine::new(retired.id, Some(1)),
    ];

    let err = plan_order(&requested, &catalog(&[retired.clone()])).unwrap_err();

    assert_eq!(
        err,
        PlanError::Inactive {
            product_id: retired.id,
            title: "Retired".into(),
        }
    );
}

#[test]
fn empty_request_has_no_valid_products() {
    let err = plan_order(&[], &HashMap::new()).unwrap_err();
    assert_eq!(err, PlanError::NoValidProducts);
}

#[test]
fn line_total_overflow_is_rejected() {
    let gilded = product("Gilded Urn", i64::MAX / 2 + 1, 5, true);

    let err = plan_order(&[RequestedLine::new(gilded.id, Some(2))], &catalog(&[gilded])).unwrap_err();

    assert_eq!(err, PlanError::AmountOverflow);
}

#[test]
fn running_total_overflow_is_rejected() {
    let a = product("Heirloom Chest", i64::MAX - 10, 1, true);
    let b = product("Brass Key", 11, 1, true);
    let requested = [
        RequestedLine::new(a.id, Some(1)),
        RequestedLine::new(b.id, Some(1)),
    ];

    let err = plan_order(&requested, &catalog(&[a, b])).unwrap_err();

    assert_eq!(err, PlanError::AmountOverflow);
}

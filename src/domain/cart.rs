use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Sum of current price times quantity over every line. Lines whose product is
/// no longer in `prices` contribute nothing. `None` if the sum overflows `i64`.
pub fn cart_total(lines: &[CartLine], prices: &HashMap<Uuid, i64>) -> Option<i64> {
    lines.iter().try_fold(0_i64, |total, line| {
        match prices.get(&line.product_id) {
            Some(price) => price
                .checked_mul(i64::from(line.quantity))
                .and_then(|line_total| total.checked_add(line_total)),
            None => Some(total),
        }
    })
}

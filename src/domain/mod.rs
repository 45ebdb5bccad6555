//! Storage-free business rules: order planning, rating aggregation, cart totals
//! and seller verification tokens.
//! Services load rows, hand plain values to these functions and persist the outcome.

pub mod cart;
pub mod checkout;
pub mod rating;
pub mod verification;

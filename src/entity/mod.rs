pub mod audit_logs;
pub mod buyers;
pub mod cart_items;
pub mod carts;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod seller_follows;
pub mod sellers;

pub use audit_logs::Entity as AuditLogs;
pub use buyers::Entity as Buyers;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use seller_follows::Entity as SellerFollows;
pub use sellers::Entity as Sellers;

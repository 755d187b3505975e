pub mod category_entity;
pub mod order;
pub mod order_aggregate;
pub mod order_entity;
pub mod order_item_entity;
pub mod pricing;
pub mod product_entity;

pub use order::{OrderOperation, OrderStatus};
pub use order_aggregate::{OrderAggregate, ProductSnapshot};
pub use pricing::{DiscountRule, OrderTotals};

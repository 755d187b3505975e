pub mod categories;
pub mod orders;
pub mod products;

pub use categories::CategoryService;
pub use orders::OrderService;
pub use products::{ProductLookup, ProductService};

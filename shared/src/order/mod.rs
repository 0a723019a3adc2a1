//! Order aggregate types
//!
//! The order is the mutable aggregate edited by the revision engine:
//! - **line**: one priced item entry with its own kitchen lifecycle
//! - **totals**: order-level monetary totals, always derived from the lines
//! - **order**: the aggregate root carrying the optimistic-lock version

pub mod line;
pub mod order;
pub mod totals;

// Re-exports
pub use line::{KitchenStatus, OrderLine, PricedModifier, UnitComponents};
pub use order::Order;
pub use totals::{DiscountConfig, OrderTotals};

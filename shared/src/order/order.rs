//! Order aggregate root

use super::line::OrderLine;
use super::totals::{DiscountConfig, OrderTotals};
use serde::{Deserialize, Serialize};

/// The mutable order aggregate
///
/// All item mutation goes through the revision engine's operation handlers;
/// nothing else assigns to `items` or `totals` directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order id (assigned by the server)
    pub id: String,
    /// Optimistic-lock version, incremented on every accepted revision
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub guest_count: i32,
    /// Ordered item list; sequence is insertion order, display-only
    pub items: Vec<OrderLine>,
    pub totals: OrderTotals,
    pub discount: DiscountConfig,
    /// Batch tag grouping items added together (kitchen ticket batching)
    pub current_batch: u32,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Order {
    /// Create a new empty order at version 1
    pub fn new(id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id,
            version: 1,
            table_name: None,
            guest_count: 1,
            items: Vec::new(),
            totals: OrderTotals::default(),
            discount: DiscountConfig::default(),
            current_batch: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Find a line by its id
    pub fn line(&self, line_id: &str) -> Option<&OrderLine> {
        self.items.iter().find(|l| l.id == line_id)
    }
}

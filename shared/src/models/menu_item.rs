//! Menu item model

use serde::{Deserialize, Serialize};

/// Menu item entity (read-mostly; the engine only decrements `stock`
/// inside a checkout transaction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price, non-negative
    pub price: f64,
    /// Available stock; never goes negative — a decrement that would
    /// underflow aborts the whole checkout transaction
    pub stock: u32,
}

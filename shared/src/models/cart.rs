//! Cart line model

use serde::{Deserialize, Serialize};

/// A single pending selection in the client's cart
///
/// At most one line exists per menu item; adding the same item again
/// merges into the existing line by increasing its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Menu item reference (store document key)
    pub item_id: String,
    /// Always >= 1 (enforced by the cart store)
    pub quantity: u32,
}

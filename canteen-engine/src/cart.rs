//! Cart store
//!
//! Holds the client's pending selections and survives process
//! restarts: lines are loaded from the document store once at
//! construction and written back after every mutation. Owned by a
//! single client session; the cross-client hazards live in checkout,
//! not here.

use crate::store::{DocumentStore, StoreError};
use parking_lot::RwLock;
use shared::models::CartLine;
use thiserror::Error;

/// Cart mutation errors
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity floor is enforced here, in the store, not in callers
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    #[error("No cart line for item: {0}")]
    UnknownItem(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// The client's cart, persisted through the document store
pub struct CartStore {
    store: DocumentStore,
    lines: RwLock<Vec<CartLine>>,
}

impl CartStore {
    /// Load the persisted cart (empty on first run)
    pub fn load(store: DocumentStore) -> Result<Self, CartError> {
        let lines = store.load_cart()?;
        if !lines.is_empty() {
            tracing::debug!(lines = lines.len(), "Restored persisted cart");
        }
        Ok(Self {
            store,
            lines: RwLock::new(lines),
        })
    }

    /// Add `quantity` of an item, merging into an existing line
    ///
    /// Calling `add("a", 1)` twice yields one line with quantity 2.
    pub fn add(&self, item_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut lines = self.lines.write();
        match lines.iter_mut().find(|l| l.item_id == item_id) {
            Some(line) => line.quantity += quantity,
            None => lines.push(CartLine {
                item_id: item_id.to_string(),
                quantity,
            }),
        }
        self.persist(&lines)
    }

    /// Set the quantity of an existing line
    ///
    /// Rejects quantities below 1; removing a line is an explicit
    /// `remove`, never a zero quantity.
    pub fn set_quantity(&self, item_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut lines = self.lines.write();
        let line = lines
            .iter_mut()
            .find(|l| l.item_id == item_id)
            .ok_or_else(|| CartError::UnknownItem(item_id.to_string()))?;
        line.quantity = quantity;
        self.persist(&lines)
    }

    /// Remove a line entirely
    pub fn remove(&self, item_id: &str) -> Result<(), CartError> {
        let mut lines = self.lines.write();
        let before = lines.len();
        lines.retain(|l| l.item_id != item_id);
        if lines.len() == before {
            return Err(CartError::UnknownItem(item_id.to_string()));
        }
        self.persist(&lines)
    }

    /// Drop every line (explicit clear or successful checkout)
    pub fn clear(&self) -> Result<(), CartError> {
        let mut lines = self.lines.write();
        lines.clear();
        self.persist(&lines)
    }

    /// Current lines by value
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.read().clone()
    }

    /// Sum of quantities across all lines
    pub fn total_quantity(&self) -> u32 {
        self.lines.read().iter().map(|l| l.quantity).sum()
    }

    fn persist(&self, lines: &[CartLine]) -> Result<(), CartError> {
        self.store.save_cart(lines)?;
        Ok(())
    }
}

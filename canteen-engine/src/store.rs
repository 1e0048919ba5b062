//! redb-based document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `menu_items` | item id | `MenuItem` | Catalog (stock lives here) |
//! | `orders` | order id | `Order` | Durable orders |
//! | `notifications` | notification id | `Notification` | Post-checkout notices |
//! | `cart` | `"cart"` | `Vec<CartLine>` | Persisted cart state |
//!
//! All values are JSON-serialized. Stock decrement and order creation
//! for a checkout are composed into one write transaction; redb's
//! commit semantics make the pair all-or-nothing. Transient failures
//! are retried by [`DocumentStore::run_transaction`] with bounded
//! exponential backoff.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::{CartLine, InvalidTransition, MenuItem, Notification, Order, OrderStatus};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const MENU_ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menu_items");
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
const NOTIFICATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("notifications");
const CART_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");

/// Single key under which the whole cart line list is stored
const CART_KEY: &str = "cart";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether retrying the whole transaction may succeed
    ///
    /// Serialization failures and missing tables are permanent;
    /// transaction, storage, and commit errors cover the contention
    /// and I/O cases the optimistic retry policy exists for.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Transaction(_) | StoreError::Storage(_) | StoreError::Commit(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from order lifecycle updates
#[derive(Debug, Error)]
pub enum OrderUpdateError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Retry budget for optimistic transactions
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(20),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before the next attempt
    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Document store backed by redb
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Database>,
}

impl DocumentStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate`, so a committed
    /// checkout survives power loss and the file is always in a
    /// consistent state.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = txn.open_table(ORDERS_TABLE)?;
            let _ = txn.open_table(NOTIFICATIONS_TABLE)?;
            let _ = txn.open_table(CART_TABLE)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Run `body` inside a single write transaction with bounded retry
    ///
    /// Transient failures starting or committing the transaction are
    /// retried with exponential backoff up to `policy.max_attempts`.
    /// An `Err` from `body` is a business abort: the transaction is
    /// rolled back, nothing is retried, and the error is returned
    /// unchanged.
    pub fn run_transaction<T, E, F>(&self, policy: RetryPolicy, mut body: F) -> Result<T, E>
    where
        F: FnMut(&WriteTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let txn = match self.db.begin_write() {
                Ok(txn) => txn,
                Err(e) => {
                    let err = StoreError::from(e);
                    if err.is_transient() && attempt < policy.max_attempts {
                        tracing::warn!(attempt, error = %err, "Transaction begin failed, retrying");
                        std::thread::sleep(policy.backoff(attempt));
                        continue;
                    }
                    return Err(err.into());
                }
            };
            match body(&txn) {
                Ok(value) => match txn.commit() {
                    Ok(()) => return Ok(value),
                    Err(e) => {
                        let err = StoreError::from(e);
                        if err.is_transient() && attempt < policy.max_attempts {
                            tracing::warn!(attempt, error = %err, "Commit failed, retrying");
                            std::thread::sleep(policy.backoff(attempt));
                            continue;
                        }
                        return Err(err.into());
                    }
                },
                Err(e) => {
                    // Business abort: discard every write from this attempt
                    let _ = txn.abort();
                    return Err(e);
                }
            }
        }
    }

    // ========== Menu Items ==========

    /// Insert or replace a menu item (catalog seeding / sync)
    pub fn insert_menu_item(&self, item: &MenuItem) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
            let value = serde_json::to_vec(item)?;
            table.insert(item.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Get a menu item (read-only, outside any transaction)
    pub fn get_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(MENU_ITEMS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Full catalog, sorted by item id
    pub fn list_menu_items(&self) -> StoreResult<Vec<MenuItem>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(MENU_ITEMS_TABLE)?;

        let mut items = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    /// Get a menu item within a write transaction (read-your-writes)
    pub fn get_menu_item_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StoreResult<Option<MenuItem>> {
        let table = txn.open_table(MENU_ITEMS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Write back a menu item within a write transaction
    pub fn put_menu_item_txn(&self, txn: &WriteTransaction, item: &MenuItem) -> StoreResult<()> {
        let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
        let value = serde_json::to_vec(item)?;
        table.insert(item.id.as_str(), value.as_slice())?;
        Ok(())
    }

    // ========== Orders ==========

    /// Insert an order within a write transaction
    pub fn insert_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StoreResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by id
    pub fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Move an order through its lifecycle (pending → prepared →
    /// completed/cancelled), rejecting illegal transitions
    pub fn update_order_status(
        &self,
        id: &str,
        next: OrderStatus,
    ) -> Result<Order, OrderUpdateError> {
        let txn = self.db.begin_write().map_err(StoreError::from)?;
        let order = {
            let mut table = txn.open_table(ORDERS_TABLE).map_err(StoreError::from)?;
            let mut order: Order = match table.get(id).map_err(StoreError::from)? {
                Some(value) => {
                    serde_json::from_slice(value.value()).map_err(StoreError::from)?
                }
                None => return Err(OrderUpdateError::NotFound(id.to_string())),
            };
            order.transition(next)?;
            let value = serde_json::to_vec(&order).map_err(StoreError::from)?;
            table.insert(id, value.as_slice()).map_err(StoreError::from)?;
            order
        };
        txn.commit().map_err(StoreError::from)?;
        Ok(order)
    }

    /// Orders with `created_at` in `[start, end)`, ordered by creation
    pub fn orders_created_between(&self, start: i64, end: i64) -> StoreResult<Vec<Order>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.created_at >= start && order.created_at < end {
                orders.push(order);
            }
        }

        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// The user's currently active order (pending or prepared), if any
    pub fn active_order_for_user(&self, user_id: &str) -> StoreResult<Option<Order>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ORDERS_TABLE)?;

        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.user_id == user_id && order.status.is_active() {
                return Ok(Some(order));
            }
        }

        Ok(None)
    }

    // ========== Notifications ==========

    /// Insert a notification (own transaction; best-effort callers
    /// swallow the error)
    pub fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(NOTIFICATIONS_TABLE)?;
            let value = serde_json::to_vec(notification)?;
            table.insert(notification.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Notifications for a user, newest first
    pub fn notifications_for_user(&self, user_id: &str) -> StoreResult<Vec<Notification>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(NOTIFICATIONS_TABLE)?;

        let mut notifications = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let notification: Notification = serde_json::from_slice(value.value())?;
            if notification.user_id == user_id {
                notifications.push(notification);
            }
        }

        notifications.sort_by_key(|n| std::cmp::Reverse(n.timestamp));
        Ok(notifications)
    }

    // ========== Cart Persistence ==========

    /// Load the persisted cart lines (empty if none were saved)
    pub fn load_cart(&self) -> StoreResult<Vec<CartLine>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CART_TABLE)?;
        match table.get(CART_KEY)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist the full cart line list, replacing the previous state
    pub fn save_cart(&self, lines: &[CartLine]) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CART_TABLE)?;
            let value = serde_json::to_vec(lines)?;
            table.insert(CART_KEY, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

//! Checkout transaction coordinator
//!
//! The authoritative atomic step: validates business constraints,
//! executes the stock-reservation + order-creation transaction, and
//! triggers post-commit side effects.
//!
//! # Ordering inside the transaction
//!
//! Every cart line is read and validated before any stock is written
//! (read-all, validate-all, then write-all). A line that fails
//! validation aborts the transaction with zero writes; there is never
//! a partial decrement to revert.
//!
//! # What this does NOT do
//!
//! Double-submissions are not deduplicated: each invocation attempts a
//! new order. A checkout is also not cancellable once its transaction
//! begins; the caller may stop waiting, but the transaction runs to
//! completion or exhausts its retry budget.

use crate::admission::{AdmissionSchedule, TimeSource};
use crate::allocator;
use crate::cart::CartStore;
use crate::error::{CheckoutError, CheckoutResult};
use crate::money;
use crate::notify::NotificationEmitter;
use crate::store::{DocumentStore, RetryPolicy};
use redb::WriteTransaction;
use shared::models::{timeslot, CartLine, MenuItem, Order, OrderLine, OrderStatus};
use std::sync::Arc;
use uuid::Uuid;

/// Hard business cap on total items per order
pub const MAX_ORDER_QUANTITY: u32 = 3;

/// Enforce the cart line invariants on a caller-supplied slice
///
/// The cart store guarantees one line per item with quantity >= 1, but
/// `checkout` also accepts raw slices. Duplicate lines for the same
/// item are merged by summing quantities; without the merge each
/// duplicate would read the original stock and the last staged
/// decrement would win, under-reserving inventory. Zero-quantity
/// lines are rejected.
fn normalize_cart(cart: &[CartLine]) -> CheckoutResult<Vec<CartLine>> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(cart.len());
    for line in cart {
        if line.quantity < 1 {
            return Err(CheckoutError::InvalidCartLine {
                item_id: line.item_id.clone(),
            });
        }
        match merged.iter_mut().find(|l| l.item_id == line.item_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line.clone()),
        }
    }
    Ok(merged)
}

/// Coordinates cart → durable order conversion with stock reservation
pub struct CheckoutCoordinator {
    store: DocumentStore,
    cart: Arc<CartStore>,
    schedule: AdmissionSchedule,
    time: TimeSource,
    emitter: NotificationEmitter,
    retry: RetryPolicy,
}

impl CheckoutCoordinator {
    pub fn new(
        store: DocumentStore,
        cart: Arc<CartStore>,
        schedule: AdmissionSchedule,
        time: TimeSource,
        retry: RetryPolicy,
    ) -> Self {
        let emitter = NotificationEmitter::new(store.clone());
        Self {
            store,
            cart,
            schedule,
            time,
            emitter,
            retry,
        }
    }

    /// Check out the session cart, clearing it on success
    pub async fn checkout_session(
        &self,
        slot: Option<&str>,
        user_id: Option<&str>,
    ) -> CheckoutResult<Order> {
        let lines = self.cart.snapshot();
        let order = self.checkout(&lines, slot, user_id).await?;
        // Best-effort: a failed clear leaves stale lines behind but the
        // order is already durable
        if let Err(e) = self.cart.clear() {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to clear cart after checkout");
        }
        Ok(order)
    }

    /// Convert a cart snapshot into a durable order
    ///
    /// Preconditions fail fast without store access; business aborts
    /// (`ItemNotFound`, `InsufficientStock`) leave stock and cart
    /// untouched; transient store contention that exhausts the retry
    /// budget surfaces as `TransactionConflict`.
    pub async fn checkout(
        &self,
        cart: &[CartLine],
        slot: Option<&str>,
        user_id: Option<&str>,
    ) -> CheckoutResult<Order> {
        // ========== Preconditions (no store access) ==========
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let user_id = user_id
            .filter(|u| !u.is_empty())
            .ok_or(CheckoutError::NotAuthenticated)?;
        let cart = normalize_cart(cart)?;
        let total_quantity: u32 = cart.iter().map(|l| l.quantity).sum();
        if total_quantity > MAX_ORDER_QUANTITY {
            return Err(CheckoutError::QuantityLimitExceeded {
                total: total_quantity,
                limit: MAX_ORDER_QUANTITY,
            });
        }
        // Evaluated fresh on every attempt; windows move with the clock
        let now = self.time.now().await;
        if !self.schedule.is_ordering_allowed(now) {
            tracing::info!(user_id, "Checkout rejected: inside a disabled admission window");
            return Err(CheckoutError::OrderingUnavailable);
        }
        let slot = slot
            .filter(|s| timeslot::is_valid(s))
            .ok_or(CheckoutError::TimeslotRequired)?;

        // Pre-transaction hint; collisions are possible under
        // concurrency (see allocator docs)
        let order_number = allocator::next_order_number(&self.store, shared::util::now_millis())?;

        // ========== Atomic step ==========
        let order = self
            .store
            .run_transaction(self.retry, |txn| {
                self.reserve_and_create(txn, &cart, order_number, slot, user_id)
            })
            .map_err(|e| match e {
                CheckoutError::Store(se) if se.is_transient() => {
                    tracing::warn!(user_id, error = %se, "Checkout retries exhausted");
                    CheckoutError::TransactionConflict
                }
                other => other,
            })?;

        // ========== Post-commit (best-effort) ==========
        self.emitter.emit(&order);
        tracing::info!(
            order_id = %order.id,
            order_number = order.order_number,
            total_quantity = order.total_quantity,
            total_cost = order.total_cost,
            "Checkout committed"
        );
        Ok(order)
    }

    /// Transaction body: validate every line, then apply every write
    fn reserve_and_create(
        &self,
        txn: &WriteTransaction,
        cart: &[CartLine],
        order_number: u32,
        slot: &str,
        user_id: &str,
    ) -> CheckoutResult<Order> {
        let mut resolved: Vec<OrderLine> = Vec::with_capacity(cart.len());
        let mut reserved: Vec<MenuItem> = Vec::with_capacity(cart.len());

        for line in cart {
            let item = self
                .store
                .get_menu_item_txn(txn, &line.item_id)?
                .ok_or_else(|| CheckoutError::ItemNotFound(line.item_id.clone()))?;
            money::validate_menu_item(&item)?;
            if item.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    item_id: item.id,
                    name: item.name,
                    requested: line.quantity,
                    available: item.stock,
                });
            }
            resolved.push(OrderLine {
                item_id: item.id.clone(),
                name: item.name.clone(),
                unit_price: item.price,
                quantity: line.quantity,
            });
            let mut item = item;
            item.stock -= line.quantity;
            reserved.push(item);
        }

        // All lines validated; apply the decrements
        for item in &reserved {
            self.store.put_menu_item_txn(txn, item)?;
        }

        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number,
            total_quantity: resolved.iter().map(|l| l.quantity).sum(),
            total_cost: money::order_total(&resolved)?,
            items: resolved,
            status: OrderStatus::Pending,
            user_id: user_id.to_string(),
            created_at: shared::util::now_millis(),
            timeslot: slot.to_string(),
        };
        self.store.insert_order_txn(txn, &order)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SLOT: Option<&str> = Some("10:00-10:30 AM");
    const USER: Option<&str> = Some("user-1");

    fn time_source() -> TimeSource {
        // Unroutable endpoint: every test evaluates on the local clock
        TimeSource::new("http://127.0.0.1:1/time", Duration::from_millis(200))
    }

    fn coordinator(store: &DocumentStore, schedule: AdmissionSchedule) -> CheckoutCoordinator {
        let cart = Arc::new(CartStore::load(store.clone()).unwrap());
        CheckoutCoordinator::new(
            store.clone(),
            cart,
            schedule,
            time_source(),
            RetryPolicy::default(),
        )
    }

    fn open_coordinator(store: &DocumentStore) -> CheckoutCoordinator {
        coordinator(store, AdmissionSchedule::new(Vec::new()))
    }

    fn seed(store: &DocumentStore, id: &str, name: &str, price: f64, stock: u32) {
        store
            .insert_menu_item(&MenuItem {
                id: id.into(),
                name: name.into(),
                description: None,
                price,
                stock,
            })
            .unwrap();
    }

    fn lines(entries: &[(&str, u32)]) -> Vec<CartLine> {
        entries
            .iter()
            .map(|(id, quantity)| CartLine {
                item_id: id.to_string(),
                quantity: *quantity,
            })
            .collect()
    }

    #[tokio::test]
    async fn successful_checkout_reserves_stock_and_notifies() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 2);
        let coordinator = open_coordinator(&store);

        let order = coordinator
            .checkout(&lines(&[("a", 2)]), SLOT, USER)
            .await
            .unwrap();

        assert_eq!(order.order_number, 1000);
        assert_eq!(order.total_quantity, 2);
        assert_eq!(order.total_cost, 90.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.timeslot, "10:00-10:30 AM");

        // Stock reserved, order durable, notification delivered
        assert_eq!(store.get_menu_item("a").unwrap().unwrap().stock, 0);
        assert_eq!(store.get_order(&order.id).unwrap().unwrap(), order);
        let notifications = store.notifications_for_user("user-1").unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("A x2"));
    }

    #[tokio::test]
    async fn duplicate_cart_lines_merge_before_reservation() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 2);
        let coordinator = open_coordinator(&store);

        // Two lines for the same item must decrement as one combined
        // line, not stage independent single-quantity decrements
        let order = coordinator
            .checkout(&lines(&[("a", 1), ("a", 1)]), SLOT, USER)
            .await
            .unwrap();

        assert_eq!(order.total_quantity, 2);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(store.get_menu_item("a").unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn duplicate_lines_exceeding_stock_are_rejected() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 2.0, 1);
        let coordinator = open_coordinator(&store);

        let err = coordinator
            .checkout(&lines(&[("a", 1), ("a", 1)]), SLOT, USER)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }
        ));
        assert_eq!(store.get_menu_item("a").unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn zero_quantity_line_is_rejected() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 5);
        let coordinator = open_coordinator(&store);

        let err = coordinator
            .checkout(&lines(&[("a", 2), ("b", 0)]), SLOT, USER)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidCartLine { item_id } if item_id == "b"));
        assert_eq!(store.get_menu_item("a").unwrap().unwrap().stock, 5);
        assert!(store
            .orders_created_between(0, i64::MAX)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn insufficient_stock_names_item_and_preserves_state() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "b", "B", 30.0, 1);
        let coordinator = open_coordinator(&store);

        let err = coordinator
            .checkout(&lines(&[("b", 2)]), SLOT, USER)
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientStock {
                name, available, requested, ..
            } => {
                assert_eq!(name, "B");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(store.get_menu_item("b").unwrap().unwrap().stock, 1);
        assert!(store
            .orders_created_between(0, i64::MAX)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn failed_line_aborts_whole_transaction() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 5);
        let coordinator = open_coordinator(&store);

        let err = coordinator
            .checkout(&lines(&[("a", 1), ("ghost", 1)]), SLOT, USER)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ItemNotFound(id) if id == "ghost"));
        // The valid line's stock must be untouched and no order created
        assert_eq!(store.get_menu_item("a").unwrap().unwrap().stock, 5);
        assert!(store
            .orders_created_between(0, i64::MAX)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn quantity_cap_applies_regardless_of_stock() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 100);
        let coordinator = open_coordinator(&store);

        let err = coordinator
            .checkout(&lines(&[("a", 4)]), SLOT, USER)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::QuantityLimitExceeded { total: 4, limit: 3 }
        ));

        // Cap also applies across lines
        seed(&store, "b", "B", 30.0, 100);
        let err = coordinator
            .checkout(&lines(&[("a", 2), ("b", 2)]), SLOT, USER)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::QuantityLimitExceeded { total: 4, limit: 3 }
        ));

        // Exactly at the cap is allowed
        coordinator
            .checkout(&lines(&[("a", 2), ("b", 1)]), SLOT, USER)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn precondition_failures_fail_fast() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 5);
        let coordinator = open_coordinator(&store);

        let err = coordinator.checkout(&[], SLOT, USER).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));

        let err = coordinator
            .checkout(&lines(&[("a", 1)]), SLOT, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotAuthenticated));

        let err = coordinator
            .checkout(&lines(&[("a", 1)]), SLOT, Some(""))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotAuthenticated));

        let err = coordinator
            .checkout(&lines(&[("a", 1)]), None, USER)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::TimeslotRequired));

        let err = coordinator
            .checkout(&lines(&[("a", 1)]), Some("13:37"), USER)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::TimeslotRequired));
    }

    #[tokio::test]
    async fn disabled_window_blocks_checkout() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 5);
        // Whole day disabled: the local-clock evaluation always rejects
        let coordinator = coordinator(
            &store,
            AdmissionSchedule::new(vec![crate::admission::DisabledWindow {
                start_min: 0,
                end_min: 1440,
            }]),
        );

        let err = coordinator
            .checkout(&lines(&[("a", 1)]), SLOT, USER)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::OrderingUnavailable));
        assert_eq!(store.get_menu_item("a").unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn order_numbers_increase_within_a_day() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 10);
        let coordinator = open_coordinator(&store);

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let order = coordinator
                .checkout(&lines(&[("a", 1)]), SLOT, USER)
                .await
                .unwrap();
            numbers.push(order.order_number);
        }
        assert_eq!(numbers, vec![1000, 1001, 1002]);
    }

    #[tokio::test]
    async fn session_checkout_clears_cart() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 5);
        let coordinator = open_coordinator(&store);
        coordinator.cart.add("a", 2).unwrap();

        let order = coordinator.checkout_session(SLOT, USER).await.unwrap();
        assert_eq!(order.total_quantity, 2);
        assert!(coordinator.cart.snapshot().is_empty());
        // The persisted cart is cleared too
        assert!(store.load_cart().unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_checkout_preserves_cart_on_failure() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "b", "B", 30.0, 1);
        let coordinator = open_coordinator(&store);
        coordinator.cart.add("b", 2).unwrap();

        let err = coordinator.checkout_session(SLOT, USER).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

        // User can adjust and retry: the cart still holds the line
        let cart = coordinator.cart.snapshot();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checkouts_never_oversell() {
        let store = DocumentStore::open_in_memory().unwrap();
        seed(&store, "a", "A", 45.0, 5);
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let coordinator = open_coordinator(&store);
                let user = format!("user-{i}");
                coordinator
                    .checkout(&lines(&[("a", 1)]), SLOT, Some(&user))
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(order) => {
                    assert!(order.order_number >= 1000);
                    successes += 1;
                }
                Err(CheckoutError::InsufficientStock { available, .. }) => {
                    assert!(available < 1_000); // sanity: a real count, not underflow
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // Exactly the available stock was sold, never more
        assert_eq!(successes, 5);
        assert_eq!(store.get_menu_item("a").unwrap().unwrap().stock, 0);
        assert_eq!(store.orders_created_between(0, i64::MAX).unwrap().len(), 5);
    }
}

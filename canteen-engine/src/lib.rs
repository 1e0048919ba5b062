//! Canteen Checkout & Inventory Reservation Engine
//!
//! Turns an in-memory cart into a durable, uniquely numbered order
//! while atomically reserving stock against the shared catalog, under
//! concurrent access from many clients, and while enforcing
//! time-of-day admission windows.
//!
//! # Checkout Flow
//!
//! ```text
//! checkout(cart, timeslot, user_id)
//!     ├─ 1. Preconditions (cart, user, quantity cap, admission, slot)
//!     ├─ 2. Order number hint (query outside the transaction)
//!     ├─ 3. Write transaction
//!     │      ├─ read every referenced menu item
//!     │      ├─ validate all lines (item exists, stock suffices)
//!     │      ├─ decrement all stocks
//!     │      └─ insert the Order document
//!     ├─ 4. Commit (transient failures retried with backoff)
//!     └─ 5. Post-commit: clear cart, emit notification, return Order
//! ```
//!
//! Surrounding screens (login, menu browsing, notification list) are
//! thin CRUD views owned by the UI layer and are out of scope here.

pub mod admission;
pub mod allocator;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod logger;
pub mod money;
pub mod notify;
pub mod store;

// Re-exports
pub use admission::{AdmissionSchedule, DisabledWindow, TimeSource};
pub use cart::{CartError, CartStore};
pub use checkout::{CheckoutCoordinator, MAX_ORDER_QUANTITY};
pub use config::Config;
pub use error::{CheckoutError, CheckoutResult};
pub use notify::NotificationEmitter;
pub use store::{DocumentStore, OrderUpdateError, RetryPolicy, StoreError, StoreResult};

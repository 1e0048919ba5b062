//! Shared types for the canteen checkout engine
//!
//! Common types used across the engine and its callers: the data model
//! (cart lines, menu items, orders, notifications), the checkout error
//! code taxonomy, and small time utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{CheckoutErrorCode, InvalidErrorCode};
pub use models::{
    CartLine, InvalidTransition, MenuItem, Notification, NotificationStatus, Order, OrderLine,
    OrderStatus,
};

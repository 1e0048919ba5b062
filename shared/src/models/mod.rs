//! Data models
//!
//! Documents persisted in the backing store plus the in-memory cart
//! line. Orders snapshot their lines by value at checkout time, so
//! later catalog edits never change a placed order.

pub mod cart;
pub mod menu_item;
pub mod notification;
pub mod order;
pub mod timeslot;

// Re-exports
pub use cart::*;
pub use menu_item::*;
pub use notification::*;
pub use order::*;

//! Checkout error codes
//!
//! Stable numeric codes for every error the checkout surface can
//! return, for cross-language callers (the UI layer owns all
//! user-facing messaging). Organized by category:
//! - 1xxx: Authentication
//! - 4xxx: Checkout preconditions
//! - 6xxx: Catalog / stock
//! - 9xxx: Store / system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified checkout error code
///
/// Represented as `u16` for efficient serialization and
/// cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum CheckoutErrorCode {
    // ==================== 1xxx: Auth ====================
    /// No authenticated user id was supplied
    NotAuthenticated = 1001,

    // ==================== 4xxx: Checkout preconditions ====================
    /// The cart holds no lines
    EmptyCart = 4001,
    /// Total quantity exceeds the per-order cap
    QuantityLimitExceeded = 4002,
    /// Missing or unknown pickup timeslot
    TimeslotRequired = 4003,
    /// Current time falls inside a disabled admission window
    OrderingUnavailable = 4004,
    /// A cart line violates its invariants (quantity below 1)
    InvalidCartLine = 4005,

    // ==================== 6xxx: Catalog / stock ====================
    /// A cart line references an item no longer in the catalog
    ItemNotFound = 6001,
    /// A cart line asks for more than the available stock
    InsufficientStock = 6002,
    /// Catalog document failed validation (e.g. negative price)
    InvalidMenuData = 6003,

    // ==================== 9xxx: Store / system ====================
    /// Optimistic transaction retries exhausted; safe to retry checkout
    TransactionConflict = 9001,
    /// Non-transient store failure
    StoreFailure = 9002,
}

impl From<CheckoutErrorCode> for u16 {
    fn from(code: CheckoutErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when deserializing an unknown error code
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid checkout error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for CheckoutErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1001 => Ok(Self::NotAuthenticated),
            4001 => Ok(Self::EmptyCart),
            4002 => Ok(Self::QuantityLimitExceeded),
            4003 => Ok(Self::TimeslotRequired),
            4004 => Ok(Self::OrderingUnavailable),
            4005 => Ok(Self::InvalidCartLine),
            6001 => Ok(Self::ItemNotFound),
            6002 => Ok(Self::InsufficientStock),
            6003 => Ok(Self::InvalidMenuData),
            9001 => Ok(Self::TransactionConflict),
            9002 => Ok(Self::StoreFailure),
            other => Err(InvalidErrorCode(other)),
        }
    }
}

impl fmt::Display for CheckoutErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", *self as u16)
    }
}

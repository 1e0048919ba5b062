//! Checkout error taxonomy
//!
//! Every failure the `checkout` surface can report. Precondition
//! failures never touch the store; business aborts leave the store and
//! cart unchanged; `TransactionConflict` is transient and safe to
//! retry whole.

use crate::store::StoreError;
use shared::error::CheckoutErrorCode;
use thiserror::Error;

pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Errors surfaced by the checkout coordinator
#[derive(Debug, Error)]
pub enum CheckoutError {
    // ========== Precondition failures (no store access) ==========
    #[error("Cart is empty")]
    EmptyCart,

    #[error("No user is logged in")]
    NotAuthenticated,

    #[error("Invalid cart line for {item_id}: quantity must be at least 1")]
    InvalidCartLine { item_id: String },

    #[error("Total quantity {total} exceeds the {limit}-item limit")]
    QuantityLimitExceeded { total: u32, limit: u32 },

    #[error("A valid pickup timeslot is required")]
    TimeslotRequired,

    #[error("Ordering is currently unavailable")]
    OrderingUnavailable,

    // ========== Business aborts (transaction rolled back) ==========
    #[error("Menu item not found: {0}")]
    ItemNotFound(String),

    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: String,
        name: String,
        requested: u32,
        available: u32,
    },

    #[error("Invalid menu data for {item_id}: {reason}")]
    InvalidMenuData { item_id: String, reason: String },

    // ========== Store failures ==========
    #[error("Checkout transaction conflicted and exhausted its retries")]
    TransactionConflict,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Stable numeric code for cross-language callers
    pub fn code(&self) -> CheckoutErrorCode {
        match self {
            CheckoutError::EmptyCart => CheckoutErrorCode::EmptyCart,
            CheckoutError::NotAuthenticated => CheckoutErrorCode::NotAuthenticated,
            CheckoutError::InvalidCartLine { .. } => CheckoutErrorCode::InvalidCartLine,
            CheckoutError::QuantityLimitExceeded { .. } => {
                CheckoutErrorCode::QuantityLimitExceeded
            }
            CheckoutError::TimeslotRequired => CheckoutErrorCode::TimeslotRequired,
            CheckoutError::OrderingUnavailable => CheckoutErrorCode::OrderingUnavailable,
            CheckoutError::ItemNotFound(_) => CheckoutErrorCode::ItemNotFound,
            CheckoutError::InsufficientStock { .. } => CheckoutErrorCode::InsufficientStock,
            CheckoutError::InvalidMenuData { .. } => CheckoutErrorCode::InvalidMenuData,
            CheckoutError::TransactionConflict => CheckoutErrorCode::TransactionConflict,
            CheckoutError::Store(e) if e.is_transient() => CheckoutErrorCode::TransactionConflict,
            CheckoutError::Store(_) => CheckoutErrorCode::StoreFailure,
        }
    }
}

//! Money arithmetic
//!
//! All totals are computed with `Decimal` internally and stored as
//! `f64` in the serialized documents, rounded to 2 decimal places
//! (half away from zero).

use crate::error::CheckoutError;
use rust_decimal::prelude::*;
use shared::models::{MenuItem, OrderLine};

/// Rounding for monetary values (2 decimal places)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price
const MAX_PRICE: f64 = 1_000_000.0;

fn round_money(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Validate a catalog document before using its price in an order
pub fn validate_menu_item(item: &MenuItem) -> Result<(), CheckoutError> {
    if !item.price.is_finite() {
        return Err(CheckoutError::InvalidMenuData {
            item_id: item.id.clone(),
            reason: format!("price must be a finite number, got {}", item.price),
        });
    }
    if item.price < 0.0 {
        return Err(CheckoutError::InvalidMenuData {
            item_id: item.id.clone(),
            reason: format!("price must be non-negative, got {}", item.price),
        });
    }
    if item.price > MAX_PRICE {
        return Err(CheckoutError::InvalidMenuData {
            item_id: item.id.clone(),
            reason: format!("price exceeds maximum allowed ({MAX_PRICE}), got {}", item.price),
        });
    }
    Ok(())
}

/// Total cost of an order: sum of unit_price * quantity, rounded
pub fn order_total(lines: &[OrderLine]) -> Result<f64, CheckoutError> {
    let mut total = Decimal::ZERO;
    for line in lines {
        let unit_price =
            Decimal::from_f64(line.unit_price).ok_or_else(|| CheckoutError::InvalidMenuData {
                item_id: line.item_id.clone(),
                reason: format!("price is not representable: {}", line.unit_price),
            })?;
        total += unit_price * Decimal::from(line.quantity);
    }
    Ok(round_money(total))
}

//! Order number allocator
//!
//! Produces the next day-scoped, human-facing ticket number. This is a
//! query over today's orders taken *before* the checkout transaction,
//! so it is a hint, not a guarantee: two concurrent checkouts can
//! compute the same number. True uniqueness is carried by the
//! store-assigned order id; the ticket is best-effort monotonically
//! increasing and may rarely collide under heavy concurrency. Making
//! it collision-free would need a serializing counter inside the stock
//! transaction, which is deliberately not done here.

use crate::store::{DocumentStore, StoreResult};

/// Numbers start at `ORDER_NUMBER_FLOOR + 1` each day
pub const ORDER_NUMBER_FLOOR: u32 = 999;

/// Next ticket number for the local calendar day containing `now_millis`
pub fn next_order_number(store: &DocumentStore, now_millis: i64) -> StoreResult<u32> {
    let (start, end) = shared::util::local_day_bounds(now_millis);
    let max = store
        .orders_created_between(start, end)?
        .iter()
        .map(|o| o.order_number)
        .max()
        .unwrap_or(ORDER_NUMBER_FLOOR);
    Ok(max + 1)
}

//! Notification emitter
//!
//! Issued only after a checkout commits. Best-effort: a delivery
//! failure is logged and swallowed and never changes the checkout
//! result.

use crate::store::DocumentStore;
use shared::models::{Notification, NotificationStatus, Order};
use uuid::Uuid;

/// Writes post-checkout notifications to the store
#[derive(Clone)]
pub struct NotificationEmitter {
    store: DocumentStore,
}

impl NotificationEmitter {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Emit the order-placed notification; failures are swallowed
    pub fn emit(&self, order: &Order) {
        let notification = Self::build(order);
        if let Err(e) = self.store.insert_notification(&notification) {
            tracing::error!(
                order_id = %order.id,
                order_number = order.order_number,
                error = %e,
                "Failed to deliver order notification"
            );
        }
    }

    fn build(order: &Order) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            user_id: order.user_id.clone(),
            order_number: order.order_number,
            title: "Order Placed".to_string(),
            message: summarize(order),
            timestamp: shared::util::now_millis(),
            status: NotificationStatus::Unread,
        }
    }
}

/// "Adobo x2, Lumpia x1" style summary of the ordered items
fn summarize(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|line| format!("{} x{}", line.name, line.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

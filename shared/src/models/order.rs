//! Order model

use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Prepared,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Pending and prepared orders are still "active" for the client
    /// (the menu screen shows the ticket instead of the menu)
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Prepared)
    }

    /// Legal lifecycle moves: pending → prepared or cancelled,
    /// prepared → completed or cancelled. Completed and cancelled are
    /// terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Prepared)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Prepared, OrderStatus::Completed)
                | (OrderStatus::Prepared, OrderStatus::Cancelled)
        )
    }
}

/// Rejected order lifecycle move
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Illegal order status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// A cart line resolved against the catalog at checkout time
///
/// Snapshotted by value so later price or name edits cannot
/// retroactively change a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: String,
    pub name: String,
    /// Unit price at the moment of checkout
    pub unit_price: f64,
    pub quantity: u32,
}

/// A durable order, created exactly once per successful checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned document id (the real uniqueness guarantee)
    pub id: String,
    /// Day-scoped, human-facing ticket number starting at 1000.
    /// Monotonically non-decreasing within a day; exact uniqueness is
    /// not guaranteed under concurrent checkouts.
    pub order_number: u32,
    pub items: Vec<OrderLine>,
    pub total_quantity: u32,
    /// Sum of unit_price * quantity, rounded to 2 decimal places
    pub total_cost: f64,
    pub status: OrderStatus,
    pub user_id: String,
    /// Creation timestamp (UTC millis)
    pub created_at: i64,
    /// Pickup timeslot, one of the enumerated valid slots
    pub timeslot: String,
}

impl Order {
    /// Apply a lifecycle move, rejecting illegal transitions
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"prepared\"").unwrap(),
            OrderStatus::Prepared
        );
    }

    #[test]
    fn active_statuses() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Prepared.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    fn order_with_status(status: OrderStatus) -> Order {
        Order {
            id: "o1".into(),
            order_number: 1000,
            items: Vec::new(),
            total_quantity: 0,
            total_cost: 0.0,
            status,
            user_id: "u1".into(),
            created_at: 0,
            timeslot: "10:00-10:30 AM".into(),
        }
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        let mut order = order_with_status(OrderStatus::Pending);
        order.transition(OrderStatus::Prepared).unwrap();
        order.transition(OrderStatus::Completed).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        // Terminal states admit no further moves
        let err = order.transition(OrderStatus::Cancelled).unwrap_err();
        assert_eq!(err.from, OrderStatus::Completed);
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn cancellation_allowed_until_completed() {
        let mut order = order_with_status(OrderStatus::Pending);
        order.transition(OrderStatus::Cancelled).unwrap();

        let mut order = order_with_status(OrderStatus::Prepared);
        order.transition(OrderStatus::Cancelled).unwrap();

        // Skipping prepared is not a legal move
        let mut order = order_with_status(OrderStatus::Pending);
        assert!(order.transition(OrderStatus::Completed).is_err());
        assert_eq!(order.status, OrderStatus::Pending);
    }
}

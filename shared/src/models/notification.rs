//! Notification model
//!
//! Created after an order commits. Best-effort: its loss never rolls
//! back the order.

use serde::{Deserialize, Serialize};

/// Read state of a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

/// A post-checkout notification for the ordering user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    /// Ticket number of the order this notification refers to
    pub order_number: u32,
    pub title: String,
    /// Summary of the ordered items, e.g. "Adobo x2, Lumpia x1"
    pub message: String,
    /// Creation timestamp (UTC millis)
    pub timestamp: i64,
    pub status: NotificationStatus,
}

//! Pickup timeslots
//!
//! A checkout must name one of these slots; anything else (or a
//! missing slot) is rejected before the transaction is attempted.

/// The enumerated pickup slots offered by the canteen
pub const VALID_TIMESLOTS: &[&str] = &[
    "9:30-10:00 AM",
    "10:00-10:30 AM",
    "12:00-12:30 PM",
    "12:30-1:00 PM",
    "3:00-3:30 PM",
    "4:00-4:30 PM",
];

/// Whether `slot` is one of the enumerated valid pickup slots
pub fn is_valid(slot: &str) -> bool {
    VALID_TIMESLOTS.contains(&slot)
}

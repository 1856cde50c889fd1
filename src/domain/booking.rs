//! Court bookings.

use serde::{Deserialize, Serialize};

use super::primitives::closed_enum;
use super::{Interval, MemberId, Money, TimeMs};

closed_enum! {
    BookingStatus, "booking status" {
        PendingPayment => "pending_payment" | "pendingpayment" | "hold",
        Confirmed => "confirmed",
        Cancelled => "cancelled" | "canceled",
        Completed => "completed",
    }
}

impl BookingStatus {
    /// Statuses that occupy the court for conflict purposes.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub court_id: i64,
    pub member_id: MemberId,
    pub interval: Interval,
    pub total_price: Money,
    pub status: BookingStatus,
    pub is_recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_booking_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    pub created_at: TimeMs,
}

/// Row to insert; ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub court_id: i64,
    pub member_id: MemberId,
    pub interval: Interval,
    pub total_price: Money,
    pub status: BookingStatus,
    pub recurrence_rule: Option<String>,
    pub parent_booking_id: Option<i64>,
}

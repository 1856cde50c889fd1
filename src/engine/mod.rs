//! Pure computation for the club ledger: pricing, refunds, recurrence,
//! schedules and ratings. Nothing here touches the store.

pub mod pricing;
pub mod rating;
pub mod recurrence;
pub mod refund;
pub mod schedule;

pub use pricing::{booking_price, PriceError, MAX_BOOKING_HOURS};
pub use recurrence::{RecurrenceRule, MAX_OCCURRENCES};
pub use refund::{refund_for, RefundRate};

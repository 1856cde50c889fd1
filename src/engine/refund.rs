//! Cancellation refund policy.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Money, TimeMs};

/// Tiered share of the booking price returned on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundRate {
    /// More than 24h notice.
    Full,
    /// More than 6h and at most 24h notice.
    Half,
    /// 6h notice or less, including already started bookings.
    None,
}

impl RefundRate {
    pub fn for_notice(hours_until_start: Decimal) -> Self {
        if hours_until_start > Decimal::from(24) {
            RefundRate::Full
        } else if hours_until_start > Decimal::from(6) {
            RefundRate::Half
        } else {
            RefundRate::None
        }
    }

    pub fn fraction(&self) -> Decimal {
        match self {
            RefundRate::Full => Decimal::ONE,
            RefundRate::Half => Decimal::new(5, 1),
            RefundRate::None => Decimal::ZERO,
        }
    }

    pub fn percent(&self) -> u32 {
        match self {
            RefundRate::Full => 100,
            RefundRate::Half => 50,
            RefundRate::None => 0,
        }
    }
}

/// Refund for a booking starting at `start` cancelled at `now`.
pub fn refund_for(price: Money, start: TimeMs, now: TimeMs) -> (RefundRate, Money) {
    let rate = RefundRate::for_notice(now.hours_until(start));
    // a fraction of at most one keeps the product inside the price's range
    let amount = price.checked_scale_by(rate.fraction()).unwrap_or(price);
    (rate, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        let price = Money::from_cents(20_000);
        let now = TimeMs::new(1_700_000_000_000);

        assert_eq!(refund_for(price, now.plus_hours(30), now), (RefundRate::Full, price));
        assert_eq!(
            refund_for(price, now.plus_hours(10), now),
            (RefundRate::Half, Money::from_cents(10_000))
        );
        assert_eq!(refund_for(price, now.plus_hours(2), now), (RefundRate::None, Money::zero()));
    }

    #[test]
    fn test_boundaries_belong_to_lower_tier() {
        assert_eq!(RefundRate::for_notice(Decimal::from(24)), RefundRate::Half);
        assert_eq!(RefundRate::for_notice(Decimal::from(6)), RefundRate::None);
        assert_eq!(RefundRate::for_notice(Decimal::new(2401, 2)), RefundRate::Full);
        assert_eq!(RefundRate::for_notice(Decimal::from(-3)), RefundRate::None);
    }

    #[test]
    fn test_odd_cent_half_refund_rounds() {
        let (_, amount) = refund_for(Money::from_cents(333), TimeMs::new(0).plus_hours(12), TimeMs::new(0));
        assert_eq!(amount, Money::from_cents(167));
    }
}

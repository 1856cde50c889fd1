//! Booking price computation.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{Interval, Money};

/// Longest single booking the club sells.
pub const MAX_BOOKING_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("booking may not exceed {MAX_BOOKING_HOURS} hours")]
    TooLong,
    #[error("booking price is out of range")]
    OutOfRange,
}

/// Duration in (fractional) hours times the hourly rate, rounded to cents.
pub fn booking_price(interval: &Interval, hourly_price: Money) -> Result<Money, PriceError> {
    let hours = interval.duration_hours();
    if hours > Decimal::from(MAX_BOOKING_HOURS) {
        return Err(PriceError::TooLong);
    }
    hourly_price
        .checked_scale_by(hours)
        .ok_or(PriceError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeMs;

    fn interval_minutes(minutes: i64) -> Interval {
        Interval::new(TimeMs::new(0), TimeMs::new(minutes * 60_000)).unwrap()
    }

    #[test]
    fn test_whole_and_fractional_hours() {
        let hourly = Money::from_cents(150_000);
        assert_eq!(booking_price(&interval_minutes(120), hourly), Ok(Money::from_cents(300_000)));
        assert_eq!(booking_price(&interval_minutes(90), hourly), Ok(Money::from_cents(225_000)));
        assert_eq!(
            booking_price(&interval_minutes(20), Money::from_cents(10_000)),
            Ok(Money::from_cents(3_333))
        );
    }

    #[test]
    fn test_free_court() {
        assert!(booking_price(&interval_minutes(60), Money::zero()).unwrap().is_zero());
    }

    #[test]
    fn test_length_limit() {
        let hourly = Money::from_cents(100);
        assert!(booking_price(&interval_minutes(MAX_BOOKING_HOURS * 60), hourly).is_ok());
        assert_eq!(
            booking_price(&interval_minutes(MAX_BOOKING_HOURS * 60 + 1), hourly),
            Err(PriceError::TooLong)
        );

        let all_time = Interval::new(TimeMs::new(i64::MIN), TimeMs::new(i64::MAX)).unwrap();
        assert_eq!(booking_price(&all_time, hourly), Err(PriceError::TooLong));
    }

    #[test]
    fn test_huge_rate_is_out_of_range() {
        assert_eq!(
            booking_price(&interval_minutes(120), Money::new(Decimal::MAX)),
            Err(PriceError::OutOfRange)
        );
    }
}

mod common;

use clubledger::domain::{Interval, LedgerRef, Tier, TimeMs, TxKind};
use clubledger::engine::RefundRate;
use clubledger::error::AppError;
use common::{cents, setup, t0};

fn hour_at(hours_from_t0: i64) -> Interval {
    Interval::new(t0().plus_hours(hours_from_t0), t0().plus_hours(hours_from_t0 + 1)).unwrap()
}

/// Book a 200.00 slot starting `notice_hours` after `now`, then cancel at `now`.
async fn cancel_with_notice(notice_hours: i64) -> (RefundRate, clubledger::Money, clubledger::Money) {
    let t = setup().await;
    let ann = t.member("ann", Tier::Standard, cents(100_000)).await;
    let court = t.court("Court 1", cents(20_000)).await;
    let now = t0();

    let receipt = t
        .club
        .bookings
        .create(&ann, court.id, hour_at(notice_hours), now)
        .await
        .unwrap();
    let cancel = t
        .club
        .bookings
        .cancel(&ann, receipt.booking.id, now)
        .await
        .unwrap();
    (cancel.refund_rate, cancel.refund_amount, t.balance(&ann).await)
}

#[tokio::test]
async fn test_thirty_hours_notice_refunds_everything() {
    let (rate, amount, balance) = cancel_with_notice(30).await;
    assert_eq!(rate, RefundRate::Full);
    assert_eq!(amount, cents(20_000));
    assert_eq!(balance, cents(100_000));
}

#[tokio::test]
async fn test_ten_hours_notice_refunds_half() {
    let (rate, amount, balance) = cancel_with_notice(10).await;
    assert_eq!(rate, RefundRate::Half);
    assert_eq!(amount, cents(10_000));
    assert_eq!(balance, cents(90_000));
}

#[tokio::test]
async fn test_two_hours_notice_refunds_nothing() {
    let (rate, amount, balance) = cancel_with_notice(2).await;
    assert_eq!(rate, RefundRate::None);
    assert_eq!(amount, cents(0));
    assert_eq!(balance, cents(80_000));
}

#[tokio::test]
async fn test_refund_entry_records_percentage() {
    let t = setup().await;
    let ann = t.member("ann", Tier::Standard, cents(100_000)).await;
    let court = t.court("Court 1", cents(20_000)).await;

    let receipt = t.club.bookings.create(&ann, court.id, hour_at(10), t0()).await.unwrap();
    t.club.bookings.cancel(&ann, receipt.booking.id, t0()).await.unwrap();

    let refunds: Vec<_> = t
        .ledger(&ann)
        .await
        .into_iter()
        .filter(|e| e.kind == TxKind::Refund)
        .collect();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, cents(10_000));
    assert_eq!(refunds[0].reference, Some(LedgerRef::Booking(receipt.booking.id)));
    assert!(refunds[0].description.as_deref().unwrap().contains("50%"));

    // Refunds do not count as spending; the payment already did.
    assert_eq!(t.load_member(&ann).await.total_spent, cents(20_000));
}

#[tokio::test]
async fn test_second_cancel_is_invalid_state() {
    let t = setup().await;
    let ann = t.member("ann", Tier::Standard, cents(100_000)).await;
    let court = t.court("Court 1", cents(20_000)).await;

    let receipt = t.club.bookings.create(&ann, court.id, hour_at(30), t0()).await.unwrap();
    t.club.bookings.cancel(&ann, receipt.booking.id, t0()).await.unwrap();

    let err = t
        .club
        .bookings
        .cancel(&ann, receipt.booking.id, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(t.balance(&ann).await, cents(100_000));
    assert_eq!(
        t.ledger(&ann).await.iter().filter(|e| e.kind == TxKind::Refund).count(),
        1
    );
}

#[tokio::test]
async fn test_only_owner_may_cancel() {
    let t = setup().await;
    let ann = t.member("ann", Tier::Standard, cents(100_000)).await;
    let bob = t.member("bob", Tier::Standard, cents(100_000)).await;
    let court = t.court("Court 1", cents(20_000)).await;

    let receipt = t.club.bookings.create(&ann, court.id, hour_at(30), t0()).await.unwrap();
    let err = t
        .club
        .bookings
        .cancel(&bob, receipt.booking.id, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = t.club.bookings.cancel(&ann, 4242, t0()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_cancelling_a_hold_refunds_nothing() {
    let t = setup().await;
    let ann = t.member("ann", Tier::Standard, cents(100_000)).await;
    let court = t.court("Court 1", cents(20_000)).await;

    let hold = t.club.bookings.hold(&ann, court.id, hour_at(30), t0()).await.unwrap();
    let cancel = t.club.bookings.cancel(&ann, hold.id, TimeMs::new(t0().as_ms() + 1)).await.unwrap();
    assert_eq!(cancel.refund_amount, cents(0));
    assert_eq!(t.balance(&ann).await, cents(100_000));
    assert!(t.ledger(&ann).await.is_empty());
}

mod common;

use clubledger::domain::{BookingStatus, Interval, Tier};
use clubledger::jobs::cleanup::HoldCleanupJob;
use clubledger::jobs::reminders::ReminderJob;
use clubledger::jobs::PeriodicJob;
use clubledger::orchestration::DuelRequest;
use common::{cents, setup, setup_with, t0, time};
use std::time::Duration;

#[tokio::test]
async fn test_cleanup_cancels_only_stale_holds() {
    let t = setup_with(|c| c.hold_expiry = Duration::from_secs(600)).await;
    let ann = t.member("ann", Tier::Standard, cents(100_000)).await;
    let court = t.court("Court 1", cents(10_000)).await;

    let slot = |h: i64| Interval::new(t0().plus_hours(h), t0().plus_hours(h + 1)).unwrap();
    let old = t.club.bookings.hold(&ann, court.id, slot(30), t0()).await.unwrap();
    let fresh = t
        .club
        .bookings
        .hold(&ann, court.id, slot(32), t0().plus_secs(500))
        .await
        .unwrap();
    let paid = t
        .club
        .bookings
        .create(&ann, court.id, slot(34), t0())
        .await
        .unwrap();

    let job = HoldCleanupJob::new(t.club.bookings.clone());
    assert_eq!(job.name(), "hold_cleanup");
    let now = t0().plus_secs(700);
    assert_eq!(job.tick(now).await.unwrap(), 1);
    assert_eq!(job.tick(now).await.unwrap(), 0);

    let status = |id| {
        let bookings = t.club.bookings.clone();
        async move { bookings.get(id).await.unwrap().status }
    };
    assert_eq!(status(old.id).await, BookingStatus::Cancelled);
    assert_eq!(status(fresh.id).await, BookingStatus::PendingPayment);
    assert_eq!(status(paid.booking.id).await, BookingStatus::Confirmed);

    // the freed slot can be booked again
    t.club
        .bookings
        .create(&ann, court.id, slot(30), now)
        .await
        .unwrap();
    assert_eq!(t.balance(&ann).await, cents(80_000));
}

#[tokio::test]
async fn test_reminders_go_out_once_per_receiver() {
    let t = setup().await;
    let ann = t.member("ann", Tier::Standard, cents(100_000)).await;
    let bob = t.member("bob", Tier::Standard, cents(0)).await;
    let court = t.court("Court 1", cents(10_000)).await;

    // 23.5h ahead of now, inside the window
    let now = t0();
    let start = now.plus_secs(23 * 3600 + 1800);
    let soon = Interval::new(start, start.plus_hours(1)).unwrap();
    t.club.bookings.create(&ann, court.id, soon, now).await.unwrap();
    // two days ahead, outside
    let later = Interval::new(now.plus_hours(48), now.plus_hours(49)).unwrap();
    t.club.bookings.create(&ann, court.id, later, now).await.unwrap();

    t.club
        .matches
        .create_duel(
            &ann,
            &DuelRequest {
                opponent: bob.clone(),
                date: Some(common::date(2026, 3, 2) + chrono::Duration::days(1)),
                start_time: Some(time(0, 0)),
            },
            now,
        )
        .await
        .unwrap();

    let before = t.channel.events().len();
    let job = ReminderJob::new(t.repo.clone(), t.club.notifier.clone());
    // one booking reminder plus one per duel player
    assert_eq!(job.tick(now).await.unwrap(), 3);
    assert_eq!(job.tick(now.plus_secs(60)).await.unwrap(), 0);

    let reminders: Vec<_> = t.channel.events()[before..]
        .iter()
        .filter(|e| e.message.starts_with("Reminder:"))
        .cloned()
        .collect();
    assert_eq!(reminders.len(), 3);
    assert!(reminders.iter().any(|e| e.target_member_id == bob));
    assert_eq!(t.club.notifier.unread_count(&bob).await.unwrap(), 2);
}

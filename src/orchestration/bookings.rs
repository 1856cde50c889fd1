//! Booking engine: single bookings, payment holds, and cancellations.
//!
//! Every operation is one SQLite transaction that starts by locking the
//! acting member's row, so the conflict check, funds check, and writes see a
//! stable database. The overlap trigger backs up the conflict check.

use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use std::time::Duration;
use tracing::info;

use super::retry::retry_busy;
use super::wallet::{ensure_funds, lock_member, post};
use crate::db::repo::{bookings, courts};
use crate::db::Repository;
use crate::domain::{
    Booking, BookingStatus, Court, Interval, LedgerRef, Member, MemberId, Money, NewBooking,
    NewTransaction, NotificationEvent, Severity, TimeMs,
};
use crate::engine::{booking_price, refund_for, RefundRate};
use crate::error::AppError;
use crate::notify::Notifier;

/// Upper bound for "my bookings".
pub const MEMBER_BOOKINGS_LIMIT: i64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub booking: Booking,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReceipt {
    pub booking: Booking,
    pub refund_rate: RefundRate,
    pub refund_percent: u32,
    pub refund_amount: Money,
    pub balance: Money,
}

pub(crate) fn booking_link(id: i64) -> String {
    format!("/bookings/{}", id)
}

/// Active member and active court, or the matching rejection.
pub(crate) async fn bookable(
    conn: &mut SqliteConnection,
    member: &Member,
    court_id: i64,
) -> Result<Court, AppError> {
    if !member.is_active {
        return Err(AppError::InvalidState(format!(
            "member {} is not active",
            member.id
        )));
    }
    let court = courts::get(conn, court_id)
        .await?
        .ok_or_else(|| AppError::not_found("court", court_id))?;
    if !court.is_active {
        return Err(AppError::InvalidState(format!(
            "court {} is not accepting bookings",
            court_id
        )));
    }
    Ok(court)
}

pub(crate) async fn ensure_slot_free(
    conn: &mut SqliteConnection,
    court_id: i64,
    interval: &Interval,
) -> Result<(), AppError> {
    if !bookings::find_overlapping(conn, court_id, interval)
        .await?
        .is_empty()
    {
        return Err(slot_conflict(court_id, interval));
    }
    Ok(())
}

/// Price of `interval` on `court`; over-long or out-of-range bookings are invalid input.
pub(crate) fn price_for(interval: &Interval, court: &Court) -> Result<Money, AppError> {
    booking_price(interval, court.hourly_price).map_err(|e| AppError::Validation(e.to_string()))
}

pub(crate) fn slot_conflict(court_id: i64, interval: &Interval) -> AppError {
    AppError::SlotConflict {
        court_id,
        start_ms: interval.start().as_ms(),
        end_ms: interval.end().as_ms(),
    }
}

/// Insert, mapping a trigger refusal to a slot conflict.
pub(crate) async fn insert_booking(
    conn: &mut SqliteConnection,
    booking: &NewBooking,
    now: TimeMs,
) -> Result<Booking, AppError> {
    bookings::insert(conn, booking, now).await.map_err(|e| {
        if bookings::is_overlap_abort(&e) {
            slot_conflict(booking.court_id, &booking.interval)
        } else {
            AppError::Db(e)
        }
    })
}

/// Charge `price` for `booking_ids`: Payment entry, reference, and links.
/// Free bookings carry no ledger entry.
pub(crate) async fn charge(
    conn: &mut SqliteConnection,
    member: &mut Member,
    price: Money,
    booking_ids: &[i64],
    description: String,
    now: TimeMs,
) -> Result<Option<i64>, AppError> {
    let Some(&first) = booking_ids.first() else {
        return Ok(None);
    };
    if price.is_zero() {
        return Ok(None);
    }
    let entry = NewTransaction::payment(&member.id, price)
        .with_reference(LedgerRef::Booking(first))
        .with_description(description);
    let payment = post(&mut *conn, member, entry, now).await?;
    bookings::link_transaction(conn, booking_ids, payment.id).await?;
    Ok(Some(payment.id))
}

#[derive(Clone)]
pub struct BookingService {
    repo: Repository,
    notifier: Notifier,
    hold_expiry: Duration,
}

impl BookingService {
    pub fn new(repo: Repository, notifier: Notifier, hold_expiry: Duration) -> Self {
        BookingService {
            repo,
            notifier,
            hold_expiry,
        }
    }

    /// Book and pay in one unit; the booking is Confirmed on success.
    pub async fn create(
        &self,
        member_id: &MemberId,
        court_id: i64,
        interval: Interval,
        now: TimeMs,
    ) -> Result<BookingReceipt, AppError> {
        let receipt = retry_busy("create_booking", || async {
            let mut tx = self.repo.begin().await?;
            let mut member = lock_member(&mut tx, member_id).await?;
            let court = bookable(&mut tx, &member, court_id).await?;
            let price = price_for(&interval, &court)?;
            ensure_slot_free(&mut tx, court_id, &interval).await?;
            ensure_funds(&member, price)?;

            let mut booking = insert_booking(
                &mut tx,
                &NewBooking {
                    court_id,
                    member_id: member_id.clone(),
                    interval,
                    total_price: price,
                    status: BookingStatus::Confirmed,
                    recurrence_rule: None,
                    parent_booking_id: None,
                },
                now,
            )
            .await?;
            booking.transaction_id = charge(
                &mut tx,
                &mut member,
                price,
                &[booking.id],
                format!("Booking #{} on {}", booking.id, court.name),
                now,
            )
            .await?;

            tx.commit().await?;
            Ok(BookingReceipt {
                booking,
                balance: member.balance,
            })
        })
        .await?;

        info!(
            booking_id = receipt.booking.id,
            member = %member_id,
            court_id,
            price = %receipt.booking.total_price,
            "booking confirmed"
        );
        self.notifier
            .emit(
                NotificationEvent::new(
                    member_id,
                    format!(
                        "Booking #{} confirmed for {}",
                        receipt.booking.id,
                        receipt.booking.interval.start()
                    ),
                    Severity::Success,
                )
                .with_link(booking_link(receipt.booking.id))
                .at(now),
            )
            .await;
        Ok(receipt)
    }

    /// Reserve a slot as PendingPayment without charging.
    pub async fn hold(
        &self,
        member_id: &MemberId,
        court_id: i64,
        interval: Interval,
        now: TimeMs,
    ) -> Result<Booking, AppError> {
        let booking = retry_busy("hold_booking", || async {
            let mut tx = self.repo.begin().await?;
            let member = lock_member(&mut tx, member_id).await?;
            let court = bookable(&mut tx, &member, court_id).await?;
            let price = price_for(&interval, &court)?;
            ensure_slot_free(&mut tx, court_id, &interval).await?;

            let booking = insert_booking(
                &mut tx,
                &NewBooking {
                    court_id,
                    member_id: member_id.clone(),
                    interval,
                    total_price: price,
                    status: BookingStatus::PendingPayment,
                    recurrence_rule: None,
                    parent_booking_id: None,
                },
                now,
            )
            .await?;
            tx.commit().await?;
            Ok(booking)
        })
        .await?;

        info!(booking_id = booking.id, member = %member_id, court_id, "slot held");
        Ok(booking)
    }

    /// Pay for a hold: PendingPayment → Confirmed with its Payment entry.
    pub async fn confirm_hold(
        &self,
        member_id: &MemberId,
        booking_id: i64,
        now: TimeMs,
    ) -> Result<BookingReceipt, AppError> {
        let expiry_ms = i64::try_from(self.hold_expiry.as_millis()).unwrap_or(i64::MAX);

        let receipt = retry_busy("confirm_hold", || async {
            let mut tx = self.repo.begin().await?;
            let mut member = lock_member(&mut tx, member_id).await?;
            let mut booking = owned_booking(&mut tx, member_id, booking_id).await?;

            if booking.status != BookingStatus::PendingPayment {
                return Err(AppError::InvalidState(format!(
                    "booking {} is {}, not awaiting payment",
                    booking_id, booking.status
                )));
            }
            if now.as_ms().saturating_sub(booking.created_at.as_ms()) > expiry_ms {
                return Err(AppError::InvalidState(format!(
                    "hold on booking {} has expired",
                    booking_id
                )));
            }
            ensure_funds(&member, booking.total_price)?;

            if !bookings::transition(
                &mut tx,
                booking_id,
                BookingStatus::PendingPayment,
                BookingStatus::Confirmed,
            )
            .await?
            {
                return Err(AppError::InvalidState(format!(
                    "booking {} is no longer awaiting payment",
                    booking_id
                )));
            }
            booking.status = BookingStatus::Confirmed;
            booking.transaction_id = charge(
                &mut tx,
                &mut member,
                booking.total_price,
                &[booking.id],
                format!("Booking #{}", booking.id),
                now,
            )
            .await?;

            tx.commit().await?;
            Ok(BookingReceipt {
                booking,
                balance: member.balance,
            })
        })
        .await?;

        info!(booking_id, member = %member_id, "hold confirmed");
        self.notifier
            .emit(
                NotificationEvent::new(
                    member_id,
                    format!("Booking #{} confirmed", booking_id),
                    Severity::Success,
                )
                .with_link(booking_link(booking_id))
                .at(now),
            )
            .await;
        Ok(receipt)
    }

    /// Cancel and refund by notice: >24h full, >6h half, otherwise nothing.
    /// Cancelling twice is an error.
    pub async fn cancel(
        &self,
        member_id: &MemberId,
        booking_id: i64,
        now: TimeMs,
    ) -> Result<CancelReceipt, AppError> {
        let receipt = retry_busy("cancel_booking", || async {
            let mut tx = self.repo.begin().await?;
            let mut member = lock_member(&mut tx, member_id).await?;
            let mut booking = owned_booking(&mut tx, member_id, booking_id).await?;

            let was = booking.status;
            if matches!(was, BookingStatus::Cancelled | BookingStatus::Completed) {
                return Err(AppError::InvalidState(format!(
                    "booking {} is already {}",
                    booking_id, was
                )));
            }
            if !bookings::transition(&mut tx, booking_id, was, BookingStatus::Cancelled).await? {
                return Err(AppError::InvalidState(format!(
                    "booking {} changed while cancelling",
                    booking_id
                )));
            }
            booking.status = BookingStatus::Cancelled;

            // holds were never paid, so nothing comes back
            let (rate, refund) = if was == BookingStatus::PendingPayment {
                (RefundRate::None, Money::zero())
            } else {
                refund_for(booking.total_price, booking.interval.start(), now)
            };

            if refund.is_positive() {
                let entry = NewTransaction::refund(member_id, refund)
                    .with_reference(LedgerRef::Booking(booking_id))
                    .with_description(format!(
                        "Refund {}% for cancelled booking #{}",
                        rate.percent(),
                        booking_id
                    ));
                post(&mut tx, &mut member, entry, now).await?;
            }

            tx.commit().await?;
            Ok(CancelReceipt {
                booking,
                refund_rate: rate,
                refund_percent: rate.percent(),
                refund_amount: refund,
                balance: member.balance,
            })
        })
        .await?;

        info!(
            booking_id,
            member = %member_id,
            refund = %receipt.refund_amount,
            percent = receipt.refund_percent,
            "booking cancelled"
        );
        self.notifier
            .emit(
                NotificationEvent::new(
                    member_id,
                    format!(
                        "Booking #{} cancelled, refunded {} ({}%)",
                        booking_id, receipt.refund_amount, receipt.refund_percent
                    ),
                    Severity::Info,
                )
                .with_link(booking_link(booking_id))
                .at(now),
            )
            .await;
        Ok(receipt)
    }

    pub async fn get(&self, booking_id: i64) -> Result<Booking, AppError> {
        let mut conn = self.repo.acquire().await?;
        bookings::get(&mut conn, booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("booking", booking_id))
    }

    pub async fn for_member(&self, member_id: &MemberId) -> Result<Vec<Booking>, AppError> {
        let mut conn = self.repo.acquire().await?;
        Ok(bookings::list_for_member(&mut conn, member_id, MEMBER_BOOKINGS_LIMIT).await?)
    }

    /// Slot-holding bookings fully inside `[from, to]`.
    pub async fn calendar(
        &self,
        court_id: Option<i64>,
        from: TimeMs,
        to: TimeMs,
    ) -> Result<Vec<Booking>, AppError> {
        if to < from {
            return Err(AppError::Validation("'to' must not be before 'from'".into()));
        }
        let mut conn = self.repo.acquire().await?;
        Ok(bookings::calendar(&mut conn, court_id, from, to).await?)
    }

    /// Cancel holds older than the expiry. Each cancel is a conditional update,
    /// so a hold confirmed or cancelled meanwhile is left alone and reruns are no-ops.
    pub async fn expire_holds(&self, now: TimeMs) -> Result<Vec<Booking>, AppError> {
        let expiry_ms = i64::try_from(self.hold_expiry.as_millis()).unwrap_or(i64::MAX);
        let cutoff = TimeMs::new(now.as_ms().saturating_sub(expiry_ms));

        let stale = {
            let mut conn = self.repo.acquire().await?;
            bookings::stale_holds(&mut conn, cutoff).await?
        };

        let mut expired = Vec::new();
        for hold in stale {
            let cancelled = retry_busy("expire_hold", || async {
                let mut conn = self.repo.acquire().await?;
                Ok(bookings::transition(
                    &mut conn,
                    hold.id,
                    BookingStatus::PendingPayment,
                    BookingStatus::Cancelled,
                )
                .await?)
            })
            .await?;
            if cancelled {
                info!(booking_id = hold.id, member = %hold.member_id, "expired unpaid hold");
                expired.push(Booking {
                    status: BookingStatus::Cancelled,
                    ..hold
                });
            }
        }

        let events = expired
            .iter()
            .map(|booking| {
                NotificationEvent::new(
                    &booking.member_id,
                    format!("Hold on booking #{} expired without payment", booking.id),
                    Severity::Warning,
                )
                .with_link(booking_link(booking.id))
                .at(now)
            })
            .collect();
        self.notifier.emit_all(events).await;
        Ok(expired)
    }
}

async fn owned_booking(
    conn: &mut SqliteConnection,
    member_id: &MemberId,
    booking_id: i64,
) -> Result<Booking, AppError> {
    let booking = bookings::get(conn, booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("booking", booking_id))?;
    if &booking.member_id != member_id {
        return Err(AppError::Unauthorized(format!(
            "booking {} belongs to another member",
            booking_id
        )));
    }
    Ok(booking)
}

//! Recurring bookings: one weekday rule expanded into a batch paid by a single entry.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::info;

use super::bookings::{bookable, booking_link, charge, insert_booking, price_for};
use super::retry::retry_busy;
use super::wallet::{ensure_funds, lock_member};
use crate::db::repo::bookings;
use crate::db::Repository;
use crate::domain::{
    Booking, BookingStatus, Interval, MemberId, Money, NewBooking, NotificationEvent, Severity,
    TimeMs,
};
use crate::engine::{RecurrenceRule, MAX_OCCURRENCES};
use crate::error::AppError;
use crate::notify::Notifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringRequest {
    pub court_id: i64,
    pub rule: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringReceipt {
    pub created_count: usize,
    pub bookings: Vec<Booking>,
    pub skipped_dates: Vec<NaiveDate>,
    pub total_price: Money,
    pub balance: Money,
}

#[derive(Clone)]
pub struct RecurringService {
    repo: Repository,
    notifier: Notifier,
}

impl RecurringService {
    pub fn new(repo: Repository, notifier: Notifier) -> Self {
        RecurringService { repo, notifier }
    }

    /// Book every matching date that is free; conflicting dates are skipped
    /// and reported. The whole batch is charged as one Payment.
    pub async fn create(
        &self,
        member_id: &MemberId,
        request: &RecurringRequest,
        now: TimeMs,
    ) -> Result<RecurringReceipt, AppError> {
        let rule = RecurrenceRule::parse(&request.rule)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if request.to < request.from {
            return Err(AppError::Validation(
                "date range ends before it starts".into(),
            ));
        }
        if request.end_time <= request.start_time {
            return Err(AppError::Validation(
                "end time must be after start time".into(),
            ));
        }
        let dates = rule.expand(request.from, request.to, MAX_OCCURRENCES);
        let rule_text = request.rule.trim().to_string();

        let receipt = retry_busy("create_recurring", || async {
            let mut tx = self.repo.begin().await?;
            let mut member = lock_member(&mut tx, member_id).await?;
            if !member.tier.can_book_recurring() {
                return Err(AppError::TierNotEligible(member.tier));
            }
            let court = bookable(&mut tx, &member, request.court_id).await?;

            let mut free = Vec::new();
            let mut skipped = Vec::new();
            for date in &dates {
                let interval = Interval::new(
                    TimeMs::at(*date, request.start_time),
                    TimeMs::at(*date, request.end_time),
                )
                .map_err(|e| AppError::Validation(e.to_string()))?;
                if bookings::find_overlapping(&mut tx, request.court_id, &interval)
                    .await?
                    .is_empty()
                {
                    free.push(interval);
                } else {
                    skipped.push(*date);
                }
            }
            if free.is_empty() {
                return Err(AppError::NoAvailableSlots { skipped });
            }

            let prices = free
                .iter()
                .map(|interval| price_for(interval, &court))
                .collect::<Result<Vec<Money>, _>>()?;
            let total = prices
                .iter()
                .try_fold(Money::zero(), |acc, p| acc.checked_add(*p))
                .ok_or_else(|| AppError::Validation("booking price is out of range".to_string()))?;
            ensure_funds(&member, total)?;

            let mut created: Vec<Booking> = Vec::with_capacity(free.len());
            for (interval, price) in free.into_iter().zip(prices) {
                let booking = insert_booking(
                    &mut tx,
                    &NewBooking {
                        court_id: request.court_id,
                        member_id: member_id.clone(),
                        interval,
                        total_price: price,
                        status: BookingStatus::Confirmed,
                        recurrence_rule: Some(rule_text.clone()),
                        parent_booking_id: created.first().map(|b| b.id),
                    },
                    now,
                )
                .await?;
                created.push(booking);
            }

            let ids: Vec<i64> = created.iter().map(|b| b.id).collect();
            let payment_id = charge(
                &mut tx,
                &mut member,
                total,
                &ids,
                format!(
                    "Recurring booking on {} ({}), {} sessions",
                    court.name,
                    rule_text,
                    ids.len()
                ),
                now,
            )
            .await?;
            for booking in &mut created {
                booking.transaction_id = payment_id;
            }

            tx.commit().await?;
            Ok(RecurringReceipt {
                created_count: created.len(),
                bookings: created,
                skipped_dates: skipped,
                total_price: total,
                balance: member.balance,
            })
        })
        .await?;

        info!(
            member = %member_id,
            court_id = request.court_id,
            created = receipt.created_count,
            skipped = receipt.skipped_dates.len(),
            total = %receipt.total_price,
            "recurring booking created"
        );
        if let Some(first) = receipt.bookings.first() {
            self.notifier
                .emit(
                    NotificationEvent::new(
                        member_id,
                        format!(
                            "{} recurring sessions booked, {} dates skipped",
                            receipt.created_count,
                            receipt.skipped_dates.len()
                        ),
                        Severity::Success,
                    )
                    .with_link(booking_link(first.id))
                    .at(now),
                )
                .await;
        }
        Ok(receipt)
    }
}

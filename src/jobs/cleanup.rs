//! Expiry of unpaid payment holds.

use anyhow::Context;
use async_trait::async_trait;

use super::PeriodicJob;
use crate::domain::TimeMs;
use crate::orchestration::BookingService;

pub struct HoldCleanupJob {
    bookings: BookingService,
}

impl HoldCleanupJob {
    pub fn new(bookings: BookingService) -> Self {
        HoldCleanupJob { bookings }
    }
}

#[async_trait]
impl PeriodicJob for HoldCleanupJob {
    fn name(&self) -> &'static str {
        "hold_cleanup"
    }

    async fn tick(&self, now: TimeMs) -> anyhow::Result<usize> {
        let expired = self
            .bookings
            .expire_holds(now)
            .await
            .context("expiring unpaid holds")?;
        Ok(expired.len())
    }
}

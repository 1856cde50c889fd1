//! Background jobs on their own timers.
//!
//! Jobs share nothing in memory with request handlers; they go through the
//! same repository operations. A failed tick is logged and the next tick runs
//! as scheduled.

use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::domain::TimeMs;

pub mod cleanup;
pub mod reminders;

pub use cleanup::HoldCleanupJob;
pub use reminders::ReminderJob;

#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// One pass at `now`; returns how many items it acted on.
    async fn tick(&self, now: TimeMs) -> anyhow::Result<usize>;
}

/// Run `job` every `period` until the runtime shuts down.
pub fn spawn<J: PeriodicJob>(job: J, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(job = job.name(), period_secs = period.as_secs(), "starting background job");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match job.tick(TimeMs::now()).await {
                Ok(0) => debug!(job = job.name(), "nothing to do"),
                Ok(n) => info!(job = job.name(), handled = n, "job tick complete"),
                Err(e) => error!(job = job.name(), error = %e, "job tick failed"),
            }
        }
    })
}

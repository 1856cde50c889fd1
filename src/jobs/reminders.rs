//! Day-ahead reminders for confirmed bookings and scheduled matches.
//!
//! Anything starting between 23h and 24h from now gets one reminder per
//! receiver. A receiver who already got a reminder with the same link in the
//! last 24h is skipped, so overlapping ticks and restarts do not repeat.

use anyhow::Context;
use async_trait::async_trait;
use tracing::warn;

use super::PeriodicJob;
use crate::db::repo::{bookings, matches, notifications};
use crate::db::Repository;
use crate::domain::{MemberId, NotificationEvent, Severity, TimeMs};
use crate::notify::Notifier;

const WINDOW_START_HOURS: i64 = 23;
const WINDOW_END_HOURS: i64 = 24;
const DEDUPE_HOURS: i64 = 24;
const PREFIX: &str = "Reminder:";

pub struct ReminderJob {
    repo: Repository,
    notifier: Notifier,
}

struct Reminder {
    receiver: MemberId,
    message: String,
    link: String,
}

impl ReminderJob {
    pub fn new(repo: Repository, notifier: Notifier) -> Self {
        ReminderJob { repo, notifier }
    }

    async fn due(&self, now: TimeMs) -> anyhow::Result<Vec<Reminder>> {
        let from = now.plus_hours(WINDOW_START_HOURS);
        let to = now.plus_hours(WINDOW_END_HOURS);
        let mut conn = self.repo.acquire().await.context("acquiring connection")?;

        let mut due = Vec::new();
        for booking in bookings::confirmed_starting_between(&mut conn, from, to)
            .await
            .context("loading upcoming bookings")?
        {
            due.push(Reminder {
                message: format!(
                    "{} your booking #{} starts at {}",
                    PREFIX,
                    booking.id,
                    booking.interval.start()
                ),
                link: format!("/bookings/{}", booking.id),
                receiver: booking.member_id,
            });
        }

        let games = matches::scheduled_between(
            &mut conn,
            from.to_datetime().date_naive(),
            to.to_datetime().date_naive(),
        )
        .await
        .context("loading upcoming matches")?;
        for game in games {
            let starts = TimeMs::at(game.date, game.start_time);
            if starts < from || starts > to {
                continue;
            }
            let label = game.round_name.as_deref().unwrap_or("Match");
            for player in game.team1.players().chain(game.team2.players()) {
                due.push(Reminder {
                    receiver: player.clone(),
                    message: format!("{} {} #{} starts at {}", PREFIX, label, game.id, starts),
                    link: format!("/matches/{}", game.id),
                });
            }
        }
        Ok(due)
    }
}

#[async_trait]
impl PeriodicJob for ReminderJob {
    fn name(&self) -> &'static str {
        "reminders"
    }

    async fn tick(&self, now: TimeMs) -> anyhow::Result<usize> {
        let since = now.plus_hours(-DEDUPE_HOURS);
        let mut sent = 0;

        for reminder in self.due(now).await? {
            let already = {
                let mut conn = self.repo.acquire().await.context("acquiring connection")?;
                notifications::sent_since(&mut conn, &reminder.receiver, &reminder.link, PREFIX, since)
                    .await
            };
            match already {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!(member = %reminder.receiver, link = %reminder.link, error = %e, "reminder check failed");
                    continue;
                }
            }

            self.notifier
                .emit(
                    NotificationEvent::new(&reminder.receiver, reminder.message, Severity::Info)
                        .with_link(reminder.link)
                        .at(now),
                )
                .await;
            sent += 1;
        }
        Ok(sent)
    }
}

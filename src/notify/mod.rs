//! Notification delivery.
//!
//! Every event is persisted to the `notifications` table and then pushed to a
//! [`NotificationChannel`]. Both steps happen after the triggering transaction
//! has committed; failures are logged and never surface to the caller.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::repo::notifications;
use crate::db::Repository;
use crate::domain::{MemberId, Notification, NotificationEvent};
use crate::error::AppError;

pub const INBOX_LIMIT: i64 = 50;

pub mod broadcast;
pub mod recording;

pub use broadcast::BroadcastChannel;
pub use recording::RecordingChannel;

/// Transport for live delivery of notification events.
#[async_trait]
pub trait NotificationChannel: Send + Sync + fmt::Debug {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), ChannelError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Nobody is listening for this member right now.
    #[error("no subscribers")]
    NoSubscribers,
    /// The transport refused the event.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Persists and pushes events.
#[derive(Clone)]
pub struct Notifier {
    repo: Repository,
    channel: Arc<dyn NotificationChannel>,
}

impl Notifier {
    pub fn new(repo: Repository, channel: Arc<dyn NotificationChannel>) -> Self {
        Notifier { repo, channel }
    }

    pub async fn emit(&self, event: NotificationEvent) {
        match self.repo.acquire().await {
            Ok(mut conn) => {
                if let Err(e) = notifications::insert(&mut conn, &event).await {
                    warn!(
                        member = %event.target_member_id,
                        error = %e,
                        "failed to persist notification"
                    );
                }
            }
            Err(e) => warn!(error = %e, "no connection for notification"),
        }

        match self.channel.deliver(&event).await {
            Ok(()) => {}
            Err(ChannelError::NoSubscribers) => {
                debug!(member = %event.target_member_id, "notification not pushed, nobody listening");
            }
            Err(e) => warn!(
                member = %event.target_member_id,
                error = %e,
                "notification push failed"
            ),
        }
    }

    pub async fn emit_all(&self, events: Vec<NotificationEvent>) {
        for event in events {
            self.emit(event).await;
        }
    }

    /// Newest first, at most [`INBOX_LIMIT`].
    pub async fn inbox(
        &self,
        member_id: &MemberId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let mut conn = self.repo.acquire().await?;
        Ok(notifications::list_for_member(&mut conn, member_id, unread_only, INBOX_LIMIT).await?)
    }

    pub async fn unread_count(&self, member_id: &MemberId) -> Result<i64, AppError> {
        let mut conn = self.repo.acquire().await?;
        Ok(notifications::count_unread(&mut conn, member_id).await?)
    }

    /// Someone else's notification reads as missing.
    pub async fn mark_read(&self, member_id: &MemberId, id: i64) -> Result<(), AppError> {
        let mut conn = self.repo.acquire().await?;
        if !notifications::mark_read(&mut conn, id, member_id).await? {
            return Err(AppError::not_found("notification", id));
        }
        Ok(())
    }
}

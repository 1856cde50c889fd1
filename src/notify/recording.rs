//! Channel that keeps delivered events in memory.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{ChannelError, NotificationChannel};
use crate::domain::NotificationEvent;

/// Records every delivered event; optionally refuses them all.
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    events: Arc<Mutex<Vec<NotificationEvent>>>,
    failing: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose every delivery fails.
    pub fn failing() -> Self {
        RecordingChannel {
            events: Arc::default(),
            failing: true,
        }
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), ChannelError> {
        if self.failing {
            return Err(ChannelError::Rejected("recording channel set to fail".to_string()));
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberId, Severity};

    fn event() -> NotificationEvent {
        NotificationEvent::new(&MemberId::new("ann"), "hello", Severity::Info)
    }

    #[test]
    fn test_records_in_order() {
        let channel = RecordingChannel::new();
        let clone = channel.clone();
        tokio_test::block_on(async {
            clone.deliver(&event()).await.unwrap();
            clone
                .deliver(&event().with_link("/wallet"))
                .await
                .unwrap();
        });
        let events = channel.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].link.as_deref(), Some("/wallet"));
    }

    #[test]
    fn test_failing_channel_keeps_nothing() {
        let channel = RecordingChannel::failing();
        let result = tokio_test::block_on(channel.deliver(&event()));
        assert!(matches!(result, Err(ChannelError::Rejected(_))));
        assert!(channel.events().is_empty());
    }
}

//! In-process fan-out to live subscribers.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{ChannelError, NotificationChannel};
use crate::domain::NotificationEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Pushes every event onto a tokio broadcast channel; subscribers filter by member.
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    sender: broadcast::Sender<NotificationEvent>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        BroadcastChannel { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl NotificationChannel for BroadcastChannel {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), ChannelError> {
        self.sender
            .send(event.clone())
            .map(|_| ())
            .map_err(|_| ChannelError::NoSubscribers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberId, Severity};

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let channel = BroadcastChannel::new(4);
        let event = NotificationEvent::new(&MemberId::new("m1"), "hello", Severity::Info);

        assert_eq!(channel.deliver(&event).await, Err(ChannelError::NoSubscribers));

        let mut rx = channel.subscribe();
        channel.deliver(&event).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), event);
    }
}

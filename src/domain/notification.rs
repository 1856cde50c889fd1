//! Member-facing notifications.

use serde::{Deserialize, Serialize};

use super::primitives::closed_enum;
use super::{MemberId, TimeMs};

closed_enum! {
    Severity, "severity" {
        Info => "info",
        Success => "success",
        Warning => "warning",
        Error => "error",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub receiver_id: MemberId,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: TimeMs,
}

/// Event emitted by the core; persisted and pushed fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub target_member_id: MemberId,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub timestamp: TimeMs,
}

impl NotificationEvent {
    pub fn new(target: &MemberId, message: impl Into<String>, severity: Severity) -> Self {
        NotificationEvent {
            target_member_id: target.clone(),
            message: message.into(),
            severity,
            link: None,
            timestamp: TimeMs::now(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn at(mut self, timestamp: TimeMs) -> Self {
        self.timestamp = timestamp;
        self
    }
}

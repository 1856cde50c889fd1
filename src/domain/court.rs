//! Bookable courts.

use serde::{Deserialize, Serialize};

use super::Money;

/// A court; deactivated courts stay in the table because bookings reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Court {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub hourly_price: Money,
    pub is_active: bool,
}

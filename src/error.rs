use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::domain::{Money, Tier};

/// Coarse error classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Conflict,
    InsufficientFunds,
    TierNotEligible,
    Validation,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::TierNotEligible => "tier_not_eligible",
            ErrorKind::Validation => "validation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Court {court_id} is already booked between {start_ms} and {end_ms}")]
    SlotConflict {
        court_id: i64,
        start_ms: i64,
        end_ms: i64,
    },
    #[error("Member is already registered for tournament {0}")]
    DuplicateParticipant(i64),
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Money, available: Money },
    #[error("Tier {0} is not eligible for recurring bookings")]
    TierNotEligible(Tier),
    #[error("No available slots; skipped dates: {}", format_dates(.skipped))]
    NoAvailableSlots { skipped: Vec<NaiveDate> },
    #[error("At least 2 participants are required, found {0}")]
    InsufficientParticipants(usize),
    #[error("Final match is not ready: {0}")]
    FinalNotReady(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

fn format_dates(dates: &[NaiveDate]) -> String {
    if dates.is_empty() {
        return "none".to_string();
    }
    dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) | AppError::Internal(_) | AppError::Db(_) => ErrorKind::Internal,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidState(_) | AppError::FinalNotReady(_) => ErrorKind::InvalidState,
            AppError::InsufficientParticipants(_) => ErrorKind::InvalidState,
            AppError::SlotConflict { .. }
            | AppError::DuplicateParticipant(_)
            | AppError::NoAvailableSlots { .. } => ErrorKind::Conflict,
            AppError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            AppError::TierNotEligible(_) => ErrorKind::TierNotEligible,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
        }
    }

    /// True when SQLite refused the write because another writer holds the lock.
    pub fn is_busy(&self) -> bool {
        match self {
            AppError::Db(sqlx::Error::Database(db)) => {
                let code = db.code();
                matches!(code.as_deref(), Some("5") | Some("6") | Some("517"))
                    || db.message().contains("database is locked")
            }
            AppError::Db(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {}", what, id))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::TierNotEligible => StatusCode::FORBIDDEN,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = json!({
            "error": self.to_string(),
            "kind": kind.as_str(),
        });
        if let AppError::NoAvailableSlots { skipped } = &self {
            body["skippedDates"] = json!(skipped
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_mapping() {
        assert_eq!(
            AppError::SlotConflict {
                court_id: 1,
                start_ms: 0,
                end_ms: 1
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::FinalNotReady("x".into()).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            AppError::TierNotEligible(Tier::Silver).kind(),
            ErrorKind::TierNotEligible
        );
        assert_eq!(
            AppError::Internal("boom".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_no_available_slots_lists_dates() {
        let err = AppError::NoAvailableSlots {
            skipped: vec![
                NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "No available slots; skipped dates: 2026-01-05, 2026-01-07"
        );
    }

    #[tokio::test]
    async fn test_response_status_codes() {
        let resp = AppError::InsufficientFunds {
            required: Money::from_cents(1000),
            available: Money::zero(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

        let resp = AppError::Unauthorized("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = AppError::not_found("booking", 7).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

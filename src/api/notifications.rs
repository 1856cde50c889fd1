use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::identity::Caller;
use crate::api::AppState;
use crate::domain::Notification;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications(
    caller: Caller,
    Query(params): Query<InboxQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .notifier
            .inbox(&caller.member_id, params.unread_only)
            .await?,
    ))
}

pub async fn unread_count(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let count = state
        .orchestrator
        .notifier
        .unread_count(&caller.member_id)
        .await?;
    Ok(Json(serde_json::json!({ "unread": count })))
}

pub async fn mark_read(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state
        .orchestrator
        .notifier
        .mark_read(&caller.member_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

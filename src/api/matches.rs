use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::api::identity::Caller;
use crate::api::AppState;
use crate::domain::{Match, MemberId, TimeMs};
use crate::error::AppError;
use crate::orchestration::{DuelRequest, ResultSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesQuery {
    pub tournament_id: Option<i64>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRequest {
    pub score1: i32,
    pub score2: i32,
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelBody {
    pub opponent_id: String,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
}

pub async fn list_matches(
    Query(params): Query<MatchesQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Match>>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .matches
            .list(params.tournament_id, params.status.as_deref(), params.limit)
            .await?,
    ))
}

pub async fn my_matches(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<Match>>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .matches
            .for_member(&caller.member_id)
            .await?,
    ))
}

pub async fn get_match(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Match>, AppError> {
    Ok(Json(state.orchestrator.matches.get(id).await?))
}

pub async fn update_result(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<ResultRequest>,
) -> Result<Json<ResultSummary>, AppError> {
    if !caller.can_referee() {
        return Err(AppError::Unauthorized(
            "referee or admin role required".into(),
        ));
    }
    Ok(Json(
        state
            .orchestrator
            .matches
            .update_result(id, body.score1, body.score2, body.details.as_deref())
            .await?,
    ))
}

pub async fn create_duel(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<DuelBody>,
) -> Result<(StatusCode, Json<Match>), AppError> {
    let request = DuelRequest {
        opponent: MemberId::new(body.opponent_id),
        date: body.date,
        start_time: body.start_time,
    };
    let duel = state
        .orchestrator
        .matches
        .create_duel(&caller.member_id, &request, TimeMs::now())
        .await?;
    Ok((StatusCode::CREATED, Json(duel)))
}

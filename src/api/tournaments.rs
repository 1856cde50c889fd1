use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::identity::Caller;
use crate::api::AppState;
use crate::db::repo::tournaments::NewTournament;
use crate::domain::{Money, Participant, TimeMs, Tournament, TournamentFormat};
use crate::error::AppError;
use crate::orchestration::{FinishSummary, ScheduleSummary, TournamentDetail};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub format: String,
    #[serde(default)]
    pub entry_fee: Money,
    #[serde(default)]
    pub prize_pool: Money,
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct TournamentsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub team_name: Option<String>,
}

pub async fn create_tournament(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<Tournament>), AppError> {
    caller.require_admin()?;
    let format =
        TournamentFormat::from_str(&body.format).map_err(|e| AppError::Validation(e.to_string()))?;

    let tournament = state
        .orchestrator
        .tournaments
        .create(
            NewTournament {
                name: body.name,
                start_date: body.start_date,
                end_date: body.end_date,
                format,
                entry_fee: body.entry_fee,
                prize_pool: body.prize_pool,
                settings: body.settings.map(|s| s.to_string()),
            },
            TimeMs::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(tournament)))
}

pub async fn list_tournaments(
    Query(params): Query<TournamentsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Tournament>>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .tournaments
            .list(params.status.as_deref())
            .await?,
    ))
}

pub async fn get_tournament(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<TournamentDetail>, AppError> {
    Ok(Json(state.orchestrator.tournaments.detail(id).await?))
}

pub async fn join_tournament(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    body: Option<Json<JoinRequest>>,
) -> Result<(StatusCode, Json<Participant>), AppError> {
    let team_name = body.and_then(|Json(b)| b.team_name);
    let participant = state
        .orchestrator
        .tournaments
        .join(&caller.member_id, id, team_name.as_deref(), TimeMs::now())
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn generate_schedule(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ScheduleSummary>, AppError> {
    caller.require_admin()?;
    let mut rng = StdRng::from_entropy();
    Ok(Json(
        state
            .orchestrator
            .tournaments
            .generate_schedule(id, &mut rng, TimeMs::now())
            .await?,
    ))
}

pub async fn finish_tournament(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<FinishSummary>, AppError> {
    caller.require_admin()?;
    Ok(Json(
        state
            .orchestrator
            .tournaments
            .finish(id, TimeMs::now())
            .await?,
    ))
}

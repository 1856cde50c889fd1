//! Members and courts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::identity::Caller;
use crate::api::AppState;
use crate::domain::{Court, Member, MemberId, Money, TimeMs, Tier};
use crate::error::AppError;
use crate::orchestration::{CourtUpdate, NewMember};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub id: Option<String>,
    pub full_name: String,
    pub tier: Option<String>,
}

pub async fn create_member(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    caller.require_admin()?;
    let tier = body
        .tier
        .as_deref()
        .map(Tier::from_str)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?
        .unwrap_or(Tier::Standard);

    let member = state
        .orchestrator
        .club
        .create_member(
            NewMember {
                id: body.id.map(MemberId::new),
                full_name: body.full_name,
                tier,
            },
            TimeMs::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn me(caller: Caller, State(state): State<AppState>) -> Result<Json<Member>, AppError> {
    Ok(Json(state.orchestrator.club.member(&caller.member_id).await?))
}

pub async fn get_member(
    _caller: Caller,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Member>, AppError> {
    Ok(Json(state.orchestrator.club.member(&MemberId::new(id)).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourtRequest {
    pub name: String,
    pub description: Option<String>,
    pub hourly_price: Money,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourtRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hourly_price: Option<Money>,
}

pub async fn list_courts(
    Query(params): Query<CourtsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Court>>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .club
            .courts(params.include_inactive)
            .await?,
    ))
}

pub async fn get_court(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Court>, AppError> {
    Ok(Json(state.orchestrator.club.court(id).await?))
}

pub async fn create_court(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<CreateCourtRequest>,
) -> Result<(StatusCode, Json<Court>), AppError> {
    caller.require_admin()?;
    let court = state
        .orchestrator
        .club
        .create_court(&body.name, body.description.as_deref(), body.hourly_price)
        .await?;
    Ok((StatusCode::CREATED, Json(court)))
}

pub async fn update_court(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCourtRequest>,
) -> Result<Json<Court>, AppError> {
    caller.require_admin()?;
    let court = state
        .orchestrator
        .club
        .update_court(
            id,
            CourtUpdate {
                name: body.name,
                description: body.description,
                hourly_price: body.hourly_price,
            },
        )
        .await?;
    Ok(Json(court))
}

pub async fn deactivate_court(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Court>, AppError> {
    caller.require_admin()?;
    Ok(Json(state.orchestrator.club.deactivate_court(id).await?))
}

//! Wallet, deposits, and the payment gateway callback.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::identity::Caller;
use crate::api::AppState;
use crate::domain::{LedgerTransaction, Money, TimeMs};
use crate::error::AppError;
use crate::orchestration::{GatewayOutcome, TransactionPage, WalletInfo};
use crate::payment::GatewayCallback;

const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub amount: Money,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn wallet(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<WalletInfo>, AppError> {
    Ok(Json(state.orchestrator.wallet.info(&caller.member_id).await?))
}

pub async fn transactions(
    caller: Caller,
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransactionPage>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .wallet
            .history(
                &caller.member_id,
                params.page.unwrap_or(1),
                params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            )
            .await?,
    ))
}

pub async fn request_deposit(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<DepositRequest>,
) -> Result<(StatusCode, Json<LedgerTransaction>), AppError> {
    let transaction = state
        .orchestrator
        .wallet
        .request_deposit(&caller.member_id, body.amount, body.note, TimeMs::now())
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn approve_deposit(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LedgerTransaction>, AppError> {
    caller.require_admin()?;
    Ok(Json(
        state
            .orchestrator
            .wallet
            .approve_deposit(id, TimeMs::now())
            .await?,
    ))
}

pub async fn reject_deposit(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<LedgerTransaction>, AppError> {
    caller.require_admin()?;
    Ok(Json(
        state
            .orchestrator
            .wallet
            .reject_deposit(id, body.reason, TimeMs::now())
            .await?,
    ))
}

/// Called by the gateway, not a member; the signature is the credential.
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(callback): Json<GatewayCallback>,
) -> Result<Json<GatewayOutcome>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .wallet
            .gateway_callback(&callback, TimeMs::now())
            .await?,
    ))
}

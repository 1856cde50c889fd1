//! Court bookings, holds, recurring batches, and the calendar.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::api::identity::Caller;
use crate::api::AppState;
use crate::domain::{Booking, Interval, TimeMs};
use crate::error::AppError;
use crate::orchestration::{BookingReceipt, CancelReceipt, RecurringReceipt, RecurringRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub court_id: i64,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl BookingRequest {
    fn interval(&self) -> Result<Interval, AppError> {
        Interval::new(TimeMs::new(self.start_ms), TimeMs::new(self.end_ms))
            .map_err(|e| AppError::Validation(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringBody {
    pub court_id: i64,
    pub rule: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
    pub court_id: Option<i64>,
    pub from_ms: i64,
    pub to_ms: i64,
}

pub async fn create_booking(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let receipt = state
        .orchestrator
        .bookings
        .create(&caller.member_id, body.court_id, body.interval()?, TimeMs::now())
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn hold_booking(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .orchestrator
        .bookings
        .hold(&caller.member_id, body.court_id, body.interval()?, TimeMs::now())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn confirm_hold(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<BookingReceipt>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .bookings
            .confirm_hold(&caller.member_id, id, TimeMs::now())
            .await?,
    ))
}

pub async fn cancel_booking(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CancelReceipt>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .bookings
            .cancel(&caller.member_id, id, TimeMs::now())
            .await?,
    ))
}

pub async fn create_recurring(
    caller: Caller,
    State(state): State<AppState>,
    Json(body): Json<RecurringBody>,
) -> Result<(StatusCode, Json<RecurringReceipt>), AppError> {
    let request = RecurringRequest {
        court_id: body.court_id,
        rule: body.rule,
        from: body.from_date,
        to: body.to_date,
        start_time: body.start_time,
        end_time: body.end_time,
    };
    let receipt = state
        .orchestrator
        .recurring
        .create(&caller.member_id, &request, TimeMs::now())
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn my_bookings(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .bookings
            .for_member(&caller.member_id)
            .await?,
    ))
}

/// Owners and admins only.
pub async fn get_booking(
    caller: Caller,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.orchestrator.bookings.get(id).await?;
    if booking.member_id != caller.member_id && !caller.is_admin() {
        return Err(AppError::Unauthorized(format!(
            "booking {} belongs to another member",
            id
        )));
    }
    Ok(Json(booking))
}

pub async fn calendar(
    Query(params): Query<CalendarQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(
        state
            .orchestrator
            .bookings
            .calendar(
                params.court_id,
                TimeMs::new(params.from_ms),
                TimeMs::new(params.to_ms),
            )
            .await?,
    ))
}

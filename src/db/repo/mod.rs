//! Repository layer for database operations.
//!
//! Table operations are free functions over a `SqliteConnection` so the same
//! call works on a pooled connection or inside an open transaction
//! (`&mut *tx`). Submodules are organized by table:
//! - `members.rs` - member rows, balances, and the write-lock touch
//! - `ledger.rs` - wallet transactions
//! - `courts.rs` - courts
//! - `bookings.rs` - bookings and the overlap query
//! - `tournaments.rs` - tournaments and participants
//! - `matches.rs` - matches and results
//! - `notifications.rs` - persisted notifications

pub mod bookings;
pub mod courts;
pub mod ledger;
pub mod matches;
pub mod members;
pub mod notifications;
pub mod tournaments;

use chrono::{NaiveDate, NaiveTime};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::str::FromStr;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";

/// Owns the pool; hands out connections and transactions to the services.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }
}

fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Read a TEXT column and parse it; bad values surface as decode errors.
pub(crate) fn parse_column<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(decode_error)
}

pub(crate) fn parse_optional<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| s.parse::<T>().map_err(decode_error))
        .transpose()
}

pub(crate) fn parse_date(row: &SqliteRow, column: &str) -> Result<NaiveDate, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(decode_error)
}

pub(crate) fn parse_time(row: &SqliteRow, column: &str) -> Result<NaiveTime, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(decode_error)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

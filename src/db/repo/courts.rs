//! Court rows. Courts are deactivated, never deleted.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::parse_column;
use crate::domain::{Court, Money};

fn from_row(row: &SqliteRow) -> Result<Court, sqlx::Error> {
    Ok(Court {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        hourly_price: parse_column(row, "hourly_price")?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
    })
}

pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
    hourly_price: Money,
) -> Result<Court, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO courts (name, description, hourly_price, is_active) VALUES (?, ?, ?, 1)",
    )
    .bind(name)
    .bind(description)
    .bind(hourly_price.to_canonical_string())
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Court {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        hourly_price,
        is_active: true,
    })
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Court>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, name, description, hourly_price, is_active FROM courts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn list(
    conn: &mut SqliteConnection,
    include_inactive: bool,
) -> Result<Vec<Court>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, description, hourly_price, is_active FROM courts
        WHERE is_active = 1 OR ?
        ORDER BY id
        "#,
    )
    .bind(include_inactive)
    .fetch_all(conn)
    .await?;
    rows.iter().map(from_row).collect()
}

pub async fn update(conn: &mut SqliteConnection, court: &Court) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE courts SET name = ?, description = ?, hourly_price = ?, is_active = ? WHERE id = ?",
    )
    .bind(&court.name)
    .bind(court.description.as_deref())
    .bind(court.hourly_price.to_canonical_string())
    .bind(court.is_active as i64)
    .bind(court.id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

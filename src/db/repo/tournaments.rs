//! Tournament and participant rows.

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{format_date, parse_column, parse_date};
use crate::domain::{
    MemberId, Money, Participant, TimeMs, Tournament, TournamentFormat, TournamentStatus,
};

const COLUMNS: &str =
    "id, name, start_date, end_date, format, entry_fee, prize_pool, status, settings";

fn from_row(row: &SqliteRow) -> Result<Tournament, sqlx::Error> {
    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        start_date: parse_date(row, "start_date")?,
        end_date: parse_date(row, "end_date")?,
        format: parse_column(row, "format")?,
        entry_fee: parse_column(row, "entry_fee")?,
        prize_pool: parse_column(row, "prize_pool")?,
        status: parse_column(row, "status")?,
        settings: row.try_get("settings")?,
    })
}

fn participant_from_row(row: &SqliteRow) -> Result<Participant, sqlx::Error> {
    Ok(Participant {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        member_id: MemberId::new(row.try_get::<String, _>("member_id")?),
        team_name: row.try_get("team_name")?,
        paid: row.try_get::<i64, _>("paid")? != 0,
        registered_at: TimeMs::new(row.try_get("registered_at")?),
    })
}

/// Fields of a tournament about to be created; it starts Open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTournament {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub format: TournamentFormat,
    pub entry_fee: Money,
    pub prize_pool: Money,
    pub settings: Option<String>,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewTournament,
    now: TimeMs,
) -> Result<Tournament, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO tournaments (name, start_date, end_date, format, entry_fee, prize_pool, status, settings, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.name)
    .bind(format_date(new.start_date))
    .bind(format_date(new.end_date))
    .bind(new.format.as_str())
    .bind(new.entry_fee.to_canonical_string())
    .bind(new.prize_pool.to_canonical_string())
    .bind(TournamentStatus::Open.as_str())
    .bind(new.settings.as_deref())
    .bind(now.as_ms())
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Tournament {
        id,
        name: new.name.clone(),
        start_date: new.start_date,
        end_date: new.end_date,
        format: new.format,
        entry_fee: new.entry_fee,
        prize_pool: new.prize_pool,
        status: TournamentStatus::Open,
        settings: new.settings.clone(),
    })
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Tournament>, sqlx::Error> {
    let sql = format!("SELECT {} FROM tournaments WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(from_row).transpose()
}

/// Newest start date first, optionally restricted to one status.
pub async fn list(
    conn: &mut SqliteConnection,
    status: Option<TournamentStatus>,
) -> Result<Vec<Tournament>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM tournaments WHERE (? IS NULL OR status = ?) ORDER BY start_date DESC, id DESC",
        COLUMNS
    );
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: TournamentStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tournaments SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Finished is terminal: returns false if the tournament already was.
pub async fn mark_finished(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tournaments SET status = ? WHERE id = ? AND status <> ?")
        .bind(TournamentStatus::Finished.as_str())
        .bind(id)
        .bind(TournamentStatus::Finished.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_participant(
    conn: &mut SqliteConnection,
    tournament_id: i64,
    member_id: &MemberId,
    team_name: Option<&str>,
    paid: bool,
    now: TimeMs,
) -> Result<Participant, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO tournament_participants (tournament_id, member_id, team_name, paid, registered_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(tournament_id)
    .bind(member_id.as_str())
    .bind(team_name)
    .bind(paid as i64)
    .bind(now.as_ms())
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Participant {
        id,
        tournament_id,
        member_id: member_id.clone(),
        team_name: team_name.map(str::to_string),
        paid,
        registered_at: now,
    })
}

pub async fn is_participant(
    conn: &mut SqliteConnection,
    tournament_id: i64,
    member_id: &MemberId,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM tournament_participants WHERE tournament_id = ? AND member_id = ?",
    )
    .bind(tournament_id)
    .bind(member_id.as_str())
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// In registration order.
pub async fn participants(
    conn: &mut SqliteConnection,
    tournament_id: i64,
) -> Result<Vec<Participant>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, tournament_id, member_id, team_name, paid, registered_at
        FROM tournament_participants
        WHERE tournament_id = ?
        ORDER BY registered_at, id
        "#,
    )
    .bind(tournament_id)
    .fetch_all(conn)
    .await?;
    rows.iter().map(participant_from_row).collect()
}

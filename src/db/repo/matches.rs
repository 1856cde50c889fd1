//! Match rows.

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{format_date, format_time, parse_column, parse_date, parse_time};
use crate::domain::{Match, MatchStatus, MemberId, NewMatch, Team, TimeMs, WinningSide};

const COLUMNS: &str = "id, tournament_id, round_name, match_date, start_time, \
                       team1_player1, team1_player2, team2_player1, team2_player2, \
                       score1, score2, details, winner, is_ranked, status";

fn player(row: &SqliteRow, column: &str) -> Result<Option<MemberId>, sqlx::Error> {
    Ok(row.try_get::<Option<String>, _>(column)?.map(MemberId::new))
}

fn from_row(row: &SqliteRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        round_name: row.try_get("round_name")?,
        date: parse_date(row, "match_date")?,
        start_time: parse_time(row, "start_time")?,
        team1: Team {
            player1: player(row, "team1_player1")?,
            player2: player(row, "team1_player2")?,
        },
        team2: Team {
            player1: player(row, "team2_player1")?,
            player2: player(row, "team2_player2")?,
        },
        score1: row.try_get("score1")?,
        score2: row.try_get("score2")?,
        details: row.try_get("details")?,
        winner: parse_column(row, "winner")?,
        is_ranked: row.try_get::<i64, _>("is_ranked")? != 0,
        status: parse_column(row, "status")?,
    })
}

fn player_str(player: &Option<MemberId>) -> Option<&str> {
    player.as_ref().map(MemberId::as_str)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewMatch,
    now: TimeMs,
) -> Result<Match, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO matches (
            tournament_id, round_name, match_date, start_time,
            team1_player1, team1_player2, team2_player1, team2_player2,
            winner, is_ranked, status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.tournament_id)
    .bind(new.round_name.as_deref())
    .bind(format_date(new.date))
    .bind(format_time(new.start_time))
    .bind(player_str(&new.team1.player1))
    .bind(player_str(&new.team1.player2))
    .bind(player_str(&new.team2.player1))
    .bind(player_str(&new.team2.player2))
    .bind(WinningSide::None.as_str())
    .bind(new.is_ranked as i64)
    .bind(MatchStatus::Scheduled.as_str())
    .bind(now.as_ms())
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Match {
        id,
        tournament_id: new.tournament_id,
        round_name: new.round_name.clone(),
        date: new.date,
        start_time: new.start_time,
        team1: new.team1.clone(),
        team2: new.team2.clone(),
        score1: 0,
        score2: 0,
        details: None,
        winner: WinningSide::None,
        is_ranked: new.is_ranked,
        status: MatchStatus::Scheduled,
    })
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Match>, sqlx::Error> {
    let sql = format!("SELECT {} FROM matches WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(from_row).transpose()
}

/// Returns the number of matches removed.
pub async fn delete_for_tournament(
    conn: &mut SqliteConnection,
    tournament_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM matches WHERE tournament_id = ?")
        .bind(tournament_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Chronological.
pub async fn for_tournament(
    conn: &mut SqliteConnection,
    tournament_id: i64,
) -> Result<Vec<Match>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM matches WHERE tournament_id = ? ORDER BY match_date, start_time, id",
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(tournament_id)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Newest first, optionally filtered by tournament and status.
pub async fn list(
    conn: &mut SqliteConnection,
    tournament_id: Option<i64>,
    status: Option<MatchStatus>,
    limit: i64,
) -> Result<Vec<Match>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM matches
        WHERE (? IS NULL OR tournament_id = ?) AND (? IS NULL OR status = ?)
        ORDER BY match_date DESC, start_time DESC, id DESC
        LIMIT ?
        "#,
        COLUMNS
    );
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query(&sql)
        .bind(tournament_id)
        .bind(tournament_id)
        .bind(status)
        .bind(status)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn for_member(
    conn: &mut SqliteConnection,
    member_id: &MemberId,
    limit: i64,
) -> Result<Vec<Match>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM matches
        WHERE ? IN (team1_player1, team1_player2, team2_player1, team2_player2)
        ORDER BY match_date DESC, start_time DESC, id DESC
        LIMIT ?
        "#,
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(member_id.as_str())
        .bind(limit)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Scheduled matches dated within `[from, to]`.
pub async fn scheduled_between(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Match>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM matches WHERE status = ? AND match_date >= ? AND match_date <= ? ORDER BY match_date, start_time",
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(MatchStatus::Scheduled.as_str())
        .bind(format_date(from))
        .bind(format_date(to))
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Write the final result; false if the match was already Finished.
pub async fn record_result(
    conn: &mut SqliteConnection,
    id: i64,
    score1: i32,
    score2: i32,
    details: Option<&str>,
    winner: WinningSide,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE matches
        SET score1 = ?, score2 = ?, details = ?, winner = ?, status = ?
        WHERE id = ? AND status <> ?
        "#,
    )
    .bind(score1)
    .bind(score2)
    .bind(details)
    .bind(winner.as_str())
    .bind(MatchStatus::Finished.as_str())
    .bind(id)
    .bind(MatchStatus::Finished.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

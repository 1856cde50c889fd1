//! Wallet transaction rows.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{parse_column, parse_optional};
use crate::domain::{LedgerRef, LedgerTransaction, MemberId, NewTransaction, TimeMs, TxStatus};

const COLUMNS: &str = "id, member_id, amount, kind, status, reference, description, created_at";

fn from_row(row: &SqliteRow) -> Result<LedgerTransaction, sqlx::Error> {
    Ok(LedgerTransaction {
        id: row.try_get("id")?,
        member_id: MemberId::new(row.try_get::<String, _>("member_id")?),
        amount: parse_column(row, "amount")?,
        kind: parse_column(row, "kind")?,
        status: parse_column(row, "status")?,
        reference: parse_optional(row, "reference")?,
        description: row.try_get("description")?,
        created_at: TimeMs::new(row.try_get("created_at")?),
    })
}

pub async fn insert(
    conn: &mut SqliteConnection,
    entry: &NewTransaction,
    now: TimeMs,
) -> Result<LedgerTransaction, sqlx::Error> {
    let reference = entry.reference.as_ref().map(LedgerRef::encode);
    let id = sqlx::query(
        r#"
        INSERT INTO ledger_transactions (member_id, amount, kind, status, reference, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.member_id.as_str())
    .bind(entry.amount.to_canonical_string())
    .bind(entry.kind.as_str())
    .bind(entry.status.as_str())
    .bind(reference)
    .bind(entry.description.as_deref())
    .bind(now.as_ms())
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(LedgerTransaction {
        id,
        member_id: entry.member_id.clone(),
        amount: entry.amount,
        kind: entry.kind,
        status: entry.status,
        reference: entry.reference.clone(),
        description: entry.description.clone(),
        created_at: now,
    })
}

pub async fn get(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<LedgerTransaction>, sqlx::Error> {
    let sql = format!("SELECT {} FROM ledger_transactions WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn find_by_reference(
    conn: &mut SqliteConnection,
    reference: &LedgerRef,
) -> Result<Option<LedgerTransaction>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM ledger_transactions WHERE reference = ? ORDER BY id LIMIT 1",
        COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(reference.encode())
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Move a transaction from `from` to `to`; false if it was no longer in `from`.
pub async fn transition(
    conn: &mut SqliteConnection,
    id: i64,
    from: TxStatus,
    to: TxStatus,
    description: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE ledger_transactions
        SET status = ?, description = COALESCE(?, description)
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(to.as_str())
    .bind(description)
    .bind(id)
    .bind(from.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Newest first.
pub async fn list_for_member(
    conn: &mut SqliteConnection,
    member_id: &MemberId,
    limit: i64,
    offset: i64,
) -> Result<Vec<LedgerTransaction>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM ledger_transactions
        WHERE member_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(member_id.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn count_for_member(
    conn: &mut SqliteConnection,
    member_id: &MemberId,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ledger_transactions WHERE member_id = ?")
            .bind(member_id.as_str())
            .fetch_one(conn)
            .await?;
    Ok(count)
}

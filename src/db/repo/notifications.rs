//! Persisted notifications.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::parse_column;
use crate::domain::{MemberId, Notification, NotificationEvent, TimeMs};

const COLUMNS: &str = "id, receiver_id, message, severity, link, is_read, created_at";

fn from_row(row: &SqliteRow) -> Result<Notification, sqlx::Error> {
    Ok(Notification {
        id: row.try_get("id")?,
        receiver_id: MemberId::new(row.try_get::<String, _>("receiver_id")?),
        message: row.try_get("message")?,
        severity: parse_column(row, "severity")?,
        link: row.try_get("link")?,
        is_read: row.try_get::<i64, _>("is_read")? != 0,
        created_at: TimeMs::new(row.try_get("created_at")?),
    })
}

pub async fn insert(
    conn: &mut SqliteConnection,
    event: &NotificationEvent,
) -> Result<Notification, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO notifications (receiver_id, message, severity, link, is_read, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(event.target_member_id.as_str())
    .bind(&event.message)
    .bind(event.severity.as_str())
    .bind(event.link.as_deref())
    .bind(event.timestamp.as_ms())
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Notification {
        id,
        receiver_id: event.target_member_id.clone(),
        message: event.message.clone(),
        severity: event.severity,
        link: event.link.clone(),
        is_read: false,
        created_at: event.timestamp,
    })
}

/// Newest first.
pub async fn list_for_member(
    conn: &mut SqliteConnection,
    receiver: &MemberId,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM notifications
        WHERE receiver_id = ? AND (is_read = 0 OR NOT ?)
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(receiver.as_str())
        .bind(unread_only)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn count_unread(
    conn: &mut SqliteConnection,
    receiver: &MemberId,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE receiver_id = ? AND is_read = 0")
            .bind(receiver.as_str())
            .fetch_one(conn)
            .await?;
    Ok(count)
}

/// False when the notification does not exist or belongs to someone else.
pub async fn mark_read(
    conn: &mut SqliteConnection,
    id: i64,
    receiver: &MemberId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND receiver_id = ?")
        .bind(id)
        .bind(receiver.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Whether `receiver` already got a notification for `link` whose message
/// starts with `prefix`, at or after `since`.
pub async fn sent_since(
    conn: &mut SqliteConnection,
    receiver: &MemberId,
    link: &str,
    prefix: &str,
    since: TimeMs,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE receiver_id = ? AND link = ? AND substr(message, 1, length(?)) = ? AND created_at >= ?
        "#,
    )
    .bind(receiver.as_str())
    .bind(link)
    .bind(prefix)
    .bind(prefix)
    .bind(since.as_ms())
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

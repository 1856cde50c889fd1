//! Booking rows and the court overlap query.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::parse_column;
use crate::db::migrations::OVERLAP_ABORT;
use crate::domain::{Booking, BookingStatus, Interval, MemberId, NewBooking, TimeMs};

const COLUMNS: &str = "id, court_id, member_id, start_ms, end_ms, total_price, status, \
                       is_recurring, recurrence_rule, parent_booking_id, transaction_id, created_at";

fn from_row(row: &SqliteRow) -> Result<Booking, sqlx::Error> {
    let start: i64 = row.try_get("start_ms")?;
    let end: i64 = row.try_get("end_ms")?;
    let interval = Interval::new(TimeMs::new(start), TimeMs::new(end))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Booking {
        id: row.try_get("id")?,
        court_id: row.try_get("court_id")?,
        member_id: MemberId::new(row.try_get::<String, _>("member_id")?),
        interval,
        total_price: parse_column(row, "total_price")?,
        status: parse_column(row, "status")?,
        is_recurring: row.try_get::<i64, _>("is_recurring")? != 0,
        recurrence_rule: row.try_get("recurrence_rule")?,
        parent_booking_id: row.try_get("parent_booking_id")?,
        transaction_id: row.try_get("transaction_id")?,
        created_at: TimeMs::new(row.try_get("created_at")?),
    })
}

/// True when the overlap trigger refused the insert.
pub fn is_overlap_abort(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.message().contains(OVERLAP_ABORT),
        _ => false,
    }
}

pub async fn insert(
    conn: &mut SqliteConnection,
    booking: &NewBooking,
    now: TimeMs,
) -> Result<Booking, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO bookings (
            court_id, member_id, start_ms, end_ms, total_price, status,
            is_recurring, recurrence_rule, parent_booking_id, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(booking.court_id)
    .bind(booking.member_id.as_str())
    .bind(booking.interval.start().as_ms())
    .bind(booking.interval.end().as_ms())
    .bind(booking.total_price.to_canonical_string())
    .bind(booking.status.as_str())
    .bind(booking.recurrence_rule.is_some() as i64)
    .bind(booking.recurrence_rule.as_deref())
    .bind(booking.parent_booking_id)
    .bind(now.as_ms())
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Booking {
        id,
        court_id: booking.court_id,
        member_id: booking.member_id.clone(),
        interval: booking.interval,
        total_price: booking.total_price,
        status: booking.status,
        is_recurring: booking.recurrence_rule.is_some(),
        recurrence_rule: booking.recurrence_rule.clone(),
        parent_booking_id: booking.parent_booking_id,
        transaction_id: None,
        created_at: now,
    })
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Booking>, sqlx::Error> {
    let sql = format!("SELECT {} FROM bookings WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(from_row).transpose()
}

/// Non-cancelled bookings on `court_id` that overlap `interval` (half-open).
pub async fn find_overlapping(
    conn: &mut SqliteConnection,
    court_id: i64,
    interval: &Interval,
) -> Result<Vec<Booking>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM bookings
        WHERE court_id = ? AND status <> ? AND start_ms < ? AND ? < end_ms
        ORDER BY start_ms
        "#,
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(court_id)
        .bind(BookingStatus::Cancelled.as_str())
        .bind(interval.end().as_ms())
        .bind(interval.start().as_ms())
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Conditional status change; false if the booking was no longer in `from`.
pub async fn transition(
    conn: &mut SqliteConnection,
    id: i64,
    from: BookingStatus,
    to: BookingStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE bookings SET status = ? WHERE id = ? AND status = ?")
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn link_transaction(
    conn: &mut SqliteConnection,
    booking_ids: &[i64],
    transaction_id: i64,
) -> Result<(), sqlx::Error> {
    for id in booking_ids {
        sqlx::query("UPDATE bookings SET transaction_id = ? WHERE id = ?")
            .bind(transaction_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn list_for_member(
    conn: &mut SqliteConnection,
    member_id: &MemberId,
    limit: i64,
) -> Result<Vec<Booking>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM bookings WHERE member_id = ? ORDER BY start_ms DESC, id DESC LIMIT ?",
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(member_id.as_str())
        .bind(limit)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Slot-holding bookings lying fully inside `[from, to]`, optionally on one court.
pub async fn calendar(
    conn: &mut SqliteConnection,
    court_id: Option<i64>,
    from: TimeMs,
    to: TimeMs,
) -> Result<Vec<Booking>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM bookings
        WHERE status IN (?, ?) AND start_ms >= ? AND end_ms <= ?
          AND (? IS NULL OR court_id = ?)
        ORDER BY start_ms, court_id
        "#,
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(BookingStatus::PendingPayment.as_str())
        .bind(from.as_ms())
        .bind(to.as_ms())
        .bind(court_id)
        .bind(court_id)
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

/// PendingPayment holds created before `created_before`.
pub async fn stale_holds(
    conn: &mut SqliteConnection,
    created_before: TimeMs,
) -> Result<Vec<Booking>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM bookings WHERE status = ? AND created_at < ? ORDER BY id",
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(BookingStatus::PendingPayment.as_str())
        .bind(created_before.as_ms())
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Confirmed bookings whose start lies in `[from, to]`.
pub async fn confirmed_starting_between(
    conn: &mut SqliteConnection,
    from: TimeMs,
    to: TimeMs,
) -> Result<Vec<Booking>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM bookings WHERE status = ? AND start_ms >= ? AND start_ms <= ? ORDER BY start_ms",
        COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(from.as_ms())
        .bind(to.as_ms())
        .fetch_all(conn)
        .await?;
    rows.iter().map(from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_db;
    use crate::db::repo::{courts, members};
    use crate::domain::{Member, Money, Tier};

    async fn seed(conn: &mut SqliteConnection) -> (MemberId, i64) {
        let member = Member {
            id: MemberId::new("m1"),
            full_name: "Ann".to_string(),
            balance: Money::zero(),
            total_spent: Money::zero(),
            tier: Tier::Gold,
            skill_rank: None,
            is_active: true,
            joined_at: TimeMs::new(0),
        };
        members::insert(&mut *conn, &member).await.unwrap();
        let court = courts::insert(&mut *conn, "Court 1", None, Money::from_cents(10_000))
            .await
            .unwrap();
        (member.id, court.id)
    }

    fn new_booking(member: &MemberId, court_id: i64, start: i64, end: i64) -> NewBooking {
        NewBooking {
            court_id,
            member_id: member.clone(),
            interval: Interval::new(TimeMs::new(start), TimeMs::new(end)).unwrap(),
            total_price: Money::from_cents(100),
            status: BookingStatus::Confirmed,
            recurrence_rule: None,
            parent_booking_id: None,
        }
    }

    #[tokio::test]
    async fn test_overlap_query_is_half_open() {
        let (_dir, repo) = setup_test_db().await;
        let mut conn = repo.acquire().await.unwrap();
        let (member, court) = seed(&mut conn).await;

        insert(&mut conn, &new_booking(&member, court, 100, 200), TimeMs::new(1))
            .await
            .unwrap();

        let window = |s, e| Interval::new(TimeMs::new(s), TimeMs::new(e)).unwrap();
        assert_eq!(find_overlapping(&mut conn, court, &window(150, 250)).await.unwrap().len(), 1);
        assert!(find_overlapping(&mut conn, court, &window(200, 300)).await.unwrap().is_empty());
        assert!(find_overlapping(&mut conn, court, &window(0, 100)).await.unwrap().is_empty());
        assert!(find_overlapping(&mut conn, court + 1, &window(150, 250)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_refusal_is_recognized() {
        let (_dir, repo) = setup_test_db().await;
        let mut conn = repo.acquire().await.unwrap();
        let (member, court) = seed(&mut conn).await;

        insert(&mut conn, &new_booking(&member, court, 100, 200), TimeMs::new(1))
            .await
            .unwrap();
        let err = insert(&mut conn, &new_booking(&member, court, 150, 160), TimeMs::new(2))
            .await
            .unwrap_err();
        assert!(is_overlap_abort(&err));
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_and_transition_is_conditional() {
        let (_dir, repo) = setup_test_db().await;
        let mut conn = repo.acquire().await.unwrap();
        let (member, court) = seed(&mut conn).await;

        let b = insert(&mut conn, &new_booking(&member, court, 100, 200), TimeMs::new(1))
            .await
            .unwrap();
        assert!(transition(&mut conn, b.id, BookingStatus::Confirmed, BookingStatus::Cancelled)
            .await
            .unwrap());
        assert!(!transition(&mut conn, b.id, BookingStatus::Confirmed, BookingStatus::Cancelled)
            .await
            .unwrap());

        let again = insert(&mut conn, &new_booking(&member, court, 100, 200), TimeMs::new(3))
            .await
            .unwrap();
        let loaded = get(&mut conn, again.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Confirmed);
        assert_eq!(get(&mut conn, b.id).await.unwrap().unwrap().status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_calendar_and_holds() {
        let (_dir, repo) = setup_test_db().await;
        let mut conn = repo.acquire().await.unwrap();
        let (member, court) = seed(&mut conn).await;

        insert(&mut conn, &new_booking(&member, court, 100, 200), TimeMs::new(1))
            .await
            .unwrap();
        let mut hold = new_booking(&member, court, 300, 400);
        hold.status = BookingStatus::PendingPayment;
        insert(&mut conn, &hold, TimeMs::new(50)).await.unwrap();

        let window = calendar(&mut conn, Some(court), TimeMs::new(0), TimeMs::new(350))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        let all = calendar(&mut conn, None, TimeMs::new(0), TimeMs::new(1_000))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        assert!(stale_holds(&mut conn, TimeMs::new(50)).await.unwrap().is_empty());
        assert_eq!(stale_holds(&mut conn, TimeMs::new(51)).await.unwrap().len(), 1);

        let mine = list_for_member(&mut conn, &member, 10).await.unwrap();
        assert_eq!(mine[0].interval.start(), TimeMs::new(300));
    }
}

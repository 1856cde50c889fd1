//! Member rows.
//!
//! Balances are only written through [`set_wallet`], which the wallet service
//! calls right after appending the matching ledger entry.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::parse_column;
use crate::domain::{Member, MemberId, Money, TimeMs};

const COLUMNS: &str =
    "id, full_name, balance, total_spent, tier, skill_rank, is_active, joined_at";

fn from_row(row: &SqliteRow) -> Result<Member, sqlx::Error> {
    Ok(Member {
        id: MemberId::new(row.try_get::<String, _>("id")?),
        full_name: row.try_get("full_name")?,
        balance: parse_column(row, "balance")?,
        total_spent: parse_column(row, "total_spent")?,
        tier: parse_column(row, "tier")?,
        skill_rank: row.try_get("skill_rank")?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
        joined_at: TimeMs::new(row.try_get("joined_at")?),
    })
}

pub async fn insert(conn: &mut SqliteConnection, member: &Member) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO members (id, full_name, balance, total_spent, tier, skill_rank, is_active, joined_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(member.id.as_str())
    .bind(&member.full_name)
    .bind(member.balance.to_canonical_string())
    .bind(member.total_spent.to_canonical_string())
    .bind(member.tier.as_str())
    .bind(member.skill_rank)
    .bind(member.is_active as i64)
    .bind(member.joined_at.as_ms())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &MemberId) -> Result<Option<Member>, sqlx::Error> {
    let sql = format!("SELECT {} FROM members WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Bump the row version. As the first write of a transaction this takes the
/// SQLite write lock, so every later read in the transaction is stable.
/// Returns false when the member does not exist.
pub async fn touch(conn: &mut SqliteConnection, id: &MemberId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE members SET version = version + 1 WHERE id = ?")
        .bind(id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_wallet(
    conn: &mut SqliteConnection,
    id: &MemberId,
    balance: Money,
    total_spent: Money,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE members SET balance = ?, total_spent = ? WHERE id = ?")
        .bind(balance.to_canonical_string())
        .bind(total_spent.to_canonical_string())
        .bind(id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_skill_rank(
    conn: &mut SqliteConnection,
    id: &MemberId,
    rank: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE members SET skill_rank = ? WHERE id = ?")
        .bind(rank)
        .bind(id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_db;
    use crate::domain::Tier;

    fn member(id: &str, balance: Money) -> Member {
        Member {
            id: MemberId::new(id),
            full_name: format!("Member {}", id),
            balance,
            total_spent: Money::zero(),
            tier: Tier::Gold,
            skill_rank: None,
            is_active: true,
            joined_at: TimeMs::new(1_000),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (_dir, repo) = setup_test_db().await;
        let mut conn = repo.acquire().await.unwrap();

        let m = member("m1", Money::from_cents(12_345));
        insert(&mut conn, &m).await.unwrap();

        let loaded = get(&mut conn, &m.id).await.unwrap().unwrap();
        assert_eq!(loaded, m);
        assert!(get(&mut conn, &MemberId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch_reports_missing_member() {
        let (_dir, repo) = setup_test_db().await;
        let mut conn = repo.acquire().await.unwrap();
        insert(&mut conn, &member("m1", Money::zero())).await.unwrap();

        assert!(touch(&mut conn, &MemberId::new("m1")).await.unwrap());
        assert!(!touch(&mut conn, &MemberId::new("ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_wallet_and_rank_updates() {
        let (_dir, repo) = setup_test_db().await;
        let mut conn = repo.acquire().await.unwrap();
        let id = MemberId::new("m1");
        insert(&mut conn, &member("m1", Money::zero())).await.unwrap();

        set_wallet(&mut conn, &id, Money::from_cents(500), Money::from_cents(250))
            .await
            .unwrap();
        set_skill_rank(&mut conn, &id, 3.1).await.unwrap();

        let loaded = get(&mut conn, &id).await.unwrap().unwrap();
        assert_eq!(loaded.balance, Money::from_cents(500));
        assert_eq!(loaded.total_spent, Money::from_cents(250));
        assert_eq!(loaded.skill_rank, Some(3.1));

        // the schema refuses a negative balance
        assert!(set_wallet(&mut conn, &id, Money::from_cents(-1), Money::zero())
            .await
            .is_err());
    }
}

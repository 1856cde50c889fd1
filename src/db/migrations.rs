//! Database migrations and initialization.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Message raised by the overlap trigger; mapped to a slot conflict by the repo.
pub const OVERLAP_ABORT: &str = "booking_overlap";

/// Triggers contain `;` inside their bodies, so they run one statement each
/// instead of going through the `schema.sql` splitter.
const TRIGGERS: &[&str] = &[r#"
    CREATE TRIGGER IF NOT EXISTS bookings_no_overlap
    BEFORE INSERT ON bookings
    WHEN NEW.status <> 'cancelled'
    BEGIN
        SELECT RAISE(ABORT, 'booking_overlap')
        WHERE EXISTS (
            SELECT 1 FROM bookings
            WHERE court_id = NEW.court_id
              AND status <> 'cancelled'
              AND start_ms < NEW.end_ms
              AND NEW.start_ms < end_ms
        );
    END
    "#];

/// Initialize the SQLite database with schema and pragmas.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| Box::pin(async move { configure_pragmas_conn(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    run_migrations(&pool).await?;

    info!(path = %db_path, "database initialized");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");
    for statement in split_statements(include_str!("schema.sql")) {
        sqlx::query(&statement).execute(pool).await?;
    }

    for trigger in TRIGGERS {
        sqlx::query(trigger).execute(pool).await?;
    }

    info!("Migrations completed successfully");
    Ok(())
}

/// Split a script on `;`, dropping `--` comment lines first so a `;` in a
/// comment never cuts a statement in half.
fn split_statements(script: &str) -> Vec<String> {
    let code = script
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    code.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn configure_pragmas_conn(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    use sqlx::Row;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    // journal_mode returns the mode actually applied
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.get(0);
    tracing::debug!(%journal_mode, "sqlite journal mode");

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn fresh_pool() -> (TempDir, SqlitePool) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("club.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (temp_dir, pool)
    }

    #[test]
    fn test_split_ignores_semicolons_in_comments() {
        let script = "-- header; with a semicolon\nCREATE TABLE a (x INTEGER);\n\n  -- another; one\nCREATE INDEX i ON a (x);\n";
        assert_eq!(
            split_statements(script),
            vec!["CREATE TABLE a (x INTEGER)", "CREATE INDEX i ON a (x)"]
        );
    }

    #[test]
    fn test_schema_statements_all_start_with_sql() {
        for statement in split_statements(include_str!("schema.sql")) {
            assert!(
                statement.starts_with("CREATE"),
                "unexpected statement start: {}",
                statement
            );
        }
    }

    #[tokio::test]
    async fn test_init_db_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("nested")
            .join("club.db")
            .to_string_lossy()
            .to_string();

        let pool = init_db(&db_path).await.expect("init_db failed");
        assert!(Path::new(&db_path).exists());

        let result: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let (_dir, pool) = fresh_pool().await;

        for table in [
            "members",
            "courts",
            "bookings",
            "ledger_transactions",
            "tournaments",
            "tournament_participants",
            "matches",
            "notifications",
        ] {
            let found: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .expect("query failed");
            assert_eq!(found.0, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let (_dir, pool) = fresh_pool().await;

        run_migrations(&pool)
            .await
            .expect("second migration run failed");

        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='trigger'")
                .fetch_one(&pool)
                .await
                .expect("query failed");
        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_pragmas_configured() {
        let (_dir, pool) = fresh_pool().await;

        let result: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert_eq!(result.0, 1);

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        // WAL is best-effort; some filesystems fall back
        assert!(
            matches!(result.0.as_str(), "wal" | "delete"),
            "unexpected journal_mode: {}",
            result.0
        );
    }

    #[tokio::test]
    async fn test_overlap_trigger_and_balance_check() {
        let (_dir, pool) = fresh_pool().await;

        sqlx::query("INSERT INTO members (id, full_name, balance, joined_at) VALUES ('m1', 'Ann', '10', 0)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO courts (name, hourly_price) VALUES ('Court 1', '100')")
            .execute(&pool)
            .await
            .unwrap();

        let insert = "INSERT INTO bookings (court_id, member_id, start_ms, end_ms, total_price, status, created_at) \
                      VALUES (1, 'm1', ?, ?, '0', ?, 0)";
        sqlx::query(insert)
            .bind(0i64)
            .bind(100i64)
            .bind("confirmed")
            .execute(&pool)
            .await
            .unwrap();

        // touching the end is fine
        sqlx::query(insert)
            .bind(100i64)
            .bind(200i64)
            .bind("pending_payment")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query(insert)
            .bind(50i64)
            .bind(150i64)
            .bind("confirmed")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(OVERLAP_ABORT));

        // cancelled rows never conflict
        sqlx::query(insert)
            .bind(50i64)
            .bind(150i64)
            .bind("cancelled")
            .execute(&pool)
            .await
            .unwrap();

        let negative = sqlx::query("UPDATE members SET balance = '-1' WHERE id = 'm1'")
            .execute(&pool)
            .await;
        assert!(negative.is_err());
    }
}

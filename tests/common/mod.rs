#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use clubledger::config::Config;
use clubledger::db::init_db;
use clubledger::db::repo::{courts, ledger, members};
use clubledger::domain::{Court, LedgerTransaction, Member, MemberId, Money, Tier, TimeMs};
use clubledger::{Orchestrator, RecordingChannel, Repository};
use std::sync::Arc;
use tempfile::TempDir;

pub const HOUR_MS: i64 = 3_600_000;

pub struct TestClub {
    pub club: Orchestrator,
    pub repo: Repository,
    pub channel: RecordingChannel,
    pub config: Config,
    _temp: TempDir,
}

pub async fn setup() -> TestClub {
    setup_with(|_| {}).await
}

pub async fn setup_with(adjust: impl FnOnce(&mut Config)) -> TestClub {
    build(adjust, RecordingChannel::new()).await
}

/// Club whose delivery channel refuses every event.
pub async fn setup_failing_channel() -> TestClub {
    build(|_| {}, RecordingChannel::failing()).await
}

async fn build(adjust: impl FnOnce(&mut Config), channel: RecordingChannel) -> TestClub {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Repository::new(pool);

    let mut config = Config::for_database(db_path);
    config.payment_hash_secret = Some("test-secret".to_string());
    adjust(&mut config);

    let club = Orchestrator::new(repo.clone(), &config, Arc::new(channel.clone()));

    TestClub {
        club,
        repo,
        channel,
        config,
        _temp: temp_dir,
    }
}

/// 2026-03-02 00:00 UTC, a Monday.
pub fn t0() -> TimeMs {
    TimeMs::at(date(2026, 3, 2), time(0, 0))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn cents(c: i64) -> Money {
    Money::from_cents(c)
}

impl TestClub {
    pub async fn member(&self, id: &str, tier: Tier, balance: Money) -> MemberId {
        let member = Member {
            id: MemberId::new(id),
            full_name: format!("Player {}", id),
            balance,
            total_spent: Money::zero(),
            tier,
            skill_rank: None,
            is_active: true,
            joined_at: TimeMs::new(0),
        };
        let mut conn = self.repo.acquire().await.unwrap();
        members::insert(&mut conn, &member).await.unwrap();
        member.id
    }

    pub async fn court(&self, name: &str, hourly: Money) -> Court {
        let mut conn = self.repo.acquire().await.unwrap();
        courts::insert(&mut conn, name, None, hourly).await.unwrap()
    }

    pub async fn load_member(&self, id: &MemberId) -> Member {
        let mut conn = self.repo.acquire().await.unwrap();
        members::get(&mut conn, id).await.unwrap().unwrap()
    }

    pub async fn balance(&self, id: &MemberId) -> Money {
        self.load_member(id).await.balance
    }

    pub async fn ledger(&self, id: &MemberId) -> Vec<LedgerTransaction> {
        let mut conn = self.repo.acquire().await.unwrap();
        ledger::list_for_member(&mut conn, id, 1000, 0).await.unwrap()
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::query(sql).execute(self.repo.pool()).await.unwrap();
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(self.repo.pool()).await.unwrap();
        n
    }
}

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod notify;
pub mod orchestration;
pub mod payment;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Booking, BookingStatus, Court, Interval, LedgerTransaction, Match, Member, MemberId, Money,
    Tier, TimeMs, Tournament, TournamentFormat, TournamentStatus,
};
pub use error::AppError;
pub use notify::{BroadcastChannel, NotificationChannel, Notifier, RecordingChannel};
pub use orchestration::Orchestrator;

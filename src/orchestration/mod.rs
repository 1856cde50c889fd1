//! Request-scoped operations. Each money-moving operation is one SQLite
//! transaction, retried when the database is busy.

pub mod bookings;
pub mod matches;
pub mod members;
pub mod orchestrator;
pub mod recurring;
pub mod retry;
pub mod tournaments;
pub mod wallet;

pub use bookings::{BookingReceipt, BookingService, CancelReceipt};
pub use matches::{DuelRequest, MatchService, RankChange, ResultSummary};
pub use members::{ClubService, CourtUpdate, NewMember};
pub use orchestrator::Orchestrator;
pub use recurring::{RecurringReceipt, RecurringRequest, RecurringService};
pub use tournaments::{FinishSummary, ScheduleSummary, TournamentDetail, TournamentService};
pub use wallet::{GatewayOutcome, TransactionPage, WalletInfo, WalletService};

//! Domain types for the club ledger.
//!
//! This module provides:
//! - Fixed-point `Money` for balances and prices
//! - Primitives: `TimeMs`, `MemberId`, half-open `Interval`
//! - Entities: members, ledger transactions, courts, bookings, tournaments,
//!   matches, and notifications
//! - Closed enums with total, case-insensitive parsers

pub mod booking;
pub mod court;
pub mod game;
pub mod ledger;
pub mod member;
pub mod money;
pub mod notification;
pub mod primitives;
pub mod tournament;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use court::Court;
pub use game::{Match, MatchStatus, NewMatch, Team, WinningSide, CHALLENGE_ROUND, FINAL_ROUND};
pub use ledger::{LedgerRef, LedgerTransaction, NewTransaction, TxKind, TxStatus};
pub use member::{Member, Tier, DEFAULT_SKILL_RANK, MAX_SKILL_RANK, MIN_SKILL_RANK};
pub use money::Money;
pub use notification::{Notification, NotificationEvent, Severity};
pub use primitives::{Interval, InvalidInterval, MemberId, TimeMs, UnrecognizedValue};
pub use tournament::{Participant, Tournament, TournamentFormat, TournamentStatus};

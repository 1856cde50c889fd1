//! Tournaments and their participants.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::primitives::closed_enum;
use super::{MemberId, Money, TimeMs};

closed_enum! {
    TournamentFormat, "tournament format" {
        RoundRobin => "round_robin" | "roundrobin",
        Knockout => "knockout",
        Hybrid => "hybrid",
    }
}

closed_enum! {
    TournamentStatus, "tournament status" {
        Open => "open",
        Registering => "registering",
        DrawCompleted => "draw_completed" | "drawcompleted",
        Ongoing => "ongoing",
        Finished => "finished",
    }
}

impl TournamentStatus {
    pub fn accepts_joins(&self) -> bool {
        matches!(self, TournamentStatus::Open | TournamentStatus::Registering)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub format: TournamentFormat,
    pub entry_fee: Money,
    pub prize_pool: Money,
    pub status: TournamentStatus,
    /// Free-form JSON, e.g. `{"groups": 4}` for Hybrid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<String>,
}

impl Tournament {
    /// Group count for group-stage formats; `None` when the settings do not say.
    pub fn configured_groups(&self) -> Option<usize> {
        let settings = self.settings.as_deref()?;
        let value: serde_json::Value = serde_json::from_str(settings).ok()?;
        value.get("groups")?.as_u64().map(|n| n as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: i64,
    pub tournament_id: i64,
    pub member_id: MemberId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub paid: bool,
    pub registered_at: TimeMs,
}

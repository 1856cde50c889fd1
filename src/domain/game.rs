//! Matches between up to two players per side.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::primitives::closed_enum;
use super::MemberId;

/// Round label of the deciding knockout match.
pub const FINAL_ROUND: &str = "Final";
pub const SEMIFINAL_ROUND: &str = "Semifinal";
pub const CHALLENGE_ROUND: &str = "Challenge";

closed_enum! {
    WinningSide, "winner" {
        None => "none",
        Team1 => "team1" | "team_1",
        Team2 => "team2" | "team_2",
        Draw => "draw",
    }
}

impl WinningSide {
    pub fn from_scores(score1: i32, score2: i32) -> Self {
        match score1.cmp(&score2) {
            std::cmp::Ordering::Greater => WinningSide::Team1,
            std::cmp::Ordering::Less => WinningSide::Team2,
            std::cmp::Ordering::Equal => WinningSide::Draw,
        }
    }
}

closed_enum! {
    MatchStatus, "match status" {
        Scheduled => "scheduled",
        InProgress => "in_progress" | "inprogress",
        Finished => "finished",
    }
}

/// One side of a match; singles leave `player2` empty, byes leave both empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub player1: Option<MemberId>,
    pub player2: Option<MemberId>,
}

impl Team {
    pub fn single(player: MemberId) -> Self {
        Team {
            player1: Some(player),
            player2: None,
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &MemberId> {
        self.player1.iter().chain(self.player2.iter())
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.players().any(|p| p == member)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i64,
    /// `None` for a freestanding duel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_name: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub team1: Team,
    pub team2: Team,
    pub score1: i32,
    pub score2: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub winner: WinningSide,
    pub is_ranked: bool,
    pub status: MatchStatus,
}

impl Match {
    pub fn is_final_round(&self) -> bool {
        self.round_name.as_deref() == Some(FINAL_ROUND)
    }

    /// (winning side, losing side); `None` unless one side actually won.
    pub fn sides_by_result(&self) -> Option<(&Team, &Team)> {
        match self.winner {
            WinningSide::Team1 => Some((&self.team1, &self.team2)),
            WinningSide::Team2 => Some((&self.team2, &self.team1)),
            WinningSide::None | WinningSide::Draw => None,
        }
    }

    pub fn involves(&self, member: &MemberId) -> bool {
        self.team1.contains(member) || self.team2.contains(member)
    }
}

/// A match to insert; scores start at zero and status at Scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub tournament_id: Option<i64>,
    pub round_name: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub team1: Team,
    pub team2: Team,
    pub is_ranked: bool,
}

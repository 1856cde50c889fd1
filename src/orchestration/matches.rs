//! Match results, rank adjustment, and member-issued duels.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, info};

use super::retry::retry_busy;
use crate::db::repo::{matches, members};
use crate::db::Repository;
use crate::domain::{
    Match, MatchStatus, MemberId, NewMatch, NotificationEvent, Severity, Team, TimeMs,
    WinningSide, CHALLENGE_ROUND,
};
use crate::engine::rating;
use crate::error::AppError;
use crate::notify::Notifier;

pub const MAX_MATCH_LIST: i64 = 100;

/// New skill rank of one player after a ranked result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankChange {
    pub member_id: MemberId,
    pub before: Option<f64>,
    pub after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    #[serde(rename = "match")]
    pub game: Match,
    pub rank_changes: Vec<RankChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuelRequest {
    pub opponent: MemberId,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
}

fn match_link(id: i64) -> String {
    format!("/matches/{}", id)
}

#[derive(Clone)]
pub struct MatchService {
    repo: Repository,
    notifier: Notifier,
}

impl MatchService {
    pub fn new(repo: Repository, notifier: Notifier) -> Self {
        MatchService { repo, notifier }
    }

    /// `status` is parsed strictly; `limit` is capped.
    pub async fn list(
        &self,
        tournament_id: Option<i64>,
        status: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Match>, AppError> {
        let status = status
            .map(MatchStatus::from_str)
            .transpose()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let limit = limit.unwrap_or(MAX_MATCH_LIST).clamp(1, MAX_MATCH_LIST);
        let mut conn = self.repo.acquire().await?;
        Ok(matches::list(&mut conn, tournament_id, status, limit).await?)
    }

    pub async fn for_member(&self, member_id: &MemberId) -> Result<Vec<Match>, AppError> {
        let mut conn = self.repo.acquire().await?;
        Ok(matches::for_member(&mut conn, member_id, MAX_MATCH_LIST).await?)
    }

    pub async fn get(&self, match_id: i64) -> Result<Match, AppError> {
        let mut conn = self.repo.acquire().await?;
        matches::get(&mut conn, match_id)
            .await?
            .ok_or_else(|| AppError::not_found("match", match_id))
    }

    /// Finalize a match. Ranked matches move every winner up and every
    /// loser down in the same transaction; draws change nothing.
    pub async fn update_result(
        &self,
        match_id: i64,
        score1: i32,
        score2: i32,
        details: Option<&str>,
    ) -> Result<ResultSummary, AppError> {
        if score1 < 0 || score2 < 0 {
            return Err(AppError::Validation("scores must not be negative".into()));
        }
        let winner = WinningSide::from_scores(score1, score2);

        let summary = retry_busy("update_result", || async {
            let mut tx = self.repo.begin().await?;
            let current = matches::get(&mut tx, match_id)
                .await?
                .ok_or_else(|| AppError::not_found("match", match_id))?;
            if current.status == MatchStatus::Finished {
                return Err(AppError::InvalidState(format!(
                    "match {} already has a result",
                    match_id
                )));
            }
            if !matches::record_result(&mut tx, match_id, score1, score2, details, winner).await? {
                return Err(AppError::InvalidState(format!(
                    "match {} already has a result",
                    match_id
                )));
            }
            let game = Match {
                score1,
                score2,
                details: details.map(str::to_string),
                winner,
                status: MatchStatus::Finished,
                ..current
            };

            let mut rank_changes = Vec::new();
            if game.is_ranked {
                if let Some((winners, losers)) = game.sides_by_result() {
                    for (player, won) in winners
                        .players()
                        .map(|p| (p, true))
                        .chain(losers.players().map(|p| (p, false)))
                    {
                        let Some(member) = members::get(&mut tx, player).await? else {
                            debug!(member = %player, match_id, "unknown player, rank unchanged");
                            continue;
                        };
                        let after = if won {
                            rating::after_win(member.skill_rank)
                        } else {
                            rating::after_loss(member.skill_rank)
                        };
                        members::set_skill_rank(&mut tx, player, after).await?;
                        rank_changes.push(RankChange {
                            member_id: player.clone(),
                            before: member.skill_rank,
                            after,
                        });
                    }
                }
            }

            tx.commit().await?;
            Ok(ResultSummary { game, rank_changes })
        })
        .await?;

        info!(
            match_id,
            score1,
            score2,
            winner = %winner,
            ranked = summary.game.is_ranked,
            "match result recorded"
        );
        Ok(summary)
    }

    /// Ranked one-on-one challenge; defaults to now when no slot is given.
    pub async fn create_duel(
        &self,
        challenger: &MemberId,
        request: &DuelRequest,
        now: TimeMs,
    ) -> Result<Match, AppError> {
        if &request.opponent == challenger {
            return Err(AppError::Validation("cannot challenge yourself".into()));
        }
        let moment = now.to_datetime();
        let date = request.date.unwrap_or_else(|| moment.date_naive());
        let start_time = request.start_time.unwrap_or_else(|| {
            NaiveTime::from_hms_opt(moment.hour(), moment.minute(), 0).unwrap_or(NaiveTime::MIN)
        });

        let duel = retry_busy("create_duel", || async {
            let mut tx = self.repo.begin().await?;
            for id in [challenger, &request.opponent] {
                if members::get(&mut tx, id).await?.is_none() {
                    return Err(AppError::not_found("member", id));
                }
            }
            let duel = matches::insert(
                &mut tx,
                &NewMatch {
                    tournament_id: None,
                    round_name: Some(CHALLENGE_ROUND.to_string()),
                    date,
                    start_time,
                    team1: Team::single(challenger.clone()),
                    team2: Team::single(request.opponent.clone()),
                    is_ranked: true,
                },
                now,
            )
            .await?;
            tx.commit().await?;
            Ok(duel)
        })
        .await?;

        info!(match_id = duel.id, challenger = %challenger, opponent = %request.opponent, "duel created");
        self.notifier
            .emit(
                NotificationEvent::new(
                    &request.opponent,
                    format!(
                        "{} challenged you to a ranked match on {} at {}",
                        challenger,
                        date.format("%Y-%m-%d"),
                        start_time.format("%H:%M")
                    ),
                    Severity::Info,
                )
                .with_link(match_link(duel.id))
                .at(now),
            )
            .await;
        Ok(duel)
    }
}

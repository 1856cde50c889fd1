//! Tournament lifecycle: creation, paid registration, scheduling, and the prize.

use rand::Rng;
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use std::str::FromStr;
use tracing::{info, warn};

use super::retry::retry_busy;
use super::wallet::{ensure_funds, lock_member, post};
use crate::db::repo::tournaments::{self, NewTournament};
use crate::db::repo::matches;
use crate::db::Repository;
use crate::domain::{
    LedgerRef, Match, MemberId, Money, NewTransaction, NotificationEvent, Participant, Severity,
    TimeMs, Tournament, TournamentStatus,
};
use crate::engine::schedule;
use crate::error::AppError;
use crate::notify::Notifier;

/// A tournament that can still be (re)scheduled.
async fn schedulable(conn: &mut SqliteConnection, tournament_id: i64) -> Result<Tournament, AppError> {
    let tournament = tournaments::get(conn, tournament_id)
        .await?
        .ok_or_else(|| AppError::not_found("tournament", tournament_id))?;
    if tournament.status == TournamentStatus::Finished {
        return Err(AppError::InvalidState(format!(
            "tournament {} is already finished",
            tournament_id
        )));
    }
    Ok(tournament)
}

async fn participant_ids(
    conn: &mut SqliteConnection,
    tournament_id: i64,
) -> Result<Vec<MemberId>, AppError> {
    Ok(tournaments::participants(conn, tournament_id)
        .await?
        .into_iter()
        .map(|p| p.member_id)
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDetail {
    pub tournament: Tournament,
    pub participants: Vec<Participant>,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub tournament_id: i64,
    pub matches_created: usize,
    pub matches_replaced: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishSummary {
    pub tournament_id: i64,
    pub final_match_id: i64,
    pub winner: MemberId,
    pub prize: Money,
}

fn tournament_link(id: i64) -> String {
    format!("/tournaments/{}", id)
}

#[derive(Clone)]
pub struct TournamentService {
    repo: Repository,
    notifier: Notifier,
    hybrid_default_groups: usize,
}

impl TournamentService {
    pub fn new(repo: Repository, notifier: Notifier, hybrid_default_groups: usize) -> Self {
        TournamentService {
            repo,
            notifier,
            hybrid_default_groups,
        }
    }

    pub async fn create(&self, new: NewTournament, now: TimeMs) -> Result<Tournament, AppError> {
        if new.name.trim().is_empty() {
            return Err(AppError::Validation("tournament name is required".into()));
        }
        if new.end_date < new.start_date {
            return Err(AppError::Validation(
                "tournament ends before it starts".into(),
            ));
        }
        if new.entry_fee.is_negative() || new.prize_pool.is_negative() {
            return Err(AppError::Validation(
                "entry fee and prize pool must not be negative".into(),
            ));
        }
        if let Some(settings) = new.settings.as_deref() {
            serde_json::from_str::<serde_json::Value>(settings)
                .map_err(|e| AppError::Validation(format!("settings must be JSON: {}", e)))?;
        }

        let mut conn = self.repo.acquire().await?;
        let tournament = tournaments::insert(&mut conn, &new, now).await?;
        info!(
            tournament_id = tournament.id,
            format = %tournament.format,
            prize = %tournament.prize_pool,
            "tournament created"
        );
        Ok(tournament)
    }

    /// `status` is free text; an unrecognized value is rejected, never ignored.
    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Tournament>, AppError> {
        let status = status
            .map(TournamentStatus::from_str)
            .transpose()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let mut conn = self.repo.acquire().await?;
        Ok(tournaments::list(&mut conn, status).await?)
    }

    pub async fn detail(&self, id: i64) -> Result<TournamentDetail, AppError> {
        let mut conn = self.repo.acquire().await?;
        let tournament = tournaments::get(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("tournament", id))?;
        let participants = tournaments::participants(&mut conn, id).await?;
        let matches = matches::for_tournament(&mut conn, id).await?;
        Ok(TournamentDetail {
            tournament,
            participants,
            matches,
        })
    }

    /// Register and pay the entry fee in one unit.
    pub async fn join(
        &self,
        member_id: &MemberId,
        tournament_id: i64,
        team_name: Option<&str>,
        now: TimeMs,
    ) -> Result<Participant, AppError> {
        let team_name = team_name.map(str::trim).filter(|n| !n.is_empty());

        let participant = retry_busy("join_tournament", || async {
            let mut tx = self.repo.begin().await?;
            let mut member = lock_member(&mut tx, member_id).await?;
            let tournament = tournaments::get(&mut tx, tournament_id)
                .await?
                .ok_or_else(|| AppError::not_found("tournament", tournament_id))?;
            if !tournament.status.accepts_joins() {
                return Err(AppError::InvalidState(format!(
                    "tournament {} is {} and not taking registrations",
                    tournament_id, tournament.status
                )));
            }
            if tournaments::is_participant(&mut tx, tournament_id, member_id).await? {
                return Err(AppError::DuplicateParticipant(tournament_id));
            }

            ensure_funds(&member, tournament.entry_fee)?;
            if tournament.entry_fee.is_positive() {
                let entry = NewTransaction::payment(member_id, tournament.entry_fee)
                    .with_reference(LedgerRef::Tournament(tournament_id))
                    .with_description(format!("Entry fee for {}", tournament.name));
                post(&mut tx, &mut member, entry, now).await?;
            }
            let participant =
                tournaments::insert_participant(&mut tx, tournament_id, member_id, team_name, true, now)
                    .await?;

            tx.commit().await?;
            Ok(participant)
        })
        .await?;

        info!(tournament_id, member = %member_id, "tournament joined");
        self.notifier
            .emit(
                NotificationEvent::new(
                    member_id,
                    format!("You are registered for tournament #{}", tournament_id),
                    Severity::Success,
                )
                .with_link(tournament_link(tournament_id))
                .at(now),
            )
            .await;
        Ok(participant)
    }

    /// Replace the tournament's matches with a freshly drawn schedule.
    /// Previously generated matches, results included, are discarded.
    pub async fn generate_schedule<R: Rng + ?Sized>(
        &self,
        tournament_id: i64,
        rng: &mut R,
        now: TimeMs,
    ) -> Result<ScheduleSummary, AppError> {
        let (tournament, participants) = {
            let mut conn = self.repo.acquire().await?;
            let tournament = schedulable(&mut conn, tournament_id).await?;
            (tournament, participant_ids(&mut conn, tournament_id).await?)
        };
        if participants.len() < 2 {
            return Err(AppError::InsufficientParticipants(participants.len()));
        }

        let groups = tournament
            .configured_groups()
            .unwrap_or(self.hybrid_default_groups)
            .max(1);
        // drawn once so a retried write stores the same schedule
        let planned = schedule::generate(&tournament, &participants, groups, rng);

        let replaced = retry_busy("generate_schedule", || async {
            let mut tx = self.repo.begin().await?;
            schedulable(&mut tx, tournament_id).await?;
            if participant_ids(&mut tx, tournament_id).await? != participants {
                return Err(AppError::InvalidState(format!(
                    "participants of tournament {} changed during scheduling",
                    tournament_id
                )));
            }
            let replaced = matches::delete_for_tournament(&mut tx, tournament_id).await?;
            for m in &planned {
                matches::insert(&mut tx, m, now).await?;
            }
            tournaments::set_status(&mut tx, tournament_id, TournamentStatus::Ongoing).await?;
            tx.commit().await?;
            Ok(replaced)
        })
        .await?;

        if replaced > 0 {
            warn!(tournament_id, replaced, "previous schedule discarded");
        }
        info!(
            tournament_id,
            participants = participants.len(),
            matches = planned.len(),
            "schedule generated"
        );
        Ok(ScheduleSummary {
            tournament_id,
            matches_created: planned.len(),
            matches_replaced: replaced,
        })
    }

    /// Close the tournament and pay the prize pool to the final's winner.
    pub async fn finish(&self, tournament_id: i64, now: TimeMs) -> Result<FinishSummary, AppError> {
        let summary = retry_busy("finish_tournament", || async {
            let mut tx = self.repo.begin().await?;
            let tournament = tournaments::get(&mut tx, tournament_id)
                .await?
                .ok_or_else(|| AppError::not_found("tournament", tournament_id))?;
            if tournament.status == TournamentStatus::Finished {
                return Err(AppError::InvalidState(format!(
                    "tournament {} is already finished",
                    tournament_id
                )));
            }
            let all = matches::for_tournament(&mut tx, tournament_id).await?;
            let final_match = schedule::select_final(&all).ok_or_else(|| {
                AppError::InvalidState(format!("tournament {} has no matches", tournament_id))
            })?;
            let winner = schedule::champion(final_match).map_err(AppError::FinalNotReady)?;

            if !tournaments::mark_finished(&mut tx, tournament_id).await? {
                return Err(AppError::InvalidState(format!(
                    "tournament {} is already finished",
                    tournament_id
                )));
            }

            let prize = tournament.prize_pool;
            if prize.is_positive() {
                let mut member = lock_member(&mut tx, &winner).await?;
                let entry = NewTransaction::reward(&winner, prize)
                    .with_reference(LedgerRef::Tournament(tournament_id))
                    .with_description(format!("Prize for winning {}", tournament.name));
                post(&mut tx, &mut member, entry, now).await?;
            }

            tx.commit().await?;
            Ok(FinishSummary {
                tournament_id,
                final_match_id: final_match.id,
                winner,
                prize,
            })
        })
        .await?;

        info!(
            tournament_id,
            winner = %summary.winner,
            prize = %summary.prize,
            "tournament finished"
        );
        self.notifier
            .emit(
                NotificationEvent::new(
                    &summary.winner,
                    format!(
                        "Congratulations, you won tournament #{} and received {}",
                        tournament_id, summary.prize
                    ),
                    Severity::Success,
                )
                .with_link(tournament_link(tournament_id))
                .at(now),
            )
            .await;
        Ok(summary)
    }
}

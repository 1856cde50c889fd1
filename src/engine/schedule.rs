//! Tournament match generation and final-match resolution.
//!
//! Generation is a pure function of the participant list, the tournament and
//! an injected random source, so a seeded `StdRng` reproduces a schedule.
//!
//! Knockout brackets only seed the first round. Later rounds are empty
//! placeholders; winners are not advanced into them.

use chrono::{Duration, NaiveTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{
    Match, MatchStatus, MemberId, NewMatch, Team, Tournament, TournamentFormat, WinningSide,
    FINAL_ROUND,
};
use crate::domain::game::SEMIFINAL_ROUND;

const FIRST_SLOT_HOUR: u32 = 8;
const LAST_SLOT_HOUR: u32 = 20;
const SLOT_MINUTES: u32 = 15;

fn knockout_round_name(matches_in_round: usize, round_number: usize) -> String {
    match matches_in_round {
        1 => FINAL_ROUND.to_string(),
        2 => SEMIFINAL_ROUND.to_string(),
        _ => format!("Round {}", round_number),
    }
}

fn group_name(group_index: usize, group_count: usize) -> String {
    if group_count > 1 {
        format!("Group {}", (b'A' + (group_index % 26) as u8) as char)
    } else {
        "Group Stage".to_string()
    }
}

/// Random start in [08:00, 20:00) on a 15-minute grid.
fn random_slot<R: Rng + ?Sized>(rng: &mut R) -> NaiveTime {
    let slots_per_hour = 60 / SLOT_MINUTES;
    let hour = rng.gen_range(FIRST_SLOT_HOUR..LAST_SLOT_HOUR);
    let minute = rng.gen_range(0..slots_per_hour) * SLOT_MINUTES;
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Single-elimination bracket: first round paired from `seeds`, then halving
/// placeholder rounds down to the final.
pub fn knockout(tournament: &Tournament, seeds: &[MemberId]) -> Vec<NewMatch> {
    let mut matches = Vec::new();
    let mut matches_in_round = seeds.len() / 2;
    let mut round_number = 1;
    let start_time =
        NaiveTime::from_hms_opt(FIRST_SLOT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);

    while matches_in_round >= 1 {
        let round_name = knockout_round_name(matches_in_round, round_number);
        let date = tournament.start_date + Duration::days(round_number as i64 - 1);

        for i in 0..matches_in_round {
            let (team1, team2) = if round_number == 1 {
                (
                    Team::single(seeds[2 * i].clone()),
                    Team::single(seeds[2 * i + 1].clone()),
                )
            } else {
                (Team::default(), Team::default())
            };
            matches.push(NewMatch {
                tournament_id: Some(tournament.id),
                round_name: Some(round_name.clone()),
                date,
                start_time,
                team1,
                team2,
                is_ranked: false,
            });
        }

        matches_in_round /= 2;
        round_number += 1;
    }

    matches
}

/// Every unordered pair within each of `group_count` groups, where
/// participant `i` lands in group `i % group_count`. Dates and times are
/// spread uniformly at random over the tournament window.
pub fn round_robin<R: Rng + ?Sized>(
    tournament: &Tournament,
    participants: &[MemberId],
    group_count: usize,
    rng: &mut R,
) -> Vec<NewMatch> {
    let group_count = group_count.max(1);
    let mut groups: Vec<Vec<&MemberId>> = vec![Vec::new(); group_count];
    for (i, member) in participants.iter().enumerate() {
        groups[i % group_count].push(member);
    }

    let span_days = (tournament.end_date - tournament.start_date).num_days().max(0);
    let mut matches = Vec::new();

    for (g, group) in groups.iter().enumerate() {
        let round_name = group_name(g, group_count);
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let day = rng.gen_range(0..=span_days);
                matches.push(NewMatch {
                    tournament_id: Some(tournament.id),
                    round_name: Some(round_name.clone()),
                    date: tournament.start_date + Duration::days(day),
                    start_time: random_slot(rng),
                    team1: Team::single(group[i].clone()),
                    team2: Team::single(group[j].clone()),
                    is_ranked: false,
                });
            }
        }
    }

    matches
}

/// Shuffle the participants and build the matches for the tournament format.
pub fn generate<R: Rng + ?Sized>(
    tournament: &Tournament,
    participants: &[MemberId],
    hybrid_groups: usize,
    rng: &mut R,
) -> Vec<NewMatch> {
    let mut seeds = participants.to_vec();
    seeds.shuffle(rng);

    match tournament.format {
        TournamentFormat::Knockout => knockout(tournament, &seeds),
        TournamentFormat::RoundRobin => round_robin(tournament, &seeds, 1, rng),
        TournamentFormat::Hybrid => round_robin(tournament, &seeds, hybrid_groups, rng),
    }
}

/// The authoritative deciding match: a "Final" round first, then the latest
/// by date and start time.
pub fn select_final(matches: &[Match]) -> Option<&Match> {
    matches
        .iter()
        .max_by_key(|m| (m.is_final_round(), m.date, m.start_time, std::cmp::Reverse(m.id)))
}

/// Member credited with the tournament win: the first player slot of the
/// winning side of a finished final.
pub fn champion(final_match: &Match) -> Result<MemberId, String> {
    if final_match.status != MatchStatus::Finished {
        return Err(format!("match {} is not finished", final_match.id));
    }
    let side = match final_match.winner {
        WinningSide::Team1 => &final_match.team1,
        WinningSide::Team2 => &final_match.team2,
        WinningSide::None | WinningSide::Draw => {
            return Err(format!("match {} has no winner", final_match.id));
        }
    };
    side.player1
        .clone()
        .ok_or_else(|| format!("winning side of match {} has no first player", final_match.id))
}

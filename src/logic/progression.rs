//! Match progression: completing matches, advancing winners/losers, reopening, placings.

use crate::logic::scoring::decide_winner;
use crate::models::{
    Contestant, Match, MatchHistory, MatchId, MatchKind, MatchStatus, Outcome, Side,
    TournamentError,
};
use crate::store::EntityKind;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Final standing of a contestant in a division (1 = gold, 2 = silver, 3 = bronze).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placing {
    pub rank: u32,
    pub contestant: Contestant,
}

fn index_of(matches: &[Match], match_id: MatchId) -> Result<usize, TournamentError> {
    matches
        .iter()
        .position(|m| m.id == match_id)
        .ok_or(TournamentError::NotFound {
            kind: EntityKind::Match,
            id: match_id,
        })
}

/// Put `contestant` (or clear the slot with None) into `slot` of match `target`.
pub(crate) fn place_contestant(
    matches: &mut [Match],
    target: MatchId,
    slot: Side,
    contestant: Option<Contestant>,
) -> Result<(), TournamentError> {
    let idx = index_of(matches, target)?;
    let m = &mut matches[idx];
    *m.slot_mut(slot) = contestant;
    m.refresh_status();
    Ok(())
}

/// Decide a match and move its contestants on through the bracket.
///
/// `winner` is the referees' decision; when None the side with more points wins.
/// Returns one history record per contestant, carrying that side's technique counts.
pub fn complete_match(
    matches: &mut [Match],
    match_id: MatchId,
    winner: Option<Side>,
) -> Result<Vec<MatchHistory>, TournamentError> {
    let idx = index_of(matches, match_id)?;
    let m = &matches[idx];
    match m.status {
        MatchStatus::Completed | MatchStatus::Bye => {
            return Err(TournamentError::MatchAlreadyCompleted(match_id))
        }
        MatchStatus::Pending => return Err(TournamentError::MatchNotReady(match_id)),
        MatchStatus::Ready | MatchStatus::InProgress => {}
    }
    let (aka, shiro) = match (m.aka, m.shiro) {
        (Some(aka), Some(shiro)) => (aka, shiro),
        _ => return Err(TournamentError::MatchNotReady(match_id)),
    };
    let winner_side = match winner {
        Some(side) => side,
        None => decide_winner(m)?,
    };
    let (winner_c, loser_c) = match winner_side {
        Side::Aka => (aka, shiro),
        Side::Shiro => (shiro, aka),
    };

    let m = &mut matches[idx];
    m.status = MatchStatus::Completed;
    m.winner = Some(winner_side);
    m.completed_at = Some(Utc::now());
    let division_id = m.division_id;
    let winner_score = *m.score(winner_side);
    let loser_score = *m.score(winner_side.opponent());
    let next = m.next_match_id.zip(m.next_slot);
    let loser_next = m.loser_next_match_id.zip(m.loser_next_slot);

    if let Some((next_id, slot)) = next {
        place_contestant(matches, next_id, slot, Some(winner_c))?;
    }
    if let Some((next_id, slot)) = loser_next {
        place_contestant(matches, next_id, slot, Some(loser_c))?;
    }

    log::debug!(
        "Match {} completed: athlete {} beat {} ({} - {})",
        match_id,
        winner_c.athlete_id,
        loser_c.athlete_id,
        winner_score.points(),
        loser_score.points()
    );

    Ok(vec![
        MatchHistory::new(
            winner_c.athlete_id,
            winner_c.team_id,
            match_id,
            division_id,
            &winner_score,
            Outcome::Win,
        ),
        MatchHistory::new(
            loser_c.athlete_id,
            loser_c.team_id,
            match_id,
            division_id,
            &loser_score,
            Outcome::Loss,
        ),
    ])
}

/// Undo a completion so the result can be corrected. Scores are kept.
///
/// Refused for byes and when a match the contestants advanced into has already started.
pub fn reopen_match(matches: &mut [Match], match_id: MatchId) -> Result<(), TournamentError> {
    let idx = index_of(matches, match_id)?;
    let m = &matches[idx];
    if m.status != MatchStatus::Completed {
        return Err(TournamentError::InvalidState);
    }
    let next = m.next_match_id.zip(m.next_slot);
    let loser_next = m.loser_next_match_id.zip(m.loser_next_slot);

    for (target, _) in next.iter().chain(loser_next.iter()) {
        let t = &matches[index_of(matches, *target)?];
        if matches!(t.status, MatchStatus::InProgress | MatchStatus::Completed) {
            return Err(TournamentError::MatchLocked(*target));
        }
    }
    for (target, slot) in next.into_iter().chain(loser_next) {
        place_contestant(matches, target, slot, None)?;
    }

    let m = &mut matches[idx];
    m.status = MatchStatus::InProgress;
    m.winner = None;
    m.completed_at = None;
    Ok(())
}

/// True when the bracket exists and every match has been decided.
pub fn is_complete(matches: &[Match]) -> bool {
    !matches.is_empty() && matches.iter().all(|m| m.status.is_decided())
}

/// Medal placings known so far. Without a third-place match both semi-final losers share bronze.
pub fn placings(matches: &[Match]) -> Vec<Placing> {
    let mut out = Vec::new();
    let Some(final_match) = matches
        .iter()
        .filter(|m| m.kind == MatchKind::Bracket)
        .max_by_key(|m| m.round)
    else {
        return out;
    };

    if final_match.status.is_decided() {
        if let Some(c) = final_match.winning_contestant() {
            out.push(Placing { rank: 1, contestant: *c });
        }
        if let Some(c) = final_match.losing_contestant() {
            out.push(Placing { rank: 2, contestant: *c });
        }
    }

    match matches.iter().find(|m| m.kind == MatchKind::ThirdPlace) {
        Some(bronze) => {
            if bronze.status == MatchStatus::Completed {
                if let Some(c) = bronze.winning_contestant() {
                    out.push(Placing { rank: 3, contestant: *c });
                }
            }
        }
        None if final_match.round > 1 => {
            let semi_round = final_match.round - 1;
            for semi in matches
                .iter()
                .filter(|m| m.kind == MatchKind::Bracket && m.round == semi_round)
                .filter(|m| m.status == MatchStatus::Completed)
            {
                if let Some(c) = semi.losing_contestant() {
                    out.push(Placing { rank: 3, contestant: *c });
                }
            }
        }
        None => {}
    }
    out
}

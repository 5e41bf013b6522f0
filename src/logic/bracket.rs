//! Single-elimination bracket: round naming, seeding and tree construction with byes.

use crate::logic::progression::place_contestant;
use crate::models::{
    Contestant, Division, DivisionState, Match, MatchId, MatchKind, MatchStatus, Side,
    TournamentError,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How contestants are placed into the first round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Draw {
    /// Shuffle contestants before placing them.
    #[default]
    Random,
    /// Registration order is seed order (first registered = seed 1).
    Seeded,
}

/// Number of rounds needed for `contestants`: ceil(log2(n)), 0 for fewer than 2.
pub fn round_count(contestants: usize) -> u32 {
    if contestants < 2 {
        return 0;
    }
    contestants.next_power_of_two().trailing_zeros()
}

/// Display name of a round counted from the end of the bracket.
pub fn round_name(round: u32, total_rounds: u32) -> String {
    let remaining = total_rounds.saturating_sub(round);
    match remaining {
        0 => "Final".to_string(),
        1 => "Semi-final".to_string(),
        2 => "Quarter-final".to_string(),
        _ => format!("Round of {}", 1u64 << (remaining + 1)),
    }
}

/// Display name of a match (third-place matches share the final's round number).
pub fn match_label(m: &Match, total_rounds: u32) -> String {
    match m.kind {
        MatchKind::ThirdPlace => "Third place".to_string(),
        MatchKind::Bracket => round_name(m.round, total_rounds),
    }
}

/// Standard seed placement for a power-of-two bracket: slot `i` holds seed `order[i]` (1-based).
/// Seeds 1 and 2 can only meet in the final; adjacent slots are first-round opponents.
pub fn seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let sum = order.len() * 2 + 1;
        order = order.iter().flat_map(|&seed| [seed, sum - seed]).collect();
    }
    order
}

/// Build every match of the division's bracket and move the division to `Bracket`.
///
/// 1. Order contestants (shuffled or registration order).
/// 2. Pad to the next power of two; empty slots are byes, given to the top seeds.
/// 3. Create all rounds up-front and link each match to the one its winner advances to.
/// 4. Optionally add a third-place match fed by the semi-final losers (needs 4+ contestants).
/// 5. Resolve first-round byes so those contestants already sit in round 2.
///
/// Returned matches are ordered by round then position, third-place match last.
pub fn generate_bracket<R: Rng + ?Sized>(
    division: &mut Division,
    draw: Draw,
    rng: &mut R,
) -> Result<Vec<Match>, TournamentError> {
    if division.state != DivisionState::Registration {
        return Err(TournamentError::InvalidState);
    }
    let n = division.contestants.len();
    if n < 2 {
        return Err(TournamentError::NotEnoughContestants);
    }

    let mut order: Vec<Contestant> = division.contestants.clone();
    if draw == Draw::Random {
        order.shuffle(rng);
    }

    let total_rounds = round_count(n);
    let size = 1usize << total_rounds;

    let mut rounds: Vec<Vec<Match>> = (1..=total_rounds)
        .map(|round| {
            let count = size >> round;
            (0..count)
                .map(|position| Match::new(division.id, round, position as u32, MatchKind::Bracket))
                .collect()
        })
        .collect();

    for r in 0..rounds.len() - 1 {
        let next_ids: Vec<MatchId> = rounds[r + 1].iter().map(|m| m.id).collect();
        for (p, m) in rounds[r].iter_mut().enumerate() {
            m.next_match_id = Some(next_ids[p / 2]);
            m.next_slot = Some(if p % 2 == 0 { Side::Aka } else { Side::Shiro });
        }
    }

    let seeds = seed_order(size);
    for (p, m) in rounds[0].iter_mut().enumerate() {
        m.aka = order.get(seeds[2 * p] - 1).copied();
        m.shiro = order.get(seeds[2 * p + 1] - 1).copied();
    }

    let third_place = if division.third_place_match && n >= 4 {
        let bronze = Match::new(division.id, total_rounds, 1, MatchKind::ThirdPlace);
        let semi_round = rounds.len() - 2;
        for (p, semi) in rounds[semi_round].iter_mut().enumerate() {
            semi.loser_next_match_id = Some(bronze.id);
            semi.loser_next_slot = Some(if p % 2 == 0 { Side::Aka } else { Side::Shiro });
        }
        Some(bronze)
    } else {
        None
    };

    let mut matches: Vec<Match> = rounds.into_iter().flatten().chain(third_place).collect();

    let first_round = size / 2;
    let mut byes = 0;
    for i in 0..first_round {
        let bye_side = match (&matches[i].aka, &matches[i].shiro) {
            (Some(_), None) => Some(Side::Aka),
            (None, Some(_)) => Some(Side::Shiro),
            _ => None,
        };
        match bye_side {
            Some(side) => {
                let m = &mut matches[i];
                m.status = MatchStatus::Bye;
                m.winner = Some(side);
                let advancing = m.contestant(side).copied();
                if let (Some(next), Some(slot)) = (m.next_match_id, m.next_slot) {
                    place_contestant(&mut matches, next, slot, advancing)?;
                }
                byes += 1;
            }
            None => matches[i].refresh_status(),
        }
    }

    division.match_ids = matches.iter().map(|m| m.id).collect();
    division.state = DivisionState::Bracket;
    log::info!(
        "Generated bracket for division {}: {} contestants, {} rounds, {} byes, {} matches",
        division.id,
        n,
        total_rounds,
        byes,
        matches.len()
    );
    Ok(matches)
}

/// Return a division to registration; the returned match ids are no longer part of it.
pub fn reset_bracket(division: &mut Division) -> Result<Vec<MatchId>, TournamentError> {
    if division.state == DivisionState::Registration {
        return Err(TournamentError::InvalidState);
    }
    division.state = DivisionState::Registration;
    Ok(std::mem::take(&mut division.match_ids))
}

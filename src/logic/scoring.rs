//! Per-match scoring: technique counts and winner by points.

use crate::models::{Match, MatchStatus, Side, Technique, TournamentError};
use std::cmp::Ordering;

fn ensure_scorable(m: &Match) -> Result<(), TournamentError> {
    match m.status {
        MatchStatus::Completed | MatchStatus::Bye => Err(TournamentError::MatchAlreadyCompleted(m.id)),
        MatchStatus::Pending => Err(TournamentError::MatchNotReady(m.id)),
        MatchStatus::Ready | MatchStatus::InProgress if !m.has_both_contestants() => {
            Err(TournamentError::MatchNotReady(m.id))
        }
        MatchStatus::Ready | MatchStatus::InProgress => Ok(()),
    }
}

/// Award one technique to `side`. The match is in progress afterwards.
pub fn record_technique(m: &mut Match, side: Side, technique: Technique) -> Result<(), TournamentError> {
    ensure_scorable(m)?;
    *m.score_mut(side).count_mut(technique) += 1;
    m.status = MatchStatus::InProgress;
    Ok(())
}

/// Take back one technique from `side` (referee correction).
pub fn remove_technique(m: &mut Match, side: Side, technique: Technique) -> Result<(), TournamentError> {
    ensure_scorable(m)?;
    let count = m.score_mut(side).count_mut(technique);
    if *count == 0 {
        return Err(TournamentError::NoScoreToRemove { side, technique });
    }
    *count -= 1;
    m.status = MatchStatus::InProgress;
    Ok(())
}

/// Side with more points. Level scores need a decision from the referees.
pub fn decide_winner(m: &Match) -> Result<Side, TournamentError> {
    match m.aka_score.points().cmp(&m.shiro_score.points()) {
        Ordering::Greater => Ok(Side::Aka),
        Ordering::Less => Ok(Side::Shiro),
        Ordering::Equal => Err(TournamentError::TiedScore(m.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contestant, MatchKind};
    use uuid::Uuid;

    fn ready_match() -> Match {
        let mut m = Match::new(Uuid::new_v4(), 1, 0, MatchKind::Bracket);
        m.aka = Some(Contestant {
            team_id: Uuid::new_v4(),
            athlete_id: Uuid::new_v4(),
        });
        m.shiro = Some(Contestant {
            team_id: Uuid::new_v4(),
            athlete_id: Uuid::new_v4(),
        });
        m.refresh_status();
        m
    }

    #[test]
    fn recording_moves_match_in_progress() {
        let mut m = ready_match();
        assert_eq!(m.status, MatchStatus::Ready);
        record_technique(&mut m, Side::Aka, Technique::Wazari).unwrap();
        record_technique(&mut m, Side::Shiro, Technique::Yuko).unwrap();
        assert_eq!(m.status, MatchStatus::InProgress);
        assert_eq!(m.aka_score.points(), 2);
        assert_eq!(m.shiro_score.points(), 1);
        assert_eq!(decide_winner(&m).unwrap(), Side::Aka);
    }

    #[test]
    fn points_weight_techniques() {
        let mut m = ready_match();
        record_technique(&mut m, Side::Aka, Technique::Yuko).unwrap();
        record_technique(&mut m, Side::Aka, Technique::Yuko).unwrap();
        record_technique(&mut m, Side::Shiro, Technique::Ippon).unwrap();
        assert_eq!(decide_winner(&m).unwrap(), Side::Shiro);
        record_technique(&mut m, Side::Aka, Technique::Yuko).unwrap();
        assert!(matches!(decide_winner(&m), Err(TournamentError::TiedScore(_))));
    }

    #[test]
    fn remove_refuses_below_zero() {
        let mut m = ready_match();
        assert!(matches!(
            remove_technique(&mut m, Side::Aka, Technique::Ippon),
            Err(TournamentError::NoScoreToRemove { .. })
        ));
        record_technique(&mut m, Side::Aka, Technique::Ippon).unwrap();
        remove_technique(&mut m, Side::Aka, Technique::Ippon).unwrap();
        assert_eq!(m.aka_score.ippon, 0);
    }

    #[test]
    fn cannot_score_pending_or_completed() {
        let mut m = Match::new(Uuid::new_v4(), 2, 0, MatchKind::Bracket);
        assert!(matches!(
            record_technique(&mut m, Side::Aka, Technique::Yuko),
            Err(TournamentError::MatchNotReady(_))
        ));
        let mut done = ready_match();
        done.status = MatchStatus::Completed;
        assert!(matches!(
            record_technique(&mut done, Side::Aka, Technique::Yuko),
            Err(TournamentError::MatchAlreadyCompleted(_))
        ));
    }
}

//! Win/loss statistics rolled up from match histories.

use crate::models::{AthleteId, AthleteStats, MatchHistory, Outcome, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Calculate win rate from wins/losses.
pub fn calculate_win_rate(wins: u32, losses: u32) -> f64 {
    let total = wins + losses;
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

/// Aggregate technique counts and outcomes over a set of histories.
pub fn athlete_stats<'a>(histories: impl IntoIterator<Item = &'a MatchHistory>) -> AthleteStats {
    let mut stats = AthleteStats::default();
    for h in histories {
        stats.matches += 1;
        match h.outcome {
            Outcome::Win => stats.wins += 1,
            Outcome::Loss => stats.losses += 1,
        }
        stats.yuko += h.yuko;
        stats.wazari += h.wazari;
        stats.ippon += h.ippon;
        stats.points += h.score().points();
    }
    stats.win_rate = calculate_win_rate(stats.wins, stats.losses);
    stats
}

/// Totals for every history recorded under `team_id`.
pub fn team_stats(team_id: TeamId, histories: &[MatchHistory]) -> AthleteStats {
    athlete_stats(histories.iter().filter(|h| h.team_id == team_id))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub athlete_id: AthleteId,
    pub stats: AthleteStats,
}

/// Per-athlete stats, best first: win rate, then wins, then points.
pub fn leaderboard(histories: &[MatchHistory]) -> Vec<LeaderboardEntry> {
    let mut by_athlete: HashMap<AthleteId, Vec<&MatchHistory>> = HashMap::new();
    for h in histories {
        by_athlete.entry(h.athlete_id).or_default().push(h);
    }

    let mut entries: Vec<LeaderboardEntry> = by_athlete
        .into_iter()
        .map(|(athlete_id, hs)| LeaderboardEntry {
            athlete_id,
            stats: athlete_stats(hs),
        })
        .collect();
    entries.sort_by(|a, b| {
        b.stats
            .win_rate
            .partial_cmp(&a.stats.win_rate)
            .unwrap_or(Ordering::Equal)
            .then(b.stats.wins.cmp(&a.stats.wins))
            .then(b.stats.points.cmp(&a.stats.points))
            .then(a.athlete_id.cmp(&b.athlete_id))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreCard;
    use uuid::Uuid;

    fn history(athlete_id: AthleteId, team_id: TeamId, score: ScoreCard, outcome: Outcome) -> MatchHistory {
        MatchHistory::new(athlete_id, team_id, Uuid::new_v4(), Uuid::new_v4(), &score, outcome)
    }

    #[test]
    fn test_calculate_win_rate() {
        assert_eq!(calculate_win_rate(0, 0), 0.0);
        assert_eq!(calculate_win_rate(3, 3), 0.5);
        assert!((calculate_win_rate(5, 1) - 0.833).abs() < 0.01);
    }

    #[test]
    fn test_athlete_stats_rolls_up_techniques() {
        let a = Uuid::new_v4();
        let t = Uuid::new_v4();
        let hs = vec![
            history(a, t, ScoreCard { yuko: 2, wazari: 1, ippon: 0 }, Outcome::Win),
            history(a, t, ScoreCard { yuko: 0, wazari: 0, ippon: 1 }, Outcome::Loss),
            history(a, t, ScoreCard { yuko: 1, wazari: 0, ippon: 1 }, Outcome::Win),
        ];
        let s = athlete_stats(&hs);
        assert_eq!(s.matches, 3);
        assert_eq!(s.wins, 2);
        assert_eq!(s.losses, 1);
        assert_eq!((s.yuko, s.wazari, s.ippon), (3, 1, 2));
        assert_eq!(s.points, 3 + 2 + 6);
        assert!((s.win_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_team_stats_filters_by_team() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let hs = vec![
            history(Uuid::new_v4(), t1, ScoreCard::default(), Outcome::Win),
            history(Uuid::new_v4(), t2, ScoreCard::default(), Outcome::Loss),
            history(Uuid::new_v4(), t1, ScoreCard::default(), Outcome::Loss),
        ];
        let s = team_stats(t1, &hs);
        assert_eq!(s.matches, 2);
        assert_eq!(s.wins, 1);
    }

    #[test]
    fn test_leaderboard_orders_by_win_rate_then_wins() {
        let t = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let hs = vec![
            history(a, t, ScoreCard::default(), Outcome::Win),
            history(a, t, ScoreCard::default(), Outcome::Loss),
            history(b, t, ScoreCard::default(), Outcome::Win),
            history(b, t, ScoreCard::default(), Outcome::Win),
            history(c, t, ScoreCard::default(), Outcome::Win),
        ];
        let board = leaderboard(&hs);
        let order: Vec<_> = board.iter().map(|e| e.athlete_id).collect();
        assert_eq!(order, vec![b, c, a]);
    }
}

//! MatchHistory records and the AthleteStats view built from them.

use crate::models::athlete::AthleteId;
use crate::models::division::DivisionId;
use crate::models::game::{MatchId, ScoreCard};
use crate::models::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MatchHistoryId = Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

/// One athlete's record of one completed match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchHistory {
    pub id: MatchHistoryId,
    pub athlete_id: AthleteId,
    pub team_id: TeamId,
    pub match_id: MatchId,
    pub division_id: DivisionId,
    pub yuko: u32,
    pub wazari: u32,
    pub ippon: u32,
    pub outcome: Outcome,
    pub recorded_at: DateTime<Utc>,
}

impl MatchHistory {
    pub fn new(
        athlete_id: AthleteId,
        team_id: TeamId,
        match_id: MatchId,
        division_id: DivisionId,
        score: &ScoreCard,
        outcome: Outcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            athlete_id,
            team_id,
            match_id,
            division_id,
            yuko: score.yuko,
            wazari: score.wazari,
            ippon: score.ippon,
            outcome,
            recorded_at: Utc::now(),
        }
    }

    pub fn score(&self) -> ScoreCard {
        ScoreCard {
            yuko: self.yuko,
            wazari: self.wazari,
            ippon: self.ippon,
        }
    }
}

/// Statistics view of an athlete (or a team) over a set of histories.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteStats {
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub yuko: u32,
    pub wazari: u32,
    pub ippon: u32,
    pub points: u32,
    /// wins / matches, 0.0 when no matches.
    pub win_rate: f64,
}

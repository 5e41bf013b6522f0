//! Division (gender/weight bracket), Contestant and DivisionState.

use crate::models::athlete::{Athlete, AthleteId, Gender};
use crate::models::game::MatchId;
use crate::models::team::TeamId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DivisionId = Uuid;

/// A (team, athlete) pairing registered into a division.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Contestant {
    pub team_id: TeamId,
    pub athlete_id: AthleteId,
}

/// Current phase of a division.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionState {
    /// Contestants can be registered and withdrawn.
    #[default]
    Registration,
    /// Bracket generated; matches are being fought.
    Bracket,
    /// Every match decided.
    Completed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub id: DivisionId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub gender: Gender,
    /// Exclusive lower weight bound (None = open).
    pub min_weight_kg: Option<f64>,
    /// Inclusive upper weight bound (None = open).
    pub max_weight_kg: Option<f64>,
    #[serde(default)]
    pub third_place_match: bool,
    #[serde(default)]
    pub contestants: Vec<Contestant>,
    #[serde(default)]
    pub match_ids: Vec<MatchId>,
    #[serde(default)]
    pub state: DivisionState,
    pub created_at: DateTime<Utc>,
}

impl Division {
    pub fn new(tournament_id: TournamentId, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: name.into(),
            gender,
            min_weight_kg: None,
            max_weight_kg: None,
            third_place_match: false,
            contestants: Vec::new(),
            match_ids: Vec::new(),
            state: DivisionState::Registration,
            created_at: Utc::now(),
        }
    }

    /// Builder-style weight range, e.g. `-60 kg` is `with_weight_range(Some(55.0), Some(60.0))`.
    pub fn with_weight_range(mut self, min_weight_kg: Option<f64>, max_weight_kg: Option<f64>) -> Self {
        self.min_weight_kg = min_weight_kg;
        self.max_weight_kg = max_weight_kg;
        self
    }

    pub fn with_third_place_match(mut self, enabled: bool) -> Self {
        self.third_place_match = enabled;
        self
    }

    pub fn weight_in_range(&self, weight_kg: f64) -> bool {
        let above_min = self.min_weight_kg.map_or(true, |min| weight_kg > min);
        let below_max = self.max_weight_kg.map_or(true, |max| weight_kg <= max);
        above_min && below_max
    }

    /// True if the athlete's gender and weight fit this division.
    pub fn accepts(&self, athlete: &Athlete) -> bool {
        athlete.gender == self.gender && self.weight_in_range(athlete.weight_kg)
    }

    pub fn has_athlete(&self, athlete_id: AthleteId) -> bool {
        self.contestants.iter().any(|c| c.athlete_id == athlete_id)
    }
}

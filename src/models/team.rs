//! Team (club / dojo) owning a roster of athletes.

use crate::models::athlete::AthleteId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TeamId = Uuid;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub coach: Option<String>,
    /// Roster in insertion order, no duplicates.
    #[serde(default)]
    pub athlete_ids: Vec<AthleteId>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            coach: None,
            athlete_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Add an athlete to the roster (no-op if already there).
    pub fn add_athlete(&mut self, athlete_id: AthleteId) {
        if !self.athlete_ids.contains(&athlete_id) {
            self.athlete_ids.push(athlete_id);
        }
    }

    /// Returns true if the athlete was on the roster.
    pub fn remove_athlete(&mut self, athlete_id: AthleteId) -> bool {
        let before = self.athlete_ids.len();
        self.athlete_ids.retain(|id| *id != athlete_id);
        self.athlete_ids.len() != before
    }
}

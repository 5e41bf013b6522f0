//! Tournament and TournamentError.

use crate::models::athlete::{AthleteId, Gender};
use crate::models::division::DivisionId;
use crate::models::game::{MatchId, Side, Technique};
use crate::models::team::TeamId;
use crate::store::{EntityKind, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Debug)]
pub enum TournamentError {
    /// Division (or match) is not in a state that allows this action.
    InvalidState,
    /// A required field is empty or out of range.
    InvalidInput(String),
    /// No document of this kind with this id.
    NotFound { kind: EntityKind, id: Uuid },
    /// A bracket needs at least 2 contestants.
    NotEnoughContestants,
    /// Athlete is already registered in the division.
    DuplicateContestant(AthleteId),
    /// Athlete is not registered in the division.
    ContestantNotFound(AthleteId),
    /// Contestants must belong to a team.
    AthleteWithoutTeam(AthleteId),
    /// Athlete's gender does not match the division.
    GenderMismatch { division: Gender, athlete: Gender },
    /// Athlete's weight is outside the division's range.
    WeightOutOfRange { weight_kg: f64 },
    /// Athlete is registered in a division and cannot be removed.
    AthleteInUse(AthleteId),
    /// A team with this name already exists (case-insensitive).
    DuplicateTeamName,
    /// Team has athletes registered in divisions.
    TeamInUse(TeamId),
    /// Match does not have both contestants yet.
    MatchNotReady(MatchId),
    /// Match was already decided.
    MatchAlreadyCompleted(MatchId),
    /// Scores are level and no decision was given.
    TiedScore(MatchId),
    /// Nothing to remove for this side/technique.
    NoScoreToRemove { side: Side, technique: Technique },
    /// A following match has already started, so this one cannot be reopened.
    MatchLocked(MatchId),
    /// CSV roster row could not be imported.
    Import { row: usize, message: String },
    /// Document store failure.
    Store(StoreError),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::InvalidInput(message) => write!(f, "Invalid input: {}", message),
            TournamentError::NotFound { kind, id } => write!(f, "{} {} not found", kind, id),
            TournamentError::NotEnoughContestants => {
                write!(f, "Need at least 2 contestants to generate a bracket")
            }
            TournamentError::DuplicateContestant(_) => {
                write!(f, "Athlete is already registered in this division")
            }
            TournamentError::ContestantNotFound(_) => {
                write!(f, "Athlete is not registered in this division")
            }
            TournamentError::AthleteWithoutTeam(_) => {
                write!(f, "Athlete must belong to a team to be registered")
            }
            TournamentError::GenderMismatch { division, athlete } => write!(
                f,
                "Division is for {} athletes, athlete is {}",
                division, athlete
            ),
            TournamentError::WeightOutOfRange { weight_kg } => {
                write!(f, "Weight {} kg is outside the division range", weight_kg)
            }
            TournamentError::AthleteInUse(_) => {
                write!(f, "Athlete is registered in a division")
            }
            TournamentError::DuplicateTeamName => write!(f, "A team with this name already exists"),
            TournamentError::TeamInUse(_) => {
                write!(f, "Team has athletes registered in a division")
            }
            TournamentError::MatchNotReady(_) => write!(f, "Match does not have both contestants"),
            TournamentError::MatchAlreadyCompleted(_) => write!(f, "Match is already completed"),
            TournamentError::TiedScore(_) => {
                write!(f, "Scores are tied; a decision (winner) is required")
            }
            TournamentError::NoScoreToRemove { side, technique } => {
                write!(f, "No {:?} recorded for {:?}", technique, side)
            }
            TournamentError::MatchLocked(_) => {
                write!(f, "A following match has already started")
            }
            TournamentError::Import { row, message } => {
                write!(f, "Roster row {}: {}", row, message)
            }
            TournamentError::Store(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for TournamentError {}

impl From<StoreError> for TournamentError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { kind, id } => TournamentError::NotFound { kind, id },
            other => TournamentError::Store(other),
        }
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// A competition day: a named event that owns its divisions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub date: NaiveDate,
    pub location: Option<String>,
    #[serde(default)]
    pub division_ids: Vec<DivisionId>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a new tournament with no divisions.
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            date,
            location: None,
            division_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

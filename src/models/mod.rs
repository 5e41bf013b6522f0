//! Data structures for the karate tournament: athletes, teams, divisions, matches, history.

mod athlete;
mod division;
mod game;
mod history;
mod team;
mod tournament;

pub use athlete::{Athlete, AthleteId, Gender};
pub use division::{Contestant, Division, DivisionId, DivisionState};
pub use game::{Match, MatchId, MatchKind, MatchStatus, ScoreCard, Side, Technique};
pub use history::{AthleteStats, MatchHistory, MatchHistoryId, Outcome};
pub use team::{Team, TeamId};
pub use tournament::{Tournament, TournamentError, TournamentId};

//! Karate tournament manager: library with models, bracket logic, and a JSON document store.

pub mod config;
pub mod import;
pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use config::Config;
pub use import::{parse_roster, ImportSummary, RosterRow};
pub use logic::{
    athlete_stats, calculate_win_rate, complete_match, create_division, decide_winner,
    generate_bracket, is_complete, leaderboard, match_label, placings, record_technique,
    register_contestant, remove_technique, reopen_match, reset_bracket, round_count, round_name,
    seed_order, team_stats, withdraw_contestant, Draw, LeaderboardEntry, Placing,
};
pub use models::{
    Athlete, AthleteId, AthleteStats, Contestant, Division, DivisionId, DivisionState, Gender,
    Match, MatchHistory, MatchHistoryId, MatchId, MatchKind, MatchStatus, Outcome, ScoreCard, Side,
    Team, TeamId, Technique, Tournament, TournamentError, TournamentId,
};
pub use service::{
    AthleteInput, BracketMatch, BracketView, DivisionInput, TeamInput, TournamentInput,
    TournamentService,
};
pub use store::{Entity, EntityKind, Store, StoreError};

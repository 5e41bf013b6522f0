//! Tournament business logic: registration, bracket generation, scoring, progression, stats.

pub mod bracket;
pub mod progression;
pub mod registration;
pub mod scoring;
pub mod stats;

pub use bracket::{generate_bracket, match_label, reset_bracket, round_count, round_name, seed_order, Draw};
pub use progression::{complete_match, is_complete, placings, reopen_match, Placing};
pub use registration::{create_division, register_contestant, withdraw_contestant};
pub use scoring::{decide_winner, record_technique, remove_technique};
pub use stats::{athlete_stats, calculate_win_rate, leaderboard, team_stats, LeaderboardEntry};

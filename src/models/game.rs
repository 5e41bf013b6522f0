//! Match (one bracket node), Side, ScoreCard and MatchStatus.

use crate::models::division::{Contestant, DivisionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Corner of the match area: aka (red) or shiro (white).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Aka,
    Shiro,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Aka => Side::Shiro,
            Side::Shiro => Side::Aka,
        }
    }
}

/// Scoring technique. Values follow the yuko = 1, wazari = 2, ippon = 3 scale.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Yuko,
    Wazari,
    Ippon,
}

impl Technique {
    pub fn points(self) -> u32 {
        match self {
            Technique::Yuko => 1,
            Technique::Wazari => 2,
            Technique::Ippon => 3,
        }
    }
}

/// Running technique counts for one side of a match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub yuko: u32,
    pub wazari: u32,
    pub ippon: u32,
}

impl ScoreCard {
    pub fn points(&self) -> u32 {
        self.yuko * Technique::Yuko.points()
            + self.wazari * Technique::Wazari.points()
            + self.ippon * Technique::Ippon.points()
    }

    pub fn count(&self, technique: Technique) -> u32 {
        match technique {
            Technique::Yuko => self.yuko,
            Technique::Wazari => self.wazari,
            Technique::Ippon => self.ippon,
        }
    }

    pub fn count_mut(&mut self, technique: Technique) -> &mut u32 {
        match technique {
            Technique::Yuko => &mut self.yuko,
            Technique::Wazari => &mut self.wazari,
            Technique::Ippon => &mut self.ippon,
        }
    }
}

/// Lifecycle of a match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Waiting for one or both contestants from earlier rounds.
    #[default]
    Pending,
    /// Both contestants known, no score recorded yet.
    Ready,
    /// At least one technique recorded (or reopened after completion).
    InProgress,
    Completed,
    /// Only one contestant; they advanced without fighting.
    Bye,
}

impl MatchStatus {
    /// Completed or bye: the match has a winner.
    pub fn is_decided(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Bye)
    }
}

/// Whether the match is part of the main tree or the bronze match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    #[default]
    Bracket,
    ThirdPlace,
}

/// A single match: two contestants (either may still be unknown).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub division_id: DivisionId,
    /// 1-based round number.
    pub round: u32,
    /// 0-based position within the round.
    pub position: u32,
    #[serde(default)]
    pub kind: MatchKind,
    pub aka: Option<Contestant>,
    pub shiro: Option<Contestant>,
    pub status: MatchStatus,
    /// None until decided.
    pub winner: Option<Side>,
    #[serde(default)]
    pub aka_score: ScoreCard,
    #[serde(default)]
    pub shiro_score: ScoreCard,
    /// Where the winner advances to (None for the final and the third-place match).
    pub next_match_id: Option<MatchId>,
    pub next_slot: Option<Side>,
    /// Where the loser goes (semi-finals feeding a third-place match).
    pub loser_next_match_id: Option<MatchId>,
    pub loser_next_slot: Option<Side>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(division_id: DivisionId, round: u32, position: u32, kind: MatchKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            division_id,
            round,
            position,
            kind,
            aka: None,
            shiro: None,
            status: MatchStatus::Pending,
            winner: None,
            aka_score: ScoreCard::default(),
            shiro_score: ScoreCard::default(),
            next_match_id: None,
            next_slot: None,
            loser_next_match_id: None,
            loser_next_slot: None,
            completed_at: None,
        }
    }

    pub fn contestant(&self, side: Side) -> Option<&Contestant> {
        match side {
            Side::Aka => self.aka.as_ref(),
            Side::Shiro => self.shiro.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Option<Contestant> {
        match side {
            Side::Aka => &mut self.aka,
            Side::Shiro => &mut self.shiro,
        }
    }

    pub fn score(&self, side: Side) -> &ScoreCard {
        match side {
            Side::Aka => &self.aka_score,
            Side::Shiro => &self.shiro_score,
        }
    }

    pub fn score_mut(&mut self, side: Side) -> &mut ScoreCard {
        match side {
            Side::Aka => &mut self.aka_score,
            Side::Shiro => &mut self.shiro_score,
        }
    }

    pub fn has_both_contestants(&self) -> bool {
        self.aka.is_some() && self.shiro.is_some()
    }

    pub fn winning_contestant(&self) -> Option<&Contestant> {
        self.winner.and_then(|side| self.contestant(side))
    }

    pub fn losing_contestant(&self) -> Option<&Contestant> {
        self.winner.and_then(|side| self.contestant(side.opponent()))
    }

    /// Recompute Pending/Ready for a match that has not started.
    pub fn refresh_status(&mut self) {
        if matches!(self.status, MatchStatus::Pending | MatchStatus::Ready) {
            self.status = if self.has_both_contestants() {
                MatchStatus::Ready
            } else {
                MatchStatus::Pending
            };
        }
    }
}

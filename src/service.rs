//! Entity operations over the document store: each call loads, applies logic, and saves.

use crate::import::{parse_roster, ImportSummary};
use crate::logic::{self, Draw, LeaderboardEntry, Placing};
use crate::models::{
    Athlete, AthleteId, AthleteStats, Division, DivisionId, DivisionState, Gender, Match,
    MatchHistory, MatchId, MatchKind, Side, Team, TeamId, Technique, Tournament, TournamentError,
    TournamentId,
};
use crate::store::{Entity, EntityKind, Store};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct AthleteInput {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub weight_kg: f64,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub belt: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TeamInput {
    pub name: String,
    #[serde(default)]
    pub coach: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TournamentInput {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DivisionInput {
    pub name: String,
    pub gender: Gender,
    #[serde(default)]
    pub min_weight_kg: Option<f64>,
    #[serde(default)]
    pub max_weight_kg: Option<f64>,
    #[serde(default)]
    pub third_place_match: bool,
}

/// A match with its display label ("Final", "Semi-final", ...).
#[derive(Clone, Debug, Serialize)]
pub struct BracketMatch {
    pub label: String,
    #[serde(flatten)]
    pub game: Match,
}

/// A division and its matches ordered by round then position.
#[derive(Clone, Debug, Serialize)]
pub struct BracketView {
    pub division: Division,
    pub total_rounds: u32,
    pub matches: Vec<BracketMatch>,
}

fn required(field: &str, value: &str) -> Result<String, TournamentError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TournamentError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Team names compare case-insensitively, beyond ASCII ("Ōita" == "ōita").
fn same_team_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn validate_weight(weight_kg: f64) -> Result<f64, TournamentError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(TournamentError::InvalidInput(format!(
            "weight {} kg is not valid",
            weight_kg
        )));
    }
    Ok(weight_kg)
}

pub struct TournamentService {
    store: Store,
}

impl TournamentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Open the store under `data_dir` (created if missing).
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, TournamentError> {
        Ok(Self::new(Store::open(data_dir)?))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn save_all<'a, T: Entity + 'a>(&self, items: impl IntoIterator<Item = &'a T>) -> Result<(), TournamentError> {
        for item in items {
            self.store.save(item)?;
        }
        Ok(())
    }

    fn divisions_with_athlete(&self, athlete_id: AthleteId) -> Result<Vec<Division>, TournamentError> {
        Ok(self
            .store
            .list::<Division>()?
            .into_iter()
            .filter(|d| d.has_athlete(athlete_id))
            .collect())
    }

    // ---- athletes ----

    pub fn create_athlete(&self, input: AthleteInput) -> Result<Athlete, TournamentError> {
        let mut athlete = Athlete::new(
            required("first_name", &input.first_name)?,
            required("last_name", &input.last_name)?,
            input.gender,
            validate_weight(input.weight_kg)?,
        );
        athlete.birth_date = input.birth_date;
        athlete.belt = optional(input.belt);

        if let Some(team_id) = input.team_id {
            let mut team: Team = self.store.load(team_id)?;
            athlete.team_id = Some(team_id);
            team.add_athlete(athlete.id);
            self.store.save(&athlete)?;
            self.store.save(&team)?;
        } else {
            self.store.save(&athlete)?;
        }
        log::info!("Created athlete {} ({})", athlete.full_name(), athlete.id);
        Ok(athlete)
    }

    pub fn get_athlete(&self, id: AthleteId) -> Result<Athlete, TournamentError> {
        Ok(self.store.load(id)?)
    }

    /// All athletes sorted by last name, then first name.
    pub fn list_athletes(&self) -> Result<Vec<Athlete>, TournamentError> {
        let mut athletes: Vec<Athlete> = self.store.list()?;
        athletes.sort_by_cached_key(|a| (a.last_name.to_lowercase(), a.first_name.to_lowercase()));
        Ok(athletes)
    }

    /// Replace an athlete's details. While registered in a division the team cannot change
    /// and the athlete must still fit every division that is open for registration.
    pub fn update_athlete(&self, id: AthleteId, input: AthleteInput) -> Result<Athlete, TournamentError> {
        let mut athlete: Athlete = self.store.load(id)?;
        let old_team = athlete.team_id;

        athlete.first_name = required("first_name", &input.first_name)?;
        athlete.last_name = required("last_name", &input.last_name)?;
        athlete.gender = input.gender;
        athlete.weight_kg = validate_weight(input.weight_kg)?;
        athlete.birth_date = input.birth_date;
        athlete.belt = optional(input.belt);
        athlete.team_id = input.team_id;

        for division in self.divisions_with_athlete(id)? {
            let refit = division.state == DivisionState::Registration && !division.accepts(&athlete);
            if old_team != athlete.team_id || refit {
                return Err(TournamentError::AthleteInUse(id));
            }
        }

        if old_team != athlete.team_id {
            if let Some(team_id) = athlete.team_id {
                let mut team: Team = self.store.load(team_id)?;
                team.add_athlete(id);
                self.store.save(&team)?;
            }
            if let Some(team_id) = old_team {
                if let Some(mut team) = self.store.find::<Team>(team_id)? {
                    team.remove_athlete(id);
                    self.store.save(&team)?;
                }
            }
        }
        self.store.save(&athlete)?;
        log::info!("Updated athlete {}", id);
        Ok(athlete)
    }

    pub fn delete_athlete(&self, id: AthleteId) -> Result<(), TournamentError> {
        let athlete: Athlete = self.store.load(id)?;
        if !self.divisions_with_athlete(id)?.is_empty() {
            return Err(TournamentError::AthleteInUse(id));
        }
        if let Some(team_id) = athlete.team_id {
            if let Some(mut team) = self.store.find::<Team>(team_id)? {
                team.remove_athlete(id);
                self.store.save(&team)?;
            }
        }
        self.store.delete::<Athlete>(id)?;
        log::info!("Deleted athlete {}", id);
        Ok(())
    }

    // ---- teams ----

    fn ensure_unique_team_name(&self, name: &str, except: Option<TeamId>) -> Result<(), TournamentError> {
        let taken = self
            .store
            .list::<Team>()?
            .iter()
            .any(|t| Some(t.id) != except && same_team_name(&t.name, name));
        if taken {
            return Err(TournamentError::DuplicateTeamName);
        }
        Ok(())
    }

    pub fn create_team(&self, input: TeamInput) -> Result<Team, TournamentError> {
        let name = required("name", &input.name)?;
        self.ensure_unique_team_name(&name, None)?;
        let mut team = Team::new(name);
        team.coach = optional(input.coach);
        self.store.save(&team)?;
        log::info!("Created team {} ({})", team.name, team.id);
        Ok(team)
    }

    pub fn get_team(&self, id: TeamId) -> Result<Team, TournamentError> {
        Ok(self.store.load(id)?)
    }

    pub fn list_teams(&self) -> Result<Vec<Team>, TournamentError> {
        let mut teams: Vec<Team> = self.store.list()?;
        teams.sort_by_cached_key(|t| t.name.to_lowercase());
        Ok(teams)
    }

    pub fn update_team(&self, id: TeamId, input: TeamInput) -> Result<Team, TournamentError> {
        let mut team: Team = self.store.load(id)?;
        let name = required("name", &input.name)?;
        self.ensure_unique_team_name(&name, Some(id))?;
        team.name = name;
        team.coach = optional(input.coach);
        self.store.save(&team)?;
        log::info!("Updated team {}", id);
        Ok(team)
    }

    /// Delete a team; its athletes are kept without a team.
    pub fn delete_team(&self, id: TeamId) -> Result<(), TournamentError> {
        let team: Team = self.store.load(id)?;
        let in_use = self
            .store
            .list::<Division>()?
            .iter()
            .any(|d| d.contestants.iter().any(|c| c.team_id == id));
        if in_use {
            return Err(TournamentError::TeamInUse(id));
        }
        for athlete_id in &team.athlete_ids {
            if let Some(mut athlete) = self.store.find::<Athlete>(*athlete_id)? {
                athlete.team_id = None;
                self.store.save(&athlete)?;
            }
        }
        self.store.delete::<Team>(id)?;
        log::info!("Deleted team {}", id);
        Ok(())
    }

    // ---- tournaments ----

    pub fn create_tournament(&self, input: TournamentInput) -> Result<Tournament, TournamentError> {
        let mut tournament = Tournament::new(required("name", &input.name)?, input.date);
        tournament.location = optional(input.location);
        self.store.save(&tournament)?;
        log::info!("Created tournament {} ({})", tournament.name, tournament.id);
        Ok(tournament)
    }

    pub fn get_tournament(&self, id: TournamentId) -> Result<Tournament, TournamentError> {
        Ok(self.store.load(id)?)
    }

    /// All tournaments, most recent date first.
    pub fn list_tournaments(&self) -> Result<Vec<Tournament>, TournamentError> {
        let mut tournaments: Vec<Tournament> = self.store.list()?;
        tournaments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.name.cmp(&b.name)));
        Ok(tournaments)
    }

    /// Delete a tournament with its divisions, matches and histories.
    pub fn delete_tournament(&self, id: TournamentId) -> Result<(), TournamentError> {
        let tournament: Tournament = self.store.load(id)?;
        for division_id in &tournament.division_ids {
            if let Some(division) = self.store.find::<Division>(*division_id)? {
                self.delete_division_documents(&division)?;
            }
        }
        self.store.delete::<Tournament>(id)?;
        log::info!("Deleted tournament {}", id);
        Ok(())
    }

    // ---- divisions ----

    pub fn create_division(&self, tournament_id: TournamentId, input: DivisionInput) -> Result<Division, TournamentError> {
        let mut tournament: Tournament = self.store.load(tournament_id)?;
        let division = logic::create_division(
            &mut tournament,
            &input.name,
            input.gender,
            input.min_weight_kg,
            input.max_weight_kg,
            input.third_place_match,
        )?;
        self.store.save(&division)?;
        self.store.save(&tournament)?;
        log::info!("Created division {} ({}) in tournament {}", division.name, division.id, tournament_id);
        Ok(division)
    }

    pub fn get_division(&self, id: DivisionId) -> Result<Division, TournamentError> {
        Ok(self.store.load(id)?)
    }

    /// Divisions of a tournament in creation order.
    pub fn list_divisions(&self, tournament_id: TournamentId) -> Result<Vec<Division>, TournamentError> {
        let tournament: Tournament = self.store.load(tournament_id)?;
        let mut out = Vec::with_capacity(tournament.division_ids.len());
        for id in &tournament.division_ids {
            match self.store.find::<Division>(*id)? {
                Some(d) => out.push(d),
                None => log::warn!("Tournament {} references missing division {}", tournament_id, id),
            }
        }
        Ok(out)
    }

    pub fn delete_division(&self, id: DivisionId) -> Result<(), TournamentError> {
        let division: Division = self.store.load(id)?;
        if let Some(mut tournament) = self.store.find::<Tournament>(division.tournament_id)? {
            tournament.division_ids.retain(|d| *d != id);
            self.store.save(&tournament)?;
        }
        self.delete_division_documents(&division)?;
        log::info!("Deleted division {}", id);
        Ok(())
    }

    fn delete_bracket_documents(&self, division_id: DivisionId, match_ids: &[MatchId]) -> Result<(), TournamentError> {
        for history in self.store.list::<MatchHistory>()? {
            if history.division_id == division_id {
                self.store.delete::<MatchHistory>(history.id)?;
            }
        }
        for match_id in match_ids {
            self.store.delete::<Match>(*match_id)?;
        }
        Ok(())
    }

    fn delete_division_documents(&self, division: &Division) -> Result<(), TournamentError> {
        self.delete_bracket_documents(division.id, &division.match_ids)?;
        self.store.delete::<Division>(division.id)?;
        Ok(())
    }

    pub fn register_contestant(&self, division_id: DivisionId, athlete_id: AthleteId) -> Result<Division, TournamentError> {
        let mut division: Division = self.store.load(division_id)?;
        let athlete: Athlete = self.store.load(athlete_id)?;
        logic::register_contestant(&mut division, &athlete)?;
        self.store.save(&division)?;
        log::info!("Registered athlete {} in division {}", athlete_id, division_id);
        Ok(division)
    }

    pub fn withdraw_contestant(&self, division_id: DivisionId, athlete_id: AthleteId) -> Result<Division, TournamentError> {
        let mut division: Division = self.store.load(division_id)?;
        logic::withdraw_contestant(&mut division, athlete_id)?;
        self.store.save(&division)?;
        log::info!("Withdrew athlete {} from division {}", athlete_id, division_id);
        Ok(division)
    }

    pub fn generate_bracket(&self, division_id: DivisionId, draw: Draw) -> Result<BracketView, TournamentError> {
        let mut division: Division = self.store.load(division_id)?;
        let matches = logic::generate_bracket(&mut division, draw, &mut rand::thread_rng())?;
        self.save_all(&matches)?;
        self.store.save(&division)?;
        Ok(Self::view(division, matches))
    }

    /// Discard the bracket (matches and histories) and reopen registration.
    pub fn reset_bracket(&self, division_id: DivisionId) -> Result<Division, TournamentError> {
        let mut division: Division = self.store.load(division_id)?;
        let match_ids = logic::reset_bracket(&mut division)?;
        self.delete_bracket_documents(division_id, &match_ids)?;
        self.store.save(&division)?;
        log::info!("Reset bracket of division {} ({} matches removed)", division_id, match_ids.len());
        Ok(division)
    }

    fn division_matches(&self, division: &Division) -> Result<Vec<Match>, TournamentError> {
        let mut matches = Vec::with_capacity(division.match_ids.len());
        for id in &division.match_ids {
            matches.push(self.store.load::<Match>(*id)?);
        }
        Ok(matches)
    }

    fn view(division: Division, mut matches: Vec<Match>) -> BracketView {
        let total_rounds = logic::round_count(division.contestants.len());
        matches.sort_by_key(|m| (m.round, m.kind == MatchKind::ThirdPlace, m.position));
        let matches = matches
            .into_iter()
            .map(|m| BracketMatch {
                label: logic::match_label(&m, total_rounds),
                game: m,
            })
            .collect();
        BracketView {
            division,
            total_rounds,
            matches,
        }
    }

    pub fn bracket(&self, division_id: DivisionId) -> Result<BracketView, TournamentError> {
        let division: Division = self.store.load(division_id)?;
        let matches = self.division_matches(&division)?;
        Ok(Self::view(division, matches))
    }

    pub fn placings(&self, division_id: DivisionId) -> Result<Vec<Placing>, TournamentError> {
        let division: Division = self.store.load(division_id)?;
        Ok(logic::placings(&self.division_matches(&division)?))
    }

    pub fn division_leaderboard(&self, division_id: DivisionId) -> Result<Vec<LeaderboardEntry>, TournamentError> {
        let _division: Division = self.store.load(division_id)?;
        let histories: Vec<MatchHistory> = self
            .store
            .list::<MatchHistory>()?
            .into_iter()
            .filter(|h| h.division_id == division_id)
            .collect();
        Ok(logic::leaderboard(&histories))
    }

    // ---- matches ----

    pub fn get_match(&self, id: MatchId) -> Result<Match, TournamentError> {
        Ok(self.store.load(id)?)
    }

    pub fn record_technique(&self, match_id: MatchId, side: Side, technique: Technique) -> Result<Match, TournamentError> {
        let mut m: Match = self.store.load(match_id)?;
        logic::record_technique(&mut m, side, technique)?;
        self.store.save(&m)?;
        log::debug!("Match {}: {:?} +{:?}", match_id, side, technique);
        Ok(m)
    }

    pub fn remove_technique(&self, match_id: MatchId, side: Side, technique: Technique) -> Result<Match, TournamentError> {
        let mut m: Match = self.store.load(match_id)?;
        logic::remove_technique(&mut m, side, technique)?;
        self.store.save(&m)?;
        log::debug!("Match {}: {:?} -{:?}", match_id, side, technique);
        Ok(m)
    }

    fn load_bracket_of(&self, match_id: MatchId) -> Result<(Division, Vec<Match>), TournamentError> {
        let m: Match = self.store.load(match_id)?;
        let division: Division = self.store.load(m.division_id)?;
        let matches = self.division_matches(&division)?;
        Ok((division, matches))
    }

    /// Save `match_id` and the matches its contestants move into.
    fn save_affected(&self, matches: &[Match], match_id: MatchId) -> Result<Match, TournamentError> {
        let by_id: HashMap<MatchId, &Match> = matches.iter().map(|m| (m.id, m)).collect();
        let m = by_id.get(&match_id).copied().ok_or(TournamentError::NotFound {
            kind: EntityKind::Match,
            id: match_id,
        })?;
        for target in [m.next_match_id, m.loser_next_match_id].into_iter().flatten() {
            if let Some(t) = by_id.get(&target) {
                self.store.save(*t)?;
            }
        }
        self.store.save(m)?;
        Ok(m.clone())
    }

    /// Decide a match, record both contestants' histories, and close the division when done.
    pub fn complete_match(&self, match_id: MatchId, winner: Option<Side>) -> Result<Match, TournamentError> {
        let (mut division, mut matches) = self.load_bracket_of(match_id)?;
        let histories = logic::complete_match(&mut matches, match_id, winner)?;
        let updated = self.save_affected(&matches, match_id)?;
        self.save_all(&histories)?;
        if logic::is_complete(&matches) {
            division.state = DivisionState::Completed;
            self.store.save(&division)?;
            log::info!("Division {} completed", division.id);
        }
        log::info!("Completed match {} (winner {:?})", match_id, updated.winner);
        Ok(updated)
    }

    /// Reopen a decided match for correction; its histories are removed.
    pub fn reopen_match(&self, match_id: MatchId) -> Result<Match, TournamentError> {
        let (mut division, mut matches) = self.load_bracket_of(match_id)?;
        logic::reopen_match(&mut matches, match_id)?;
        let updated = self.save_affected(&matches, match_id)?;
        for history in self.store.list::<MatchHistory>()? {
            if history.match_id == match_id {
                self.store.delete::<MatchHistory>(history.id)?;
            }
        }
        if division.state == DivisionState::Completed {
            division.state = DivisionState::Bracket;
            self.store.save(&division)?;
        }
        log::info!("Reopened match {}", match_id);
        Ok(updated)
    }

    // ---- statistics ----

    /// An athlete's match histories, oldest first.
    pub fn athlete_history(&self, athlete_id: AthleteId) -> Result<Vec<MatchHistory>, TournamentError> {
        let _athlete: Athlete = self.store.load(athlete_id)?;
        let mut histories: Vec<MatchHistory> = self
            .store
            .list::<MatchHistory>()?
            .into_iter()
            .filter(|h| h.athlete_id == athlete_id)
            .collect();
        histories.sort_by_key(|h| h.recorded_at);
        Ok(histories)
    }

    pub fn athlete_stats(&self, athlete_id: AthleteId) -> Result<AthleteStats, TournamentError> {
        Ok(logic::athlete_stats(&self.athlete_history(athlete_id)?))
    }

    pub fn team_stats(&self, team_id: TeamId) -> Result<AthleteStats, TournamentError> {
        let _team: Team = self.store.load(team_id)?;
        Ok(logic::team_stats(team_id, &self.store.list::<MatchHistory>()?))
    }

    // ---- import ----

    /// Import athletes from a CSV roster. Nothing is written unless every row is valid.
    pub fn import_roster<R: Read>(&self, reader: R) -> Result<ImportSummary, TournamentError> {
        let rows = parse_roster(reader)?;
        let mut teams: Vec<Team> = self.store.list()?;
        let mut summary = ImportSummary::default();

        for row in rows {
            let team_idx = match &row.team {
                Some(name) => {
                    let idx = match teams.iter().position(|t| same_team_name(&t.name, name)) {
                        Some(idx) => idx,
                        None => {
                            teams.push(Team::new(name.clone()));
                            summary.teams_created += 1;
                            teams.len() - 1
                        }
                    };
                    Some(idx)
                }
                None => None,
            };

            let mut athlete = Athlete::new(row.first_name, row.last_name, row.gender, row.weight_kg);
            athlete.birth_date = row.birth_date;
            athlete.belt = row.belt;
            if let Some(idx) = team_idx {
                let team = &mut teams[idx];
                athlete.team_id = Some(team.id);
                team.add_athlete(athlete.id);
                self.store.save(&*team)?;
            }
            self.store.save(&athlete)?;
            summary.athletes_created += 1;
        }

        log::info!(
            "Imported roster: {} athletes, {} new teams",
            summary.athletes_created,
            summary.teams_created
        );
        Ok(summary)
    }
}

//! Registration phase: divisions within a tournament and contestants within a division.

use crate::models::{
    Athlete, AthleteId, Contestant, Division, DivisionState, Gender, Tournament, TournamentError,
};

/// Create a division in `tournament` and record its id there. Name must be non-empty;
/// when both weight bounds are given, min must be below max.
pub fn create_division(
    tournament: &mut Tournament,
    name: &str,
    gender: Gender,
    min_weight_kg: Option<f64>,
    max_weight_kg: Option<f64>,
    third_place_match: bool,
) -> Result<Division, TournamentError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::InvalidInput("division name is empty".into()));
    }
    for bound in [min_weight_kg, max_weight_kg].into_iter().flatten() {
        if !bound.is_finite() || bound < 0.0 {
            return Err(TournamentError::InvalidInput(format!(
                "invalid weight bound {}",
                bound
            )));
        }
    }
    if let (Some(min), Some(max)) = (min_weight_kg, max_weight_kg) {
        if min >= max {
            return Err(TournamentError::InvalidInput(format!(
                "weight range {}..{} is empty",
                min, max
            )));
        }
    }
    let division = Division::new(tournament.id, name, gender)
        .with_weight_range(min_weight_kg, max_weight_kg)
        .with_third_place_match(third_place_match);
    tournament.division_ids.push(division.id);
    Ok(division)
}

/// Register an athlete (via their team) into a division that is still taking registrations.
pub fn register_contestant(division: &mut Division, athlete: &Athlete) -> Result<Contestant, TournamentError> {
    if division.state != DivisionState::Registration {
        return Err(TournamentError::InvalidState);
    }
    let team_id = athlete
        .team_id
        .ok_or(TournamentError::AthleteWithoutTeam(athlete.id))?;
    if athlete.gender != division.gender {
        return Err(TournamentError::GenderMismatch {
            division: division.gender,
            athlete: athlete.gender,
        });
    }
    if !division.weight_in_range(athlete.weight_kg) {
        return Err(TournamentError::WeightOutOfRange {
            weight_kg: athlete.weight_kg,
        });
    }
    if division.has_athlete(athlete.id) {
        return Err(TournamentError::DuplicateContestant(athlete.id));
    }
    let contestant = Contestant {
        team_id,
        athlete_id: athlete.id,
    };
    division.contestants.push(contestant);
    Ok(contestant)
}

/// Remove an athlete from a division that is still taking registrations.
pub fn withdraw_contestant(division: &mut Division, athlete_id: AthleteId) -> Result<(), TournamentError> {
    if division.state != DivisionState::Registration {
        return Err(TournamentError::InvalidState);
    }
    let idx = division
        .contestants
        .iter()
        .position(|c| c.athlete_id == athlete_id)
        .ok_or(TournamentError::ContestantNotFound(athlete_id))?;
    division.contestants.remove(idx);
    Ok(())
}

//! End-to-end tests of the service over a temporary document store.

use chrono::NaiveDate;
use karate_tournament_web::{
    AthleteInput, DivisionInput, DivisionState, Draw, Gender, Match, MatchHistory, MatchStatus,
    Side, Store, TeamInput, Technique, TournamentError, TournamentInput, TournamentService,
};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("karate-service-test-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("workspace should be creatable");
    root
}

fn athlete(first: &str, weight: f64, team_id: Option<Uuid>) -> AthleteInput {
    AthleteInput {
        first_name: first.to_string(),
        last_name: "Tanaka".to_string(),
        gender: Gender::Male,
        weight_kg: weight,
        birth_date: None,
        belt: Some("brown".to_string()),
        team_id,
    }
}

struct Fixture {
    root: PathBuf,
    svc: TournamentService,
    tournament_id: Uuid,
    division_id: Uuid,
    athletes: Vec<Uuid>,
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

/// One tournament, one -75kg male division with `n` registered athletes.
fn fixture(n: usize, third_place_match: bool) -> Fixture {
    let root = unique_workspace();
    let svc = TournamentService::open(&root).unwrap();
    let team = svc
        .create_team(TeamInput {
            name: "Dojo Kai".into(),
            coach: None,
        })
        .unwrap();
    let tournament = svc
        .create_tournament(TournamentInput {
            name: "Spring Cup".into(),
            date: NaiveDate::from_ymd_opt(2026, 4, 18).unwrap(),
            location: Some("Osaka".into()),
        })
        .unwrap();
    let division = svc
        .create_division(
            tournament.id,
            DivisionInput {
                name: "-75kg".into(),
                gender: Gender::Male,
                min_weight_kg: Some(67.0),
                max_weight_kg: Some(75.0),
                third_place_match,
            },
        )
        .unwrap();
    let mut athletes = Vec::new();
    for i in 0..n {
        let a = svc.create_athlete(athlete(&format!("A{i}"), 70.0, Some(team.id))).unwrap();
        svc.register_contestant(division.id, a.id).unwrap();
        athletes.push(a.id);
    }
    Fixture {
        root,
        svc,
        tournament_id: tournament.id,
        division_id: division.id,
        athletes,
    }
}

fn ready_matches(svc: &TournamentService, division_id: Uuid) -> Vec<Match> {
    svc.bracket(division_id)
        .unwrap()
        .matches
        .into_iter()
        .map(|bm| bm.game)
        .filter(|m| m.status == MatchStatus::Ready)
        .collect()
}

#[test]
fn team_roster_follows_athlete_team() {
    let f = fixture(2, false);
    let team = &f.svc.list_teams().unwrap()[0];
    assert_eq!(team.athlete_ids, f.athletes);

    assert!(matches!(
        f.svc.create_team(TeamInput {
            name: "dojo kai".into(),
            coach: None
        }),
        Err(TournamentError::DuplicateTeamName)
    ));
}

#[test]
fn registered_athlete_cannot_be_deleted_or_moved_out_of_range() {
    let f = fixture(2, false);
    assert!(matches!(
        f.svc.delete_athlete(f.athletes[0]),
        Err(TournamentError::AthleteInUse(_))
    ));
    let current = f.svc.get_athlete(f.athletes[0]).unwrap();
    assert!(matches!(
        f.svc.update_athlete(f.athletes[0], athlete("A0", 80.0, current.team_id)),
        Err(TournamentError::AthleteInUse(_))
    ));

    f.svc.withdraw_contestant(f.division_id, f.athletes[0]).unwrap();
    f.svc.delete_athlete(f.athletes[0]).unwrap();
    let team = &f.svc.list_teams().unwrap()[0];
    assert_eq!(team.athlete_ids, vec![f.athletes[1]]);
}

#[test]
fn register_rejects_athlete_outside_division() {
    let f = fixture(0, false);
    let team_id = f.svc.list_teams().unwrap()[0].id;
    let heavy = f.svc.create_athlete(athlete("Big", 90.0, Some(team_id))).unwrap();
    assert!(matches!(
        f.svc.register_contestant(f.division_id, heavy.id),
        Err(TournamentError::WeightOutOfRange { .. })
    ));
    assert!(matches!(
        f.svc.register_contestant(f.division_id, Uuid::new_v4()),
        Err(TournamentError::NotFound { .. })
    ));
}

#[test]
fn full_division_flow_rolls_scores_into_stats() {
    let f = fixture(4, true);
    let view = f.svc.generate_bracket(f.division_id, Draw::Seeded).unwrap();
    assert_eq!(view.total_rounds, 2);
    let labels: Vec<_> = view.matches.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["Semi-final", "Semi-final", "Final", "Third place"]);
    assert_eq!(
        f.svc.get_division(f.division_id).unwrap().state,
        DivisionState::Bracket
    );

    // registration is closed once the bracket exists
    assert!(matches!(
        f.svc.withdraw_contestant(f.division_id, f.athletes[0]),
        Err(TournamentError::InvalidState)
    ));

    // aka scores an ippon in every match and wins on points
    loop {
        let ready = ready_matches(&f.svc, f.division_id);
        if ready.is_empty() {
            break;
        }
        for m in ready {
            f.svc.record_technique(m.id, Side::Aka, Technique::Ippon).unwrap();
            f.svc.record_technique(m.id, Side::Shiro, Technique::Yuko).unwrap();
            let done = f.svc.complete_match(m.id, None).unwrap();
            assert_eq!(done.winner, Some(Side::Aka));
        }
    }

    let division = f.svc.get_division(f.division_id).unwrap();
    assert_eq!(division.state, DivisionState::Completed);

    // seed 1 won semi and final
    let champion = f.svc.athlete_stats(f.athletes[0]).unwrap();
    assert_eq!((champion.matches, champion.wins, champion.losses), (2, 2, 0));
    assert_eq!(champion.ippon, 2);
    assert_eq!(champion.points, 6);
    assert_eq!(champion.win_rate, 1.0);

    let placings = f.svc.placings(f.division_id).unwrap();
    assert_eq!(placings.len(), 3);
    assert_eq!(placings[0].contestant.athlete_id, f.athletes[0]);

    let board = f.svc.division_leaderboard(f.division_id).unwrap();
    assert_eq!(board.len(), 4);
    assert_eq!(board[0].athlete_id, f.athletes[0]);

    let team_id = f.svc.list_teams().unwrap()[0].id;
    let team = f.svc.team_stats(team_id).unwrap();
    assert_eq!(team.matches, 8);
    assert_eq!(team.wins, 4);
}

#[test]
fn reopening_the_final_removes_its_histories() {
    let f = fixture(2, false);
    let view = f.svc.generate_bracket(f.division_id, Draw::Seeded).unwrap();
    let final_id = view.matches[0].game.id;

    f.svc.complete_match(final_id, Some(Side::Shiro)).unwrap();
    assert_eq!(f.svc.athlete_history(f.athletes[1]).unwrap().len(), 1);
    assert_eq!(
        f.svc.get_division(f.division_id).unwrap().state,
        DivisionState::Completed
    );

    let reopened = f.svc.reopen_match(final_id).unwrap();
    assert_eq!(reopened.status, MatchStatus::InProgress);
    assert!(f.svc.athlete_history(f.athletes[1]).unwrap().is_empty());
    assert_eq!(
        f.svc.get_division(f.division_id).unwrap().state,
        DivisionState::Bracket
    );
}

#[test]
fn reset_bracket_deletes_matches_and_reopens_registration() {
    let f = fixture(3, false);
    let view = f.svc.generate_bracket(f.division_id, Draw::Random).unwrap();
    let ids: Vec<_> = view.matches.iter().map(|m| m.game.id).collect();
    let ready = ready_matches(&f.svc, f.division_id);
    f.svc.complete_match(ready[0].id, Some(Side::Aka)).unwrap();

    let division = f.svc.reset_bracket(f.division_id).unwrap();
    assert_eq!(division.state, DivisionState::Registration);
    for id in ids {
        assert!(matches!(f.svc.get_match(id), Err(TournamentError::NotFound { .. })));
    }
    let store = Store::open(&f.root).unwrap();
    assert!(store.list::<MatchHistory>().unwrap().is_empty());
    f.svc.withdraw_contestant(f.division_id, f.athletes[2]).unwrap();
}

#[test]
fn deleting_a_tournament_cascades() {
    let f = fixture(4, false);
    f.svc.generate_bracket(f.division_id, Draw::Random).unwrap();
    f.svc.delete_tournament(f.tournament_id).unwrap();

    assert!(f.svc.list_tournaments().unwrap().is_empty());
    assert!(matches!(
        f.svc.get_division(f.division_id),
        Err(TournamentError::NotFound { .. })
    ));
    let store = Store::open(&f.root).unwrap();
    assert!(store.list::<Match>().unwrap().is_empty());
    // athletes are not owned by the tournament
    assert_eq!(f.svc.list_athletes().unwrap().len(), 4);
    f.svc.delete_athlete(f.athletes[0]).unwrap();
}

#[test]
fn team_names_are_unique_regardless_of_case_beyond_ascii() {
    let f = fixture(0, false);
    let oita = f
        .svc
        .create_team(TeamInput {
            name: "Ōita Dojo".into(),
            coach: None,
        })
        .unwrap();
    assert!(matches!(
        f.svc.create_team(TeamInput {
            name: "ōita dojo".into(),
            coach: None
        }),
        Err(TournamentError::DuplicateTeamName)
    ));
    assert!(matches!(
        f.svc.create_team(TeamInput {
            name: "ŌITA DOJO".into(),
            coach: None
        }),
        Err(TournamentError::DuplicateTeamName)
    ));
    assert_eq!(f.svc.list_teams().unwrap().len(), 2);

    // a team may keep its own name under a different case
    let renamed = f
        .svc
        .update_team(
            oita.id,
            TeamInput {
                name: "ŌITA Dojo".into(),
                coach: Some("Sensei Abe".into()),
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "ŌITA Dojo");
}

#[test]
fn update_team_rejects_another_teams_name() {
    let f = fixture(0, false);
    let other = f
        .svc
        .create_team(TeamInput {
            name: "Berlin Karate".into(),
            coach: None,
        })
        .unwrap();
    assert!(matches!(
        f.svc.update_team(
            other.id,
            TeamInput {
                name: "DOJO KAI".into(),
                coach: None
            }
        ),
        Err(TournamentError::DuplicateTeamName)
    ));

    let kept = f
        .svc
        .update_team(
            other.id,
            TeamInput {
                name: "Berlin Karate".into(),
                coach: Some("Lena".into()),
            },
        )
        .unwrap();
    assert_eq!(kept.coach.as_deref(), Some("Lena"));
    assert_eq!(f.svc.get_team(other.id).unwrap().coach.as_deref(), Some("Lena"));
}

#[test]
fn moving_an_athlete_updates_both_rosters() {
    let f = fixture(0, false);
    let dojo = f.svc.list_teams().unwrap()[0].id;
    let berlin = f
        .svc
        .create_team(TeamInput {
            name: "Berlin Karate".into(),
            coach: None,
        })
        .unwrap()
        .id;
    let a = f.svc.create_athlete(athlete("Ken", 70.0, Some(dojo))).unwrap();
    assert_eq!(f.svc.get_team(dojo).unwrap().athlete_ids, vec![a.id]);

    let moved = f.svc.update_athlete(a.id, athlete("Ken", 70.0, Some(berlin))).unwrap();
    assert_eq!(moved.team_id, Some(berlin));
    assert!(f.svc.get_team(dojo).unwrap().athlete_ids.is_empty());
    assert_eq!(f.svc.get_team(berlin).unwrap().athlete_ids, vec![a.id]);

    f.svc.update_athlete(a.id, athlete("Ken", 70.0, None)).unwrap();
    assert!(f.svc.get_team(berlin).unwrap().athlete_ids.is_empty());
    assert_eq!(f.svc.get_athlete(a.id).unwrap().team_id, None);
}

#[test]
fn delete_team_refuses_while_registered_and_clears_athletes() {
    let f = fixture(1, false);
    let dojo = f.svc.list_teams().unwrap()[0].id;
    assert!(matches!(
        f.svc.delete_team(dojo),
        Err(TournamentError::TeamInUse(_))
    ));

    f.svc.withdraw_contestant(f.division_id, f.athletes[0]).unwrap();
    f.svc.delete_team(dojo).unwrap();
    assert!(matches!(f.svc.get_team(dojo), Err(TournamentError::NotFound { .. })));
    assert_eq!(f.svc.get_athlete(f.athletes[0]).unwrap().team_id, None);
}

#[test]
fn list_divisions_in_creation_order() {
    let f = fixture(0, false);
    let second = f
        .svc
        .create_division(
            f.tournament_id,
            DivisionInput {
                name: "-61kg".into(),
                gender: Gender::Female,
                min_weight_kg: Some(55.0),
                max_weight_kg: Some(61.0),
                third_place_match: false,
            },
        )
        .unwrap();
    let ids: Vec<_> = f
        .svc
        .list_divisions(f.tournament_id)
        .unwrap()
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec![f.division_id, second.id]);
    assert!(matches!(
        f.svc.list_divisions(Uuid::new_v4()),
        Err(TournamentError::NotFound { .. })
    ));
}

#[test]
fn delete_division_removes_bracket_and_histories() {
    let f = fixture(4, false);
    f.svc.generate_bracket(f.division_id, Draw::Seeded).unwrap();
    let ready = ready_matches(&f.svc, f.division_id);
    f.svc.complete_match(ready[0].id, Some(Side::Aka)).unwrap();

    f.svc.delete_division(f.division_id).unwrap();

    let tournament = f.svc.get_tournament(f.tournament_id).unwrap();
    assert!(tournament.division_ids.is_empty());
    assert!(f.svc.list_divisions(f.tournament_id).unwrap().is_empty());
    assert!(matches!(
        f.svc.get_division(f.division_id),
        Err(TournamentError::NotFound { .. })
    ));
    let store = Store::open(&f.root).unwrap();
    assert!(store.list::<Match>().unwrap().is_empty());
    assert!(store.list::<MatchHistory>().unwrap().is_empty());
    // the athletes are free again
    f.svc.delete_athlete(f.athletes[0]).unwrap();
}

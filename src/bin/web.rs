//! Single binary web server: JSON API over the document store, static files from /static.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, KARATE_DATA_DIR, STATIC_DIR (see `Config`).

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use karate_tournament_web::{
    AthleteInput, Config, DivisionInput, Draw, Side, TeamInput, Technique, TournamentError,
    TournamentInput, TournamentService,
};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// Shared service; writes take the write lock so multi-document updates never interleave.
type AppState = Data<RwLock<TournamentService>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Path segment: entity id (e.g. /api/athletes/{id})
#[derive(Deserialize)]
struct IdPath {
    id: Uuid,
}

/// Path segments: division id and athlete id.
#[derive(Deserialize)]
struct ContestantPath {
    id: Uuid,
    athlete_id: Uuid,
}

#[derive(Deserialize)]
struct RegisterBody {
    athlete_id: Uuid,
}

#[derive(Deserialize)]
struct GenerateBracketBody {
    #[serde(default)]
    draw: Draw,
}

#[derive(Deserialize)]
struct ScoreBody {
    side: Side,
    technique: Technique,
}

#[derive(Deserialize)]
struct CompleteMatchBody {
    /// Referee decision; omitted = winner by points.
    #[serde(default)]
    winner: Option<Side>,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::NotFound { .. } => HttpResponse::NotFound().json(body),
        TournamentError::Store(_) => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(body)
        }
        _ => {
            log::warn!("Rejected request: {}", e);
            HttpResponse::BadRequest().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn respond_empty(result: Result<(), TournamentError>) -> HttpResponse {
    match result {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": "lock error" }))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "karate-tournament-web",
    })
}

#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

// ---- athletes ----

#[get("/api/athletes")]
async fn api_list_athletes(state: AppState) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.list_athletes())
}

#[post("/api/athletes")]
async fn api_create_athlete(state: AppState, body: Json<AthleteInput>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.create_athlete(body.into_inner()))
}

/// Bulk import from a CSV roster (request body is the CSV text).
#[post("/api/athletes/import")]
async fn api_import_athletes(state: AppState, body: String) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.import_roster(body.as_bytes()))
}

#[get("/api/athletes/{id}")]
async fn api_get_athlete(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.get_athlete(path.id))
}

#[put("/api/athletes/{id}")]
async fn api_update_athlete(state: AppState, path: Path<IdPath>, body: Json<AthleteInput>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.update_athlete(path.id, body.into_inner()))
}

#[delete("/api/athletes/{id}")]
async fn api_delete_athlete(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond_empty(svc.delete_athlete(path.id))
}

#[get("/api/athletes/{id}/history")]
async fn api_athlete_history(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.athlete_history(path.id))
}

#[get("/api/athletes/{id}/stats")]
async fn api_athlete_stats(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.athlete_stats(path.id))
}

// ---- teams ----

#[get("/api/teams")]
async fn api_list_teams(state: AppState) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.list_teams())
}

#[post("/api/teams")]
async fn api_create_team(state: AppState, body: Json<TeamInput>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.create_team(body.into_inner()))
}

#[get("/api/teams/{id}")]
async fn api_get_team(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.get_team(path.id))
}

#[put("/api/teams/{id}")]
async fn api_update_team(state: AppState, path: Path<IdPath>, body: Json<TeamInput>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.update_team(path.id, body.into_inner()))
}

#[delete("/api/teams/{id}")]
async fn api_delete_team(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond_empty(svc.delete_team(path.id))
}

#[get("/api/teams/{id}/stats")]
async fn api_team_stats(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.team_stats(path.id))
}

// ---- tournaments ----

#[get("/api/tournaments")]
async fn api_list_tournaments(state: AppState) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.list_tournaments())
}

#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<TournamentInput>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.create_tournament(body.into_inner()))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.get_tournament(path.id))
}

/// Delete a tournament with all its divisions, matches and histories.
#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond_empty(svc.delete_tournament(path.id))
}

#[get("/api/tournaments/{id}/divisions")]
async fn api_list_divisions(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.list_divisions(path.id))
}

#[post("/api/tournaments/{id}/divisions")]
async fn api_create_division(state: AppState, path: Path<IdPath>, body: Json<DivisionInput>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.create_division(path.id, body.into_inner()))
}

// ---- divisions ----

#[get("/api/divisions/{id}")]
async fn api_get_division(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.get_division(path.id))
}

#[delete("/api/divisions/{id}")]
async fn api_delete_division(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond_empty(svc.delete_division(path.id))
}

/// Register an athlete (division must be taking registrations).
#[post("/api/divisions/{id}/contestants")]
async fn api_register_contestant(state: AppState, path: Path<IdPath>, body: Json<RegisterBody>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.register_contestant(path.id, body.athlete_id))
}

#[delete("/api/divisions/{id}/contestants/{athlete_id}")]
async fn api_withdraw_contestant(state: AppState, path: Path<ContestantPath>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.withdraw_contestant(path.id, path.athlete_id))
}

#[get("/api/divisions/{id}/bracket")]
async fn api_get_bracket(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.bracket(path.id))
}

/// Generate the bracket (Registration -> Bracket). Body is optional; default draw is random.
#[post("/api/divisions/{id}/bracket")]
async fn api_generate_bracket(
    state: AppState,
    path: Path<IdPath>,
    body: Option<Json<GenerateBracketBody>>,
) -> HttpResponse {
    let draw = body.map(|b| b.draw).unwrap_or_default();
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.generate_bracket(path.id, draw))
}

/// Discard the bracket and reopen registration.
#[delete("/api/divisions/{id}/bracket")]
async fn api_reset_bracket(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.reset_bracket(path.id))
}

#[get("/api/divisions/{id}/placings")]
async fn api_placings(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.placings(path.id))
}

#[get("/api/divisions/{id}/leaderboard")]
async fn api_leaderboard(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.division_leaderboard(path.id))
}

// ---- matches ----

#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.get_match(path.id))
}

#[post("/api/matches/{id}/score")]
async fn api_record_score(state: AppState, path: Path<IdPath>, body: Json<ScoreBody>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.record_technique(path.id, body.side, body.technique))
}

/// Referee correction: take back one technique.
#[post("/api/matches/{id}/score/undo")]
async fn api_undo_score(state: AppState, path: Path<IdPath>, body: Json<ScoreBody>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.remove_technique(path.id, body.side, body.technique))
}

#[post("/api/matches/{id}/complete")]
async fn api_complete_match(
    state: AppState,
    path: Path<IdPath>,
    body: Option<Json<CompleteMatchBody>>,
) -> HttpResponse {
    let winner = body.and_then(|b| b.winner);
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.complete_match(path.id, winner))
}

#[post("/api/matches/{id}/reopen")]
async fn api_reopen_match(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let svc = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    respond(svc.reopen_match(path.id))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let service = TournamentService::open(&config.data_dir)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    log::info!("Using data directory {}", config.data_dir.display());

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(service));
    let static_dir = config.static_dir.clone();
    let serve_static = static_dir.is_dir();
    if !serve_static {
        log::warn!("Static directory {} not found; /static disabled", static_dir.display());
    }

    HttpServer::new(move || {
        let app = App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(favicon)
            .service(api_list_athletes)
            .service(api_create_athlete)
            .service(api_import_athletes)
            .service(api_get_athlete)
            .service(api_update_athlete)
            .service(api_delete_athlete)
            .service(api_athlete_history)
            .service(api_athlete_stats)
            .service(api_list_teams)
            .service(api_create_team)
            .service(api_get_team)
            .service(api_update_team)
            .service(api_delete_team)
            .service(api_team_stats)
            .service(api_list_tournaments)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_delete_tournament)
            .service(api_list_divisions)
            .service(api_create_division)
            .service(api_get_division)
            .service(api_delete_division)
            .service(api_register_contestant)
            .service(api_withdraw_contestant)
            .service(api_get_bracket)
            .service(api_generate_bracket)
            .service(api_reset_bracket)
            .service(api_placings)
            .service(api_leaderboard)
            .service(api_get_match)
            .service(api_record_score)
            .service(api_undo_score)
            .service(api_complete_match)
            .service(api_reopen_match);
        if serve_static {
            app.service(Files::new("/static", &static_dir).show_files_listing())
        } else {
            app
        }
    })
    .bind(bind)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, http::StatusCode};

    async fn error_body(resp: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn lock_error_is_a_json_error() {
        let resp = lock_error();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_body(resp).await["error"], "lock error");
    }

    #[actix_web::test]
    async fn missing_entity_maps_to_not_found() {
        let resp = error_response(&TournamentError::NotFound {
            kind: karate_tournament_web::EntityKind::Team,
            id: Uuid::nil(),
        });
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(error_body(resp).await["error"].is_string());
    }
}

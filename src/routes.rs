// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{answer, content, participant, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the content, session, roster and scoring sub-routers under `/api`.
/// * Applies global middleware (Trace, CORS).
/// * Injects the shared state (engine and config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let content_routes = Router::new()
        .route("/quizzes", get(content::list_quizzes).post(content::create_quiz))
        .route(
            "/quizzes/{id}",
            get(content::get_quiz)
                .put(content::update_quiz)
                .delete(content::delete_quiz),
        )
        .route(
            "/quizzes/{id}/questions",
            get(content::list_questions).post(content::create_question),
        )
        .route(
            "/questions/{id}",
            get(content::get_question)
                .put(content::update_question)
                .delete(content::delete_question),
        )
        .route(
            "/questions/{id}/options",
            get(content::list_answer_options).post(content::create_answer_option),
        )
        .route(
            "/options/{id}",
            put(content::update_answer_option).delete(content::delete_answer_option),
        );

    let session_routes = Router::new()
        .route("/sessions", get(session::list_sessions).post(session::create_session))
        .route("/sessions/{id}", get(session::get_session))
        .route("/sessions/code/{code}", get(session::get_session_by_code))
        .route("/sessions/{id}/end", post(session::end_session))
        .route("/sessions/{id}/questions", get(session::get_session_questions))
        .route("/sessions/{id}/leaderboard", get(session::get_leaderboard));

    let roster_routes = Router::new()
        .route(
            "/sessions/{id}/participants",
            get(participant::list_participants).post(participant::join_session),
        )
        .route("/join", post(participant::join_by_code))
        .route(
            "/participants/{id}",
            get(participant::get_participant)
                .put(participant::rename_participant)
                .delete(participant::leave_session),
        );

    let scoring_routes = Router::new()
        .route("/sessions/{id}/answers", post(answer::submit_answer))
        .route(
            "/sessions/{id}/participants/{participant_id}/answers",
            get(answer::list_participant_answers),
        );

    let api = Router::new()
        .merge(content_routes)
        .merge(session_routes)
        .merge(roster_routes)
        .merge(scoring_routes);

    Router::new()
        .nest("/api", api)
        // Global Middleware (applied top to bottom)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{engine::GameEngine, error::AppError, models::session::CreateSessionRequest};

/// Starts a game session on a quiz.
///
/// * Uses the host's join code when one is given, otherwise generates one.
/// * 404 if the quiz does not exist, 409 if the code is held by an active session.
pub async fn create_session(
    State(engine): State<GameEngine>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = engine
        .create_session(payload.quiz_id, payload.join_code.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_sessions(State(engine): State<GameEngine>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.list_sessions().await?))
}

pub async fn get_session(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.get_session(id).await?))
}

/// Resolves a join code to its active session.
pub async fn get_session_by_code(
    State(engine): State<GameEngine>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.get_session_by_code(&code).await?))
}

/// Ends a session. Safe to call repeatedly.
pub async fn end_session(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.end_session(id).await?))
}

/// Questions for the player view, without the correct answers.
pub async fn get_session_questions(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.session_questions(id).await?))
}

/// Ranked standings, live during the game and final afterwards.
pub async fn get_leaderboard(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.leaderboard(id).await?))
}

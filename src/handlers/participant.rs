// src/handlers/participant.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    engine::GameEngine,
    error::AppError,
    models::participant::{DisplayNameRequest, JoinByCodeRequest},
};

/// Joins the session in the path.
pub async fn join_session(
    State(engine): State<GameEngine>,
    Path(session_id): Path<i64>,
    Json(payload): Json<DisplayNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let participant = engine.join(session_id, &payload.display_name).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// Joins whichever active session holds the given code.
pub async fn join_by_code(
    State(engine): State<GameEngine>,
    Json(payload): Json<JoinByCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let participant = engine
        .join_by_code(&payload.join_code, &payload.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn list_participants(
    State(engine): State<GameEngine>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.list_participants(session_id).await?))
}

pub async fn get_participant(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.get_participant(id).await?))
}

pub async fn rename_participant(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
    Json(payload): Json<DisplayNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(engine.update_display_name(id, &payload.display_name).await?))
}

/// Leaves the game. The participant's submissions go with them.
pub async fn leave_session(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    engine.leave(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

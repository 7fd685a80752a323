// src/handlers/answer.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{engine::GameEngine, error::AppError, models::submission::SubmitAnswerRequest};

/// Submits a participant's answer to one question.
///
/// * Scores it with the time-decay formula.
/// * Records it together with the running-score increment.
/// * A second answer to the same question returns 409; the first one stands.
pub async fn submit_answer(
    State(engine): State<GameEngine>,
    Path(session_id): Path<i64>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let submission = engine.submit_answer(session_id, &req).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// A participant's answer history in question order.
pub async fn list_participant_answers(
    State(engine): State<GameEngine>,
    Path((session_id, participant_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        engine
            .participant_submissions(session_id, participant_id)
            .await?,
    ))
}

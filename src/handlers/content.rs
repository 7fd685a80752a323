// src/handlers/content.rs

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
    models::{
        answer_option::{CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
        question::{CreateQuestionRequest, UpdateQuestionRequest},
        quiz::QuizRequest,
    },
};

/// Lists all quizzes.
pub async fn list_quizzes(State(engine): State<GameEngine>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.list_quizzes().await?))
}

pub async fn get_quiz(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.get_quiz(id).await?))
}

/// Creates a new quiz.
pub async fn create_quiz(
    State(engine): State<GameEngine>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = engine.create_quiz(&payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Replaces a quiz's title, category and description.
/// Refused while the quiz is being played.
pub async fn update_quiz(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(engine.update_quiz(id, &payload).await?))
}

/// Deletes a quiz together with its questions, options and past sessions.
pub async fn delete_quiz(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    engine.delete_quiz(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Questions of a quiz in presentation order, including option correctness.
pub async fn list_questions(
    State(engine): State<GameEngine>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.list_questions(quiz_id).await?))
}

pub async fn create_question(
    State(engine): State<GameEngine>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let question = engine.create_question(quiz_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn get_question(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.get_question(id).await?))
}

/// Updates a question. Fields are optional.
pub async fn update_question(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(engine.update_question(id, &payload).await?))
}

pub async fn delete_question(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    engine.delete_question(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_answer_options(
    State(engine): State<GameEngine>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.list_answer_options(question_id).await?))
}

pub async fn create_answer_option(
    State(engine): State<GameEngine>,
    Path(question_id): Path<i64>,
    Json(payload): Json<CreateAnswerOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let option = engine.create_answer_option(question_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(option)))
}

pub async fn update_answer_option(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAnswerOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(engine.update_answer_option(id, &payload).await?))
}

pub async fn delete_answer_option(
    State(engine): State<GameEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    engine.delete_answer_option(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

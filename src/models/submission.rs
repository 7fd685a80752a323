// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'submissions' table in the database.
/// At most one row exists per (participant_id, question_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: i64,
    pub session_id: i64,
    pub participant_id: i64,
    pub question_id: i64,
    pub answer_option_id: i64,

    /// Seconds between the question being shown and the answer arriving.
    pub time_taken: f64,

    /// Correctness of the chosen option when the answer was scored.
    pub is_correct: bool,

    pub points_earned: i64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// A scored answer ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub session_id: i64,
    pub participant_id: i64,
    pub question_id: i64,
    pub answer_option_id: i64,
    pub time_taken: f64,
    pub is_correct: bool,
    pub points_earned: i64,
}

/// DTO for submitting an answer to the session in the path.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub participant_id: i64,
    pub question_id: i64,
    pub answer_option_id: i64,
    #[validate(range(min = 0.0))]
    pub time_taken: f64,
}

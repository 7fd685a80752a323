// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::answer_option::PublicAnswerOption;

pub const DEFAULT_TIME_LIMIT: i32 = 30;

/// Represents the 'questions' table in the database.
/// Presentation order within a quiz is ascending `id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text content of the question.
    pub text: String,

    /// Seconds players have to answer, between 5 and 300.
    pub time_limit: i32,

    /// Maximum points for an instant correct answer. `None` means the default of 1000.
    pub points: Option<i32>,

    /// Whether more than one option may be marked correct.
    pub multi_select: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a question to players (options without correctness).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub time_limit: i32,
    pub points: Option<i32>,
    pub multi_select: bool,
    pub options: Vec<PublicAnswerOption>,
}

fn default_time_limit() -> i32 {
    DEFAULT_TIME_LIMIT
}

/// DTO for creating a new question under a quiz.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    #[serde(default = "default_time_limit")]
    #[validate(range(min = 5, max = 300))]
    pub time_limit: i32,
    #[validate(range(min = 2, max = 10000))]
    pub points: Option<i32>,
    #[serde(default)]
    pub multi_select: bool,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: Option<String>,
    #[validate(range(min = 5, max = 300))]
    pub time_limit: Option<i32>,
    #[validate(range(min = 2, max = 10000))]
    pub points: Option<i32>,
    pub multi_select: Option<bool>,
}

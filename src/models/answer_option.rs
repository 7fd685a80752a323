// src/models/answer_option.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'answer_options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Option as shown to players while a question is live.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicAnswerOption {
    pub id: i64,
    pub text: String,
}

impl From<AnswerOption> for PublicAnswerOption {
    fn from(option: AnswerOption) -> Self {
        Self {
            id: option.id,
            text: option.text,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAnswerOptionRequest {
    #[validate(length(min = 1, max = 255))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAnswerOptionRequest {
    #[validate(length(min = 1, max = 255))]
    pub text: Option<String>,
    pub is_correct: Option<bool>,
}

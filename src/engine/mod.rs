// src/engine/mod.rs

//! Game session scoring and leaderboard engine.
//!
//! The engine holds no game state of its own. Every operation reads and writes
//! through the [`Store`], so any number of request handlers can share one
//! `GameEngine` clone each.

mod content;
mod leaderboard;
mod registry;
mod roster;
mod scoring;

use std::sync::Arc;

pub use crate::models::leaderboard::rank_standings;
pub use scoring::{DEFAULT_MAX_POINTS, points_for};

use crate::{
    config::Config,
    error::AppError,
    models::{participant::Participant, session::GameSession},
    store::Store,
};

const MAX_DISPLAY_NAME_CHARS: usize = 100;

#[derive(Clone)]
pub struct GameEngine {
    store: Arc<dyn Store>,
    join_code_length: usize,
    join_code_attempts: u32,
}

impl GameEngine {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            join_code_length: config.join_code_length,
            join_code_attempts: config.join_code_attempts.max(1),
        }
    }

    async fn require_session(&self, session_id: i64) -> Result<GameSession, AppError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))
    }

    /// Loads a participant and checks that it belongs to `session_id`.
    async fn require_member(
        &self,
        session_id: i64,
        participant_id: i64,
    ) -> Result<Participant, AppError> {
        match self.store.get_participant(participant_id).await? {
            Some(participant) if participant.session_id == session_id => Ok(participant),
            _ => Err(AppError::NotFound(format!(
                "Participant {} not found in session {}",
                participant_id, session_id
            ))),
        }
    }
}

/// Trims a display name and checks its length.
fn clean_display_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "Display name must be between 1 and {} characters",
            MAX_DISPLAY_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::GameEngine;
    use crate::{
        config::Config,
        models::{
            answer_option::{AnswerOption, CreateAnswerOptionRequest},
            question::{CreateQuestionRequest, Question},
            quiz::{Quiz, QuizRequest},
        },
        store::{ContentStore, MemoryStore},
    };

    pub struct Fixture {
        pub engine: GameEngine,
        pub store: MemoryStore,
        pub quiz: Quiz,
        pub question: Question,
        pub correct: AnswerOption,
        pub wrong: AnswerOption,
    }

    pub async fn add_question(store: &MemoryStore, quiz_id: i64, time_limit: i32) -> Question {
        store
            .create_question(
                quiz_id,
                &CreateQuestionRequest {
                    text: "Which option is right?".to_string(),
                    time_limit,
                    points: None,
                    multi_select: false,
                },
            )
            .await
            .unwrap()
    }

    pub async fn add_option(store: &MemoryStore, question_id: i64, is_correct: bool) -> AnswerOption {
        store
            .create_answer_option(
                question_id,
                &CreateAnswerOptionRequest {
                    text: if is_correct { "A" } else { "B" }.to_string(),
                    is_correct,
                },
            )
            .await
            .unwrap()
    }

    /// A quiz with one 30 second question: option A correct, option B wrong.
    pub async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let engine = GameEngine::new(Arc::new(store.clone()), &Config::default());
        let quiz = store
            .create_quiz(&QuizRequest {
                title: "Capitals".to_string(),
                category: Some("geography".to_string()),
                description: None,
            })
            .await
            .unwrap();
        let question = add_question(&store, quiz.id, 30).await;
        let correct = add_option(&store, question.id, true).await;
        let wrong = add_option(&store, question.id, false).await;
        Fixture {
            engine,
            store,
            quiz,
            question,
            correct,
            wrong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_trimmed_and_bounded() {
        assert_eq!(clean_display_name("  Ada ").unwrap(), "Ada");
        assert!(clean_display_name("   ").is_err());
        assert!(clean_display_name(&"x".repeat(101)).is_err());
    }
}

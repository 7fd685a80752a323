// src/store/mod.rs

//! Storage contracts the engine is written against.
//!
//! `ContentStore` serves quiz content; `GameStore` holds sessions, participants
//! and submissions. Both are implemented by [`PgStore`] for production and by
//! [`MemoryStore`] for tests and database-less runs.

mod memory;
mod postgres;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{
    error::AppError,
    models::{
        answer_option::{AnswerOption, CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
        leaderboard::Standing,
        participant::Participant,
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        quiz::{Quiz, QuizRequest},
        session::GameSession,
        submission::{NewSubmission, Submission},
    },
};

pub type StoreResult<T> = Result<T, AppError>;

/// Quizzes, questions and answer options.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_quizzes(&self) -> StoreResult<Vec<Quiz>>;
    async fn get_quiz(&self, id: i64) -> StoreResult<Option<Quiz>>;
    async fn create_quiz(&self, quiz: &QuizRequest) -> StoreResult<Quiz>;
    async fn update_quiz(&self, id: i64, quiz: &QuizRequest) -> StoreResult<Option<Quiz>>;
    /// Cascades to questions, options and every session on the quiz.
    async fn delete_quiz(&self, id: i64) -> StoreResult<bool>;

    /// Questions of a quiz in presentation order.
    async fn list_questions(&self, quiz_id: i64) -> StoreResult<Vec<Question>>;
    async fn get_question(&self, id: i64) -> StoreResult<Option<Question>>;
    /// Fails with `NotFound` when the quiz does not exist.
    async fn create_question(
        &self,
        quiz_id: i64,
        question: &CreateQuestionRequest,
    ) -> StoreResult<Question>;
    async fn update_question(
        &self,
        id: i64,
        changes: &UpdateQuestionRequest,
    ) -> StoreResult<Option<Question>>;
    async fn delete_question(&self, id: i64) -> StoreResult<bool>;

    async fn list_answer_options(&self, question_id: i64) -> StoreResult<Vec<AnswerOption>>;
    async fn get_answer_option(&self, id: i64) -> StoreResult<Option<AnswerOption>>;
    /// Fails with `NotFound` when the question does not exist.
    async fn create_answer_option(
        &self,
        question_id: i64,
        option: &CreateAnswerOptionRequest,
    ) -> StoreResult<AnswerOption>;
    async fn update_answer_option(
        &self,
        id: i64,
        changes: &UpdateAnswerOptionRequest,
    ) -> StoreResult<Option<AnswerOption>>;
    async fn delete_answer_option(&self, id: i64) -> StoreResult<bool>;

    /// True while any active session is playing this quiz.
    async fn quiz_has_active_session(&self, quiz_id: i64) -> StoreResult<bool>;
}

/// Result of asking the store to end a session.
#[derive(Debug, Clone)]
pub struct EndedSession {
    pub session: GameSession,
    /// False when the session had already ended before this call.
    pub transitioned: bool,
    /// Participants ranked by this call. Empty unless `transitioned`.
    pub ranked: usize,
}

/// Sessions, participants and submissions.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Inserts an active session. `Conflict` when another active session holds
    /// `join_code`, `NotFound` when the quiz does not exist.
    async fn insert_session(&self, quiz_id: i64, join_code: &str) -> StoreResult<GameSession>;
    async fn get_session(&self, id: i64) -> StoreResult<Option<GameSession>>;
    async fn find_active_session_by_code(&self, join_code: &str)
    -> StoreResult<Option<GameSession>>;
    /// All sessions, newest first.
    async fn list_sessions(&self) -> StoreResult<Vec<GameSession>>;
    /// Moves an active session to `ended` and writes every participant's
    /// `final_rank` as one unit. An ended session is returned unchanged.
    async fn end_session(&self, id: i64) -> StoreResult<Option<EndedSession>>;

    /// Adds a participant if the session is still active, checked atomically
    /// with the insert. `NotFound` / `InvalidState` otherwise.
    async fn insert_participant(
        &self,
        session_id: i64,
        display_name: &str,
    ) -> StoreResult<Participant>;
    async fn get_participant(&self, id: i64) -> StoreResult<Option<Participant>>;
    /// Participants of a session ordered by join time.
    async fn list_participants(&self, session_id: i64) -> StoreResult<Vec<Participant>>;
    async fn rename_participant(
        &self,
        id: i64,
        display_name: &str,
    ) -> StoreResult<Option<Participant>>;
    /// Removes the participant together with their submissions.
    async fn delete_participant(&self, id: i64) -> StoreResult<bool>;

    /// Inserts the submission and adds its points to the participant's
    /// running score as one unit. The session must still be active at that
    /// moment (`InvalidState` otherwise). `Conflict` when the participant
    /// already answered the question.
    async fn record_submission(&self, submission: &NewSubmission) -> StoreResult<Submission>;
    async fn has_submission(&self, participant_id: i64, question_id: i64) -> StoreResult<bool>;
    /// Submissions of one participant in question presentation order.
    async fn list_submissions(
        &self,
        session_id: i64,
        participant_id: i64,
    ) -> StoreResult<Vec<Submission>>;
    /// Per-participant totals aggregated from submissions. Order is not guaranteed.
    async fn standings(&self, session_id: i64) -> StoreResult<Vec<Standing>>;
}

/// Everything the engine needs from storage.
pub trait Store: ContentStore + GameStore {}

impl<T: ContentStore + GameStore> Store for T {}

// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ContentStore, EndedSession, GameStore, StoreResult};
use crate::{
    error::AppError,
    models::{
        answer_option::{AnswerOption, CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
        leaderboard::{Standing, rank_standings},
        participant::Participant,
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        quiz::{Quiz, QuizRequest},
        session::{GameSession, SessionState},
        submission::{NewSubmission, Submission},
    },
};

#[derive(Default)]
struct Tables {
    last_id: i64,
    quizzes: BTreeMap<i64, Quiz>,
    questions: BTreeMap<i64, Question>,
    options: BTreeMap<i64, AnswerOption>,
    sessions: BTreeMap<i64, GameSession>,
    participants: BTreeMap<i64, Participant>,
    submissions: BTreeMap<i64, Submission>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn remove_participant(&mut self, id: i64) -> bool {
        self.submissions.retain(|_, s| s.participant_id != id);
        self.participants.remove(&id).is_some()
    }

    fn remove_session(&mut self, id: i64) {
        self.submissions.retain(|_, s| s.session_id != id);
        self.participants.retain(|_, p| p.session_id != id);
        self.sessions.remove(&id);
    }

    fn remove_question(&mut self, id: i64) {
        self.options.retain(|_, o| o.question_id != id);
        self.questions.remove(&id);
    }

    fn require_active(&self, session_id: i64) -> StoreResult<()> {
        match self.sessions.get(&session_id) {
            None => Err(AppError::NotFound(format!(
                "Session {} not found",
                session_id
            ))),
            Some(session) if !session.state.is_active() => Err(AppError::InvalidState(format!(
                "Session {} has ended",
                session_id
            ))),
            Some(_) => Ok(()),
        }
    }

    fn standings(&self, session_id: i64) -> Vec<Standing> {
        self.participants
            .values()
            .filter(|p| p.session_id == session_id)
            .map(|p| {
                let (total_score, correct_count) = self
                    .submissions
                    .values()
                    .filter(|s| s.participant_id == p.id)
                    .fold((0, 0), |(total, correct), s| {
                        (total + s.points_earned, correct + i64::from(s.is_correct))
                    });
                Standing {
                    participant_id: p.id,
                    display_name: p.display_name.clone(),
                    joined_at: p.joined_at,
                    total_score,
                    correct_count,
                }
            })
            .collect()
    }
}

/// In-process store. All tables sit behind a single lock, so every write
/// (including check-then-insert of submissions) is atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_quizzes(&self) -> StoreResult<Vec<Quiz>> {
        Ok(self.tables.read().await.quizzes.values().cloned().collect())
    }

    async fn get_quiz(&self, id: i64) -> StoreResult<Option<Quiz>> {
        Ok(self.tables.read().await.quizzes.get(&id).cloned())
    }

    async fn create_quiz(&self, quiz: &QuizRequest) -> StoreResult<Quiz> {
        let mut tables = self.tables.write().await;
        let quiz = Quiz {
            id: tables.next_id(),
            title: quiz.title.clone(),
            category: quiz.category.clone(),
            description: quiz.description.clone(),
            created_at: Utc::now(),
        };
        tables.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(&self, id: i64, quiz: &QuizRequest) -> StoreResult<Option<Quiz>> {
        let mut tables = self.tables.write().await;
        Ok(tables.quizzes.get_mut(&id).map(|existing| {
            existing.title = quiz.title.clone();
            existing.category = quiz.category.clone();
            existing.description = quiz.description.clone();
            existing.clone()
        }))
    }

    async fn delete_quiz(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.quizzes.remove(&id).is_none() {
            return Ok(false);
        }
        let sessions: Vec<i64> = tables
            .sessions
            .values()
            .filter(|s| s.quiz_id == id)
            .map(|s| s.id)
            .collect();
        for session_id in sessions {
            tables.remove_session(session_id);
        }
        let questions: Vec<i64> = tables
            .questions
            .values()
            .filter(|q| q.quiz_id == id)
            .map(|q| q.id)
            .collect();
        for question_id in questions {
            tables.remove_question(question_id);
        }
        Ok(true)
    }

    async fn list_questions(&self, quiz_id: i64) -> StoreResult<Vec<Question>> {
        let tables = self.tables.read().await;
        Ok(tables
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn get_question(&self, id: i64) -> StoreResult<Option<Question>> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn create_question(
        &self,
        quiz_id: i64,
        question: &CreateQuestionRequest,
    ) -> StoreResult<Question> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.contains_key(&quiz_id) {
            return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
        }
        let question = Question {
            id: tables.next_id(),
            quiz_id,
            text: question.text.clone(),
            time_limit: question.time_limit,
            points: question.points,
            multi_select: question.multi_select,
            created_at: Utc::now(),
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update_question(
        &self,
        id: i64,
        changes: &UpdateQuestionRequest,
    ) -> StoreResult<Option<Question>> {
        let mut tables = self.tables.write().await;
        Ok(tables.questions.get_mut(&id).map(|question| {
            if let Some(text) = &changes.text {
                question.text = text.clone();
            }
            if let Some(time_limit) = changes.time_limit {
                question.time_limit = time_limit;
            }
            if let Some(points) = changes.points {
                question.points = Some(points);
            }
            if let Some(multi_select) = changes.multi_select {
                question.multi_select = multi_select;
            }
            question.clone()
        }))
    }

    async fn delete_question(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.questions.contains_key(&id) {
            return Ok(false);
        }
        if tables.submissions.values().any(|s| s.question_id == id) {
            return Err(AppError::Conflict(format!(
                "Question {} has recorded submissions",
                id
            )));
        }
        tables.remove_question(id);
        Ok(true)
    }

    async fn list_answer_options(&self, question_id: i64) -> StoreResult<Vec<AnswerOption>> {
        let tables = self.tables.read().await;
        Ok(tables
            .options
            .values()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn get_answer_option(&self, id: i64) -> StoreResult<Option<AnswerOption>> {
        Ok(self.tables.read().await.options.get(&id).cloned())
    }

    async fn create_answer_option(
        &self,
        question_id: i64,
        option: &CreateAnswerOptionRequest,
    ) -> StoreResult<AnswerOption> {
        let mut tables = self.tables.write().await;
        if !tables.questions.contains_key(&question_id) {
            return Err(AppError::NotFound(format!(
                "Question {} not found",
                question_id
            )));
        }
        let option = AnswerOption {
            id: tables.next_id(),
            question_id,
            text: option.text.clone(),
            is_correct: option.is_correct,
        };
        tables.options.insert(option.id, option.clone());
        Ok(option)
    }

    async fn update_answer_option(
        &self,
        id: i64,
        changes: &UpdateAnswerOptionRequest,
    ) -> StoreResult<Option<AnswerOption>> {
        let mut tables = self.tables.write().await;
        Ok(tables.options.get_mut(&id).map(|option| {
            if let Some(text) = &changes.text {
                option.text = text.clone();
            }
            if let Some(is_correct) = changes.is_correct {
                option.is_correct = is_correct;
            }
            option.clone()
        }))
    }

    async fn delete_answer_option(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.options.contains_key(&id) {
            return Ok(false);
        }
        if tables.submissions.values().any(|s| s.answer_option_id == id) {
            return Err(AppError::Conflict(format!(
                "Answer option {} has recorded submissions",
                id
            )));
        }
        tables.options.remove(&id);
        Ok(true)
    }

    async fn quiz_has_active_session(&self, quiz_id: i64) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .any(|s| s.quiz_id == quiz_id && s.state.is_active()))
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn insert_session(&self, quiz_id: i64, join_code: &str) -> StoreResult<GameSession> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.contains_key(&quiz_id) {
            return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
        }
        if tables
            .sessions
            .values()
            .any(|s| s.state.is_active() && s.join_code == join_code)
        {
            return Err(AppError::Conflict(format!(
                "Join code {} is already in use",
                join_code
            )));
        }
        let session = GameSession {
            id: tables.next_id(),
            quiz_id,
            join_code: join_code.to_string(),
            state: SessionState::Active,
            started_at: Utc::now(),
            ended_at: None,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: i64) -> StoreResult<Option<GameSession>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn find_active_session_by_code(
        &self,
        join_code: &str,
    ) -> StoreResult<Option<GameSession>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.state.is_active() && s.join_code == join_code)
            .cloned())
    }

    async fn list_sessions(&self) -> StoreResult<Vec<GameSession>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.values().rev().cloned().collect())
    }

    async fn end_session(&self, id: i64) -> StoreResult<Option<EndedSession>> {
        let mut tables = self.tables.write().await;
        let Some(session) = tables.sessions.get_mut(&id) else {
            return Ok(None);
        };
        if !session.state.is_active() {
            return Ok(Some(EndedSession {
                session: session.clone(),
                transitioned: false,
                ranked: 0,
            }));
        }
        session.state = SessionState::Ended;
        session.ended_at = Some(Utc::now());
        let session = session.clone();

        let ranks = rank_standings(tables.standings(id));
        for entry in &ranks {
            if let Some(participant) = tables.participants.get_mut(&entry.participant_id) {
                participant.final_rank = Some(entry.rank);
            }
        }

        Ok(Some(EndedSession {
            session,
            transitioned: true,
            ranked: ranks.len(),
        }))
    }

    async fn insert_participant(
        &self,
        session_id: i64,
        display_name: &str,
    ) -> StoreResult<Participant> {
        let mut tables = self.tables.write().await;
        tables.require_active(session_id)?;
        let participant = Participant {
            id: tables.next_id(),
            session_id,
            display_name: display_name.to_string(),
            joined_at: Utc::now(),
            running_score: 0,
            final_rank: None,
        };
        tables
            .participants
            .insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn get_participant(&self, id: i64) -> StoreResult<Option<Participant>> {
        Ok(self.tables.read().await.participants.get(&id).cloned())
    }

    async fn list_participants(&self, session_id: i64) -> StoreResult<Vec<Participant>> {
        let tables = self.tables.read().await;
        let mut participants: Vec<Participant> = tables
            .participants
            .values()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect();
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        Ok(participants)
    }

    async fn rename_participant(
        &self,
        id: i64,
        display_name: &str,
    ) -> StoreResult<Option<Participant>> {
        let mut tables = self.tables.write().await;
        Ok(tables.participants.get_mut(&id).map(|participant| {
            participant.display_name = display_name.to_string();
            participant.clone()
        }))
    }

    async fn delete_participant(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.remove_participant(id))
    }

    async fn record_submission(&self, submission: &NewSubmission) -> StoreResult<Submission> {
        let mut tables = self.tables.write().await;
        // Checked under the same lock as the insert, so a concurrent end wins or loses as a whole.
        tables.require_active(submission.session_id)?;
        if !tables.participants.contains_key(&submission.participant_id) {
            return Err(AppError::NotFound(format!(
                "Participant {} not found",
                submission.participant_id
            )));
        }
        if tables.submissions.values().any(|s| {
            s.participant_id == submission.participant_id
                && s.question_id == submission.question_id
        }) {
            return Err(AppError::Conflict(format!(
                "Participant {} already answered question {}",
                submission.participant_id, submission.question_id
            )));
        }

        let record = Submission {
            id: tables.next_id(),
            session_id: submission.session_id,
            participant_id: submission.participant_id,
            question_id: submission.question_id,
            answer_option_id: submission.answer_option_id,
            time_taken: submission.time_taken,
            is_correct: submission.is_correct,
            points_earned: submission.points_earned,
            submitted_at: Utc::now(),
        };
        tables.submissions.insert(record.id, record.clone());
        if let Some(participant) = tables.participants.get_mut(&submission.participant_id) {
            participant.running_score += submission.points_earned;
        }
        Ok(record)
    }

    async fn has_submission(&self, participant_id: i64, question_id: i64) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .values()
            .any(|s| s.participant_id == participant_id && s.question_id == question_id))
    }

    async fn list_submissions(
        &self,
        session_id: i64,
        participant_id: i64,
    ) -> StoreResult<Vec<Submission>> {
        let tables = self.tables.read().await;
        let mut submissions: Vec<Submission> = tables
            .submissions
            .values()
            .filter(|s| s.session_id == session_id && s.participant_id == participant_id)
            .cloned()
            .collect();
        submissions.sort_by_key(|s| s.question_id);
        Ok(submissions)
    }

    async fn standings(&self, session_id: i64) -> StoreResult<Vec<Standing>> {
        Ok(self.tables.read().await.standings(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Seeded {
        store: MemoryStore,
        session: GameSession,
        question: Question,
        correct: AnswerOption,
    }

    async fn seeded() -> Seeded {
        let store = MemoryStore::new();
        let quiz = store
            .create_quiz(&QuizRequest {
                title: "Rivers".to_string(),
                category: None,
                description: None,
            })
            .await
            .unwrap();
        let question = store
            .create_question(
                quiz.id,
                &CreateQuestionRequest {
                    text: "Longest river?".to_string(),
                    time_limit: 30,
                    points: None,
                    multi_select: false,
                },
            )
            .await
            .unwrap();
        let correct = store
            .create_answer_option(
                question.id,
                &CreateAnswerOptionRequest {
                    text: "Nile".to_string(),
                    is_correct: true,
                },
            )
            .await
            .unwrap();
        let session = store.insert_session(quiz.id, "AB12").await.unwrap();
        Seeded {
            store,
            session,
            question,
            correct,
        }
    }

    fn answer(seed: &Seeded, participant_id: i64, points_earned: i64) -> NewSubmission {
        NewSubmission {
            session_id: seed.session.id,
            participant_id,
            question_id: seed.question.id,
            answer_option_id: seed.correct.id,
            time_taken: 1.0,
            is_correct: true,
            points_earned,
        }
    }

    #[tokio::test]
    async fn answer_after_end_is_refused_and_ranks_stay_consistent() {
        let seed = seeded().await;
        let ada = seed.store.insert_participant(seed.session.id, "Ada").await.unwrap();
        let bob = seed.store.insert_participant(seed.session.id, "Bob").await.unwrap();

        seed.store.end_session(seed.session.id).await.unwrap();

        // Validation already passed before the end landed; the write must still be refused.
        let err = seed
            .store
            .record_submission(&answer(&seed, bob.id, 983))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let bob = seed.store.get_participant(bob.id).await.unwrap().unwrap();
        assert_eq!(bob.running_score, 0);
        assert!(!seed.store.has_submission(bob.id, seed.question.id).await.unwrap());

        let board = rank_standings(seed.store.standings(seed.session.id).await.unwrap());
        for entry in board {
            let p = seed
                .store
                .get_participant(entry.participant_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(p.final_rank, Some(entry.rank));
        }
        let ada = seed.store.get_participant(ada.id).await.unwrap().unwrap();
        assert_eq!(ada.final_rank, Some(1));
    }

    #[tokio::test]
    async fn ending_freezes_ranks_in_the_same_call() {
        let seed = seeded().await;
        let ada = seed.store.insert_participant(seed.session.id, "Ada").await.unwrap();
        let bob = seed.store.insert_participant(seed.session.id, "Bob").await.unwrap();
        seed.store
            .record_submission(&answer(&seed, bob.id, 500))
            .await
            .unwrap();

        let first = seed.store.end_session(seed.session.id).await.unwrap().unwrap();
        assert!(first.transitioned);
        assert_eq!(first.ranked, 2);

        let rank = |p: Option<Participant>| p.unwrap().final_rank;
        assert_eq!(rank(seed.store.get_participant(bob.id).await.unwrap()), Some(1));
        assert_eq!(rank(seed.store.get_participant(ada.id).await.unwrap()), Some(2));

        let again = seed.store.end_session(seed.session.id).await.unwrap().unwrap();
        assert!(!again.transitioned);
        assert_eq!(again.ranked, 0);
        assert_eq!(again.session.ended_at, first.session.ended_at);
    }

    #[tokio::test]
    async fn answer_for_missing_session_is_not_found() {
        let seed = seeded().await;
        let ada = seed.store.insert_participant(seed.session.id, "Ada").await.unwrap();
        let mut submission = answer(&seed, ada.id, 10);
        submission.session_id = 9_999;

        let err = seed.store.record_submission(&submission).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn has_submission_tracks_recorded_answers() {
        let seed = seeded().await;
        let ada = seed.store.insert_participant(seed.session.id, "Ada").await.unwrap();
        assert!(!seed.store.has_submission(ada.id, seed.question.id).await.unwrap());

        seed.store
            .record_submission(&answer(&seed, ada.id, 1000))
            .await
            .unwrap();
        assert!(seed.store.has_submission(ada.id, seed.question.id).await.unwrap());

        let err = seed
            .store
            .record_submission(&answer(&seed, ada.id, 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}

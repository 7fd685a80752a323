// src/engine/scoring.rs

use super::GameEngine;
use crate::{
    error::AppError,
    models::submission::{NewSubmission, Submission, SubmitAnswerRequest},
};

/// Points for an instant correct answer when the question sets no base value.
pub const DEFAULT_MAX_POINTS: i64 = 1000;

/// Time-decay score for one answer.
///
/// A correct answer earns half of `max_points` as a floor plus a speed bonus
/// worth the other half, which shrinks linearly to zero as `time_taken`
/// approaches `time_limit`. Answers at or past the limit earn the floor.
/// Wrong answers earn nothing.
pub fn points_for(is_correct: bool, time_taken: f64, time_limit: i32, max_points: Option<i32>) -> i64 {
    if !is_correct {
        return 0;
    }
    let max = max_points.map(i64::from).unwrap_or(DEFAULT_MAX_POINTS);
    let floor = max / 2;
    let bonus = max - floor;
    if time_limit <= 0 || !time_taken.is_finite() {
        return floor;
    }

    let limit = f64::from(time_limit);
    let elapsed = time_taken.clamp(0.0, limit);
    let decay = (bonus as f64 * elapsed / limit) as i64;
    floor + (bonus - decay).max(0)
}

impl GameEngine {
    /// Scores an answer and records it exactly once per (participant, question).
    pub async fn submit_answer(
        &self,
        session_id: i64,
        req: &SubmitAnswerRequest,
    ) -> Result<Submission, AppError> {
        if !req.time_taken.is_finite() || req.time_taken < 0.0 {
            return Err(AppError::BadRequest(
                "time_taken must be a non-negative number of seconds".to_string(),
            ));
        }

        let session = self.require_session(session_id).await?;
        if !session.state.is_active() {
            return Err(AppError::InvalidState(format!(
                "Session {} has ended; answers are closed",
                session_id
            )));
        }

        self.require_member(session_id, req.participant_id).await?;

        let question = match self.store.get_question(req.question_id).await? {
            Some(question) if question.quiz_id == session.quiz_id => question,
            _ => {
                return Err(AppError::NotFound(format!(
                    "Question {} is not part of session {}",
                    req.question_id, session_id
                )));
            }
        };

        // Early exit only; the store's uniqueness check is authoritative.
        if self.store.has_submission(req.participant_id, question.id).await? {
            tracing::warn!(
                session_id,
                participant_id = req.participant_id,
                question_id = question.id,
                "Rejected duplicate submission"
            );
            return Err(AppError::Conflict(format!(
                "Participant {} already answered question {}",
                req.participant_id, question.id
            )));
        }

        let option = match self.store.get_answer_option(req.answer_option_id).await? {
            Some(option) if option.question_id == question.id => option,
            _ => {
                return Err(AppError::NotFound(format!(
                    "Answer option {} does not belong to question {}",
                    req.answer_option_id, question.id
                )));
            }
        };

        let points_earned = points_for(
            option.is_correct,
            req.time_taken,
            question.time_limit,
            question.points,
        );

        let submission = self
            .store
            .record_submission(&NewSubmission {
                session_id,
                participant_id: req.participant_id,
                question_id: question.id,
                answer_option_id: option.id,
                time_taken: req.time_taken,
                is_correct: option.is_correct,
                points_earned,
            })
            .await?;

        tracing::debug!(
            session_id,
            participant_id = submission.participant_id,
            question_id = submission.question_id,
            points_earned,
            "Answer scored"
        );

        Ok(submission)
    }
}

// src/engine/content.rs

use super::GameEngine;
use crate::{
    error::AppError,
    models::{
        answer_option::{AnswerOption, CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        quiz::{Quiz, QuizRequest},
    },
};

// Quiz content is frozen while any active session plays it, so a running
// game's questions, options and scores cannot shift underneath it.
impl GameEngine {
    async fn ensure_quiz_editable(&self, quiz_id: i64) -> Result<(), AppError> {
        if self.store.quiz_has_active_session(quiz_id).await? {
            return Err(AppError::InvalidState(format!(
                "Quiz {} is being played in an active session",
                quiz_id
            )));
        }
        Ok(())
    }

    async fn require_question(&self, question_id: i64) -> Result<Question, AppError> {
        self.store
            .get_question(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question {} not found", question_id)))
    }

    async fn require_option(&self, option_id: i64) -> Result<AnswerOption, AppError> {
        self.store
            .get_answer_option(option_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Answer option {} not found", option_id)))
    }

    /// Single-select questions may carry at most one correct option.
    async fn ensure_correct_slot_free(
        &self,
        question: &Question,
        except_option: Option<i64>,
    ) -> Result<(), AppError> {
        if question.multi_select {
            return Ok(());
        }
        let taken = self
            .store
            .list_answer_options(question.id)
            .await?
            .iter()
            .any(|o| o.is_correct && Some(o.id) != except_option);
        if taken {
            return Err(AppError::Conflict(format!(
                "Question {} already has a correct option",
                question.id
            )));
        }
        Ok(())
    }

    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        self.store.list_quizzes().await
    }

    pub async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError> {
        self.store
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))
    }

    pub async fn create_quiz(&self, quiz: &QuizRequest) -> Result<Quiz, AppError> {
        let quiz = self.store.create_quiz(quiz).await?;
        tracing::info!(quiz_id = quiz.id, "Quiz created");
        Ok(quiz)
    }

    pub async fn update_quiz(&self, quiz_id: i64, quiz: &QuizRequest) -> Result<Quiz, AppError> {
        self.get_quiz(quiz_id).await?;
        self.ensure_quiz_editable(quiz_id).await?;
        self.store
            .update_quiz(quiz_id, quiz)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))
    }

    /// Deletes a quiz with its questions, options and every (ended) session on it.
    pub async fn delete_quiz(&self, quiz_id: i64) -> Result<(), AppError> {
        self.get_quiz(quiz_id).await?;
        self.ensure_quiz_editable(quiz_id).await?;
        if !self.store.delete_quiz(quiz_id).await? {
            return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
        }
        tracing::info!(quiz_id, "Quiz deleted");
        Ok(())
    }

    pub async fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        self.get_quiz(quiz_id).await?;
        self.store.list_questions(quiz_id).await
    }

    pub async fn get_question(&self, question_id: i64) -> Result<Question, AppError> {
        self.require_question(question_id).await
    }

    pub async fn create_question(
        &self,
        quiz_id: i64,
        question: &CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        self.get_quiz(quiz_id).await?;
        self.ensure_quiz_editable(quiz_id).await?;
        self.store.create_question(quiz_id, question).await
    }

    pub async fn update_question(
        &self,
        question_id: i64,
        changes: &UpdateQuestionRequest,
    ) -> Result<Question, AppError> {
        let question = self.require_question(question_id).await?;
        self.ensure_quiz_editable(question.quiz_id).await?;

        if changes.multi_select == Some(false) && question.multi_select {
            let correct = self
                .store
                .list_answer_options(question_id)
                .await?
                .iter()
                .filter(|o| o.is_correct)
                .count();
            if correct > 1 {
                return Err(AppError::Conflict(format!(
                    "Question {} has {} correct options; keep at most one before disabling multi-select",
                    question_id, correct
                )));
            }
        }

        self.store
            .update_question(question_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question {} not found", question_id)))
    }

    pub async fn delete_question(&self, question_id: i64) -> Result<(), AppError> {
        let question = self.require_question(question_id).await?;
        self.ensure_quiz_editable(question.quiz_id).await?;
        if !self.store.delete_question(question_id).await? {
            return Err(AppError::NotFound(format!("Question {} not found", question_id)));
        }
        Ok(())
    }

    pub async fn list_answer_options(&self, question_id: i64) -> Result<Vec<AnswerOption>, AppError> {
        self.require_question(question_id).await?;
        self.store.list_answer_options(question_id).await
    }

    pub async fn create_answer_option(
        &self,
        question_id: i64,
        option: &CreateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        let question = self.require_question(question_id).await?;
        self.ensure_quiz_editable(question.quiz_id).await?;
        if option.is_correct {
            self.ensure_correct_slot_free(&question, None).await?;
        }
        self.store.create_answer_option(question_id, option).await
    }

    pub async fn update_answer_option(
        &self,
        option_id: i64,
        changes: &UpdateAnswerOptionRequest,
    ) -> Result<AnswerOption, AppError> {
        let option = self.require_option(option_id).await?;
        let question = self.require_question(option.question_id).await?;
        self.ensure_quiz_editable(question.quiz_id).await?;
        if changes.is_correct == Some(true) {
            self.ensure_correct_slot_free(&question, Some(option_id)).await?;
        }
        self.store
            .update_answer_option(option_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Answer option {} not found", option_id)))
    }

    pub async fn delete_answer_option(&self, option_id: i64) -> Result<(), AppError> {
        let option = self.require_option(option_id).await?;
        let question = self.require_question(option.question_id).await?;
        self.ensure_quiz_editable(question.quiz_id).await?;
        if !self.store.delete_answer_option(option_id).await? {
            return Err(AppError::NotFound(format!("Answer option {} not found", option_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::fixture;
    use crate::error::AppError;
    use crate::models::{
        answer_option::{CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
        question::{CreateQuestionRequest, UpdateQuestionRequest},
        quiz::QuizRequest,
        submission::SubmitAnswerRequest,
    };

    #[tokio::test]
    async fn quiz_is_locked_while_a_session_is_active() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();

        let err = fx
            .engine
            .update_question(
                fx.question.id,
                &UpdateQuestionRequest {
                    time_limit: Some(10),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(matches!(
            fx.engine.delete_quiz(fx.quiz.id).await,
            Err(AppError::InvalidState(_))
        ));

        fx.engine.end_session(session.id).await.unwrap();
        let updated = fx
            .engine
            .update_question(
                fx.question.id,
                &UpdateQuestionRequest {
                    time_limit: Some(10),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.time_limit, 10);
    }

    #[tokio::test]
    async fn single_select_question_allows_one_correct_option() {
        let fx = fixture().await;

        let err = fx
            .engine
            .create_answer_option(
                fx.question.id,
                &CreateAnswerOptionRequest {
                    text: "Also right?".to_string(),
                    is_correct: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = fx
            .engine
            .update_answer_option(
                fx.wrong.id,
                &UpdateAnswerOptionRequest {
                    text: None,
                    is_correct: Some(true),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Re-marking the existing correct option is fine.
        fx.engine
            .update_answer_option(
                fx.correct.id,
                &UpdateAnswerOptionRequest {
                    text: Some("A!".to_string()),
                    is_correct: Some(true),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn multi_select_question_accepts_several_correct_options() {
        let fx = fixture().await;
        let question = fx
            .engine
            .create_question(
                fx.quiz.id,
                &CreateQuestionRequest {
                    text: "Pick all primes".to_string(),
                    time_limit: 20,
                    points: None,
                    multi_select: true,
                },
            )
            .await
            .unwrap();
        for text in ["2", "3"] {
            fx.engine
                .create_answer_option(
                    question.id,
                    &CreateAnswerOptionRequest {
                        text: text.to_string(),
                        is_correct: true,
                    },
                )
                .await
                .unwrap();
        }

        let err = fx
            .engine
            .update_question(
                question.id,
                &UpdateQuestionRequest {
                    multi_select: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn answered_question_cannot_be_deleted_but_quiz_can() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let p = fx.engine.join(session.id, "Ada").await.unwrap();
        fx.engine
            .submit_answer(
                session.id,
                &SubmitAnswerRequest {
                    participant_id: p.id,
                    question_id: fx.question.id,
                    answer_option_id: fx.correct.id,
                    time_taken: 1.0,
                },
            )
            .await
            .unwrap();
        fx.engine.end_session(session.id).await.unwrap();

        let err = fx.engine.delete_question(fx.question.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        fx.engine.delete_quiz(fx.quiz.id).await.unwrap();
        assert!(matches!(
            fx.engine.get_session(session.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.engine.get_question(fx.question.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn quiz_crud_round() {
        let fx = fixture().await;
        let quiz = fx
            .engine
            .create_quiz(&QuizRequest {
                title: "Rivers".to_string(),
                category: None,
                description: Some("Long ones".to_string()),
            })
            .await
            .unwrap();

        let updated = fx
            .engine
            .update_quiz(
                quiz.id,
                &QuizRequest {
                    title: "Rivers of Europe".to_string(),
                    category: Some("geography".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Rivers of Europe");
        assert_eq!(fx.engine.list_quizzes().await.unwrap().len(), 2);

        fx.engine.delete_quiz(quiz.id).await.unwrap();
        assert!(matches!(
            fx.engine.get_quiz(quiz.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.engine.list_questions(quiz.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}

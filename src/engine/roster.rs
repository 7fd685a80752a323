// src/engine/roster.rs

use super::{GameEngine, clean_display_name};
use crate::{error::AppError, models::participant::Participant};

impl GameEngine {
    /// Admits a player into an active session.
    pub async fn join(&self, session_id: i64, display_name: &str) -> Result<Participant, AppError> {
        let display_name = clean_display_name(display_name)?;
        let participant = self.store.insert_participant(session_id, &display_name).await?;
        tracing::info!(
            session_id,
            participant_id = participant.id,
            "Participant joined"
        );
        Ok(participant)
    }

    pub async fn join_by_code(
        &self,
        code: &str,
        display_name: &str,
    ) -> Result<Participant, AppError> {
        let session = self.get_session_by_code(code).await?;
        self.join(session.id, display_name).await
    }

    /// Removes a participant and forfeits everything they scored.
    pub async fn leave(&self, participant_id: i64) -> Result<(), AppError> {
        if !self.store.delete_participant(participant_id).await? {
            return Err(AppError::NotFound(format!(
                "Participant {} not found",
                participant_id
            )));
        }
        tracing::info!(participant_id, "Participant left");
        Ok(())
    }

    pub async fn update_display_name(
        &self,
        participant_id: i64,
        display_name: &str,
    ) -> Result<Participant, AppError> {
        let display_name = clean_display_name(display_name)?;
        self.store
            .rename_participant(participant_id, &display_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant {} not found", participant_id)))
    }

    pub async fn get_participant(&self, participant_id: i64) -> Result<Participant, AppError> {
        self.store
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant {} not found", participant_id)))
    }

    pub async fn list_participants(&self, session_id: i64) -> Result<Vec<Participant>, AppError> {
        self.require_session(session_id).await?;
        self.store.list_participants(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::fixture;
    use crate::error::AppError;
    use crate::models::submission::SubmitAnswerRequest;

    #[tokio::test]
    async fn joining_starts_at_zero() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let p = fx.engine.join(session.id, " Ada ").await.unwrap();

        assert_eq!(p.display_name, "Ada");
        assert_eq!(p.running_score, 0);
        assert_eq!(p.final_rank, None);
        assert_eq!(p.session_id, session.id);
    }

    #[tokio::test]
    async fn joining_ended_session_is_invalid_state() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        fx.engine.end_session(session.id).await.unwrap();

        let err = fx.engine.join(session.id, "Late").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn joining_missing_session_is_not_found() {
        let fx = fixture().await;
        let err = fx.engine.join(777, "Ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn join_by_code_finds_active_session() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, Some("QUIZ")).await.unwrap();
        let p = fx.engine.join_by_code("quiz", "Ada").await.unwrap();
        assert_eq!(p.session_id, session.id);
    }

    #[tokio::test]
    async fn leaving_removes_participant_and_their_score() {
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

        fx.engine.leave(p.id).await.unwrap();

        assert!(matches!(
            fx.engine.get_participant(p.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(fx.engine.leaderboard(session.id).await.unwrap().is_empty());
        assert!(matches!(fx.engine.leave(p.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn rename_updates_display_name() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let p = fx.engine.join(session.id, "Ada").await.unwrap();

        let renamed = fx.engine.update_display_name(p.id, "Ada L.").await.unwrap();
        assert_eq!(renamed.display_name, "Ada L.");

        let err = fx.engine.update_display_name(999, "Nobody").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn participants_are_listed_in_join_order() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        for name in ["first", "second", "third"] {
            fx.engine.join(session.id, name).await.unwrap();
        }

        let names: Vec<String> = fx
            .engine
            .list_participants(session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }
}

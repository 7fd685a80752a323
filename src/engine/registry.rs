// src/engine/registry.rs

use super::GameEngine;
use crate::{error::AppError, models::session::GameSession, utils::join_code};

impl GameEngine {
    /// Starts a new active session on `quiz_id`.
    ///
    /// With `requested_code` the host's code is used as-is (after normalising)
    /// and a clash with an active session is an immediate `Conflict`. Otherwise
    /// codes are generated until one is free or the attempt budget runs out.
    pub async fn create_session(
        &self,
        quiz_id: i64,
        requested_code: Option<&str>,
    ) -> Result<GameSession, AppError> {
        if self.store.get_quiz(quiz_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
        }

        if let Some(code) = requested_code {
            let code = join_code::normalize(code);
            join_code::validate(&code)?;
            let session = self.store.insert_session(quiz_id, &code).await?;
            tracing::info!(session_id = session.id, quiz_id, code = %session.join_code, "Session created");
            return Ok(session);
        }

        for attempt in 1..=self.join_code_attempts {
            let code = join_code::generate(self.join_code_length);
            match self.store.insert_session(quiz_id, &code).await {
                Ok(session) => {
                    tracing::info!(session_id = session.id, quiz_id, code = %session.join_code, "Session created");
                    return Ok(session);
                }
                Err(AppError::Conflict(_)) => {
                    tracing::debug!("Join code collision on attempt {}", attempt);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(format!(
            "Could not allocate a free join code after {} attempts",
            self.join_code_attempts
        )))
    }

    pub async fn get_session(&self, session_id: i64) -> Result<GameSession, AppError> {
        self.require_session(session_id).await
    }

    /// Looks up the active session holding `code`. Ended sessions are reachable only by id.
    pub async fn get_session_by_code(&self, code: &str) -> Result<GameSession, AppError> {
        let code = join_code::normalize(code);
        self.store
            .find_active_session_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No active session with code {}", code)))
    }

    pub async fn list_sessions(&self) -> Result<Vec<GameSession>, AppError> {
        self.store.list_sessions().await
    }

    /// Moves the session to `ended`. Ending an ended session returns it unchanged.
    /// Final ranks are frozen by the store together with the transition, so a
    /// failed end leaves the session active and can simply be retried.
    pub async fn end_session(&self, session_id: i64) -> Result<GameSession, AppError> {
        let ended = self
            .store
            .end_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

        if ended.transitioned {
            tracing::info!(session_id, participants = ended.ranked, "Session ended");
        }

        Ok(ended.session)
    }
}

// src/models/session.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lifecycle of a game session. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Ended,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        self == SessionState::Active
    }
}

/// One live instance of a quiz, identified to players by its join code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSession {
    pub id: i64,
    pub quiz_id: i64,
    pub join_code: String,
    pub state: SessionState,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for starting a session. The host may pick the join code.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub quiz_id: i64,
    #[validate(length(
        min = 4,
        max = 8,
        message = "Join code length must be between 4 and 8 characters."
    ))]
    pub join_code: Option<String>,
}

// src/models/participant.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'participants' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: i64,
    pub session_id: i64,
    pub display_name: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,

    /// Sum of `points_earned` over this participant's submissions.
    pub running_score: i64,

    /// 1-based leaderboard position, frozen when the session ends.
    pub final_rank: Option<i32>,
}

/// DTO carrying a display name, used for joining by session id and for renaming.
#[derive(Debug, Deserialize, Validate)]
pub struct DisplayNameRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Display name length must be between 1 and 100 characters."
    ))]
    pub display_name: String,
}

/// DTO for joining by the code shown on the host screen.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinByCodeRequest {
    #[validate(length(min = 4, max = 8))]
    pub join_code: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Display name length must be between 1 and 100 characters."
    ))]
    pub display_name: String,
}

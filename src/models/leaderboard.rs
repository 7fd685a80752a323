// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Aggregated row per participant, joined from `participants` and `submissions`.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct Standing {
    pub participant_id: i64,
    pub display_name: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    pub total_score: i64,
    pub correct_count: i64,
}

/// One line of the leaderboard as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: i32,
    pub participant_id: i64,
    pub display_name: String,
    pub total_score: i64,
    pub correct_count: i64,
}

/// Orders standings by score (highest first), then by who joined first, then
/// by id, and numbers them from 1. Equal scores never share a rank.
pub fn rank_standings(mut standings: Vec<Standing>) -> Vec<LeaderboardEntry> {
    standings.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(a.joined_at.cmp(&b.joined_at))
            .then(a.participant_id.cmp(&b.participant_id))
    });

    standings
        .into_iter()
        .zip(1..)
        .map(|(standing, rank)| LeaderboardEntry {
            rank,
            participant_id: standing.participant_id,
            display_name: standing.display_name,
            total_score: standing.total_score,
            correct_count: standing.correct_count,
        })
        .collect()
}

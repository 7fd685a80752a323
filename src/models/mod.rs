// src/models/mod.rs

pub mod answer_option;
pub mod leaderboard;
pub mod participant;
pub mod question;
pub mod quiz;
pub mod session;
pub mod submission;

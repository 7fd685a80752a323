// src/handlers/mod.rs

pub mod answer;
pub mod content;
pub mod participant;
pub mod session;

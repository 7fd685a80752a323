// src/utils/mod.rs

pub mod join_code;

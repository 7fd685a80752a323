// src/utils/join_code.rs

use rand::Rng;

use crate::error::AppError;

/// Character set for generated codes. Leaves out 0/O and 1/I/L so codes read aloud cleanly.
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 8;

/// Generates a random join code of `length` characters.
pub fn generate(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Normalises a code typed by a host or player: trims whitespace and upper-cases it.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validates a host-chosen code. Any ASCII letters and digits are accepted,
/// not just the generator's alphabet.
pub fn validate(code: &str) -> Result<(), AppError> {
    let len = code.chars().count();
    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&len) {
        return Err(AppError::BadRequest(format!(
            "Join code must be between {} and {} characters",
            MIN_CODE_LENGTH, MAX_CODE_LENGTH
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(
            "Join code may only contain letters and digits".to_string(),
        ));
    }
    Ok(())
}

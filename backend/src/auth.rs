use actix_web_httpauth::extractors::basic::BasicAuth;
use sha2::{Digest, Sha256};

use crate::config::Settings;
use crate::error::ApiError;

/// Gate for protected routes: returns the accepted username.
pub fn authenticate(credentials: Option<&BasicAuth>, settings: &Settings) -> Result<String, ApiError> {
    let Some(credentials) = credentials else {
        log::warn!("Request without basic auth credentials rejected");
        return Err(ApiError::Unauthorized);
    };

    verify_credentials(
        credentials.user_id(),
        credentials.password().unwrap_or_default(),
        &settings.auth_basic_username,
        &settings.auth_basic_password,
    )
}

pub fn verify_credentials(
    username: &str,
    password: &str,
    expected_username: &str,
    expected_password: &str,
) -> Result<String, ApiError> {
    // both comparisons always run
    let username_correct = constant_time_eq(username.as_bytes(), expected_username.as_bytes());
    let password_correct = constant_time_eq(password.as_bytes(), expected_password.as_bytes());

    if !(username_correct & password_correct) {
        log::warn!("Basic auth credentials rejected");
        return Err(ApiError::Unauthorized);
    }

    Ok(username.to_string())
}

// Digests have a fixed length, so the fold below takes the same time for any input pair.
fn constant_time_eq(supplied: &[u8], expected: &[u8]) -> bool {
    let supplied = Sha256::digest(supplied);
    let expected = Sha256::digest(expected);
    supplied
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

//! Password hashing for account credentials.
//!
//! This module provides:
//! - Argon2id hashing into a self-describing PHC string
//! - Verification of a candidate password against a stored PHC string
//!
//! # Security
//!
//! - Argon2id (memory-hard, resistant to GPU/ASIC attacks)
//! - Random salt per hash, so equal passwords produce different hashes
//! - Verification is constant-time inside the argon2 crate

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

/// Errors during password hashing.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Stored password hash is malformed")]
    InvalidFormat,
}

/// Argon2id with the parameters used for every stored credential.
fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(19456, 2, 1, None)
        .map_err(|e| PasswordError::Hashing(format!("Invalid Argon2 params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password into a PHC string.
///
/// # Errors
/// Returns error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// # Errors
/// Returns `PasswordError::InvalidFormat` if the stored hash cannot be parsed.
/// A wrong password is `Ok(false)`, not an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(|_| PasswordError::InvalidFormat)?;
    Ok(hasher()?
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

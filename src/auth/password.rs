//! Argon2id password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{HalfsiesError, HalfsiesResult};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password into a PHC string with a fresh random salt
pub fn hash_password(password: &str) -> HalfsiesResult<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(HalfsiesError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HalfsiesError::Auth(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
///
/// A wrong password is `Ok(false)`; only an unreadable stored hash errors.
pub fn verify_password(password: &str, stored_hash: &str) -> HalfsiesResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| HalfsiesError::Auth(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

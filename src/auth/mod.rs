//! Authentication: password hashing, the login session and password prompts

mod password;
mod session;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use session::Session;

use zeroize::Zeroizing;

use crate::error::{HalfsiesError, HalfsiesResult};

/// Read a password without echoing it
pub fn prompt_password(prompt: &str) -> HalfsiesResult<Zeroizing<String>> {
    rpassword::prompt_password(prompt)
        .map(Zeroizing::new)
        .map_err(|e| HalfsiesError::Auth(format!("Failed to read password: {}", e)))
}

/// Prompt twice for a new password until both entries match
pub fn prompt_new_password() -> HalfsiesResult<Zeroizing<String>> {
    loop {
        let first = prompt_password("New password: ")?;
        if first.chars().count() < MIN_PASSWORD_LEN {
            eprintln!(
                "Password must be at least {} characters. Please try again.",
                MIN_PASSWORD_LEN
            );
            continue;
        }
        let second = prompt_password("Confirm password: ")?;
        if *first != *second {
            eprintln!("Passwords do not match. Please try again.");
            continue;
        }
        return Ok(first);
    }
}

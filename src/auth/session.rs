//! Login session persisted in `session.json`
//!
//! The session only records who is logged in. A session pointing at a user
//! that no longer exists counts as logged out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::HalfsiesPaths;
use crate::error::{HalfsiesError, HalfsiesResult};
use crate::models::{User, UserId};
use crate::storage::{write_json_atomic, Storage};

use super::password::verify_password;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    /// Check credentials and start a session for the matching user
    pub fn login(storage: &Storage, email: &str, password: &str) -> HalfsiesResult<User> {
        let invalid = || HalfsiesError::Auth("Invalid email or password".into());

        let user = storage
            .users
            .filter(|u| u.matches_email(email))?
            .into_iter()
            .next()
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        let session = Session {
            user_id: user.id,
            logged_in_at: Utc::now(),
        };
        write_json_atomic(storage.paths().session_file(), &session)?;
        info!(user = %user.id, "logged in");
        Ok(user)
    }

    /// End the current session, returning whether one existed
    pub fn logout(paths: &HalfsiesPaths) -> HalfsiesResult<bool> {
        let path = paths.session_file();
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)
            .map_err(|e| HalfsiesError::Io(format!("Failed to remove session: {}", e)))?;
        Ok(true)
    }

    fn load(paths: &HalfsiesPaths) -> HalfsiesResult<Option<Session>> {
        let path = paths.session_file();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| HalfsiesError::Io(format!("Failed to read session: {}", e)))?;
        match serde_json::from_str(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                debug!(error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    /// The logged-in user, if any
    pub fn current(storage: &Storage) -> HalfsiesResult<Option<User>> {
        match Self::load(storage.paths())? {
            Some(session) => storage.users.get(session.user_id),
            None => Ok(None),
        }
    }

    /// The logged-in user, or an authentication error
    pub fn require_user(storage: &Storage) -> HalfsiesResult<User> {
        Self::current(storage)?.ok_or_else(|| {
            HalfsiesError::Auth("Not logged in. Run 'halfsies user login' first".into())
        })
    }
}

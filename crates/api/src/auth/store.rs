//! In-memory credential store.
//!
//! A single-user store seeded at startup; the password hash is computed
//! once with Argon2id so only the hash lives in memory afterwards.
//! Replace with a real user database before multi-user deployment.

use std::collections::HashMap;

use scrappy_core::error::CoreError;

use crate::auth::password::{hash_password, verify_password};

/// Default admin username when `SCRAPPY_ADMIN_USER` is unset.
const DEFAULT_ADMIN_USER: &str = "admin";

/// Development-only default password when `SCRAPPY_ADMIN_PASSWORD` is unset.
const DEV_DEFAULT_PASSWORD: &str = "password123";

/// Username -> Argon2id PHC hash.
pub struct UserStore {
    users: HashMap<String, String>,
}

impl UserStore {
    /// Build the store from `SCRAPPY_ADMIN_USER` / `SCRAPPY_ADMIN_PASSWORD`.
    ///
    /// Falls back to the development credentials (`admin` / `password123`)
    /// and logs a warning when the password is not configured.
    pub fn from_env() -> Self {
        let username =
            std::env::var("SCRAPPY_ADMIN_USER").unwrap_or_else(|_| DEFAULT_ADMIN_USER.into());

        let password = std::env::var("SCRAPPY_ADMIN_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!(
                "SCRAPPY_ADMIN_PASSWORD not set; using the insecure development default"
            );
            DEV_DEFAULT_PASSWORD.into()
        });

        Self::with_user(&username, &password)
    }

    /// Build a store containing a single user with the given credentials.
    pub fn with_user(username: &str, password: &str) -> Self {
        let hash = hash_password(password).expect("password hashing must succeed at startup");

        let mut users = HashMap::new();
        users.insert(username.to_string(), hash);
        Self { users }
    }

    /// Validate credentials and return the principal identifier.
    ///
    /// Unknown usernames and wrong passwords produce the same error so the
    /// response does not reveal which accounts exist.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<String, CoreError> {
        let invalid = || CoreError::Unauthorized("Incorrect username or password".into());

        let hash = self.users.get(username).ok_or_else(invalid)?;

        let matches = verify_password(password, hash)
            .map_err(|e| CoreError::Internal(format!("Password verification error: {e}")))?;

        if !matches {
            return Err(invalid());
        }

        Ok(username.to_string())
    }
}

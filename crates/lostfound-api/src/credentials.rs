use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use tracing::{info, warn};

use lostfound_db::{Database, queries};
use lostfound_types::models::{User, UserId};

use crate::error::ApiError;

/// Reserved identity shared by every guest login.
pub const GUEST_USERNAME: &str = "guest";
const GUEST_PASSWORD: &str = "guestpassword123";

/// Usernames are compared and stored trimmed and lower-cased.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Hash with Argon2id and a random salt; returns the PHC string.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Storage {
            context: "Failed to hash password",
            cause: anyhow::anyhow!("{e}"),
        })
}

fn verify_password(password: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// User identities, password hashes and the admin flag.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_user(&self, username: &str, raw_password: &str) -> Result<User, ApiError> {
        let username = normalize_username(username);
        let password = raw_password.trim();

        if username.is_empty() {
            return Err(ApiError::Validation("Username is required".into()));
        }
        if password.is_empty() {
            return Err(ApiError::Validation("Password is required".into()));
        }
        if username == GUEST_USERNAME {
            return Err(ApiError::Validation("Username is reserved".into()));
        }

        // Cheap early exit; the UNIQUE constraint below is what actually decides.
        if self
            .db
            .get_user_by_username(&username)
            .map_err(ApiError::storage("Failed to look up user"))?
            .is_some()
        {
            info!("Signup: username '{}' already taken", username);
            return Err(ApiError::DuplicateUsername);
        }

        let password_hash = hash_password(password)?;
        let row = self
            .db
            .with_conn(|conn| queries::insert_user(conn, &username, &password_hash, false))
            .map_err(ApiError::storage("Failed to create user"))?
            .ok_or(ApiError::DuplicateUsername)?;

        info!("Signup: user '{}' created with id {}", row.username, row.id);
        Ok(row.into_user())
    }

    /// Unknown user and wrong password produce the same error.
    pub fn verify_credentials(&self, username: &str, raw_password: &str) -> Result<User, ApiError> {
        let username = normalize_username(username);

        let Some(row) = self
            .db
            .get_user_by_username(&username)
            .map_err(ApiError::storage("Failed to look up user"))?
        else {
            info!("Login: unknown user '{}'", username);
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password(raw_password.trim(), &row.password) {
            info!("Login: password mismatch for '{}'", username);
            return Err(ApiError::InvalidCredentials);
        }

        Ok(row.into_user())
    }

    /// Return the shared guest account, creating it on first use. Two
    /// concurrent first calls both end up with the same row: the loser of
    /// the insert race re-reads the winner's.
    pub fn get_or_create_guest(&self) -> Result<User, ApiError> {
        if let Some(row) = self
            .db
            .get_user_by_username(GUEST_USERNAME)
            .map_err(ApiError::storage("Failed to find guest account"))?
        {
            return Ok(row.into_user());
        }

        info!("Guest account not found, creating it");
        let password_hash = hash_password(GUEST_PASSWORD)?;
        let inserted = self
            .db
            .with_conn(|conn| queries::insert_user(conn, GUEST_USERNAME, &password_hash, false))
            .map_err(ApiError::storage("Failed to create guest account"))?;

        let row = match inserted {
            Some(row) => row,
            None => self
                .db
                .get_user_by_username(GUEST_USERNAME)
                .map_err(ApiError::storage("Failed to find guest account"))?
                .ok_or_else(|| ApiError::Storage {
                    context: "Failed to find guest account",
                    cause: anyhow::anyhow!("guest row missing after unique violation"),
                })?,
        };

        Ok(row.into_user())
    }

    pub fn find_user(&self, id: UserId) -> Result<Option<User>, ApiError> {
        Ok(self
            .db
            .get_user_by_id(id)
            .map_err(ApiError::storage("Failed to look up user"))?
            .map(|row| row.into_user()))
    }

    pub fn is_admin(&self, id: UserId) -> Result<bool, ApiError> {
        self.find_user(id)?
            .map(|user| user.is_admin)
            .ok_or(ApiError::UserNotFound)
    }

    /// Create `username` as an admin, or promote it if it already exists.
    /// An existing account keeps its password.
    pub fn ensure_admin(&self, username: &str, raw_password: &str) -> Result<User, ApiError> {
        let normalized = normalize_username(username);
        let existing = self
            .db
            .get_user_by_username(&normalized)
            .map_err(ApiError::storage("Failed to look up user"))?;

        let id = match existing {
            Some(row) => row.id,
            None => self.create_user(&normalized, raw_password)?.id,
        };

        self.db
            .set_admin(id, true)
            .map_err(ApiError::storage("Failed to grant admin"))?;

        self.find_user(id)?.ok_or(ApiError::UserNotFound)
    }
}

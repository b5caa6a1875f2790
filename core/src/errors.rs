//! Error types for the identity store and file cache.
//!
//! Each consumer maps these onto the wire-level reply text the command
//! handlers emit (`server::reply`).

use thiserror::Error;

/// Errors raised by [`crate::store::SessionStore`] implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A `create_user`/`new_farm` call named a user that already exists.
    #[error("User already exist!")]
    UserAlreadyExists,

    /// Credentials did not verify, or the named user does not exist.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A referenced session id has no matching row.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionIdDisplay),

    /// A referenced user id has no matching row.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The underlying SQLite connection failed.
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// Password hashing or verification failed for reasons other than a
    /// simple mismatch (malformed hash, RNG failure).
    #[error("password hashing error: {0}")]
    Hash(String),
}

/// Thin wrapper so [`StoreError::SessionNotFound`] can carry an `i64`
/// without pulling `i64` display formatting into the enum variant itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdDisplay(pub i64);

impl std::fmt::Display for SessionIdDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<argon2::password_hash::Error> for StoreError {
    fn from(e: argon2::password_hash::Error) -> Self {
        StoreError::Hash(e.to_string())
    }
}

/// Errors raised by the static file cache.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

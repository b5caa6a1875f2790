//! Handler-facing error taxonomy.
//!
//! `farm_core::StoreError` covers the identity store; these types cover
//! everything above it: malformed input, and auth preconditions violated
//! for the connection's current state. Each implements `Display` with
//! the exact text a handler passes to [`crate::reply::Reply::failure`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Cannot parse command - {0}")]
    Unparseable(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not signed in yet!")]
    NotSignedIn,
    #[error("Already signed in!")]
    AlreadySignedIn,
    #[error("Farm already connected!")]
    FarmAlreadyAttached,
    #[error("Farm not connected!")]
    NoFarmAttached,
    #[error("It is not farm!")]
    NotAFarm,
}

#[derive(Error, Debug)]
pub enum NotFoundError {
    #[error("Farm not found!")]
    FarmNotFound,
}

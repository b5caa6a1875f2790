//! Per-socket connection state.
//!
//! Owned exclusively by the task handling one socket — never shared,
//! never locked. See SPEC_FULL.md §4.2.

use farm_core::model::{SessionId, UserId};

use crate::broker::SubscriptionHandle;
use crate::errors::AuthError;

#[derive(Debug, Default)]
pub struct ConnectionState {
    pub user: Option<UserId>,
    pub session: Option<SessionId>,
    pub farm_session: Option<SessionId>,
    /// The topic and handle this connection is currently registered
    /// under (set by `sign_in`/`new_user`, cleared by `sign_out`).
    pub subscription: Option<(String, SubscriptionHandle)>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_farm_attached(&self) -> bool {
        self.farm_session.is_some()
    }

    /// Bind a freshly authenticated `(user, session)` pair.
    pub fn bind(&mut self, user: UserId, session: SessionId) -> Result<(), AuthError> {
        if self.is_signed_in() {
            return Err(AuthError::AlreadySignedIn);
        }
        self.user = Some(user);
        self.session = Some(session);
        Ok(())
    }

    /// Clear the signed-in identity, returning the session id that was
    /// cleared so the caller can delete it from the store.
    pub fn unbind(&mut self) -> Result<SessionId, AuthError> {
        if !self.is_signed_in() {
            return Err(AuthError::NotSignedIn);
        }
        self.user = None;
        self.farm_session = None;
        self.session.take().ok_or(AuthError::NotSignedIn)
    }

    pub fn attach_farm(&mut self, farm_session: SessionId) -> Result<(), AuthError> {
        if !self.is_signed_in() {
            return Err(AuthError::NotSignedIn);
        }
        if self.is_farm_attached() {
            return Err(AuthError::FarmAlreadyAttached);
        }
        self.farm_session = Some(farm_session);
        Ok(())
    }

    /// Clear the farm attachment, returning the session id that was
    /// cleared so the caller can delete it from the store.
    pub fn detach_farm(&mut self) -> Result<SessionId, AuthError> {
        if !self.is_signed_in() {
            return Err(AuthError::NotSignedIn);
        }
        self.farm_session.take().ok_or(AuthError::NoFarmAttached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_twice_rejected() {
        let mut c = ConnectionState::new();
        c.bind(1, 1).unwrap();
        assert!(matches!(c.bind(2, 2), Err(AuthError::AlreadySignedIn)));
    }

    #[test]
    fn attach_farm_requires_sign_in() {
        let mut c = ConnectionState::new();
        assert!(matches!(c.attach_farm(1), Err(AuthError::NotSignedIn)));
    }

    #[test]
    fn attach_farm_twice_rejected() {
        let mut c = ConnectionState::new();
        c.bind(1, 1).unwrap();
        c.attach_farm(2).unwrap();
        assert!(matches!(
            c.attach_farm(3),
            Err(AuthError::FarmAlreadyAttached)
        ));
    }

    #[test]
    fn unbind_clears_farm_session_too() {
        let mut c = ConnectionState::new();
        c.bind(1, 1).unwrap();
        c.attach_farm(2).unwrap();
        let session = c.unbind().unwrap();
        assert_eq!(session, 1);
        assert!(c.farm_session.is_none());
        assert!(!c.is_signed_in());
    }

    #[test]
    fn detach_farm_without_attachment_rejected() {
        let mut c = ConnectionState::new();
        c.bind(1, 1).unwrap();
        assert!(matches!(c.detach_farm(), Err(AuthError::NoFarmAttached)));
    }
}

//! The identity store: users, groups, sessions, and farm ownership.

pub mod sqlite;

use crate::errors::StoreError;
use crate::model::{Farm, User, UserId, SessionId};

/// Operations the command handlers need from the identity store.
///
/// All operations are synchronous: the store is a single SQLite
/// connection behind a mutex, and every call here is a fast point
/// lookup or small transaction, not a long-running I/O operation.
pub trait SessionStore: Send + Sync {
    fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError>;

    /// Create a new user with the given name and plaintext password,
    /// hashing the password before it ever reaches the store.
    fn create_user(&self, name: &str, password: &str) -> Result<UserId, StoreError>;

    /// Verify `password` against the stored hash for `name`. Returns
    /// `Ok(None)` if no such user exists or the password does not match;
    /// never distinguishes the two to the caller.
    fn check_password(&self, name: &str, password: &str) -> Result<Option<User>, StoreError>;

    fn create_session(&self, user_id: UserId) -> Result<SessionId, StoreError>;

    fn delete_session(&self, session_id: SessionId) -> Result<(), StoreError>;

    fn session_user(&self, session_id: SessionId) -> Result<Option<UserId>, StoreError>;

    fn is_in_group(&self, user_id: UserId, group_name: &str) -> Result<bool, StoreError>;

    /// Returns `false` (no-op) if the user was already a member.
    fn add_to_group(&self, user_id: UserId, group_name: &str) -> Result<bool, StoreError>;

    fn link_farm(&self, owner_user_id: UserId, farm_user_id: UserId) -> Result<(), StoreError>;

    /// The farm owned by `owner_user_id`, if any. At most one row can
    /// ever match, since `Farm.user_id` is unique.
    fn owned_farm(&self, owner_user_id: UserId) -> Result<Option<Farm>, StoreError>;

    /// The owning user of `farm_user_id`, the reverse of [`owned_farm`](Self::owned_farm).
    /// Used to route a farm-originated message back to its owner's topic.
    fn farm_owner(&self, farm_user_id: UserId) -> Result<Option<UserId>, StoreError>;

    /// The most recently created session for `user_id`, if any. A user
    /// can accumulate more than one session row (a farm's `connect_farm`
    /// placeholder session alongside its own `sign_in` session); the
    /// latest one is always the live, subscribed one, so a fresh
    /// sign-in transparently supersedes a stale session for routing
    /// purposes.
    fn active_session(&self, user_id: UserId) -> Result<Option<SessionId>, StoreError>;

    /// Create a farm user, link it to its owner, and add it to the farm
    /// group as a single atomic operation.
    fn new_farm(
        &self,
        owner_user_id: UserId,
        farm_name: &str,
        farm_password: &str,
    ) -> Result<UserId, StoreError>;
}

//! Entities tracked by the identity store.
//!
//! A farm device is not a distinct entity type: it is a [`User`] whose
//! name carries the `farm_` prefix and who is a member of the well-known
//! [`FARM_GROUP`].

use serde::{Deserialize, Serialize};

/// Name of the well-known group every farm device user belongs to.
pub const FARM_GROUP: &str = "farm";

pub type UserId = i64;
pub type GroupId = i64;
pub type SessionId = i64;
pub type FarmLinkId = i64;

/// A registered account, human or farm device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Argon2id PHC hash. Never logged, never serialized back to a client.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// Membership edge between a [`User`] and a [`Group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    pub user_id: UserId,
    pub group_id: GroupId,
}

/// A live authentication token, created on sign-in and destroyed on
/// sign-out or socket close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
}

/// Ownership edge between a human user and the farm device it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub id: FarmLinkId,
    pub user_id: UserId,
    pub farm_id: UserId,
}

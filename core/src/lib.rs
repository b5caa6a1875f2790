pub mod errors;
pub mod files;
pub mod model;
pub mod store;

pub use errors::{FileError, StoreError};
pub use model::{Farm, Group, Session, User, UserGroup, FARM_GROUP};
pub use store::{sqlite::SqliteStore, SessionStore};

//! SQLite-backed [`SessionStore`].

use std::path::Path;
use std::sync::Mutex;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::StoreError;
use crate::model::{Farm, User, UserId, SessionId, FARM_GROUP};
use crate::store::SessionStore;

/// A `SessionStore` backed by a single SQLite connection guarded by a
/// mutex. SQLite serializes writers internally; the mutex exists only
/// because `rusqlite::Connection` is not `Sync`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if absent) the database at `path` and ensure the
    /// schema and well-known `farm` group exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS Users (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                name     TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS Groups (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            );
            CREATE TABLE IF NOT EXISTS UserGroup (
                user_id  INTEGER NOT NULL,
                group_id INTEGER NOT NULL,
                UNIQUE(user_id, group_id)
            );
            CREATE TABLE IF NOT EXISTS Session (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS Farm (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER UNIQUE NOT NULL,
                farm_id INTEGER NOT NULL
            );
            ",
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO Groups (name) VALUES (?1)",
            params![FARM_GROUP],
        )?;
        Ok(())
    }

    fn group_id(conn: &Connection, name: &str) -> Result<Option<i64>, StoreError> {
        conn.query_row(
            "SELECT id FROM Groups WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::from)
    }
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> Result<bool, StoreError> {
    let parsed = PasswordHash::new(hash).map_err(|e| StoreError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

impl SessionStore for SqliteStore {
    fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT id, name, password FROM Users WHERE name = ?1",
            params![name],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn create_user(&self, name: &str, password: &str) -> Result<UserId, StoreError> {
        let hash = hash_password(password)?;
        let conn = self.conn.lock().expect("store mutex poisoned");
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM Users WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StoreError::UserAlreadyExists);
        }
        conn.execute(
            "INSERT INTO Users (name, password) VALUES (?1, ?2)",
            params![name, hash],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn check_password(&self, name: &str, password: &str) -> Result<Option<User>, StoreError> {
        let Some(user) = self.find_user_by_name(name)? else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    fn create_session(&self, user_id: UserId) -> Result<SessionId, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO Session (user_id) VALUES (?1)",
            params![user_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn delete_session(&self, session_id: SessionId) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute("DELETE FROM Session WHERE id = ?1", params![session_id])?;
        Ok(())
    }

    fn session_user(&self, session_id: SessionId) -> Result<Option<UserId>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT user_id FROM Session WHERE id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn is_in_group(&self, user_id: UserId, group_name: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let Some(group_id) = Self::group_id(&conn, group_name)? else {
            return Ok(false);
        };
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM UserGroup WHERE user_id = ?1 AND group_id = ?2",
            params![user_id, group_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn add_to_group(&self, user_id: UserId, group_name: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let group_id = match Self::group_id(&conn, group_name)? {
            Some(id) => id,
            None => {
                conn.execute(
                    "INSERT INTO Groups (name) VALUES (?1)",
                    params![group_name],
                )?;
                conn.last_insert_rowid()
            }
        };
        let changed = conn.execute(
            "INSERT OR IGNORE INTO UserGroup (user_id, group_id) VALUES (?1, ?2)",
            params![user_id, group_id],
        )?;
        Ok(changed > 0)
    }

    fn link_farm(&self, owner_user_id: UserId, farm_user_id: UserId) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO Farm (user_id, farm_id) VALUES (?1, ?2)",
            params![owner_user_id, farm_user_id],
        )?;
        Ok(())
    }

    fn owned_farm(&self, owner_user_id: UserId) -> Result<Option<Farm>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT id, user_id, farm_id FROM Farm WHERE user_id = ?1",
            params![owner_user_id],
            |row| {
                Ok(Farm {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    farm_id: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn farm_owner(&self, farm_user_id: UserId) -> Result<Option<UserId>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT user_id FROM Farm WHERE farm_id = ?1",
            params![farm_user_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn active_session(&self, user_id: UserId) -> Result<Option<SessionId>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT id FROM Session WHERE user_id = ?1 ORDER BY id DESC LIMIT 1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn new_farm(
        &self,
        owner_user_id: UserId,
        farm_name: &str,
        farm_password: &str,
    ) -> Result<UserId, StoreError> {
        let hash = hash_password(farm_password)?;
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM Users WHERE name = ?1",
                params![farm_name],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StoreError::UserAlreadyExists);
        }

        let tx = conn.transaction().map_err(StoreError::from)?;

        tx.execute(
            "INSERT INTO Users (name, password) VALUES (?1, ?2)",
            params![farm_name, hash],
        )?;
        let farm_user_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO Farm (user_id, farm_id) VALUES (?1, ?2)",
            params![owner_user_id, farm_user_id],
        )?;

        let group_id = match tx
            .query_row(
                "SELECT id FROM Groups WHERE name = ?1",
                params![FARM_GROUP],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        {
            Some(id) => id,
            None => {
                tx.execute("INSERT INTO Groups (name) VALUES (?1)", params![FARM_GROUP])?;
                tx.last_insert_rowid()
            }
        };
        tx.execute(
            "INSERT OR IGNORE INTO UserGroup (user_id, group_id) VALUES (?1, ?2)",
            params![farm_user_id, group_id],
        )?;

        tx.commit()?;
        Ok(farm_user_id)
    }
}

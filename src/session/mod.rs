//! User data and the login session.
//!
//! [`UserDataStore`] is a small key/value table. [`Session`] is the explicit
//! session object built on top of it: loaded once at startup, handed to the
//! API client, and cleared on logout.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use serde_json::Value;

use crate::error::StewardError;
use crate::storage::Database;

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Key/value store for user data.
pub struct UserDataStore<'a> {
    db: &'a Database,
}

impl<'a> UserDataStore<'a> {
    /// Create a store over an open database.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert or overwrite a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the write fails.
    pub fn save(&self, key: &str, value: &Value) -> Result<(), StewardError> {
        let data = serde_json::to_string(value)?;

        self.db
            .connection()
            .execute(
                "INSERT INTO user_data (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, data],
            )
            .map_err(|e| StewardError::storage("Failed to save user data", &e))?;

        Ok(())
    }

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn get(&self, key: &str) -> Result<Option<Value>, StewardError> {
        let data: Option<String> = self
            .db
            .connection()
            .query_row("SELECT value FROM user_data WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StewardError::storage("Failed to read user data", &e))?;

        data.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(StewardError::from)
    }

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the delete fails.
    pub fn clear(&self) -> Result<(), StewardError> {
        self.db
            .connection()
            .execute("DELETE FROM user_data", [])
            .map_err(|e| StewardError::storage("Failed to clear user data", &e))?;

        Ok(())
    }
}

/// Authenticated session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    /// Bearer token for the API
    pub token: Option<String>,
    /// User object returned at login
    pub user: Option<Value>,
}

impl Session {
    /// Build a session from a login response.
    #[must_use]
    pub const fn new(token: String, user: Option<Value>) -> Self {
        Self {
            token: Some(token),
            user,
        }
    }

    /// Load the persisted session, or an empty one.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read.
    pub fn load(store: &UserDataStore<'_>) -> Result<Self, StewardError> {
        let token = store
            .get(TOKEN_KEY)?
            .and_then(|v| v.as_str().map(ToString::to_string));
        let user = store.get(USER_KEY)?;

        Ok(Self { token, user })
    }

    /// Persist the session.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be written.
    pub fn save(&self, store: &UserDataStore<'_>) -> Result<(), StewardError> {
        if let Some(token) = &self.token {
            store.save(TOKEN_KEY, &Value::String(token.clone()))?;
        }
        if let Some(user) = &self.user {
            store.save(USER_KEY, user)?;
        }
        Ok(())
    }

    /// Forget the session in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be cleared.
    pub fn logout(&mut self, store: &UserDataStore<'_>) -> Result<(), StewardError> {
        store.clear()?;
        *self = Self::default();
        tracing::info!("session cleared");
        Ok(())
    }

    /// Whether a token is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Display name of the logged-in user, if known.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        user.get("username")
            .or_else(|| user.get("full_name"))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_data_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let store = UserDataStore::new(&db);

        assert!(store.get("branch").unwrap().is_none());

        store.save("branch", &json!({"id": 12})).unwrap();
        store.save("branch", &json!({"id": 13})).unwrap();
        assert_eq!(store.get("branch").unwrap(), Some(json!({"id": 13})));

        store.clear().unwrap();
        assert!(store.get("branch").unwrap().is_none());
    }

    #[test]
    fn test_empty_session() {
        let db = Database::open_in_memory().unwrap();
        let session = Session::load(&UserDataStore::new(&db)).unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_session_survives_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("steward.db");

        {
            let db = Database::open_at(&path).unwrap();
            let session = Session::new(
                "tok-123".to_string(),
                Some(json!({"username": "steward1", "role": "steward"})),
            );
            session.save(&UserDataStore::new(&db)).unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        let session = Session::load(&UserDataStore::new(&db)).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token.as_deref(), Some("tok-123"));
        assert_eq!(session.username(), Some("steward1"));
    }

    #[test]
    fn test_logout_clears_store() {
        let db = Database::open_in_memory().unwrap();
        let store = UserDataStore::new(&db);

        let mut session = Session::new("tok".to_string(), None);
        session.save(&store).unwrap();

        session.logout(&store).unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(Session::load(&store).unwrap(), Session::default());
    }
}

//! Persisted auth session for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session (bearer token plus user profile) is the only authentication
//! signal on the client. Route guards read it, the API client attaches its
//! token, and a 401 from any request clears it. There is no client-side
//! expiry: the session lives until logout or a server-driven 401.
//!
//! DESIGN
//! ======
//! `SessionStore` wraps a `watch` channel so observers (router, CLI prompt)
//! see every change, and mirrors the value into a `Storage` backend under the
//! keys `token` and `user`. Storage failures are logged and never block the
//! in-memory update.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use models::User;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Authenticated identity held by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value persistence for the session, in the shape of browser local storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk.
///
/// Every call re-reads the file, so two CLI invocations sharing a file see
/// each other's logins.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session file unreadable");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_owned(), value.to_owned());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all().unwrap_or_default();
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Observable holder of the (at most one) current session.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionStore {
    /// Build a store and restore any session persisted in `storage`.
    ///
    /// A token without a user (or the reverse), or a user entry that does not
    /// parse, is treated as corrupt and both keys are removed.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let restored = restore(storage.as_ref());
        let (tx, _rx) = watch::channel(restored);
        Self { storage, tx: Arc::new(tx) }
    }

    /// Store with in-memory persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.token.clone())
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.tx.borrow().as_ref().map(|s| s.user.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Replace the session. Any previous session is discarded.
    pub fn set(&self, session: Session) {
        self.persist(&session);
        self.tx.send_replace(Some(session));
    }

    /// Swap the user profile of the live session, keeping its token.
    pub fn update_user(&self, user: User) {
        let mut updated = None;
        self.tx.send_if_modified(|current| match current {
            Some(session) if session.user != user => {
                session.user = user;
                updated = Some(session.clone());
                true
            }
            _ => false,
        });
        if let Some(session) = updated {
            self.persist(&session);
        }
    }

    /// Drop the session. Returns `true` only for the call that actually
    /// removed one, so concurrent callers can tell who observed the loss.
    pub fn clear(&self) -> bool {
        let removed = self.tx.send_if_modified(|current| current.take().is_some());
        if removed {
            remove_keys(self.storage.as_ref());
        }
        removed
    }

    fn persist(&self, session: &Session) {
        let user = match serde_json::to_string(&session.user) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize session user");
                return;
            }
        };
        let result = self
            .storage
            .set(TOKEN_KEY, &session.token)
            .and_then(|()| self.storage.set(USER_KEY, &user));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist session");
        }
    }
}

fn restore(storage: &dyn Storage) -> Option<Session> {
    let token = storage.get(TOKEN_KEY);
    let user = storage.get(USER_KEY);
    match (token, user) {
        (None, None) => None,
        (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                warn!(error = %e, "stored session user is corrupt; clearing session");
                remove_keys(storage);
                None
            }
        },
        _ => {
            warn!("incomplete stored session; clearing session");
            remove_keys(storage);
            None
        }
    }
}

fn remove_keys(storage: &dyn Storage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove(key) {
            warn!(key, error = %e, "failed to remove session key");
        }
    }
}

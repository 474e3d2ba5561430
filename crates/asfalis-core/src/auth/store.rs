//! Session persistence.
//!
//! The `SessionStore` trait is the only way the rest of the crate touches the
//! persisted record. Field helpers are load-modify-save over the whole record.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

use super::session::{Session, SESSION_NAMESPACE};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Credential store failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Session store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage for the single session record.
///
/// Every method completes its write before returning; a `load` after a
/// `save` or `clear` always observes it.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> StoreResult<Session>;

    fn save(&self, session: &Session) -> StoreResult<()>;

    fn clear(&self) -> StoreResult<()>;

    fn is_logged_in(&self) -> StoreResult<bool> {
        Ok(self.load()?.is_logged_in)
    }

    fn set_logged_in(&self, is_logged_in: bool) -> StoreResult<()> {
        let mut session = self.load()?;
        session.is_logged_in = is_logged_in;
        self.save(&session)
    }

    fn auth_token(&self) -> StoreResult<String> {
        Ok(self.load()?.auth_token)
    }

    fn set_auth_token(&self, token: &str) -> StoreResult<()> {
        let mut session = self.load()?;
        session.auth_token = token.to_string();
        self.save(&session)
    }

    fn user_id(&self) -> StoreResult<i32> {
        Ok(self.load()?.user_id)
    }

    fn username(&self) -> StoreResult<String> {
        Ok(self.load()?.username)
    }
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn load(&self) -> StoreResult<Session> {
        (**self).load()
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        (**self).save(session)
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store, used by tests and by shells that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> StoreResult<Session> {
        let guard = self.session.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        let mut guard = self.session.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = session.clone();
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.save(&Session::default())
    }
}

// ============================================================================
// File store
// ============================================================================

/// JSON file store, one file per namespace inside the data directory.
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes writers so the temp file is never shared.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(data_dir: &Path) -> Self {
        let file_name = format!("{}.json", SESSION_NAMESPACE.to_lowercase());
        Self {
            path: data_dir.join(file_name),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> StoreResult<Session> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a reader sees either the old or the new record.
        let temp = self.temp_path();
        let contents = serde_json::to_string_pretty(session)?;
        {
            let mut file = std::fs::File::create(&temp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&temp, &self.path)?;
        debug!(path = ?self.path, "Session record saved");
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        debug!(path = ?self.path, "Session record cleared");
        Ok(())
    }
}

use std::sync::Mutex;

use keyring::Entry;
use tracing::debug;

use super::session::{Session, SESSION_NAMESPACE};
use super::store::{SessionStore, StoreError, StoreResult};

/// Keychain service the session record is filed under.
const SERVICE_NAME: &str = "asfalis-mobile";

/// Session store backed by the OS keychain.
///
/// The whole record is one secret, so a write replaces it atomically.
pub struct KeyringSessionStore {
    entry: Mutex<Entry>,
}

impl KeyringSessionStore {
    pub fn new() -> StoreResult<Self> {
        Self::for_account(SESSION_NAMESPACE)
    }

    pub fn for_account(account: &str) -> StoreResult<Self> {
        let entry = Entry::new(SERVICE_NAME, account)?;
        Ok(Self {
            entry: Mutex::new(entry),
        })
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> StoreResult<Session> {
        let entry = self.entry.lock().map_err(|_| StoreError::Poisoned)?;
        match entry.get_password() {
            Ok(secret) => Ok(serde_json::from_str(&secret)?),
            Err(keyring::Error::NoEntry) => Ok(Session::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        let secret = serde_json::to_string(session)?;
        let entry = self.entry.lock().map_err(|_| StoreError::Poisoned)?;
        entry.set_password(&secret)?;
        debug!(service = SERVICE_NAME, "Session record stored in keychain");
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let entry = self.entry.lock().map_err(|_| StoreError::Poisoned)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

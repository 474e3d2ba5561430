//! Session persistence for the single per-device login record.
//!
//! This module provides:
//! - `Session`: the persisted record (login flag, identity, bearer token)
//! - `SessionStore`: the storage contract the session manager is given
//! - `FileSessionStore`, `KeyringSessionStore`, `MemorySessionStore`: backends

pub mod keychain;
pub mod session;
pub mod store;

pub use keychain::KeyringSessionStore;
pub use session::{Identity, Session, SESSION_NAMESPACE};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError, StoreResult};

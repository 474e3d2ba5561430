//! Asfalis core - the login-session lifecycle of the Asfalis mobile client.
//!
//! Credential login, bearer-token persistence, silent revalidation on every
//! resume, biometric-gated re-entry and QR-code resolution. Screens are not
//! part of this crate; a shell drives `SessionManager` and renders outcomes.

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod session;

pub use api::{ApiClient, ApiError, AuthApi, ClientOptions};
pub use auth::{FileSessionStore, Identity, KeyringSessionStore, MemorySessionStore, Session, SessionStore};
pub use config::Config;
pub use forms::{Credentials, LoginForm, ValidationError};
pub use session::{
    BiometricAvailability, BiometricOutcome, BiometricPrompt, ResumeReport, Resumption,
    SessionError, SessionManager, SessionState,
};

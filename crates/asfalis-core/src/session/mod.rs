//! Login-session lifecycle: the state machine, its error boundary and the
//! biometric seam the platform plugs into.

pub mod biometric;
pub mod error;
pub mod manager;
pub mod state;

pub use biometric::{BiometricAvailability, BiometricOutcome, BiometricPrompt};
pub use error::SessionError;
pub use manager::{ResumeReport, SessionManager};
pub use state::{Resumption, SessionState};

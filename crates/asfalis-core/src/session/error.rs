use thiserror::Error;

use crate::api::ApiError;
use crate::auth::StoreError;
use crate::forms::ValidationError;

use super::biometric::BiometricAvailability;

/// Shown for every transport failure; details go to the log only.
pub const CONNECTIVITY_MESSAGE: &str = "There was an error connecting to the system";

/// Shown when the server refuses a scanned code.
pub const NOT_AUTHORIZED_MESSAGE: &str = "Sorry, you are not authorized to perform this activity";

/// Everything a session operation can report to the shell.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credentials or token rejected; the server's own message.
    #[error("{0}")]
    Unauthorized(String),

    #[error("There was an error connecting to the system")]
    Network,

    #[error("{0}")]
    Server(String),

    #[error("No saved session - sign in with your username and password first")]
    NoStoredToken,

    #[error("Biometric login unavailable: {0}")]
    BiometricUnavailable(BiometricAvailability),

    #[error("Biometric not recognized")]
    BiometricNotRecognized,

    #[error("Biometric login failed: {0}")]
    BiometricError(String),

    /// The session was rejected, replaced or signed out while this operation
    /// was pending, so its result was discarded.
    #[error("Session changed before the operation completed")]
    Superseded,

    #[error("Please sign in to continue")]
    SignInRequired,

    #[error("Sorry, you are not authorized to perform this activity")]
    NotAuthorized,

    #[error("Session storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl SessionError {
    /// Map a remote failure onto the shell-facing taxonomy. `fallback` is used
    /// when the server rejected the request without saying why.
    pub(crate) fn from_api(err: ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Unauthorized(message) => SessionError::Unauthorized(non_empty(message, fallback)),
            ApiError::NetworkFailure(_) => SessionError::Network,
            ApiError::ServerError { status, message } => {
                SessionError::Server(non_empty(message, &format!("Server error ({})", status)))
            }
        }
    }

    /// Whether the caller may simply try the same operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Network | SessionError::Server(_))
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

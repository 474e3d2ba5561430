use serde::Serialize;

/// Where the login lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No active session. A token may still be kept for biometric re-entry.
    #[default]
    LoggedOut,
    /// A token is stored and has not been checked with the server yet.
    /// `resume_session` records whether the app was logged in before the
    /// resume reset the flag.
    AwaitingRevalidation { resume_session: bool },
    LoggedIn,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn)
    }

    /// Whether a successful revalidation from this state should log in.
    pub fn resumes_session(&self) -> bool {
        match self {
            SessionState::AwaitingRevalidation { resume_session } => *resume_session,
            SessionState::LoggedIn => true,
            SessionState::LoggedOut => false,
        }
    }
}

/// What the shell should show after an app start or resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumption {
    pub state: SessionState,
    /// Username to prefill on the login form.
    pub remembered_username: Option<String>,
    /// Whether to offer biometric re-entry.
    pub offer_biometric: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resumes_session() {
        assert!(!SessionState::LoggedOut.resumes_session());
        assert!(SessionState::LoggedIn.resumes_session());
        assert!(SessionState::AwaitingRevalidation { resume_session: true }.resumes_session());
        assert!(!SessionState::AwaitingRevalidation { resume_session: false }.resumes_session());
    }

    #[test]
    fn test_default_is_logged_out() {
        assert_eq!(SessionState::default(), SessionState::LoggedOut);
        assert!(!SessionState::default().is_logged_in());
    }

    #[test]
    fn test_serializes_with_state_tag() {
        let json = serde_json::to_value(SessionState::AwaitingRevalidation { resume_session: true }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"state": "awaiting_revalidation", "resume_session": true})
        );
    }
}

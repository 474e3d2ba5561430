use serde::{Deserialize, Serialize};

/// Namespace the session record is stored under.
/// There is at most one session per device, always under this key.
pub const SESSION_NAMESPACE: &str = "ASFALIS_SHARED_PREFERENCE";

/// The persisted login record.
///
/// An empty `auth_token` means "no session". A record that has never been
/// written loads as `Session::default()`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Session {
    #[serde(rename = "IS_LOGIN", default)]
    pub is_logged_in: bool,
    #[serde(rename = "USER_ID", default)]
    pub user_id: i32,
    #[serde(rename = "USERNAME", default)]
    pub username: String,
    #[serde(rename = "EMAIL_ADDRESS", default)]
    pub email: String,
    #[serde(rename = "AUTH_TOKEN", default)]
    pub auth_token: String,
}

impl Session {
    /// Build a fully logged-in session from a successful credential login.
    pub fn logged_in(user_id: i32, username: String, email: String, auth_token: String) -> Self {
        Self {
            is_logged_in: true,
            user_id,
            username,
            email,
            auth_token,
        }
    }

    pub fn has_token(&self) -> bool {
        !self.auth_token.is_empty()
    }

    /// An active session: flagged logged in and holding a token.
    pub fn is_active(&self) -> bool {
        self.is_logged_in && self.has_token()
    }

    /// Identity projection, only available for an active session
    pub fn identity(&self) -> Option<Identity> {
        if !self.is_active() {
            return None;
        }
        Some(Identity {
            user_id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
        })
    }
}

// Token stays out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("is_logged_in", &self.is_logged_in)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("auth_token", &format_args!("<{} bytes>", self.auth_token.len()))
            .finish()
    }
}

/// Who is logged in, as shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_has_no_token() {
        let session = Session::default();
        assert!(!session.has_token());
        assert!(!session.is_active());
        assert!(session.identity().is_none());
    }

    #[test]
    fn test_flag_without_token_is_not_active() {
        let session = Session {
            is_logged_in: true,
            ..Default::default()
        };
        assert!(!session.is_active());
    }

    #[test]
    fn test_identity_of_active_session() {
        let session = Session::logged_in(7, "bob".into(), "bob@example.com".into(), "abc".into());
        let identity = session.identity().expect("active session has identity");
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.username, "bob");
        assert_eq!(identity.email, "bob@example.com");
    }

    #[test]
    fn test_serializes_with_persisted_key_names() {
        let session = Session::logged_in(3, "amy".into(), "amy@example.com".into(), "tok".into());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["IS_LOGIN"], true);
        assert_eq!(json["USER_ID"], 3);
        assert_eq!(json["USERNAME"], "amy");
        assert_eq!(json["EMAIL_ADDRESS"], "amy@example.com");
        assert_eq!(json["AUTH_TOKEN"], "tok");
    }

    #[test]
    fn test_missing_fields_load_as_defaults() {
        let session: Session = serde_json::from_str(r#"{"AUTH_TOKEN":"abc"}"#).unwrap();
        assert!(!session.is_logged_in);
        assert_eq!(session.user_id, 0);
        assert_eq!(session.auth_token, "abc");
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::logged_in(1, "bob".into(), String::new(), "secret-token".into());
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<12 bytes>"));
    }
}

//! Wire types for the login API.

use serde::{Deserialize, Serialize};

/// Body of `POST login/personal`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(rename = "Name")]
    pub name: &'a str,
    #[serde(rename = "Password")]
    pub password: &'a str,
}

/// Body of `POST login/token/validation`.
#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub token: &'a str,
}

/// Refreshed token returned by a successful validation.
#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

/// Identity and bearer token issued by a successful credential login.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct LoginGrant {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub token: String,
}

impl std::fmt::Debug for LoginGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGrant")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Result of a successful token validation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenValidation {
    /// Replacement token, when the server chose to refresh.
    pub refreshed_token: Option<String>,
}

impl TokenValidation {
    pub fn refreshed(token: impl Into<String>) -> Self {
        Self {
            refreshed_token: Some(token.into()),
        }
    }

    /// Interpret a 2xx validation body. Anything other than a JSON object
    /// with a non-empty `token` means "still valid, not refreshed".
    pub(crate) fn from_body(body: &str) -> Self {
        let refreshed_token = serde_json::from_str::<TokenBody>(body)
            .ok()
            .map(|b| b.token)
            .filter(|t| !t.is_empty());
        Self { refreshed_token }
    }
}

impl std::fmt::Debug for TokenValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidation")
            .field("refreshed", &self.refreshed_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_uses_pascal_case_keys() {
        let body = serde_json::to_value(LoginRequest {
            name: "bob",
            password: "pw",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"Name": "bob", "Password": "pw"}));
    }

    #[test]
    fn test_parse_login_grant() {
        let json = r#"{"userId": 12, "username": "bob", "email": "bob@example.com", "token": "jwt"}"#;
        let grant: LoginGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.user_id, 12);
        assert_eq!(grant.token, "jwt");
        assert!(!format!("{:?}", grant).contains("jwt"));
    }

    #[test]
    fn test_token_validation_from_body() {
        assert_eq!(
            TokenValidation::from_body(r#"{"token":"xyz"}"#).refreshed_token.as_deref(),
            Some("xyz")
        );
        assert_eq!(TokenValidation::from_body(r#"{"token":""}"#).refreshed_token, None);
        assert_eq!(TokenValidation::from_body("").refreshed_token, None);
        assert_eq!(TokenValidation::from_body("valid").refreshed_token, None);
    }
}

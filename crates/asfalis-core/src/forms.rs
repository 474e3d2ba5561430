//! Typed input validation for the login form and scanned codes.
//!
//! Fields are trimmed before checking. Validation stops at the first empty
//! required field so the shell can focus it.

use std::fmt;

use thiserror::Error;

/// Message attached to an empty required field.
pub const REQUIRED_FIELD_MESSAGE: &str = "The field is required";

/// Maximum length for the login name.
const MAX_NAME_LENGTH: usize = 100;

/// Maximum length for the password.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Password,
    Code,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Name => "name",
            Field::Password => "password",
            Field::Code => "code",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: The field is required")]
    Required { field: Field },

    #[error("{field}: must be at most {max} characters")]
    TooLong { field: Field, max: usize },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Required { field } | ValidationError::TooLong { field, .. } => *field,
        }
    }

    /// Inline message for the offending field, without the field label.
    pub fn field_message(&self) -> String {
        match self {
            ValidationError::Required { .. } => REQUIRED_FIELD_MESSAGE.to_string(),
            ValidationError::TooLong { max, .. } => format!("Must be at most {} characters", max),
        }
    }
}

/// Raw login form input, as typed by the user.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub name: String,
    pub password: String,
}

/// Validated, trimmed credentials ready to send.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginForm {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        let name = required(Field::Name, &self.name, MAX_NAME_LENGTH)?;
        let password = required(Field::Password, &self.password, MAX_PASSWORD_LENGTH)?;
        Ok(Credentials {
            name: name.to_string(),
            password: password.to_string(),
        })
    }
}

/// Validate a scanned code before sending it for resolution.
pub fn validate_code(code: &str) -> Result<&str, ValidationError> {
    required(Field::Code, code, usize::MAX)
}

fn required(field: Field, value: &str, max: usize) -> Result<&str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_form_is_trimmed() {
        let creds = LoginForm::new("  bob ", " secret\n").validate().unwrap();
        assert_eq!(creds.name, "bob");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_first_empty_field_is_reported() {
        let err = LoginForm::new("", "").validate().unwrap_err();
        assert_eq!(err, ValidationError::Required { field: Field::Name });

        let err = LoginForm::new("bob", "   ").validate().unwrap_err();
        assert_eq!(err.field(), Field::Password);
        assert_eq!(err.to_string(), "password: The field is required");
        assert_eq!(err.field_message(), REQUIRED_FIELD_MESSAGE);
    }

    #[test]
    fn test_overlong_password_rejected() {
        let err = LoginForm::new("bob", "x".repeat(129)).validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: Field::Password,
                max: 128
            }
        );
    }

    #[test]
    fn test_validate_code() {
        assert_eq!(validate_code(" ABC123 ").unwrap(), "ABC123");
        assert_eq!(
            validate_code("\t").unwrap_err(),
            ValidationError::Required { field: Field::Code }
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = LoginForm::new("bob", "hunter2").validate().unwrap();
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}

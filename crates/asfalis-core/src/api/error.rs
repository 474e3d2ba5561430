use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Credentials or token rejected; carries the server's message.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    NetworkFailure(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::truncate_body(body.trim());
        match status.as_u16() {
            400 | 401 | 403 => ApiError::Unauthorized(message),
            code => ApiError::ServerError {
                status: code,
                message,
            },
        }
    }

    /// A 2xx response whose body could not be used.
    pub fn malformed(status: reqwest::StatusCode, detail: impl std::fmt::Display) -> Self {
        ApiError::ServerError {
            status: status.as_u16(),
            message: format!("Malformed response: {}", detail),
        }
    }

    /// Message fit for showing to the user, when the server supplied one.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthorized(message) => message,
            ApiError::NetworkFailure(message) => message,
            ApiError::ServerError { message, .. } => message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "transport error"
        };
        ApiError::NetworkFailure(format!("{}: {}", kind, err))
    }
}

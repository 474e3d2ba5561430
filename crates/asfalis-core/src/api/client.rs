//! API client for the Asfalis login service.
//!
//! This module provides the `AuthApi` trait the session manager talks to,
//! and `ApiClient`, its HTTPS implementation on top of reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Certificate, Client, Url};
use tracing::debug;

use super::models::{LoginGrant, LoginRequest, TokenRequest, TokenValidation};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://localhost:5001/api/";

/// Connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 20;

/// Write timeout in seconds. reqwest has no write timeout of its own, so this
/// is folded into the whole-request bound together with the read timeout.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 25;

const LOGIN_PATH: &str = "login/personal";
const VALIDATION_PATH: &str = "login/token/validation";
const QR_CODE_PATH: &str = "login/qrcode/";

// ============================================================================
// Trait
// ============================================================================

/// Remote operations the session lifecycle depends on.
///
/// Every call is terminal: errors are returned, never retried here.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, name: &str, password: &str) -> Result<LoginGrant, ApiError>;

    /// Succeeds while `token` is still accepted; the server may refresh it.
    async fn validate_token(&self, token: &str) -> Result<TokenValidation, ApiError>;

    /// Decode a scanned code server-side on behalf of `user_id`.
    async fn resolve_code(
        &self,
        user_id: i32,
        code: &str,
        bearer_token: &str,
    ) -> Result<String, ApiError>;
}

#[async_trait]
impl<T: AuthApi + ?Sized> AuthApi for std::sync::Arc<T> {
    async fn login(&self, name: &str, password: &str) -> Result<LoginGrant, ApiError> {
        (**self).login(name, password).await
    }

    async fn validate_token(&self, token: &str) -> Result<TokenValidation, ApiError> {
        (**self).validate_token(token).await
    }

    async fn resolve_code(
        &self,
        user_id: i32,
        code: &str,
        bearer_token: &str,
    ) -> Result<String, ApiError> {
        (**self).resolve_code(user_id, code, bearer_token).await
    }
}

// ============================================================================
// Options
// ============================================================================

/// Connection settings for `ApiClient`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Extra PEM root certificate to trust alongside the system roots.
    pub extra_root_pem: Option<Vec<u8>>,
}

impl ClientOptions {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
            extra_root_pem: None,
        })
    }

    /// Options for the local development server.
    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins append.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("Invalid base URL: {}", raw))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("Base URL cannot carry paths: {}", raw);
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// ============================================================================
// Client
// ============================================================================

/// HTTPS client for the login API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client. Certificates are always validated; a
    /// self-signed server is reached by trusting its root explicitly.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            .timeout(options.write_timeout + options.read_timeout);

        if let Some(ref pem) = options.extra_root_pem {
            let cert = Certificate::from_pem(pem).context("Failed to parse root certificate")?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: options.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::NetworkFailure(format!("invalid endpoint {}: {}", path, e)))
    }

    fn qr_code_url(&self, user_id: i32, code: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(QR_CODE_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::NetworkFailure("base URL cannot carry paths".to_string()))?
            .pop_if_empty()
            .push(&user_id.to_string())
            .push(code);
        Ok(url)
    }

    /// Check if response is successful, returning the body text either way.
    async fn check_response(response: reqwest::Response) -> Result<(reqwest::StatusCode, String), ApiError> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Response received");
        if status.is_success() {
            Ok((status, body))
        } else {
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, name: &str, password: &str) -> Result<LoginGrant, ApiError> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!(%url, "Sending login request");

        let response = self
            .client
            .post(url)
            .json(&LoginRequest { name, password })
            .send()
            .await?;

        let (status, body) = Self::check_response(response).await?;
        let grant: LoginGrant =
            serde_json::from_str(&body).map_err(|e| ApiError::malformed(status, e))?;
        if grant.token.is_empty() {
            return Err(ApiError::malformed(status, "login grant carries no token"));
        }
        Ok(grant)
    }

    async fn validate_token(&self, token: &str) -> Result<TokenValidation, ApiError> {
        let url = self.endpoint(VALIDATION_PATH)?;
        debug!(%url, token_len = token.len(), "Sending token validation request");

        let response = self
            .client
            .post(url)
            .json(&TokenRequest { token })
            .send()
            .await?;

        let (_, body) = Self::check_response(response).await?;
        Ok(TokenValidation::from_body(&body))
    }

    async fn resolve_code(
        &self,
        user_id: i32,
        code: &str,
        bearer_token: &str,
    ) -> Result<String, ApiError> {
        let url = self.qr_code_url(user_id, code)?;
        debug!(user_id, "Sending QR code resolution request");

        let response = self
            .client
            .get(url)
            .bearer_auth(bearer_token)
            .send()
            .await?;

        let (_, body) = Self::check_response(response).await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ClientOptions::new(base).unwrap()).unwrap()
    }

    #[test]
    fn test_normalize_base_url_adds_trailing_slash() {
        let url = normalize_base_url("https://example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/");

        let url = normalize_base_url("https://example.com/api/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/");
    }

    #[test]
    fn test_normalize_base_url_rejects_garbage() {
        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_endpoints_append_to_base_path() {
        let api = client("https://example.com/api");
        assert_eq!(
            api.endpoint(LOGIN_PATH).unwrap().as_str(),
            "https://example.com/api/login/personal"
        );
        assert_eq!(
            api.endpoint(VALIDATION_PATH).unwrap().as_str(),
            "https://example.com/api/login/token/validation"
        );
    }

    #[test]
    fn test_qr_code_url_encodes_code_segment() {
        let api = client("https://example.com/api/");
        let url = api.qr_code_url(42, "a/b c?").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/login/qrcode/42/a%2Fb%20c%3F"
        );
    }

    #[test]
    fn test_default_timeouts() {
        let options = ClientOptions::local().unwrap();
        assert_eq!(options.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(options.connect_timeout, Duration::from_secs(30));
        assert_eq!(options.read_timeout, Duration::from_secs(20));
        assert_eq!(options.write_timeout, Duration::from_secs(25));
    }
}

//! REST API client module for the Asfalis login service.
//!
//! This module provides the `AuthApi` trait and its `ApiClient`
//! implementation for credential login, token validation/refresh and
//! QR-code resolution.
//!
//! Authenticated calls carry a JWT bearer token obtained from the
//! credential login endpoint.

pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiClient, AuthApi, ClientOptions};
pub use error::ApiError;
pub use models::{LoginGrant, TokenValidation};

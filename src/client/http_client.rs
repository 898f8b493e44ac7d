//! Shared HTTP client construction policy.
//!
//! Both the Graph API client and the BibTeX fetcher build their
//! `reqwest::Client` here so timeouts, user-agent and compression stay
//! consistent across all outgoing traffic.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::user_agent;

use super::{ApiError, FailureCause};

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default whole-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connect and request timeouts applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Maximum time to establish a connection.
    pub connect: Duration,
    /// Maximum time for the whole request, body included.
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Builds the `Authorization: Bearer <token>` header map for an API key.
///
/// # Errors
///
/// Returns [`ApiError`] when the key cannot be sent as a header value.
pub fn bearer_headers(api_key: Option<&str>) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let Some(api_key) = api_key.map(str::trim).filter(|key| !key.is_empty()) else {
        return Ok(headers);
    };

    let mut value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
        ApiError::request_failed(
            "<client>",
            FailureCause::Request,
            "API key contains characters that are not valid in an HTTP header",
        )
    })?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Builds an HTTP client using shared project policy.
///
/// `client_name` is only used in error messages.
///
/// # Errors
///
/// Returns [`ApiError`] when client construction fails.
pub fn build_http_client(
    client_name: &str,
    timeouts: HttpTimeouts,
    default_headers: HeaderMap,
) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .user_agent(user_agent::default_user_agent())
        .default_headers(default_headers)
        .gzip(true)
        .build()
        .map_err(|error| {
            ApiError::request_failed(
                client_name,
                FailureCause::Request,
                format!("HTTP client construction failed: {error}"),
            )
        })
}

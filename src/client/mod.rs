//! Transport layer for the OpenAIRE Graph API.
//!
//! This module provides:
//! - [`Transport`] - the seam the query layer talks to (one async `get`)
//! - [`OpenAireClient`] - the reqwest-backed implementation
//! - [`ApiError`] - the single error kind raised by the core
//!
//! # Example
//!
//! ```no_run
//! use openaire_core::client::{OpenAireClient, QueryParams, Transport};
//!
//! # async fn example() -> Result<(), openaire_core::ApiError> {
//! let client = OpenAireClient::new(None)?;
//! let mut params = QueryParams::new();
//! params.insert("search".to_string(), "research software".to_string());
//! let envelope = client.get("researchProducts", &params).await?;
//! println!("{envelope}");
//! # Ok(())
//! # }
//! ```

mod error;
pub mod http_client;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

pub use error::{ApiError, FailureCause};
pub use http_client::{HttpTimeouts, build_http_client};

/// Default OpenAIRE Graph API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openaire.eu/graph/v1/";

/// Query-string parameters for one request, rendered in a stable order.
pub type QueryParams = BTreeMap<String, String>;

/// Issues GET requests against the API and returns the decoded JSON body.
///
/// Implementations must surface every failure as [`ApiError`] and must not
/// validate the response shape; interpreting the envelope is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs `GET <base>/<endpoint>?<params>` and returns the decoded body.
    async fn get(&self, endpoint: &str, params: &QueryParams) -> Result<Value, ApiError>;
}

/// Connection settings for [`OpenAireClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL; a trailing `/` is added when missing.
    pub base_url: String,
    /// Optional bearer token attached to every request.
    pub api_key: Option<String>,
    /// Connect and request timeouts.
    pub timeouts: HttpTimeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Sets the whole-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

/// reqwest-backed [`Transport`] for the OpenAIRE Graph API.
pub struct OpenAireClient {
    client: Client,
    base_url: Url,
    authenticated: bool,
}

impl OpenAireClient {
    /// Creates a client for the public API, optionally authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(api_key: Option<String>) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::default().with_api_key(api_key))
    }

    /// Creates a client from explicit settings (custom base URL for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the base URL does not parse, the API key is not a
    /// valid header value, or the HTTP client cannot be built.
    #[tracing::instrument(skip_all, fields(base_url = %config.base_url))]
    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&config.base_url)?;
        let headers = http_client::bearer_headers(config.api_key.as_deref())?;
        let authenticated = !headers.is_empty();
        let client = http_client::build_http_client("openaire", config.timeouts, headers)?;

        debug!(authenticated, "OpenAIRE client initialized");
        Ok(Self {
            client,
            base_url,
            authenticated,
        })
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns `true` when a bearer token is attached to requests.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Resolves `endpoint` against the base URL and appends `params`.
    ///
    /// Only relative paths below the base URL are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the endpoint is an absolute URL, climbs out of
    /// the base path, or cannot be joined to the base URL.
    pub fn endpoint_url(&self, endpoint: &str, params: &QueryParams) -> Result<Url, ApiError> {
        let relative = endpoint.trim_start_matches('/');
        if Url::parse(relative).is_ok() || relative.split(['/', '\\']).any(|seg| seg == "..") {
            return Err(self.outside_base(endpoint));
        }
        let mut url = self.base_url.join(relative).map_err(|e| {
            ApiError::request_failed(
                endpoint,
                FailureCause::Request,
                format!("cannot resolve endpoint against {}: {e}", self.base_url),
            )
        })?;
        if !url.as_str().starts_with(self.base_url.as_str()) {
            return Err(self.outside_base(endpoint));
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }

    fn outside_base(&self, endpoint: &str) -> ApiError {
        ApiError::request_failed(
            endpoint,
            FailureCause::Request,
            format!("endpoint is not below {}", self.base_url),
        )
    }
}

impl std::fmt::Debug for OpenAireClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAireClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for OpenAireClient {
    #[tracing::instrument(skip(self, params), fields(endpoint = %endpoint))]
    async fn get(&self, endpoint: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let url = self.endpoint_url(endpoint, params)?;
        debug!(url = %url, ?params, "Making GET request");

        let response = self.client.get(url).send().await.map_err(|e| {
            let err = ApiError::from_reqwest(endpoint, &e);
            error!(error = %err, "OpenAIRE request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::http_status(endpoint, status.as_u16());
            error!(status = status.as_u16(), error = %err, "OpenAIRE returned an error status");
            return Err(err);
        }

        response.json::<Value>().await.map_err(|e| {
            let err = ApiError::from_reqwest(endpoint, &e);
            error!(error = %err, "Failed to decode OpenAIRE response body");
            err
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&normalized).map_err(|e| {
        ApiError::request_failed(
            raw,
            FailureCause::Request,
            format!("invalid API base URL: {e}"),
        )
    })
}

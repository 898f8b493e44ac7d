//! Error types for OpenAIRE API requests.
//!
//! Every transport-level failure collapses into [`ApiError::RequestFailed`] so
//! callers only have to decide between retrying the whole query or giving up.
//! The [`FailureCause`] keeps enough detail for logs and user messages.

use std::fmt;

use thiserror::Error;

/// Underlying reason an API request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// DNS resolution, refused connection, TLS handshake, etc.
    Connection,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server answered with a non-success status code.
    HttpStatus(u16),
    /// Any other request-level failure (invalid URL, undecodable body, ...).
    Request,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => f.write_str("connection error"),
            Self::Timeout => f.write_str("timeout"),
            Self::HttpStatus(status) => write!(f, "HTTP {status}"),
            Self::Request => f.write_str("request error"),
        }
    }
}

/// Errors raised by the OpenAIRE client.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// A request could not be completed.
    #[error("request to '{endpoint}' failed ({cause}): {message}")]
    RequestFailed {
        /// Endpoint (or URL) the request targeted.
        endpoint: String,
        /// Classified failure reason.
        cause: FailureCause,
        /// Human-readable description of the failure.
        message: String,
    },
}

impl ApiError {
    /// Creates a `RequestFailed` error.
    #[must_use]
    pub fn request_failed(endpoint: &str, cause: FailureCause, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            endpoint: endpoint.to_string(),
            cause,
            message: message.into(),
        }
    }

    /// Creates a `RequestFailed` error for a non-success HTTP status.
    #[must_use]
    pub fn http_status(endpoint: &str, status: u16) -> Self {
        let message = match status {
            401 | 403 => "access denied; check the API key".to_string(),
            404 => "endpoint not found".to_string(),
            429 => "rate limit exceeded; try again later".to_string(),
            s if s >= 500 => "OpenAIRE API unavailable; try again later".to_string(),
            s => format!("server returned HTTP {s}"),
        };
        Self::request_failed(endpoint, FailureCause::HttpStatus(status), message)
    }

    /// Classifies a reqwest error into a `RequestFailed` error.
    #[must_use]
    pub fn from_reqwest(endpoint: &str, error: &reqwest::Error) -> Self {
        let cause = if error.is_timeout() {
            FailureCause::Timeout
        } else if error.is_connect() {
            FailureCause::Connection
        } else if let Some(status) = error.status() {
            FailureCause::HttpStatus(status.as_u16())
        } else {
            FailureCause::Request
        };
        Self::request_failed(endpoint, cause, error.to_string())
    }

    /// Returns the classified failure reason.
    #[must_use]
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::RequestFailed { cause, .. } => *cause,
        }
    }

    /// Returns the endpoint the failed request targeted.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::RequestFailed { endpoint, .. } => endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_message_contains_endpoint_and_cause() {
        let err = ApiError::request_failed("researchProducts", FailureCause::Timeout, "took too long");
        let msg = err.to_string();
        assert!(msg.contains("researchProducts"), "should contain endpoint: {msg}");
        assert!(msg.contains("timeout"), "should contain cause: {msg}");
        assert!(msg.contains("took too long"), "should contain message: {msg}");
    }

    #[test]
    fn test_http_status_classification() {
        assert_eq!(
            ApiError::http_status("projects", 503).cause(),
            FailureCause::HttpStatus(503)
        );
        assert!(ApiError::http_status("projects", 503).to_string().contains("unavailable"));
        assert!(ApiError::http_status("projects", 429).to_string().contains("rate limit"));
        assert!(ApiError::http_status("projects", 401).to_string().contains("API key"));
        assert!(ApiError::http_status("projects", 418).to_string().contains("HTTP 418"));
    }

    #[test]
    fn test_failure_cause_display() {
        assert_eq!(FailureCause::Connection.to_string(), "connection error");
        assert_eq!(FailureCause::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(FailureCause::Request.to_string(), "request error");
    }

    #[test]
    fn test_api_error_clone_and_endpoint() {
        let err = ApiError::http_status("organizations", 500);
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
        assert_eq!(cloned.endpoint(), "organizations");
    }
}

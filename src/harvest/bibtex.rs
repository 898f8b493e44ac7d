//! BibTeX retrieval through DOI content negotiation.
//!
//! [`BibtexClient`] asks the DOI resolver for `application/x-bibtex` and
//! keeps responses that look like BibTeX entries. Batch fetching is strictly
//! sequential with a fixed pause between requests.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap};
use tracing::{debug, info, warn};

use crate::client::ApiError;
use crate::client::http_client::{DEFAULT_CONNECT_TIMEOUT_SECS, HttpTimeouts, build_http_client};

use super::HarvestError;
use super::doi::{DOI_RESOLVER, doi_url};

/// Media type requested from the resolver.
pub const BIBTEX_MEDIA_TYPE: &str = "application/x-bibtex";
/// Per-request timeout for resolver calls.
pub const BIBTEX_TIMEOUT_SECS: u64 = 10;
/// Pause between consecutive resolver calls.
pub const DEFAULT_BIBTEX_DELAY: Duration = Duration::from_millis(500);

/// Fetches BibTeX entries for DOIs and URLs.
pub struct BibtexClient {
    client: Client,
    resolver: String,
    delay: Duration,
}

impl BibtexClient {
    /// Client for `https://doi.org/` with the default pause.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, HarvestError> {
        let timeouts = HttpTimeouts {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request: Duration::from_secs(BIBTEX_TIMEOUT_SECS),
        };
        let client = build_http_client("bibtex", timeouts, HeaderMap::new())?;
        Ok(Self {
            client,
            resolver: DOI_RESOLVER.to_string(),
            delay: DEFAULT_BIBTEX_DELAY,
        })
    }

    /// Joins bare DOIs onto `resolver` instead of `https://doi.org/`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.resolver = resolver.into();
        self
    }

    /// Sets the pause between consecutive requests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn resolver(&self) -> &str {
        &self.resolver
    }

    /// Fetches one entry for a DOI (bare, `doi:` or resolver URL) or URL.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Api`] for transport or status failures and
    /// [`HarvestError::UnexpectedBibtex`] when the body is not BibTeX.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, candidate: &str) -> Result<String, HarvestError> {
        let url = doi_url(candidate, &self.resolver);
        debug!(url = %url, "Fetching BibTeX");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, BIBTEX_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(&url, status.as_u16()).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&url, &e))?;
        let entry = body.trim();
        if !entry.starts_with('@') {
            return Err(HarvestError::UnexpectedBibtex { url });
        }
        Ok(entry.to_string())
    }

    /// Fetches entries for every candidate in order.
    ///
    /// Failures are logged and counted; `on_entry` is called after each
    /// attempt with the candidate and its outcome.
    pub async fn fetch_library<F>(&self, candidates: &[String], mut on_entry: F) -> BibtexLibrary
    where
        F: FnMut(&str, Result<&str, &HarvestError>),
    {
        let mut library = BibtexLibrary::default();
        for (index, candidate) in candidates.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            library.attempted += 1;
            match self.fetch(candidate).await {
                Ok(entry) => {
                    on_entry(candidate, Ok(entry.as_str()));
                    library.entries.push(entry);
                }
                Err(error) => {
                    warn!(candidate = %candidate, error = %error, "Failed to get BibTeX");
                    on_entry(candidate, Err(&error));
                    library.failed += 1;
                }
            }
        }
        info!(
            fetched = library.entries.len(),
            attempted = library.attempted,
            "BibTeX fetching complete"
        );
        library
    }
}

impl std::fmt::Debug for BibtexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BibtexClient")
            .field("resolver", &self.resolver)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// Entries gathered by [`BibtexClient::fetch_library`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibtexLibrary {
    entries: Vec<String>,
    attempted: usize,
    failed: usize,
}

impl BibtexLibrary {
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries separated by a blank line.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries.join("\n\n")
    }

    /// Writes [`render`](Self::render) to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Io`] when the file cannot be written.
    pub async fn write_to(&self, path: &Path) -> Result<(), HarvestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HarvestError::io(parent, e))?;
        }
        tokio::fs::write(path, self.render())
            .await
            .map_err(|e| HarvestError::io(path, e))
    }
}

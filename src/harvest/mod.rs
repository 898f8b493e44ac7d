//! Harvesting research products to disk and turning them into BibTeX.
//!
//! This module provides:
//! - [`HarvestRequest`] - the research-product query a harvest runs
//! - [`KeywordFilter`] - optional post-filter on titles and descriptions
//! - [`harvest_to_file`] - page through a query and persist the records
//! - [`bibtex`] - DOI content negotiation for harvested records

pub mod bibtex;
pub mod doi;

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::ApiError;
use crate::openaire::OpenAire;
use crate::query::{AccessRight, QueryBuilder, Record, ResearchProductType, ResearchProductsQuery};

/// Directory harvests are written to when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "openaire-data-harvested";

/// Errors raised while harvesting or exporting records.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A harvest file could not be encoded or decoded.
    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A harvest file did not hold a JSON array of records.
    #[error("'{path}' does not contain a JSON array of records")]
    NotAnArray { path: PathBuf },

    /// An API or resolver request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The resolver answered, but not with a BibTeX entry.
    #[error("unexpected response format for '{url}' (not a BibTeX entry)")]
    UnexpectedBibtex { url: String },
}

impl HarvestError {
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Parameters of a research-product harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    /// Full-text search terms.
    pub query: String,
    /// Restrict to one product type.
    pub product_type: Option<ResearchProductType>,
    /// Restrict to one best access right.
    pub access_right: Option<AccessRight>,
    /// Page size; `None` keeps the builder default of 10.
    pub page_size: Option<u32>,
}

impl HarvestRequest {
    /// Harvest of open-access publications matching `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            product_type: Some(ResearchProductType::Publication),
            access_right: Some(AccessRight::Open),
            page_size: None,
        }
    }

    /// Builds the query, newest publications first.
    #[must_use]
    pub fn to_query(&self, openaire: &OpenAire) -> ResearchProductsQuery {
        let mut query = openaire.research_products().search(self.query.as_str());
        if let Some(product_type) = self.product_type {
            query = query.product_type(product_type);
        }
        if let Some(access_right) = self.access_right {
            query = query.best_open_access_right(access_right);
        }
        if let Some(page_size) = self.page_size {
            query = query.size(page_size);
        }
        query.sort_by_publication_date(false)
    }

    /// File name for this harvest; see [`harvest_file_name`].
    #[must_use]
    pub fn file_name(&self) -> String {
        harvest_file_name(&self.query)
    }
}

/// Case-insensitive keyword match on `mainTitle` and `descriptions`.
///
/// A record passes when any keyword occurs in any of those fields. An empty
/// filter passes every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Blank keywords are dropped.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        searchable_text(record).any(|text| {
            let text = text.to_lowercase();
            self.keywords.iter().any(|keyword| text.contains(keyword))
        })
    }
}

fn searchable_text(record: &Value) -> impl Iterator<Item = &str> {
    let title = record.get("mainTitle").and_then(Value::as_str);
    let descriptions: Vec<&str> = match record.get("descriptions") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(text)) => vec![text.as_str()],
        _ => Vec::new(),
    };
    title.into_iter().chain(descriptions)
}

/// File name for a harvest of `query`: whitespace and path separators
/// become `_`, plus a `.json` extension.
#[must_use]
pub fn harvest_file_name(query: &str) -> String {
    let stem: String = query
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();
    let stem = if stem.is_empty() { "harvest" } else { &stem };
    format!("{stem}.json")
}

/// Writes `records` as a pretty-printed JSON array, creating parent directories.
///
/// # Errors
///
/// Returns [`HarvestError`] when encoding or any filesystem step fails.
pub async fn write_records_json(path: &Path, records: &[Record]) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| HarvestError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(records).map_err(|e| HarvestError::json(path, e))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| HarvestError::io(path, e))?;
    debug!(path = %path.display(), records = records.len(), "wrote harvest file");
    Ok(())
}

/// Reads a harvest file written by [`write_records_json`].
///
/// # Errors
///
/// Returns [`HarvestError`] when the file is unreadable or not a JSON array.
pub async fn read_records_json(path: &Path) -> Result<Vec<Record>, HarvestError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| HarvestError::io(path, e))?;
    match serde_json::from_str::<Value>(&contents).map_err(|e| HarvestError::json(path, e))? {
        Value::Array(records) => Ok(records),
        _ => Err(HarvestError::NotAnArray {
            path: path.to_path_buf(),
        }),
    }
}

/// Outcome of [`harvest_to_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Records returned by the API.
    pub fetched: usize,
    /// Records that passed the keyword filter and were written.
    pub kept: usize,
    /// Pages requested.
    pub pages: usize,
    /// Output file.
    pub path: PathBuf,
}

/// Pages through `query`, keeps records passing `filter`, and writes them to `path`.
///
/// Nothing is written when a page request fails.
///
/// # Errors
///
/// Returns [`HarvestError`] on the first failed request or on a write failure.
#[tracing::instrument(skip(query, filter), fields(path = %path.display()))]
pub async fn harvest_to_file(
    query: impl Into<QueryBuilder>,
    filter: &KeywordFilter,
    path: &Path,
) -> Result<HarvestSummary, HarvestError> {
    let mut pages = query.into().cursor_iterator();
    let mut fetched = 0;
    let mut kept = Vec::new();

    while let Some(page) = pages.next_page().await? {
        fetched += page.len();
        if let Some(total) = page.total() {
            info!(fetched, total, "harvest progress");
        }
        kept.extend(page.into_items().into_iter().filter(|r| filter.matches(r)));
    }

    write_records_json(path, &kept).await?;
    info!(fetched, kept = kept.len(), "harvest complete");
    Ok(HarvestSummary {
        fetched,
        kept: kept.len(),
        pages: pages.pages_emitted(),
        path: path.to_path_buf(),
    })
}

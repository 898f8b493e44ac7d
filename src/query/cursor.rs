//! Cursor-based pagination over an OpenAIRE collection.
//!
//! The API answers every request with a `results` array and a `header`
//! object; `header.nextCursor` is the token for the following page. The
//! iterator walks that chain one request at a time:
//!
//! ```text
//! Init (cursor = "*") --page with nextCursor--> Active (cursor = token)
//!   |                                              |
//!   +--- empty results / bad header / no nextCursor ---> Done
//! ```
//!
//! A malformed envelope ends iteration quietly; only transport failures are
//! errors.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::Stream;
use futures_util::stream;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::{ApiError, QueryParams, Transport};

/// Cursor value requesting the first page.
pub const INITIAL_CURSOR: &str = "*";
/// Query parameter carrying the cursor.
pub const CURSOR_PARAM: &str = "cursor";

const RESULTS_KEY: &str = "results";
const HEADER_KEY: &str = "header";
const NEXT_CURSOR_KEY: &str = "nextCursor";
const PREVIOUS_CURSOR_KEY: &str = "previousCursor";
const NUM_FOUND_KEY: &str = "numFound";

/// A raw record as returned by the server.
pub type Record = Value;

/// One batch of records plus the pagination metadata that came with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    items: Vec<Record>,
    next_cursor: Option<String>,
    previous_cursor: Option<String>,
    total: Option<u64>,
}

impl Page {
    /// Records in server order.
    #[must_use]
    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// Consumes the page and returns its records.
    #[must_use]
    pub fn into_items(self) -> Vec<Record> {
        self.items
    }

    /// Cursor for the following page; `None` on the last page.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// Cursor of the previous page, if the server reported one.
    #[must_use]
    pub fn previous_cursor(&self) -> Option<&str> {
        self.previous_cursor.as_deref()
    }

    /// Total matching records as reported on this page (`header.numFound`).
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Returns `true` when no further page follows.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    /// Number of records on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the page carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Observable position of a [`CursorIterator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No page fetched yet; the next request uses [`INITIAL_CURSOR`].
    Init,
    /// At least one page fetched and a next cursor is known.
    Active,
    /// Terminal; no further requests will be issued.
    Done,
}

/// Lazily fetches pages by following server-issued cursors.
///
/// Pages are fetched strictly one after another. The iterator owns its
/// cursor state and is meant for a single consumer; to start over, build a
/// new iterator from the query.
pub struct CursorIterator {
    transport: Arc<dyn Transport>,
    endpoint: String,
    params: QueryParams,
    cursor: String,
    exhausted: bool,
    used_cursors: HashSet<String>,
    pages_emitted: usize,
    max_pages: Option<usize>,
}

impl CursorIterator {
    /// Creates an iterator over `endpoint` using `params` for every request.
    ///
    /// The iterator adds the `cursor` parameter itself; any `cursor` entry in
    /// `params` is overwritten on each request.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>, params: QueryParams) -> Self {
        let endpoint = endpoint.into();
        info!(endpoint = %endpoint, ?params, "Cursor iterator initialized");
        Self {
            transport,
            endpoint,
            params,
            cursor: INITIAL_CURSOR.to_string(),
            exhausted: false,
            used_cursors: HashSet::new(),
            pages_emitted: 0,
            max_pages: None,
        }
    }

    /// Stops after `max_pages` pages even if the server keeps issuing cursors.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Current state of the pagination state machine.
    #[must_use]
    pub fn state(&self) -> CursorState {
        if self.exhausted {
            CursorState::Done
        } else if self.pages_emitted == 0 {
            CursorState::Init
        } else {
            CursorState::Active
        }
    }

    /// Cursor the next request would use.
    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Returns `true` once the iterator is terminal.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of pages produced so far.
    #[must_use]
    pub fn pages_emitted(&self) -> usize {
        self.pages_emitted
    }

    /// Base parameters sent with every request (without the cursor).
    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` at end of results. Once that happens every later
    /// call returns `Ok(None)` without issuing a request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails. The iterator is terminal
    /// afterwards; re-run the query to retry.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint, cursor = %self.cursor))]
    pub async fn next_page(&mut self) -> Result<Option<Page>, ApiError> {
        if self.exhausted {
            info!("Cursor iterator exhausted");
            return Ok(None);
        }
        if let Some(max_pages) = self.max_pages
            && self.pages_emitted >= max_pages
        {
            warn!(max_pages, "Reached page cap; stopping pagination");
            self.exhausted = true;
            return Ok(None);
        }

        let mut params = self.params.clone();
        params.insert(CURSOR_PARAM.to_string(), self.cursor.clone());
        self.used_cursors.insert(self.cursor.clone());
        info!("Fetching next page");

        let body = match self.transport.get(&self.endpoint, &params).await {
            Ok(body) => body,
            Err(err) => {
                self.exhausted = true;
                return Err(err);
            }
        };

        let Value::Object(mut envelope) = body else {
            warn!("Response body is not a JSON object; treating as end of results");
            self.exhausted = true;
            return Ok(None);
        };

        let items = match envelope.remove(RESULTS_KEY) {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => {
                info!("No items found in the current page");
                if self.pages_emitted == 0 {
                    info!("No results found for the initial query");
                }
                self.exhausted = true;
                return Ok(None);
            }
        };
        debug!(items = items.len(), "Items extracted from results");

        let Some(Value::Object(header)) = envelope.remove(HEADER_KEY) else {
            warn!("Response is missing a 'header' object; treating as end of results");
            self.exhausted = true;
            return Ok(None);
        };
        debug!(?header, "Extracting pagination metadata from header");

        let next_cursor = non_empty_str(&header, NEXT_CURSOR_KEY);
        let previous_cursor = non_empty_str(&header, PREVIOUS_CURSOR_KEY);
        let total = header.get(NUM_FOUND_KEY).and_then(Value::as_u64);

        match next_cursor {
            Some(next) if self.used_cursors.contains(&next) => {
                warn!(next_cursor = %next, "Server repeated an already used cursor; stopping pagination");
                self.exhausted = true;
            }
            Some(next) => {
                info!(next_cursor = %next, "Received nextCursor");
                self.cursor = next;
            }
            None => {
                info!("No nextCursor in header; marking iterator as exhausted");
                self.exhausted = true;
            }
        }

        self.pages_emitted += 1;
        debug!(total = ?total, pages = self.pages_emitted, "Page emitted");
        Ok(Some(Page {
            items,
            next_cursor: (!self.exhausted).then(|| self.cursor.clone()),
            previous_cursor,
            total,
        }))
    }

    /// Drains the remaining pages into `records`.
    ///
    /// Records from pages fetched before a failure stay in `records`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] from the first failing request.
    pub async fn collect_into(&mut self, records: &mut Vec<Record>) -> Result<usize, ApiError> {
        let mut added = 0;
        while let Some(page) = self.next_page().await? {
            added += page.len();
            records.extend(page.into_items());
        }
        info!(records = added, pages = self.pages_emitted, "Pagination complete");
        Ok(added)
    }

    /// Drains every page and returns all records in page order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] from the first failing request.
    pub async fn collect_all(mut self) -> Result<Vec<Record>, ApiError> {
        let mut records = Vec::new();
        self.collect_into(&mut records).await?;
        Ok(records)
    }

    /// Converts the iterator into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page, ApiError>> + Send {
        stream::try_unfold(self, |mut iterator| async move {
            let page = iterator.next_page().await?;
            Ok::<_, ApiError>(page.map(|page| (page, iterator)))
        })
    }
}

impl std::fmt::Debug for CursorIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorIterator")
            .field("endpoint", &self.endpoint)
            .field("params", &self.params)
            .field("cursor", &self.cursor)
            .field("exhausted", &self.exhausted)
            .field("pages_emitted", &self.pages_emitted)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

fn non_empty_str(header: &Map<String, Value>, key: &str) -> Option<String> {
    header
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

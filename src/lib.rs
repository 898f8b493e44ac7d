//! OpenAIRE Graph API client library
//!
//! Builds filtered, sorted queries against the OpenAIRE Graph API
//! (research products, organizations, data sources, projects), follows the
//! API's cursor pagination, and harvests results to disk.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`client`] - HTTP transport, connection settings, and [`ApiError`]
//! - [`query`] - query builders, entity vocabulary, and the cursor iterator
//! - [`openaire`] - the [`OpenAire`] entry point handing out query builders
//! - [`harvest`] - harvest-to-file, keyword filtering, and BibTeX export

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod harvest;
pub mod openaire;
pub mod query;

#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use client::{
    ApiError, ClientConfig, DEFAULT_BASE_URL, FailureCause, OpenAireClient, QueryParams, Transport,
};
pub use harvest::{HarvestError, HarvestRequest, HarvestSummary, KeywordFilter, harvest_to_file};
pub use openaire::OpenAire;
pub use query::{
    AccessRight, CursorIterator, CursorState, EntityType, FilterValue, ImpactClass,
    OpenAccessColor, Page, Query, QueryBuilder, Record, ResearchProductType, SortDirection,
};

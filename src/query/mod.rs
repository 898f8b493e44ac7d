//! Query building and cursor pagination.
//!
//! This module provides:
//! - [`QueryBuilder`] - untyped filter/sort/size accumulation and parameter rendering
//! - [`Query`] - the same builder tagged with an entity collection and its vocabulary
//! - [`CursorIterator`] - the cursor-following page producer
//! - [`Page`] - one batch of records plus pagination metadata
//!
//! # Example
//!
//! ```no_run
//! use openaire_core::{AccessRight, OpenAire, ResearchProductType};
//!
//! # async fn example() -> Result<(), openaire_core::ApiError> {
//! let openaire = OpenAire::new(None)?;
//! let records = openaire
//!     .research_products()
//!     .search("research software metadata")
//!     .product_type(ResearchProductType::Publication)
//!     .best_open_access_right(AccessRight::Open)
//!     .sort_by_publication_date(false)
//!     .all()
//!     .await?;
//! println!("fetched {} records", records.len());
//! # Ok(())
//! # }
//! ```

mod builder;
mod cursor;
mod entities;

pub use builder::{
    DEFAULT_PAGE_SIZE, FilterValue, MAX_PAGE_SIZE, PAGE_SIZE_PARAM, QueryBuilder, SORT_BY_PARAM,
    SortCriterion, SortDirection,
};
pub use cursor::{CURSOR_PARAM, CursorIterator, CursorState, INITIAL_CURSOR, Page, Record};
pub use entities::{
    AccessRight, DataSources, DataSourcesQuery, Entity, EntityType, ImpactClass,
    OpenAccessColor, Organizations, OrganizationsQuery, Projects, ProjectsQuery, Query,
    ResearchProductType, ResearchProducts, ResearchProductsQuery,
};

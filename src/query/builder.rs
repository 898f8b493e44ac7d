//! Untyped query builder shared by every entity collection.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{ApiError, QueryParams, Transport};

use super::cursor::{CursorIterator, Record};

/// Page size used until a valid `size()` call overrides it.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size the API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Query parameter carrying the page size.
pub const PAGE_SIZE_PARAM: &str = "pageSize";
/// Query parameter carrying the rendered sort criteria.
pub const SORT_BY_PARAM: &str = "sortBy";

/// Value of a single filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Sent verbatim.
    Text(String),
    /// OR-list, sent comma-joined.
    List(Vec<String>),
    /// Sent as lowercase `true` / `false`.
    Bool(bool),
}

impl FilterValue {
    /// Renders the value as it appears in the query string.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(values) => values.join(","),
            Self::Bool(flag) => flag.to_string(),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for FilterValue {
    fn from(values: &[&str]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl From<&[String]> for FilterValue {
    fn from(values: &[String]) -> Self {
        Self::List(values.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for FilterValue {
    fn from(values: [&str; N]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_string()).collect())
    }
}

/// Sort order of one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Maps the `ascending` flag used by the fluent API.
    #[must_use]
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    /// Returns the wire token (`ASC` / `DESC`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// One `(field, direction)` sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    field: String,
    direction: SortDirection,
}

impl SortCriterion {
    /// Creates a sort criterion.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Sort field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Sort direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Renders `"<field> ASC"` or `"<field> DESC"`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{} {}", self.field, self.direction.as_str())
    }
}

/// Accumulates filters, sort criteria and page size for one collection and
/// turns them into request parameters.
///
/// Setters consume and return the builder so calls chain:
///
/// ```
/// use std::sync::Arc;
/// use openaire_core::{OpenAireClient, QueryBuilder};
///
/// let client = Arc::new(OpenAireClient::new(None).unwrap());
/// let params = QueryBuilder::new(client, "researchProducts")
///     .filter("type", ["publication", "dataset"])
///     .sort("publicationDate", false)
///     .size(50)
///     .build_params();
///
/// assert_eq!(params["type"], "publication,dataset");
/// assert_eq!(params["sortBy"], "publicationDate DESC");
/// assert_eq!(params["pageSize"], "50");
/// ```
///
/// Field names are not validated; unknown fields are sent verbatim.
#[derive(Clone)]
pub struct QueryBuilder {
    transport: Arc<dyn Transport>,
    entity_type: String,
    filters: BTreeMap<String, FilterValue>,
    sort_criteria: Vec<SortCriterion>,
    page_size: u32,
}

impl QueryBuilder {
    /// Creates an empty query against `entity_type` (the endpoint name).
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, entity_type: impl Into<String>) -> Self {
        Self {
            transport,
            entity_type: entity_type.into(),
            filters: BTreeMap::new(),
            sort_criteria: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets a filter, replacing any earlier value for the same field.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Appends a sort criterion. Repeated calls compose in call order.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.sort_criteria.push(SortCriterion::new(
            field,
            SortDirection::from_ascending(ascending),
        ));
        self
    }

    /// Removes every sort criterion.
    #[must_use]
    pub fn clear_sort(mut self) -> Self {
        self.sort_criteria.clear();
        self
    }

    /// Sets the page size (1-100).
    ///
    /// Out-of-range values are not an error: a warning is logged and the page
    /// size falls back to [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        if (1..=MAX_PAGE_SIZE).contains(&size) {
            self.page_size = size;
        } else {
            warn!(
                requested = size,
                default = DEFAULT_PAGE_SIZE,
                "Page size must be between 1 and 100. Using default."
            );
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self
    }

    /// Target collection (endpoint name).
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Current filters keyed by field.
    #[must_use]
    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    /// Current sort criteria in insertion order.
    #[must_use]
    pub fn sort_criteria(&self) -> &[SortCriterion] {
        &self.sort_criteria
    }

    /// Current page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Renders the request parameters for the current state.
    ///
    /// Always contains `pageSize`, one entry per filter, and `sortBy` only when
    /// at least one sort criterion was added.
    #[must_use]
    pub fn build_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert(PAGE_SIZE_PARAM.to_string(), self.page_size.to_string());

        for (field, value) in &self.filters {
            params.insert(field.clone(), value.render());
        }

        if !self.sort_criteria.is_empty() {
            let sort_by = self
                .sort_criteria
                .iter()
                .map(SortCriterion::render)
                .collect::<Vec<_>>()
                .join(",");
            params.insert(SORT_BY_PARAM.to_string(), sort_by);
        }

        params
    }

    /// Sends one non-paginated request and returns the raw envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    pub async fn execute(&self) -> Result<Value, ApiError> {
        let params = self.build_params();
        debug!(entity = %self.entity_type, ?params, "Executing single-page query");
        self.transport.get(&self.entity_type, &params).await
    }

    /// Creates a cursor iterator seeded with the current parameters.
    #[must_use]
    pub fn cursor_iterator(&self) -> CursorIterator {
        CursorIterator::new(
            Arc::clone(&self.transport),
            self.entity_type.clone(),
            self.build_params(),
        )
    }

    /// Fetches every page and returns all records in page order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] as soon as any page request fails.
    pub async fn all(&self) -> Result<Vec<Record>, ApiError> {
        self.cursor_iterator().collect_all().await
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("entity_type", &self.entity_type)
            .field("filters", &self.filters)
            .field("sort_criteria", &self.sort_criteria)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(Arc::new(ScriptedTransport::default()), "researchProducts")
    }

    #[test]
    fn test_filter_value_rendering() {
        assert_eq!(FilterValue::from("OPEN").render(), "OPEN");
        assert_eq!(FilterValue::from(true).render(), "true");
        assert_eq!(FilterValue::from(false).render(), "false");
        assert_eq!(FilterValue::from(vec!["a", "b"]).render(), "a,b");
        assert_eq!(FilterValue::from(Vec::<String>::new()).render(), "");
    }

    #[test]
    fn test_default_params_only_page_size() {
        let params = builder().build_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[PAGE_SIZE_PARAM], "10");
        assert!(!params.contains_key(SORT_BY_PARAM));
    }

    #[test]
    fn test_build_params_is_pure() {
        let query = builder()
            .filter("search", "metadata")
            .filter("subjects", ["a", "b"])
            .sort("publicationDate", false);
        assert_eq!(query.build_params(), query.build_params());
    }

    #[test]
    fn test_list_filter_joined_with_comma() {
        let params = builder().filter("subjects", ["a", "b"]).build_params();
        assert_eq!(params["subjects"], "a,b");
    }

    #[test]
    fn test_bool_filter_lowercase() {
        let params = builder()
            .filter("isPeerReviewed", true)
            .filter("isGreen", false)
            .build_params();
        assert_eq!(params["isPeerReviewed"], "true");
        assert_eq!(params["isGreen"], "false");
    }

    #[test]
    fn test_sort_calls_compose_in_order() {
        let params = builder().sort("x", true).sort("y", false).build_params();
        assert_eq!(params[SORT_BY_PARAM], "x ASC,y DESC");
    }

    #[test]
    fn test_filter_overwrites_same_field() {
        let params = builder()
            .filter("type", "publication")
            .filter("type", "dataset")
            .build_params();
        assert_eq!(params["type"], "dataset");
    }

    #[test]
    fn test_size_out_of_range_resets_to_default() {
        assert_eq!(builder().size(0).page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(builder().size(101).page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(builder().size(50).size(101).page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_size_bounds_accepted() {
        assert_eq!(builder().size(1).page_size(), 1);
        assert_eq!(builder().size(100).page_size(), 100);
        assert_eq!(builder().size(100).build_params()[PAGE_SIZE_PARAM], "100");
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let params = builder().filter("someFutureField", "x").build_params();
        assert_eq!(params["someFutureField"], "x");
    }

    #[test]
    fn test_clear_sort_removes_sort_by() {
        let params = builder().sort("x", true).clear_sort().build_params();
        assert!(!params.contains_key(SORT_BY_PARAM));
    }

    #[tokio::test]
    async fn test_execute_sends_built_params_without_cursor() {
        let transport = Arc::new(ScriptedTransport::with_bodies([json!({"results": [1]})]));
        let query = QueryBuilder::new(transport.clone(), "projects").filter("acronym", "ABC");

        let body = query.execute().await.unwrap();
        assert_eq!(body["results"], json!([1]));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].endpoint, "projects");
        assert_eq!(requests[0].params, query.build_params());
        assert!(!requests[0].params.contains_key("cursor"));
    }
}

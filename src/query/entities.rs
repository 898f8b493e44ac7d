//! Entity collections and their filter/sort vocabulary.
//!
//! [`Query<E>`] wraps a [`QueryBuilder`] and adds named methods for the
//! fields the Graph API documents for collection `E`. Every named method is a
//! thin wrapper over [`Query::filter`] or [`Query::sort`].

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::client::{ApiError, QueryParams, Transport};

use super::builder::{FilterValue, QueryBuilder};
use super::cursor::{CursorIterator, Record};

/// The four queryable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    ResearchProducts,
    Organizations,
    DataSources,
    Projects,
}

impl EntityType {
    /// All collections in documentation order.
    pub const ALL: [Self; 4] = [
        Self::ResearchProducts,
        Self::Organizations,
        Self::DataSources,
        Self::Projects,
    ];

    /// Endpoint name of the collection.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResearchProducts => "researchProducts",
            Self::Organizations => "organizations",
            Self::DataSources => "dataSources",
            Self::Projects => "projects",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|entity| entity.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown entity type '{s}' (expected one of: researchProducts, organizations, dataSources, projects)"
                )
            })
    }
}

/// Marker trait tying a type to its collection.
pub trait Entity {
    /// Collection queried by `Query<Self>`.
    const ENTITY_TYPE: EntityType;
}

/// Research products (publications, datasets, software, other).
#[derive(Debug, Clone, Copy)]
pub struct ResearchProducts;

/// Organizations.
#[derive(Debug, Clone, Copy)]
pub struct Organizations;

/// Data sources.
#[derive(Debug, Clone, Copy)]
pub struct DataSources;

/// Projects.
#[derive(Debug, Clone, Copy)]
pub struct Projects;

impl Entity for ResearchProducts {
    const ENTITY_TYPE: EntityType = EntityType::ResearchProducts;
}

impl Entity for Organizations {
    const ENTITY_TYPE: EntityType = EntityType::Organizations;
}

impl Entity for DataSources {
    const ENTITY_TYPE: EntityType = EntityType::DataSources;
}

impl Entity for Projects {
    const ENTITY_TYPE: EntityType = EntityType::Projects;
}

/// Query builder for research products.
pub type ResearchProductsQuery = Query<ResearchProducts>;
/// Query builder for organizations.
pub type OrganizationsQuery = Query<Organizations>;
/// Query builder for data sources.
pub type DataSourcesQuery = Query<DataSources>;
/// Query builder for projects.
pub type ProjectsQuery = Query<Projects>;

/// Research product type (`type` filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchProductType {
    Publication,
    Dataset,
    Software,
    Other,
}

impl ResearchProductType {
    /// Wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publication => "publication",
            Self::Dataset => "dataset",
            Self::Software => "software",
            Self::Other => "other",
        }
    }
}

/// Best open access right label (`bestOpenAccessRightLabel` filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRight {
    OpenSource,
    Open,
    Embargo,
    Restricted,
    Closed,
    Unknown,
}

impl AccessRight {
    /// Wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenSource => "OPEN SOURCE",
            Self::Open => "OPEN",
            Self::Embargo => "EMBARGO",
            Self::Restricted => "RESTRICTED",
            Self::Closed => "CLOSED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Citation-based impact class, C1 (top 0.01%) to C5 (the rest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactClass {
    C1,
    C2,
    C3,
    C4,
    C5,
}

impl ImpactClass {
    /// Wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::C3 => "C3",
            Self::C4 => "C4",
            Self::C5 => "C5",
        }
    }
}

/// Open access color of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAccessColor {
    Bronze,
    Gold,
    Hybrid,
}

impl OpenAccessColor {
    /// Wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Gold => "gold",
            Self::Hybrid => "hybrid",
        }
    }
}

impl From<ResearchProductType> for FilterValue {
    fn from(value: ResearchProductType) -> Self {
        Self::from(value.as_str())
    }
}

impl From<AccessRight> for FilterValue {
    fn from(value: AccessRight) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ImpactClass> for FilterValue {
    fn from(value: ImpactClass) -> Self {
        Self::from(value.as_str())
    }
}

impl From<OpenAccessColor> for FilterValue {
    fn from(value: OpenAccessColor) -> Self {
        Self::from(value.as_str())
    }
}

/// A [`QueryBuilder`] bound to collection `E`.
pub struct Query<E> {
    builder: QueryBuilder,
    entity: PhantomData<E>,
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("entity", &E::ENTITY_TYPE)
            .field("builder", &self.builder)
            .finish()
    }
}

impl<E: Entity> Query<E> {
    /// Creates an empty query against `E`'s collection.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            builder: QueryBuilder::new(transport, E::ENTITY_TYPE.as_str()),
            entity: PhantomData,
        }
    }

    fn map(self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        Self {
            builder: f(self.builder),
            entity: PhantomData,
        }
    }

    /// Sets a filter; see [`QueryBuilder::filter`].
    #[must_use]
    pub fn filter(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.map(|builder| builder.filter(field, value))
    }

    /// Appends a sort criterion; see [`QueryBuilder::sort`].
    #[must_use]
    pub fn sort(self, field: impl Into<String>, ascending: bool) -> Self {
        self.map(|builder| builder.sort(field, ascending))
    }

    /// Sets the page size; see [`QueryBuilder::size`].
    #[must_use]
    pub fn size(self, size: u32) -> Self {
        self.map(|builder| builder.size(size))
    }

    /// The underlying untyped builder.
    #[must_use]
    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Drops the entity tag.
    #[must_use]
    pub fn into_builder(self) -> QueryBuilder {
        self.builder
    }

    /// Renders the request parameters; see [`QueryBuilder::build_params`].
    #[must_use]
    pub fn build_params(&self) -> QueryParams {
        self.builder.build_params()
    }

    /// Sends one non-paginated request; see [`QueryBuilder::execute`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    pub async fn execute(&self) -> Result<Value, ApiError> {
        self.builder.execute().await
    }

    /// Creates a cursor iterator; see [`QueryBuilder::cursor_iterator`].
    #[must_use]
    pub fn cursor_iterator(&self) -> CursorIterator {
        self.builder.cursor_iterator()
    }

    /// Fetches every record; see [`QueryBuilder::all`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] as soon as any page request fails.
    pub async fn all(&self) -> Result<Vec<Record>, ApiError> {
        self.builder.all().await
    }
}

impl<E: Entity> From<Query<E>> for QueryBuilder {
    fn from(query: Query<E>) -> Self {
        query.into_builder()
    }
}

fn date_range(
    query: QueryBuilder,
    from_field: &str,
    to_field: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> QueryBuilder {
    let query = match from {
        Some(from) => query.filter(from_field, from),
        None => query,
    };
    match to {
        Some(to) => query.filter(to_field, to),
        None => query,
    }
}

// ==================== Research products ====================

impl Query<ResearchProducts> {
    /// Full-text search over the product.
    #[must_use]
    pub fn search(self, query: impl Into<String>) -> Self {
        self.filter("search", query.into())
    }

    /// Search in the main title.
    #[must_use]
    pub fn main_title(self, title: impl Into<String>) -> Self {
        self.filter("mainTitle", title.into())
    }

    /// Search in the description.
    #[must_use]
    pub fn description(self, description: impl Into<String>) -> Self {
        self.filter("description", description.into())
    }

    /// OpenAIRE id.
    #[must_use]
    pub fn id(self, openaire_id: impl Into<String>) -> Self {
        self.filter("id", openaire_id.into())
    }

    /// Persistent identifier (e.g. DOI).
    #[must_use]
    pub fn pid(self, persistent_id: impl Into<String>) -> Self {
        self.filter("pid", persistent_id.into())
    }

    /// Identifier of the record at its original source.
    #[must_use]
    pub fn original_id(self, original_id: impl Into<String>) -> Self {
        self.filter("originalId", original_id.into())
    }

    /// Product type.
    #[must_use]
    pub fn product_type(self, product_type: ResearchProductType) -> Self {
        self.filter("type", product_type)
    }

    /// Publication date range (`YYYY` or `YYYY-MM-DD`); only given bounds are set.
    #[must_use]
    pub fn publication_date_range(self, from: Option<&str>, to: Option<&str>) -> Self {
        self.map(|b| date_range(b, "fromPublicationDate", "toPublicationDate", from, to))
    }

    /// Subjects (a list is OR-combined).
    #[must_use]
    pub fn subjects(self, subjects: impl Into<FilterValue>) -> Self {
        self.filter("subjects", subjects)
    }

    /// Country code associated with the product.
    #[must_use]
    pub fn country_code(self, country_code: impl Into<String>) -> Self {
        self.filter("countryCode", country_code.into())
    }

    /// Author full name.
    #[must_use]
    pub fn author_full_name(self, name: impl Into<String>) -> Self {
        self.filter("authorFullName", name.into())
    }

    /// Author ORCiD.
    #[must_use]
    pub fn author_orcid(self, orcid: impl Into<String>) -> Self {
        self.filter("authorOrcid", orcid.into())
    }

    /// Publisher name.
    #[must_use]
    pub fn publisher(self, publisher: impl Into<String>) -> Self {
        self.filter("publisher", publisher.into())
    }

    /// Best open access right label.
    #[must_use]
    pub fn best_open_access_right(self, access_right: AccessRight) -> Self {
        self.filter("bestOpenAccessRightLabel", access_right)
    }

    /// Citation-based influence class.
    #[must_use]
    pub fn influence_class(self, class: ImpactClass) -> Self {
        self.filter("influenceClass", class)
    }

    /// Citation-based impulse class.
    #[must_use]
    pub fn impulse_class(self, class: ImpactClass) -> Self {
        self.filter("impulseClass", class)
    }

    /// Citation-based popularity class.
    #[must_use]
    pub fn popularity_class(self, class: ImpactClass) -> Self {
        self.filter("popularityClass", class)
    }

    /// Citation count class.
    #[must_use]
    pub fn citation_count_class(self, class: ImpactClass) -> Self {
        self.filter("citationCountClass", class)
    }

    /// Instance type (publications only).
    #[must_use]
    pub fn instance_type(self, instance_type: impl Into<String>) -> Self {
        self.filter("instanceType", instance_type.into())
    }

    /// Sustainable Development Goal 1-17 (publications only).
    ///
    /// Out-of-range values are ignored with a warning.
    #[must_use]
    pub fn sdg(self, sdg_number: u8) -> Self {
        if (1..=17).contains(&sdg_number) {
            self.filter("sdg", sdg_number.to_string())
        } else {
            warn!(sdg = sdg_number, "SDG number must be between 1 and 17; filter ignored");
            self
        }
    }

    /// Field of Science classification (publications only).
    #[must_use]
    pub fn fos(self, fos_id: impl Into<String>) -> Self {
        self.filter("fos", fos_id.into())
    }

    /// Peer review status (publications only).
    #[must_use]
    pub fn is_peer_reviewed(self, peer_reviewed: bool) -> Self {
        self.filter("isPeerReviewed", peer_reviewed)
    }

    /// Published in a diamond journal (publications only).
    #[must_use]
    pub fn is_in_diamond_journal(self, in_diamond: bool) -> Self {
        self.filter("isInDiamondJournal", in_diamond)
    }

    /// Publicly funded (publications only).
    #[must_use]
    pub fn is_publicly_funded(self, publicly_funded: bool) -> Self {
        self.filter("isPubliclyFunded", publicly_funded)
    }

    /// Green open access (publications only).
    #[must_use]
    pub fn is_green(self, green: bool) -> Self {
        self.filter("isGreen", green)
    }

    /// Open access color (publications only).
    #[must_use]
    pub fn open_access_color(self, color: OpenAccessColor) -> Self {
        self.filter("openAccessColor", color)
    }

    /// Connected organization id.
    #[must_use]
    pub fn related_organization_id(self, org_id: impl Into<String>) -> Self {
        self.filter("relOrganizationId", org_id.into())
    }

    /// Connected community id.
    #[must_use]
    pub fn related_community_id(self, community_id: impl Into<String>) -> Self {
        self.filter("relCommunityId", community_id.into())
    }

    /// Connected project id.
    #[must_use]
    pub fn related_project_id(self, project_id: impl Into<String>) -> Self {
        self.filter("relProjectId", project_id.into())
    }

    /// Connected project code.
    #[must_use]
    pub fn related_project_code(self, project_code: impl Into<String>) -> Self {
        self.filter("relProjectCode", project_code.into())
    }

    /// Only products connected (or not) to a project.
    #[must_use]
    pub fn has_project_relation(self, has_relation: bool) -> Self {
        self.filter("hasProjectRel", has_relation)
    }

    /// Funder short name of a connected project.
    #[must_use]
    pub fn related_project_funding_short_name(self, funder: impl Into<String>) -> Self {
        self.filter("relProjectFundingShortName", funder.into())
    }

    /// Funding stream id of a connected project.
    #[must_use]
    pub fn related_project_funding_stream_id(self, stream_id: impl Into<String>) -> Self {
        self.filter("relProjectFundingStreamId", stream_id.into())
    }

    /// Hosting data source id.
    #[must_use]
    pub fn related_hosting_data_source_id(self, datasource_id: impl Into<String>) -> Self {
        self.filter("relHostingDataSourceId", datasource_id.into())
    }

    /// Collected-from data source id.
    #[must_use]
    pub fn related_collected_from_datasource_id(self, datasource_id: impl Into<String>) -> Self {
        self.filter("relCollectedFromDatasourceId", datasource_id.into())
    }

    #[must_use]
    pub fn sort_by_relevance(self, ascending: bool) -> Self {
        self.sort("relevance", ascending)
    }

    #[must_use]
    pub fn sort_by_publication_date(self, ascending: bool) -> Self {
        self.sort("publicationDate", ascending)
    }

    #[must_use]
    pub fn sort_by_date_of_collection(self, ascending: bool) -> Self {
        self.sort("dateOfCollection", ascending)
    }

    #[must_use]
    pub fn sort_by_influence(self, ascending: bool) -> Self {
        self.sort("influence", ascending)
    }

    #[must_use]
    pub fn sort_by_popularity(self, ascending: bool) -> Self {
        self.sort("popularity", ascending)
    }

    #[must_use]
    pub fn sort_by_citation_count(self, ascending: bool) -> Self {
        self.sort("citationCount", ascending)
    }

    #[must_use]
    pub fn sort_by_impulse(self, ascending: bool) -> Self {
        self.sort("impulse", ascending)
    }
}

// ==================== Organizations ====================

impl Query<Organizations> {
    #[must_use]
    pub fn search(self, query: impl Into<String>) -> Self {
        self.filter("search", query.into())
    }

    #[must_use]
    pub fn legal_name(self, name: impl Into<String>) -> Self {
        self.filter("legalName", name.into())
    }

    #[must_use]
    pub fn legal_short_name(self, short_name: impl Into<String>) -> Self {
        self.filter("legalShortName", short_name.into())
    }

    #[must_use]
    pub fn id(self, openaire_id: impl Into<String>) -> Self {
        self.filter("id", openaire_id.into())
    }

    /// Persistent identifier (e.g. ROR).
    #[must_use]
    pub fn pid(self, persistent_id: impl Into<String>) -> Self {
        self.filter("pid", persistent_id.into())
    }

    #[must_use]
    pub fn country_code(self, country_code: impl Into<String>) -> Self {
        self.filter("countryCode", country_code.into())
    }

    #[must_use]
    pub fn related_community_id(self, community_id: impl Into<String>) -> Self {
        self.filter("relCommunityId", community_id.into())
    }

    #[must_use]
    pub fn related_collected_from_datasource_id(self, datasource_id: impl Into<String>) -> Self {
        self.filter("relCollectedFromDatasourceId", datasource_id.into())
    }

    /// Sorts by relevance, the only ordering organizations support.
    ///
    /// Replaces any sort criteria set earlier.
    #[must_use]
    pub fn sort_by_relevance(self, ascending: bool) -> Self {
        self.map(|b| b.clear_sort().sort("relevance", ascending))
    }
}

// ==================== Data sources ====================

impl Query<DataSources> {
    #[must_use]
    pub fn search(self, query: impl Into<String>) -> Self {
        self.filter("search", query.into())
    }

    #[must_use]
    pub fn official_name(self, name: impl Into<String>) -> Self {
        self.filter("officialName", name.into())
    }

    #[must_use]
    pub fn english_name(self, name: impl Into<String>) -> Self {
        self.filter("englishName", name.into())
    }

    /// Legal short name of the organization owning the data source.
    #[must_use]
    pub fn legal_short_name(self, short_name: impl Into<String>) -> Self {
        self.filter("legalShortName", short_name.into())
    }

    #[must_use]
    pub fn id(self, openaire_id: impl Into<String>) -> Self {
        self.filter("id", openaire_id.into())
    }

    #[must_use]
    pub fn pid(self, persistent_id: impl Into<String>) -> Self {
        self.filter("pid", persistent_id.into())
    }

    #[must_use]
    pub fn subjects(self, subjects: impl Into<FilterValue>) -> Self {
        self.filter("subjects", subjects)
    }

    #[must_use]
    pub fn data_source_type_name(self, type_name: impl Into<String>) -> Self {
        self.filter("dataSourceTypeName", type_name.into())
    }

    /// Content types (OpenDOAR vocabulary; a list is OR-combined).
    #[must_use]
    pub fn content_types(self, content_types: impl Into<FilterValue>) -> Self {
        self.filter("contentTypes", content_types)
    }

    #[must_use]
    pub fn related_organization_id(self, org_id: impl Into<String>) -> Self {
        self.filter("relOrganizationId", org_id.into())
    }

    #[must_use]
    pub fn related_community_id(self, community_id: impl Into<String>) -> Self {
        self.filter("relCommunityId", community_id.into())
    }

    #[must_use]
    pub fn related_collected_from_datasource_id(self, datasource_id: impl Into<String>) -> Self {
        self.filter("relCollectedFromDatasourceId", datasource_id.into())
    }

    /// Sorts by relevance, the only ordering data sources support.
    ///
    /// Replaces any sort criteria set earlier.
    #[must_use]
    pub fn sort_by_relevance(self, ascending: bool) -> Self {
        self.map(|b| b.clear_sort().sort("relevance", ascending))
    }
}

// ==================== Projects ====================

impl Query<Projects> {
    #[must_use]
    pub fn search(self, query: impl Into<String>) -> Self {
        self.filter("search", query.into())
    }

    #[must_use]
    pub fn title(self, title: impl Into<String>) -> Self {
        self.filter("title", title.into())
    }

    #[must_use]
    pub fn keywords(self, keywords: impl Into<FilterValue>) -> Self {
        self.filter("keywords", keywords)
    }

    #[must_use]
    pub fn id(self, openaire_id: impl Into<String>) -> Self {
        self.filter("id", openaire_id.into())
    }

    /// Grant agreement code.
    #[must_use]
    pub fn code(self, grant_code: impl Into<String>) -> Self {
        self.filter("code", grant_code.into())
    }

    #[must_use]
    pub fn acronym(self, acronym: impl Into<String>) -> Self {
        self.filter("acronym", acronym.into())
    }

    #[must_use]
    pub fn call_identifier(self, call_id: impl Into<String>) -> Self {
        self.filter("callIdentifier", call_id.into())
    }

    #[must_use]
    pub fn funding_short_name(self, funder_short_name: impl Into<String>) -> Self {
        self.filter("fundingShortName", funder_short_name.into())
    }

    #[must_use]
    pub fn funding_stream_id(self, stream_id: impl Into<String>) -> Self {
        self.filter("fundingStreamId", stream_id.into())
    }

    /// Start date range (`YYYY` or `YYYY-MM-DD`); only given bounds are set.
    #[must_use]
    pub fn start_date_range(self, from: Option<&str>, to: Option<&str>) -> Self {
        self.map(|b| date_range(b, "fromStartDate", "toStartDate", from, to))
    }

    /// End date range (`YYYY` or `YYYY-MM-DD`); only given bounds are set.
    #[must_use]
    pub fn end_date_range(self, from: Option<&str>, to: Option<&str>) -> Self {
        self.map(|b| date_range(b, "fromEndDate", "toEndDate", from, to))
    }

    /// Name or short name of a related organization.
    #[must_use]
    pub fn related_organization_name(self, org_name: impl Into<String>) -> Self {
        self.filter("relOrganizationName", org_name.into())
    }

    #[must_use]
    pub fn related_organization_id(self, org_id: impl Into<String>) -> Self {
        self.filter("relOrganizationId", org_id.into())
    }

    #[must_use]
    pub fn related_community_id(self, community_id: impl Into<String>) -> Self {
        self.filter("relCommunityId", community_id.into())
    }

    #[must_use]
    pub fn related_organization_country_code(self, country_code: impl Into<FilterValue>) -> Self {
        self.filter("relOrganizationCountryCode", country_code)
    }

    #[must_use]
    pub fn related_collected_from_datasource_id(self, datasource_id: impl Into<String>) -> Self {
        self.filter("relCollectedFromDatasourceId", datasource_id.into())
    }

    #[must_use]
    pub fn sort_by_relevance(self, ascending: bool) -> Self {
        self.sort("relevance", ascending)
    }

    #[must_use]
    pub fn sort_by_start_date(self, ascending: bool) -> Self {
        self.sort("startDate", ascending)
    }

    #[must_use]
    pub fn sort_by_end_date(self, ascending: bool) -> Self {
        self.sort("endDate", ascending)
    }
}

//! Entry point tying a transport to the per-collection query builders.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{ApiError, ClientConfig, OpenAireClient, QueryParams, Transport};
use crate::query::{
    DataSourcesQuery, EntityType, OrganizationsQuery, ProjectsQuery, QueryBuilder,
    ResearchProductsQuery,
};

/// Hands out query builders that share one transport.
#[derive(Clone)]
pub struct OpenAire {
    transport: Arc<dyn Transport>,
}

impl OpenAire {
    /// Connects to the public API, optionally with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the HTTP client cannot be built.
    pub fn new(api_key: Option<String>) -> Result<Self, ApiError> {
        Ok(Self::with_transport(Arc::new(OpenAireClient::new(api_key)?)))
    }

    /// Connects using explicit client settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the settings are invalid.
    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(Arc::new(OpenAireClient::with_config(
            config,
        )?)))
    }

    /// Uses a caller-provided transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    #[must_use]
    pub fn research_products(&self) -> ResearchProductsQuery {
        ResearchProductsQuery::new(Arc::clone(&self.transport))
    }

    #[must_use]
    pub fn organizations(&self) -> OrganizationsQuery {
        OrganizationsQuery::new(Arc::clone(&self.transport))
    }

    #[must_use]
    pub fn data_sources(&self) -> DataSourcesQuery {
        DataSourcesQuery::new(Arc::clone(&self.transport))
    }

    #[must_use]
    pub fn projects(&self) -> ProjectsQuery {
        ProjectsQuery::new(Arc::clone(&self.transport))
    }

    /// Untyped builder for `entity`.
    #[must_use]
    pub fn query(&self, entity: EntityType) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(&self.transport), entity.as_str())
    }

    /// Sends a raw GET to any endpoint below the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    pub async fn raw_query(&self, endpoint: &str, params: &QueryParams) -> Result<Value, ApiError> {
        self.transport.get(endpoint, params).await
    }
}

impl std::fmt::Debug for OpenAire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAire").finish_non_exhaustive()
    }
}

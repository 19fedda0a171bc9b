// src/lib.rs
pub mod analysis;
pub mod connectors;
pub mod error;
pub mod federated;
pub mod llm;
pub mod prompts;
pub mod research;
pub mod settings;
pub mod transport;
pub mod utils;

use crate::error::ConnectorError;
use crate::federated::{Source, Study};
use crate::settings::Settings;
use crate::transport::{HttpFetch, ReqwestFetcher};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

pub use crate::analysis::{interpret, AnalysisResult};
pub use crate::federated::{FederatedSearch, SourceSelection};
pub use crate::llm::{AnalysisBackend, AnalysisError};
pub use crate::research::{ResearchCollector, ResearchReport};

/// A single bibliographic provider.
///
/// Implementations translate one query into normalized [`Study`] records.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which provider this adapter talks to.
    fn source(&self) -> Source;

    /// Returns a description of the adapter.
    fn description(&self) -> &'static str;

    /// Run one upstream search. `max_results` is the page size sent upstream;
    /// `0` selects the provider default.
    async fn fetch(&self, query: &str, max_results: u32) -> Result<Vec<Study>, ConnectorError>;

    /// Like [`fetch`](Self::fetch) but never fails: errors are logged and
    /// turned into an empty list.
    async fn search(&self, query: &str, max_results: u32) -> Vec<Study> {
        match self.fetch(query, max_results).await {
            Ok(studies) => studies,
            Err(e) => {
                warn!(source = %self.source(), query, error = %e, "search failed");
                Vec::new()
            }
        }
    }
}

/// Adapters keyed by source, iterated in fan-out order.
pub struct SourceRegistry {
    adapters: BTreeMap<Source, Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry {
            adapters: BTreeMap::new(),
        }
    }

    /// Register an adapter, replacing any previous one for the same source.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.source(), adapter);
    }

    pub fn get(&self, source: Source) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.get(&source)
    }

    pub fn sources(&self) -> Vec<Source> {
        self.adapters.keys().copied().collect()
    }

    pub fn list_adapters(&self) -> Vec<ServerInfo> {
        self.adapters
            .values()
            .map(|adapter| ServerInfo {
                name: adapter.source().to_string(),
                description: adapter.description().to_string(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a registry with every adapter enabled via Cargo features, using the
/// default reqwest transport.
pub fn build_registry(settings: &Settings) -> Result<SourceRegistry, ConnectorError> {
    let fetcher: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new()?);
    Ok(build_registry_with_fetcher(settings, fetcher))
}

/// Build a registry over a caller-supplied transport.
#[cfg_attr(
    not(any(feature = "arxiv", feature = "pubmed", feature = "semantic-scholar")),
    allow(unused_variables)
)]
pub fn build_registry_with_fetcher(
    settings: &Settings,
    fetcher: Arc<dyn HttpFetch>,
) -> SourceRegistry {
    #[allow(unused_mut)]
    let mut registry = SourceRegistry::new();

    #[cfg(feature = "arxiv")]
    {
        let mut connector = connectors::arxiv::ArxivConnector::new(Arc::clone(&fetcher));
        if let Some(base) = settings.endpoints.arxiv.as_deref() {
            connector = connector.with_base_url(base);
        }
        registry.register(Arc::new(connector));
    }

    #[cfg(feature = "pubmed")]
    {
        let mut connector = connectors::pubmed::PubMedConnector::new(Arc::clone(&fetcher))
            .with_email(settings.pubmed_email());
        if let Some(base) = settings.endpoints.pubmed.as_deref() {
            connector = connector.with_base_url(base);
        }
        registry.register(Arc::new(connector));
    }

    #[cfg(feature = "semantic-scholar")]
    {
        let mut connector =
            connectors::semantic_scholar::SemanticScholarConnector::new(Arc::clone(&fetcher))
                .with_api_key(settings.semantic_scholar_api_key());
        if let Some(base) = settings.endpoints.semantic_scholar.as_deref() {
            connector = connector.with_base_url(base);
        }
        registry.register(Arc::new(connector));
    }

    registry
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub description: String,
}

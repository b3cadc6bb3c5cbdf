//! Recommendation service.
//!
//! Built once at startup by an explicit `setup` call and read-only
//! afterwards:
//! - Loads the catalog and embeds every item in one batch
//! - Builds the nearest-neighbor index chosen for this environment
//! - Selects the reranker from configuration
//!
//! Each `recommend` call runs encode → search → rerank → compose.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::catalog::{Catalog, CatalogError};
use crate::compose::{compose, effective_k};
use crate::config::Config;
use crate::rerank::Reranker;
use crate::semantic::{
    build_index, EmbeddingError, EmbeddingModel, IndexError, IndexKind, NearestNeighborIndex,
    TextEncoder,
};
use crate::types::{Candidate, Recommendation};

/// Fewest neighbors fetched per query, before reranking and balancing.
const MIN_SEARCH_DEPTH: usize = 30;

/// Errors that can occur while setting up or querying the recommender.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

pub struct Recommender {
    catalog: Catalog,
    encoder: Box<dyn TextEncoder>,
    index: Box<dyn NearestNeighborIndex>,
    reranker: Reranker,
}

impl Recommender {
    /// Build the service from configuration.
    ///
    /// # Arguments
    /// * `config` - Loaded configuration
    /// * `base_path` - Base directory for the model cache
    pub fn setup(config: &Config, base_path: &Path) -> Result<Self, RecommendError> {
        let catalog = Catalog::load(&config.catalog_path())?;

        let timeout = Duration::from_secs(config.embedding.download_timeout_secs);
        let encoder =
            EmbeddingModel::new(&config.embedding.model, base_path.to_path_buf(), Some(timeout))?;

        let kind = IndexKind::detect(config.index);
        let reranker = Reranker::from_config(&config.rerank);

        Self::with_parts(catalog, Box::new(encoder), kind, reranker)
    }

    /// Build the service from explicit parts: embeds the catalog and builds
    /// the index of the given kind.
    pub fn with_parts(
        catalog: Catalog,
        encoder: Box<dyn TextEncoder>,
        kind: IndexKind,
        reranker: Reranker,
    ) -> Result<Self, RecommendError> {
        let now = Instant::now();

        let vectors = encoder.encode_batch(&catalog.texts())?;
        let index = build_index(kind, encoder.dimensions(), vectors)?;

        log::info!(
            "built {} index rows={} dims={} encoder={}",
            index.kind().as_str(),
            index.len(),
            index.dimensions(),
            encoder.name()
        );
        log::debug!(
            "took {}ms to build index",
            now.elapsed().as_micros() as f64 / 1000.0
        );

        Ok(Self {
            catalog,
            encoder,
            index,
            reranker,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index_kind(&self) -> IndexKind {
        self.index.kind()
    }

    pub fn encoder_name(&self) -> &str {
        self.encoder.name()
    }

    pub fn reranker_name(&self) -> &str {
        self.reranker.name()
    }

    /// Recommend between 5 and `k` (clamped to 5..=10) assessments for
    /// `query`.
    ///
    /// An empty catalog gives an empty list. Reranking failures fall back
    /// to similarity order and are never returned.
    pub fn recommend(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        if self.catalog.is_empty() {
            return Ok(vec![]);
        }

        let k = effective_k(k);
        let candidates = self.retrieve(query, MIN_SEARCH_DEPTH.max(k * 3))?;
        let ranked = self.rerank_or_keep(query, candidates);

        Ok(compose(ranked, k))
    }

    /// Nearest catalog items for `query`, by similarity.
    pub fn retrieve(&self, query: &str, depth: usize) -> Result<Vec<Candidate>, RecommendError> {
        let query_vector = self.encoder.encode(query)?;
        let hits = self.index.search(&query_vector, depth)?;

        let candidates = hits
            .into_iter()
            .filter_map(|hit| {
                let item = self.catalog.get(hit.index)?;
                Some(Candidate {
                    name: item.name.clone(),
                    url: item.url.clone(),
                    test_type: item.test_type.clone(),
                    description: item.description.clone(),
                    score: hit.score,
                })
            })
            .collect();

        Ok(candidates)
    }

    fn rerank_or_keep(&self, query: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if !self.reranker.is_available() {
            return candidates;
        }

        let name = self.reranker.name();
        match self.reranker.rerank(query, &candidates) {
            Ok(reranked) => {
                log::info!("reranker={name} outcome=applied");
                reranked
            }
            Err(err) => {
                log::warn!("reranker={name} outcome=error err={err}");
                candidates
            }
        }
    }
}

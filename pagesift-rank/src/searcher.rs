//! Long-lived search handle tying an index store to the weight store.

use std::sync::Arc;

use crate::config::{SearchConfig, WeightConfig};
use crate::error::{ConfigError, Result};
use crate::index::IndexStore;
use crate::orchestrator::search::orchestrate_search;
use crate::types::{SearchOutcome, SearchRequest};
use crate::weights::WeightStore;

/// Shared entry point for hosts (CLI, HTTP service).
///
/// Cheap to share behind an `Arc`; every search reads one immutable weight
/// snapshot, so concurrent searches and weight updates never interfere.
pub struct Searcher {
    store: Arc<dyn IndexStore>,
    weights: WeightStore,
    config: SearchConfig,
}

impl Searcher {
    /// Create a searcher.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::Config`] if `config` is invalid.
    pub fn new(
        store: Arc<dyn IndexStore>,
        weights: WeightStore,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            weights,
            config,
        })
    }

    /// Search with the current weights and no author filter.
    ///
    /// # Errors
    ///
    /// See [`orchestrate_search`].
    pub fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome> {
        self.search_request(&SearchRequest::new(query, top_k))
    }

    /// Search with the current weights.
    ///
    /// # Errors
    ///
    /// See [`orchestrate_search`].
    pub fn search_request(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        let weights = self.weights.current();
        self.search_with(request, &weights)
    }

    /// Search with explicit weights, bypassing the stored configuration.
    ///
    /// # Errors
    ///
    /// See [`orchestrate_search`].
    pub fn search_with(
        &self,
        request: &SearchRequest,
        weights: &WeightConfig,
    ) -> Result<SearchOutcome> {
        tracing::trace!(query = %request.query, top_k = request.top_k, "search requested");
        orchestrate_search(&self.store, request, weights, &self.config)
    }

    /// Validate, persist and publish new weights.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for negative or non-finite values,
    /// or a persistence error. The previous weights stay in effect on error.
    pub fn update_weights(
        &self,
        proximity: f64,
        position: f64,
        idf: f64,
    ) -> std::result::Result<(), ConfigError> {
        self.weights.update(WeightConfig {
            proximity_weight: proximity,
            position_weight: position,
            idf_weight: idf,
        })
    }

    /// Current weight snapshot.
    pub fn weights(&self) -> WeightConfig {
        *self.weights.current()
    }

    /// The weight store.
    pub fn weight_store(&self) -> &WeightStore {
        &self.weights
    }

    /// Search configuration in effect.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Distinct author names known to the store.
    pub fn authors(&self) -> Vec<String> {
        self.store.authors()
    }

    /// Number of documents (pages) in the store.
    pub fn document_count(&self) -> u64 {
        self.store.total_document_count()
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("weights", &self.weights)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::types::{CorpusStats, Hit};

    struct FixedStore;

    impl IndexStore for FixedStore {
        fn retrieve(
            &self,
            _query: &str,
            _field: &str,
            _limit: usize,
        ) -> std::result::Result<Vec<Hit>, IndexError> {
            let near = Hit::builder("near", 1)
                .term_frequency(1)
                .positions(vec![0, 1])
                .field_length(100)
                .build()?;
            let rare = Hit::builder("rare", 1)
                .term_frequency(1)
                .rarity(3.0)
                .field_length(100)
                .positions(vec![99])
                .build()?;
            Ok(vec![near, rare])
        }

        fn rarity(&self, _field: &str, _term: &str) -> f64 {
            0.0
        }

        fn highlight(&self, hit: &Hit) -> String {
            hit.doc_id().to_string()
        }

        fn total_document_count(&self) -> u64 {
            2
        }

        fn corpus_stats(&self, _field: &str) -> CorpusStats {
            CorpusStats::default()
        }

        fn authors(&self) -> Vec<String> {
            vec!["Unknown".into()]
        }
    }

    fn searcher() -> Searcher {
        Searcher::new(Arc::new(FixedStore), WeightStore::default(), SearchConfig::default())
            .expect("valid config")
    }

    fn top(outcome: &SearchOutcome) -> &str {
        &outcome.results()[0].doc_id
    }

    #[test]
    fn weights_change_ranking_without_reindexing() {
        let searcher = searcher();
        // near: 1 + 2*1 + 1.5*0.5 = 3.75, rare: 1 + 3 + 2*0.01 = 4.02
        assert_eq!(top(&searcher.search("x", 2).expect("search")), "rare");

        searcher.update_weights(10.0, 2.0, 0.0).expect("update");
        assert_eq!(top(&searcher.search("x", 2).expect("search")), "near");
    }

    #[test]
    fn explicit_weights_do_not_touch_store() {
        let searcher = searcher();
        let proximity_heavy = WeightConfig::new(10.0, 0.0, 0.0).expect("valid");
        let outcome = searcher
            .search_with(&SearchRequest::new("x", 2), &proximity_heavy)
            .expect("search");
        assert_eq!(top(&outcome), "near");
        assert_eq!(searcher.weights(), WeightConfig::default());
    }

    #[test]
    fn rejected_update_keeps_weights() {
        let searcher = searcher();
        assert!(searcher.update_weights(-1.0, 1.0, 1.0).is_err());
        assert_eq!(searcher.weights(), WeightConfig::default());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = SearchConfig {
            default_top_k: 0,
            ..SearchConfig::default()
        };
        assert!(Searcher::new(Arc::new(FixedStore), WeightStore::default(), config).is_err());
    }

    #[test]
    fn passthrough_queries() {
        let searcher = searcher();
        assert_eq!(searcher.document_count(), 2);
        assert_eq!(searcher.authors(), vec!["Unknown".to_string()]);
    }
}

//! # pagesift-rank
//!
//! Relevance scoring and result aggregation for page-level document search.
//!
//! An index store (anything implementing [`IndexStore`]) supplies raw
//! term-level hits. This crate turns them into a ranked list of documents:
//! each hit gets a composite score from four signals, hits of the same
//! document are merged into one result listing every matched page, and the
//! result list is sorted deterministically and truncated.
//!
//! ## Design
//!
//! - Scoring is a pure function of a hit and an immutable [`WeightConfig`]
//! - Weights are tunable at runtime through [`WeightStore`] without
//!   rebuilding any index; updates are validated, written atomically and
//!   published as a whole
//! - Multi-word queries are searched as exact phrases by default
//! - Retrieval runs under a deadline; a timed-out retrieval yields an empty
//!   outcome, never a ranking over partial hits
//!
//! ## Logging
//!
//! Query text is logged only at debug/trace level.

pub mod config;
pub mod error;
pub mod index;
pub mod orchestrator;
pub mod searcher;
pub mod types;
pub mod weights;

use std::sync::Arc;

pub use config::{FieldBoost, SearchConfig, WeightConfig};
pub use error::{ConfigError, IndexError, Result, SearchError};
pub use index::IndexStore;
pub use orchestrator::query_rewrite::{rewrite_query, QueryRewrite};
pub use orchestrator::search::QueryStage;
pub use searcher::Searcher;
pub use types::{
    CorpusStats, EmptyReason, Hit, HitBuilder, QueryMetrics, RankedResult, ScoredHit,
    SearchOutcome, SearchRequest,
};
pub use weights::WeightStore;

/// Search a store with the default [`SearchConfig`] and explicit weights.
///
/// # Errors
///
/// Returns [`SearchError::QueryParse`] for query text the store rejects,
/// [`SearchError::Index`] if the store fails, and [`SearchError::Config`]
/// when `top_k` is 0.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use pagesift_rank::{IndexStore, WeightConfig};
/// # fn example(store: Arc<dyn IndexStore>) -> pagesift_rank::Result<()> {
/// let weights = WeightConfig::default();
/// let outcome = pagesift_rank::search(&store, "annual report", 10, &weights)?;
/// for result in outcome.results() {
///     println!("{} (pages {}): {}", result.path, result.pages, result.score);
/// }
/// # Ok(())
/// # }
/// ```
pub fn search(
    store: &Arc<dyn IndexStore>,
    query: &str,
    top_k: usize,
    weights: &WeightConfig,
) -> Result<SearchOutcome> {
    orchestrator::search::orchestrate_search(
        store,
        &SearchRequest::new(query, top_k),
        weights,
        &SearchConfig::default(),
    )
}

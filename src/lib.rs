//! pagesift: page-level document search with tunable relevance ranking.
//!
//! The ranking core lives in `pagesift-rank`. This crate hosts it:
//! configuration, corpus import, an in-memory index store, the HTTP
//! service and the `pagesift` CLI.

pub mod config;
pub mod corpus;
pub mod error;
pub mod memory_index;
pub mod pagesift_dirs;
pub mod server;

use std::path::PathBuf;
use std::sync::Arc;

use pagesift_rank::{IndexStore, Searcher, WeightStore};

pub use config::AppConfig;
pub use corpus::{LoadIssue, LoadReport};
pub use error::{AppError, Result};
pub use memory_index::MemoryIndex;
pub use server::SearchServer;

/// A ready searcher plus what happened while importing its corpus.
pub struct LoadedCorpus {
    /// Searcher over the imported pages.
    pub searcher: Arc<Searcher>,
    /// The index the searcher queries, for inspection.
    pub index: Arc<MemoryIndex>,
    /// Import problems, never fatal.
    pub report: LoadReport,
}

/// Import the configured corpus files plus `extra_corpora`, index them and
/// open the weight store.
///
/// # Errors
///
/// Returns an error if the search section is invalid or the persisted
/// weights file exists but cannot be read. Corpus problems are collected
/// in [`LoadedCorpus::report`].
pub fn load_corpus(config: &AppConfig, extra_corpora: &[PathBuf]) -> Result<LoadedCorpus> {
    config.validate()?;

    let files: Vec<PathBuf> = config
        .corpus
        .files
        .iter()
        .chain(extra_corpora)
        .cloned()
        .collect();
    let mut report = corpus::load_corpora(&files);
    for issue in &report.issues {
        tracing::warn!("skipped corpus input: {issue}");
    }

    let records = std::mem::take(&mut report.records);
    let index = Arc::new(MemoryIndex::new(records));
    tracing::info!(files = files.len(), pages = index.len(), "corpus indexed");

    let weights = WeightStore::open(config.weights.resolved_path())?;
    let store: Arc<dyn IndexStore> = index.clone();
    let searcher = Searcher::new(store, weights, config.search.clone())?;

    Ok(LoadedCorpus {
        searcher: Arc::new(searcher),
        index,
        report,
    })
}

//! Trait definition for the index store the ranking core consumes.
//!
//! The store owns tokenisation, query syntax, postings and corpus statistics.
//! The core only asks it for hits, rarity values, snippets and counts.

use crate::error::IndexError;
use crate::types::{CorpusStats, Hit};

/// A pluggable index store backend.
///
/// Calls are synchronous. The orchestrator runs [`IndexStore::retrieve`] on a
/// worker thread and abandons it on timeout, so implementations must be
/// `Send + Sync` and must not rely on the caller waiting for them.
///
/// An abandoned worker is detached, not cancelled: it keeps its `Arc` to the
/// store and runs `retrieve` to completion, then drops the result. Nothing
/// bounds how many such workers are alive at once, so `retrieve` must return
/// in bounded time even when nobody is waiting for it.
pub trait IndexStore: Send + Sync {
    /// Retrieve up to `limit` hits for `query` in `field`, in stable
    /// retrieval order, each fully populated.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Parse`] for malformed query text and
    /// [`IndexError::Unavailable`] when the store cannot serve the request.
    fn retrieve(&self, query: &str, field: &str, limit: usize) -> Result<Vec<Hit>, IndexError>;

    /// Corpus rarity of `term` in `field`. Returns 0 for unknown terms.
    fn rarity(&self, field: &str, term: &str) -> f64;

    /// A short, markup-safe snippet with the match emphasised.
    fn highlight(&self, hit: &Hit) -> String;

    /// Number of documents (pages) in the corpus.
    fn total_document_count(&self) -> u64;

    /// Signal maxima for `field`, used to bound achievable scores.
    fn corpus_stats(&self, field: &str) -> CorpusStats;

    /// Sorted distinct author names; a missing author is listed as
    /// `"Unknown"`.
    fn authors(&self) -> Vec<String>;
}

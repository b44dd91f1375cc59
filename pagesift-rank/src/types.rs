//! Core types flowing through the ranking pipeline.
//!
//! [`Hit`] values come from an index store, are paired with a score as
//! [`ScoredHit`], and leave the pipeline as [`RankedResult`]s grouped per
//! document.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::IndexError;

/// Rendered in place of a missing optional attribute.
pub const UNKNOWN: &str = "Unknown";

/// Display format for creation timestamps.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One matched occurrence of a query term in one field of one document page.
///
/// Hits are immutable once built. Construct them with [`Hit::builder`], which
/// validates the numeric attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    doc_id: String,
    page: u32,
    field: String,
    term: String,
    term_frequency: u32,
    positions: Vec<u32>,
    field_length: u32,
    rarity: f64,
    author: Option<String>,
    created_at: Option<NaiveDateTime>,
    path: String,
    snippet_source: String,
}

impl Hit {
    /// Start building a hit for the given document identity and page.
    pub fn builder(doc_id: impl Into<String>, page: u32) -> HitBuilder {
        HitBuilder {
            doc_id: doc_id.into(),
            page,
            field: String::from("content"),
            term: String::new(),
            term_frequency: 0,
            positions: Vec::new(),
            field_length: 0,
            rarity: 0.0,
            author: None,
            created_at: None,
            path: String::new(),
            snippet_source: String::new(),
        }
    }

    /// Logical document identity used for grouping.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Field the term matched in.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The matched term or phrase.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Occurrences of the term in this field instance.
    pub fn term_frequency(&self) -> u32 {
        self.term_frequency
    }

    /// Token positions as supplied by the store (not necessarily sorted).
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Number of tokens in the field instance. Always at least 1.
    pub fn field_length(&self) -> u32 {
        self.field_length
    }

    /// Corpus rarity of the term.
    pub fn rarity(&self) -> f64 {
        self.rarity
    }

    /// Author, if the source document declared one.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Author with the missing case resolved to [`UNKNOWN`].
    pub fn author_or_unknown(&self) -> &str {
        self.author.as_deref().unwrap_or(UNKNOWN)
    }

    /// Creation timestamp, if known.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }

    /// Source path as stored (not normalised).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw text the store highlights from.
    pub fn snippet_source(&self) -> &str {
        &self.snippet_source
    }
}

/// Validating builder for [`Hit`].
#[derive(Debug, Clone)]
pub struct HitBuilder {
    doc_id: String,
    page: u32,
    field: String,
    term: String,
    term_frequency: u32,
    positions: Vec<u32>,
    field_length: u32,
    rarity: f64,
    author: Option<String>,
    created_at: Option<NaiveDateTime>,
    path: String,
    snippet_source: String,
}

impl HitBuilder {
    /// Field name (defaults to `content`).
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Matched term or phrase.
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    /// Occurrence count.
    pub fn term_frequency(mut self, tf: u32) -> Self {
        self.term_frequency = tf;
        self
    }

    /// Token positions; order and duplicates are tolerated.
    pub fn positions(mut self, positions: impl Into<Vec<u32>>) -> Self {
        self.positions = positions.into();
        self
    }

    /// Token count of the field instance.
    pub fn field_length(mut self, len: u32) -> Self {
        self.field_length = len;
        self
    }

    /// Corpus rarity of the term.
    pub fn rarity(mut self, rarity: f64) -> Self {
        self.rarity = rarity;
        self
    }

    /// Optional author.
    pub fn author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }

    /// Optional creation timestamp.
    pub fn created_at(mut self, created_at: Option<NaiveDateTime>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Source path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Raw snippet source text.
    pub fn snippet_source(mut self, text: impl Into<String>) -> Self {
        self.snippet_source = text.into();
        self
    }

    /// Validate and build the hit.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidHit`] when the document identity is blank,
    /// the page is 0, the field length is 0, or the rarity is negative or not
    /// finite.
    pub fn build(self) -> Result<Hit, IndexError> {
        if self.doc_id.trim().is_empty() {
            return Err(IndexError::InvalidHit("document identity is empty".into()));
        }
        if self.page == 0 {
            return Err(IndexError::InvalidHit(format!(
                "page must be >= 1 (document {})",
                self.doc_id
            )));
        }
        if self.field_length == 0 {
            return Err(IndexError::InvalidHit(format!(
                "field length must be >= 1 (document {}, page {})",
                self.doc_id, self.page
            )));
        }
        if !self.rarity.is_finite() || self.rarity < 0.0 {
            return Err(IndexError::InvalidHit(format!(
                "rarity must be finite and non-negative, got {}",
                self.rarity
            )));
        }
        Ok(Hit {
            doc_id: self.doc_id,
            page: self.page,
            field: self.field,
            term: self.term,
            term_frequency: self.term_frequency,
            positions: self.positions,
            field_length: self.field_length,
            rarity: self.rarity,
            author: self.author,
            created_at: self.created_at,
            path: self.path,
            snippet_source: self.snippet_source,
        })
    }
}

/// A hit paired with its composite relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    /// The underlying hit.
    pub hit: Hit,
    /// Non-negative composite score.
    pub score: f64,
}

/// One ranked document in a search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Logical document identity.
    pub doc_id: String,
    /// Source path using `/` as the only separator.
    pub path: String,
    /// Ascending page numbers, e.g. `"1, 2, 7"`.
    pub pages: String,
    /// Best page score rounded to three decimals.
    pub score: f64,
    /// Highlighted snippet from the best-scoring hit.
    pub snippet: String,
    /// Author or `"Unknown"`.
    pub author: String,
    /// Creation timestamp or `"Unknown"`.
    pub created: String,
}

/// Corpus-wide maxima of the scoring signals for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of documents (pages) in the corpus.
    pub document_count: u64,
    /// Highest term frequency observed in the field.
    pub max_term_frequency: u32,
    /// Highest rarity any term in the field can have.
    pub max_rarity: f64,
}

/// One search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Raw query text as typed by the user.
    pub query: String,
    /// Maximum number of documents to return.
    pub top_k: usize,
    /// Keep only hits whose author (or `"Unknown"`) equals this value.
    #[serde(default)]
    pub author: Option<String>,
}

impl SearchRequest {
    /// Request without an author filter.
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            author: None,
        }
    }

    /// Restrict results to one author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Execution metrics collected for one search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// Corpus-wide document count; 0 if the store was not consulted.
    pub document_count: u64,
    /// Raw hits retrieved across all fields, before author filtering.
    pub raw_hits: usize,
    /// Wall-clock duration measured on a monotonic clock.
    pub duration_ms: u64,
    /// Upper bound on any hit score for this query's fields and weights.
    pub score_ceiling: f64,
}

/// Why a search produced no results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmptyReason {
    /// The query was empty or whitespace only.
    BlankQuery,
    /// The store returned no hits (or none survived the author filter).
    NoMatches,
    /// Retrieval exceeded its budget; partial hits were discarded.
    RetrievalTimeout {
        /// The budget that was exceeded.
        budget_ms: u64,
    },
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankQuery => f.write_str("empty query"),
            Self::NoMatches => f.write_str("no matches"),
            Self::RetrievalTimeout { budget_ms } => {
                write!(f, "retrieval timed out after {budget_ms} ms")
            }
        }
    }
}

/// Terminal outcome of a successful search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// At least one document matched.
    Success {
        /// Ranked documents, best first.
        results: Vec<RankedResult>,
        /// Execution metrics.
        metrics: QueryMetrics,
    },
    /// Nothing to show, with a diagnostic reason.
    Empty {
        /// Why the result set is empty.
        reason: EmptyReason,
        /// Execution metrics.
        metrics: QueryMetrics,
    },
}

impl SearchOutcome {
    /// Ranked results; empty for [`SearchOutcome::Empty`].
    pub fn results(&self) -> &[RankedResult] {
        match self {
            Self::Success { results, .. } => results,
            Self::Empty { .. } => &[],
        }
    }

    /// Metrics of the call.
    pub fn metrics(&self) -> &QueryMetrics {
        match self {
            Self::Success { metrics, .. } | Self::Empty { metrics, .. } => metrics,
        }
    }

    /// The empty reason, if any.
    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            Self::Success { .. } => None,
            Self::Empty { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> HitBuilder {
        Hit::builder("docs/a.pdf", 1)
            .term("rust")
            .term_frequency(2)
            .positions(vec![3, 1])
            .field_length(10)
            .rarity(1.5)
            .path("docs\\a.pdf")
    }

    #[test]
    fn builder_produces_hit() {
        let hit = base().build().expect("valid hit");
        assert_eq!(hit.doc_id(), "docs/a.pdf");
        assert_eq!(hit.page(), 1);
        assert_eq!(hit.field(), "content");
        assert_eq!(hit.positions(), &[3, 1]);
        assert_eq!(hit.field_length(), 10);
    }

    #[test]
    fn zero_page_rejected() {
        let err = Hit::builder("a", 0).field_length(1).build().unwrap_err();
        assert!(err.to_string().contains("page"));
    }

    #[test]
    fn zero_field_length_rejected() {
        let err = base().field_length(0).build().unwrap_err();
        assert!(err.to_string().contains("field length"));
    }

    #[test]
    fn negative_or_nan_rarity_rejected() {
        assert!(base().rarity(-0.1).build().is_err());
        assert!(base().rarity(f64::NAN).build().is_err());
        assert!(base().rarity(f64::INFINITY).build().is_err());
    }

    #[test]
    fn blank_doc_id_rejected() {
        let err = Hit::builder("  ", 1).field_length(1).build().unwrap_err();
        assert!(matches!(err, IndexError::InvalidHit(_)));
    }

    #[test]
    fn missing_author_resolves_to_unknown() {
        let hit = base().author(None).build().expect("valid hit");
        assert_eq!(hit.author(), None);
        assert_eq!(hit.author_or_unknown(), UNKNOWN);

        let blank = base().author(Some("  ".into())).build().expect("valid hit");
        assert_eq!(blank.author_or_unknown(), UNKNOWN);
    }

    #[test]
    fn outcome_accessors() {
        let empty = SearchOutcome::Empty {
            reason: EmptyReason::BlankQuery,
            metrics: QueryMetrics::default(),
        };
        assert!(empty.results().is_empty());
        assert_eq!(empty.empty_reason(), Some(&EmptyReason::BlankQuery));
    }

    #[test]
    fn empty_reason_display() {
        let reason = EmptyReason::RetrievalTimeout { budget_ms: 250 };
        assert_eq!(reason.to_string(), "retrieval timed out after 250 ms");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = SearchOutcome::Empty {
            reason: EmptyReason::NoMatches,
            metrics: QueryMetrics::default(),
        };
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["status"], "empty");
        assert_eq!(json["reason"]["kind"], "no_matches");
    }
}

//! Page-to-document aggregation.
//!
//! Many scored hits can point at the same logical document (one per page,
//! term and field). They are grouped by document identity; each group keeps
//! its distinct pages plus the single best hit, which supplies the score,
//! snippet and metadata of the ranked result.
//!
//! Callers oversample: the store is asked for more raw hits than `top_k`
//! because hits collapse during grouping. When fewer than `top_k` documents
//! remain, the shorter list is returned as-is.

use std::collections::{BTreeSet, HashMap};

use crate::types::{Hit, RankedResult, ScoredHit, CREATED_AT_FORMAT, UNKNOWN};

use super::path_normalize::normalize_path;

/// Accumulates the hits of one document during a single aggregation pass.
#[derive(Debug, Clone)]
pub struct DocumentGroup<'a> {
    pages: BTreeSet<u32>,
    best: &'a ScoredHit,
}

impl<'a> DocumentGroup<'a> {
    /// Start a group from its first hit.
    pub fn new(first: &'a ScoredHit) -> Self {
        let mut pages = BTreeSet::new();
        pages.insert(first.hit.page());
        Self { pages, best: first }
    }

    /// Record a page. Inserting the same page again has no effect.
    pub fn insert_page(&mut self, page: u32) {
        self.pages.insert(page);
    }

    /// Add a hit: records its page and takes over as best only if its score
    /// is strictly greater, so ties keep the earliest hit.
    pub fn add(&mut self, scored: &'a ScoredHit) {
        self.insert_page(scored.hit.page());
        if scored.score > self.best.score {
            self.best = scored;
        }
    }

    /// Distinct pages in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }

    /// Number of distinct pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The best hit seen so far.
    pub fn best(&self) -> &'a ScoredHit {
        self.best
    }

    /// Pages rendered as `"1, 2, 7"`.
    pub fn page_list(&self) -> String {
        self.pages()
            .map(|page| page.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn into_result(self, highlight: &impl Fn(&Hit) -> String) -> RankedResult {
        let hit = &self.best.hit;
        let source_path = if hit.path().trim().is_empty() {
            hit.doc_id()
        } else {
            hit.path()
        };
        RankedResult {
            doc_id: hit.doc_id().to_string(),
            path: normalize_path(source_path),
            pages: self.page_list(),
            score: round_score(self.best.score),
            snippet: highlight(hit),
            author: hit.author_or_unknown().to_string(),
            created: hit
                .created_at()
                .map_or_else(|| UNKNOWN.to_string(), |t| t.format(CREATED_AT_FORMAT).to_string()),
        }
    }
}

/// Scores at or above this magnitude have no fractional digits left.
const ROUNDING_LIMIT: f64 = 1e15;

/// Round a score to three decimals.
///
/// Scores too large to carry decimals are returned unchanged, so rounding
/// never overflows a finite score to infinity.
pub fn round_score(score: f64) -> f64 {
    if !score.is_finite() || score.abs() >= ROUNDING_LIMIT {
        return score;
    }
    (score * 1000.0).round() / 1000.0
}

/// Group scored hits by document, rank the groups and keep the best `top_k`.
///
/// `scored` must be in stable retrieval order. Groups are ordered by rounded
/// score descending, then document identity ascending. `highlight` renders
/// the snippet of each surviving group's best hit and is not called for
/// groups cut by truncation.
pub fn group_and_rank<F>(scored: &[ScoredHit], top_k: usize, highlight: F) -> Vec<RankedResult>
where
    F: Fn(&Hit) -> String,
{
    let mut groups: HashMap<&str, DocumentGroup<'_>> = HashMap::new();
    for entry in scored {
        groups
            .entry(entry.hit.doc_id())
            .and_modify(|group| group.add(entry))
            .or_insert_with(|| DocumentGroup::new(entry));
    }

    let mut ranked: Vec<(f64, DocumentGroup<'_>)> = groups
        .into_values()
        .map(|group| (round_score(group.best().score), group))
        .collect();
    ranked.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| a.best().hit.doc_id().cmp(b.best().hit.doc_id()))
    });
    ranked.truncate(top_k);

    ranked
        .into_iter()
        .map(|(_, group)| group.into_result(&highlight))
        .collect()
}

//! Query pipeline: parse, retrieve, score, aggregate, respond.
//!
//! Each configured field is retrieved on its own worker thread. The
//! orchestrator waits for every field against one overall deadline; if the
//! deadline passes, all hits are discarded and the call ends in an empty
//! outcome rather than a ranking over an incomplete hit list. Scoring and
//! aggregation only start once retrieval has fully completed.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::config::{FieldBoost, SearchConfig, WeightConfig};
use crate::error::{IndexError, Result, SearchError};
use crate::index::IndexStore;
use crate::types::{EmptyReason, Hit, QueryMetrics, ScoredHit, SearchOutcome, SearchRequest};

use super::aggregate::group_and_rank;
use super::query_rewrite::rewrite_query;
use super::scoring::{max_quality, score_hits};

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStage {
    /// Validate input and apply the phrase policy.
    Parse,
    /// Fetch raw hits from the index store.
    Retrieve,
    /// Compute composite scores.
    Score,
    /// Group by document, rank and truncate.
    Aggregate,
    /// Attach snippets and metrics.
    Respond,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "parse",
            Self::Retrieve => "retrieve",
            Self::Score => "score",
            Self::Aggregate => "aggregate",
            Self::Respond => "respond",
        };
        f.write_str(name)
    }
}

type FieldResult = std::result::Result<Vec<Hit>, IndexError>;

/// Run one search request through the full pipeline.
///
/// # Pipeline
///
/// 1. Reject `top_k == 0` and invalid configuration; a blank query ends in
///    [`EmptyReason::BlankQuery`] without touching the store
/// 2. Rewrite multi-word queries into exact phrases
/// 3. Retrieve `top_k * oversample_factor` hits per configured field,
///    concurrently, under one deadline
/// 4. Drop hits not matching the author filter, if any
/// 5. Score each hit and apply its field boost
/// 6. Group by document, rank, truncate to `top_k`, highlight survivors
///
/// # Errors
///
/// Returns [`SearchError::QueryParse`] when the store rejects the query text,
/// [`SearchError::Index`] when the store fails, and [`SearchError::Config`]
/// for a zero `top_k` or invalid configuration.
pub fn orchestrate_search(
    store: &Arc<dyn IndexStore>,
    request: &SearchRequest,
    weights: &WeightConfig,
    config: &SearchConfig,
) -> Result<SearchOutcome> {
    let started = Instant::now();

    // 1. Parse.
    if request.top_k == 0 {
        return Err(SearchError::Config("top_k must be greater than 0".into()));
    }
    config.validate()?;
    weights
        .validate()
        .map_err(|e| SearchError::Config(e.to_string()))?;

    if request.query.trim().is_empty() {
        tracing::debug!(stage = %QueryStage::Parse, "blank query, store not consulted");
        return Ok(SearchOutcome::Empty {
            reason: EmptyReason::BlankQuery,
            metrics: QueryMetrics {
                duration_ms: elapsed_ms(started),
                ..QueryMetrics::default()
            },
        });
    }

    let rewrite = rewrite_query(&request.query);
    tracing::debug!(
        stage = %QueryStage::Parse,
        query = %rewrite,
        phrase = rewrite.is_phrase(),
        "query parsed"
    );

    // 2. Retrieve.
    let limit = config.oversample_limit(request.top_k);
    let budget = Duration::from_millis(config.retrieval_timeout_ms);
    let deadline = started + budget;
    tracing::debug!(
        stage = %QueryStage::Retrieve,
        fields = config.fields.len(),
        limit,
        "retrieving"
    );

    let receivers = config
        .fields
        .iter()
        .map(|field| spawn_retrieval(store, rewrite.text(), &field.name, limit))
        .collect::<Result<Vec<_>>>()?;

    let mut retrieved: Vec<(&FieldBoost, Vec<Hit>)> = Vec::with_capacity(receivers.len());
    for (field, rx) in config.fields.iter().zip(receivers) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(hits) => {
                let hits = hits?;
                tracing::debug!(field = %field.name, count = hits.len(), "field retrieved");
                retrieved.push((field, hits));
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    field = %field.name,
                    budget_ms = config.retrieval_timeout_ms,
                    "retrieval timed out, discarding partial hits"
                );
                return Ok(SearchOutcome::Empty {
                    reason: EmptyReason::RetrievalTimeout {
                        budget_ms: config.retrieval_timeout_ms,
                    },
                    metrics: QueryMetrics {
                        duration_ms: elapsed_ms(started),
                        ..QueryMetrics::default()
                    },
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SearchError::Index(format!(
                    "retrieval worker for field `{}` exited without a result",
                    field.name
                )));
            }
        }
    }

    let raw_hits = retrieved.iter().map(|(_, hits)| hits.len()).sum();
    if let Some(author) = &request.author {
        for (_, hits) in &mut retrieved {
            hits.retain(|hit| hit.author_or_unknown() == author.as_str());
        }
    }

    let mut metrics = QueryMetrics {
        document_count: store.total_document_count(),
        raw_hits,
        duration_ms: 0,
        score_ceiling: config
            .fields
            .iter()
            .map(|field| field.boost * max_quality(weights, &store.corpus_stats(&field.name)))
            .fold(0.0, f64::max),
    };

    // 3. Score.
    let mut scored: Vec<ScoredHit> = Vec::with_capacity(raw_hits);
    for (field, hits) in retrieved {
        scored.extend(score_hits(hits, weights, field.boost));
    }
    tracing::debug!(stage = %QueryStage::Score, scored = scored.len(), "hits scored");

    if scored.is_empty() {
        metrics.duration_ms = elapsed_ms(started);
        return Ok(SearchOutcome::Empty {
            reason: EmptyReason::NoMatches,
            metrics,
        });
    }

    // 4. Aggregate, 5. Respond.
    let results = group_and_rank(&scored, request.top_k, |hit| store.highlight(hit));
    tracing::debug!(stage = %QueryStage::Aggregate, documents = results.len(), "hits grouped");

    metrics.duration_ms = elapsed_ms(started);
    tracing::debug!(
        stage = %QueryStage::Respond,
        results = results.len(),
        raw_hits = metrics.raw_hits,
        duration_ms = metrics.duration_ms,
        "search complete"
    );
    Ok(SearchOutcome::Success { results, metrics })
}

/// Start retrieval of one field on a worker thread.
///
/// The worker owns clones of everything it needs, so an abandoned worker can
/// finish (or hang) without holding borrows of the caller. After a timeout the
/// thread is detached: it runs `retrieve` to completion and then releases its
/// handle on the store. See [`IndexStore`] for what that asks of stores.
fn spawn_retrieval(
    store: &Arc<dyn IndexStore>,
    query: &str,
    field: &str,
    limit: usize,
) -> Result<Receiver<FieldResult>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let store = Arc::clone(store);
    let query = query.to_string();
    let field_name = field.to_string();
    thread::Builder::new()
        .name(format!("pagesift-retrieve-{field}"))
        .spawn(move || {
            let result = store.retrieve(&query, &field_name, limit);
            // The receiver is gone after a timeout; the result is dropped.
            let _ = tx.send(result);
        })
        .map_err(|e| SearchError::Index(format!("failed to start retrieval worker: {e}")))?;
    Ok(rx)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

//! Query orchestrator: phrase rewrite, retrieval, scoring, grouping, ranking.
//!
//! This module turns one query into a ranked list of documents. Raw hits are
//! fetched from the index store for every configured field, scored
//! independently, grouped by document identity and sorted by best page
//! score.

pub mod aggregate;
pub mod path_normalize;
pub mod query_rewrite;
pub mod scoring;
pub mod search;

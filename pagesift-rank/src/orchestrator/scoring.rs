//! Composite relevance scoring for raw hits.
//!
//! Each hit is reduced to four signals and combined linearly:
//!
//! ```text
//! score = term_frequency
//!       + idf_weight       * rarity
//!       + position_weight  * position
//!       + proximity_weight * proximity
//! ```
//!
//! - `position = 1 - min(positions) / field_length`, clamped to `[0, 1]`;
//!   0 when the hit has no positions.
//! - `proximity = 1 / (1 + average gap between consecutive positions)`;
//!   0 with fewer than two distinct positions.
//!
//! Every signal is non-negative and every weight is non-negative, so the
//! score is monotonically non-decreasing in each signal. Scores saturate at
//! `f64::MAX` instead of overflowing to infinity.

use crate::config::WeightConfig;
use crate::types::{CorpusStats, Hit, ScoredHit};

/// The four per-hit signals before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    /// Raw occurrence count.
    pub term_frequency: f64,
    /// Corpus rarity of the term.
    pub rarity: f64,
    /// First-occurrence signal in `[0, 1]`.
    pub position: f64,
    /// Clustering signal in `[0, 1]`.
    pub proximity: f64,
}

/// Sort and deduplicate token positions.
pub fn normalize_positions(positions: &[u32]) -> Vec<u32> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Earlier first occurrence scores higher, relative to the field length.
pub fn position_score(positions: &[u32], field_length: u32) -> f64 {
    let Some(first) = positions.iter().min() else {
        return 0.0;
    };
    if field_length == 0 {
        return 0.0;
    }
    (1.0 - f64::from(*first) / f64::from(field_length)).clamp(0.0, 1.0)
}

/// Tighter clusters of occurrences score higher.
pub fn proximity_score(positions: &[u32]) -> f64 {
    let normalized = normalize_positions(positions);
    if normalized.len() < 2 {
        return 0.0;
    }
    let total_gap: f64 = normalized
        .windows(2)
        .map(|pair| f64::from(pair[1] - pair[0]))
        .sum();
    let average_gap = total_gap / (normalized.len() - 1) as f64;
    1.0 / (1.0 + average_gap)
}

/// Extract the scoring signals of a hit.
pub fn signals(hit: &Hit) -> Signals {
    Signals {
        term_frequency: f64::from(hit.term_frequency()),
        rarity: hit.rarity(),
        position: position_score(hit.positions(), hit.field_length()),
        proximity: proximity_score(hit.positions()),
    }
}

/// Combine signals under a weighting scheme.
pub fn composite(signals: &Signals, weights: &WeightConfig) -> f64 {
    saturate(
        signals.term_frequency
            + weights.idf_weight * signals.rarity
            + weights.position_weight * signals.position
            + weights.proximity_weight * signals.proximity,
    )
}

/// Clamp an overflowed sum or product back to the largest finite value.
fn saturate(value: f64) -> f64 {
    value.min(f64::MAX)
}

/// Score one hit.
pub fn score(hit: &Hit, weights: &WeightConfig) -> f64 {
    composite(&signals(hit), weights)
}

/// Score hits from one field, applying that field's boost.
///
/// Output order matches input order.
pub fn score_hits(hits: Vec<Hit>, weights: &WeightConfig, boost: f64) -> Vec<ScoredHit> {
    hits.into_iter()
        .map(|hit| {
            let score = saturate(boost * score(&hit, weights));
            ScoredHit { hit, score }
        })
        .collect()
}

/// Upper bound on any score achievable in a field with the given statistics.
///
/// Position and proximity are bounded by 1.0; term frequency and rarity by
/// the corpus maxima.
pub fn max_quality(weights: &WeightConfig, stats: &CorpusStats) -> f64 {
    saturate(
        f64::from(stats.max_term_frequency)
            + weights.idf_weight * stats.max_rarity
            + weights.position_weight
            + weights.proximity_weight,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hit(tf: u32, rarity: f64, positions: Vec<u32>, field_length: u32) -> Hit {
        Hit::builder("A", 1)
            .term("rust")
            .term_frequency(tf)
            .rarity(rarity)
            .positions(positions)
            .field_length(field_length)
            .build()
            .expect("valid hit")
    }

    #[test]
    fn first_position_at_start_scores_one() {
        assert!((position_score(&[0, 5, 9], 100) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn position_halfway_scores_half() {
        assert!((position_score(&[50], 100) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn position_past_field_end_clamps_to_zero() {
        assert!(position_score(&[120], 100).abs() < f64::EPSILON);
    }

    #[test]
    fn no_positions_score_zero() {
        assert!(position_score(&[], 10).abs() < f64::EPSILON);
        assert!(proximity_score(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn single_position_has_no_proximity() {
        assert!(proximity_score(&[7]).abs() < f64::EPSILON);
    }

    #[test]
    fn proximity_uses_average_gap() {
        // gaps 5 and 4 -> average 4.5
        let expected = 1.0 / 5.5;
        assert!((proximity_score(&[0, 5, 9]) - expected).abs() < 1e-12);
    }

    #[test]
    fn adjacent_positions_score_half() {
        assert!((proximity_score(&[3, 4]) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unsorted_and_duplicate_positions_are_normalized() {
        assert_eq!(normalize_positions(&[9, 0, 5, 5, 0]), vec![0, 5, 9]);
        let clean = proximity_score(&[0, 5, 9]);
        let messy = proximity_score(&[9, 5, 0, 5, 9]);
        assert!((clean - messy).abs() < f64::EPSILON);
        assert!((position_score(&[9, 5, 0], 100) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicates_only_collapse_to_single_position() {
        assert!(proximity_score(&[4, 4, 4]).abs() < f64::EPSILON);
    }

    #[test]
    fn composite_with_default_weights() {
        let weights = WeightConfig::default();
        let clustered = hit(3, 2.0, vec![0, 5, 9], 100);
        let expected = 3.0 + 2.0 + 2.0 * 1.0 + 1.5 / 5.5;
        assert!((score(&clustered, &weights) - expected).abs() < 1e-12);

        let single = hit(1, 2.0, vec![50], 100);
        assert!((score(&single, &weights) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_weights_leave_term_frequency() {
        let weights = WeightConfig::new(0.0, 0.0, 0.0).expect("valid");
        assert!((score(&hit(4, 9.0, vec![0, 1], 10), &weights) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn signals_can_be_reweighted_side_by_side() {
        let s = signals(&hit(2, 1.0, vec![0, 2], 4));
        let a = WeightConfig::new(1.0, 0.0, 0.0).expect("valid");
        let b = WeightConfig::new(0.0, 1.0, 0.0).expect("valid");
        assert!((composite(&s, &a) - (2.0 + 1.0 / 3.0)).abs() < 1e-12);
        assert!((composite(&s, &b) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn boost_scales_scores_in_order() {
        let weights = WeightConfig::default();
        let hits = vec![hit(1, 0.0, vec![], 10), hit(2, 0.0, vec![], 10)];
        let scored = score_hits(hits, &weights, 2.0);
        assert_eq!(scored.len(), 2);
        assert!((scored[0].score - 2.0).abs() < f64::EPSILON);
        assert!((scored[1].score - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_quality_sums_weighted_maxima() {
        let stats = CorpusStats {
            document_count: 10,
            max_term_frequency: 5,
            max_rarity: 2.5,
        };
        let expected = 5.0 + 2.5 + 2.0 + 1.5;
        assert!((max_quality(&WeightConfig::default(), &stats) - expected).abs() < 1e-12);
    }

    #[test]
    fn huge_weights_saturate_instead_of_overflowing() {
        let weights = WeightConfig::new(f64::MAX, f64::MAX, f64::MAX).expect("valid");
        let h = hit(3, 2.0, vec![0, 1], 4);
        assert_eq!(score(&h, &weights), f64::MAX);

        let zero_boost = score_hits(vec![h.clone()], &weights, 0.0);
        assert_eq!(zero_boost[0].score, 0.0);
        let doubled = score_hits(vec![h], &weights, 2.0);
        assert_eq!(doubled[0].score, f64::MAX);

        let stats = CorpusStats {
            document_count: 1,
            max_term_frequency: 3,
            max_rarity: 2.0,
        };
        assert_eq!(max_quality(&weights, &stats), f64::MAX);
    }

    fn weights() -> impl Strategy<Value = WeightConfig> {
        (0.0f64..50.0, 0.0f64..50.0, 0.0f64..50.0).prop_map(|(proximity, position, idf)| {
            WeightConfig {
                proximity_weight: proximity,
                position_weight: position,
                idf_weight: idf,
            }
        })
    }

    fn any_signals() -> impl Strategy<Value = Signals> {
        (0.0f64..1000.0, 0.0f64..20.0, 0.0f64..=1.0, 0.0f64..=1.0).prop_map(
            |(term_frequency, rarity, position, proximity)| Signals {
                term_frequency,
                rarity,
                position,
                proximity,
            },
        )
    }

    proptest! {
        #[test]
        fn composite_monotonic_in_term_frequency(
            w in weights(),
            s in any_signals(),
            d in 0.0f64..100.0,
        ) {
            let higher = Signals { term_frequency: s.term_frequency + d, ..s };
            prop_assert!(composite(&higher, &w) >= composite(&s, &w));
        }

        #[test]
        fn composite_monotonic_in_rarity(w in weights(), s in any_signals(), d in 0.0f64..10.0) {
            let higher = Signals { rarity: s.rarity + d, ..s };
            prop_assert!(composite(&higher, &w) >= composite(&s, &w));
        }

        #[test]
        fn composite_monotonic_in_position(w in weights(), s in any_signals(), p in 0.0f64..=1.0) {
            let higher = Signals { position: s.position.max(p), ..s };
            prop_assert!(composite(&higher, &w) >= composite(&s, &w));
        }

        #[test]
        fn composite_monotonic_in_proximity(w in weights(), s in any_signals(), p in 0.0f64..=1.0) {
            let higher = Signals { proximity: s.proximity.max(p), ..s };
            prop_assert!(composite(&higher, &w) >= composite(&s, &w));
        }

        #[test]
        fn signals_stay_in_unit_range(
            positions in prop::collection::vec(0u32..500, 0..12),
            field_length in 1u32..400,
        ) {
            let pos = position_score(&positions, field_length);
            let prox = proximity_score(&positions);
            prop_assert!((0.0..=1.0).contains(&pos));
            prop_assert!((0.0..=1.0).contains(&prox));
        }

        #[test]
        fn scores_never_exceed_max_quality(
            w in weights(),
            tf in 0u32..50,
            rarity in 0.0f64..8.0,
            positions in prop::collection::vec(0u32..500, 0..12),
            field_length in 1u32..400,
        ) {
            let stats = CorpusStats {
                document_count: 1,
                max_term_frequency: 50,
                max_rarity: 8.0,
            };
            let h = hit(tf, rarity, positions, field_length);
            prop_assert!(score(&h, &w) <= max_quality(&w, &stats) + 1e-9);
            prop_assert!(score(&h, &w) >= 0.0);
        }
    }
}

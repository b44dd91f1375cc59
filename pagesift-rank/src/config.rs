//! Ranking and search configuration with sensible defaults.
//!
//! [`WeightConfig`] holds the three tunable signal weights. [`SearchConfig`]
//! controls which fields are searched, how much the store oversamples, and
//! how long retrieval may take.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SearchError};

/// Default proximity weight.
pub const DEFAULT_PROXIMITY_WEIGHT: f64 = 1.5;
/// Default position weight.
pub const DEFAULT_POSITION_WEIGHT: f64 = 2.0;
/// Default rarity (IDF) weight.
pub const DEFAULT_IDF_WEIGHT: f64 = 1.0;

/// The three signal weights used by the scoring engine.
///
/// Always replaced as a whole; weights are finite and non-negative once
/// validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    /// Multiplier for the proximity signal.
    pub proximity_weight: f64,
    /// Multiplier for the first-position signal.
    pub position_weight: f64,
    /// Multiplier for the corpus rarity signal.
    pub idf_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            proximity_weight: DEFAULT_PROXIMITY_WEIGHT,
            position_weight: DEFAULT_POSITION_WEIGHT,
            idf_weight: DEFAULT_IDF_WEIGHT,
        }
    }
}

impl WeightConfig {
    /// Build a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first weight that is
    /// negative, infinite or NaN.
    pub fn new(proximity: f64, position: f64, idf: f64) -> Result<Self, ConfigError> {
        let config = Self {
            proximity_weight: proximity,
            position_weight: position,
            idf_weight: idf,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse weights supplied as text (CLI arguments, form fields).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotANumber`] for text that is not a number and
    /// [`ConfigError::Validation`] for numbers out of range.
    pub fn parse(proximity: &str, position: &str, idf: &str) -> Result<Self, ConfigError> {
        Self::new(
            parse_weight("proximity_weight", proximity)?,
            parse_weight("position_weight", position)?,
            parse_weight("idf_weight", idf)?,
        )
    }

    /// Checks every weight is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("proximity_weight", self.proximity_weight),
            ("position_weight", self.position_weight),
            ("idf_weight", self.idf_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation { field, value });
            }
        }
        Ok(())
    }

    /// Whether two configs agree within `tolerance` on every weight.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.proximity_weight - other.proximity_weight).abs() <= tolerance
            && (self.position_weight - other.position_weight).abs() <= tolerance
            && (self.idf_weight - other.idf_weight).abs() <= tolerance
    }
}

fn parse_weight(field: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::NotANumber {
            field,
            raw: raw.to_string(),
        })
}

/// A searched field and the multiplier applied to its hit scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    /// Field name as known to the index store.
    pub name: String,
    /// Non-negative score multiplier.
    pub boost: f64,
}

impl FieldBoost {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, boost: f64) -> Self {
        Self {
            name: name.into(),
            boost,
        }
    }
}

/// Configuration for the query orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fields to retrieve from, each with its boost. Retrieved in order.
    pub fields: Vec<FieldBoost>,
    /// Raw hits requested per field = `top_k * oversample_factor`.
    pub oversample_factor: usize,
    /// Overall retrieval budget in milliseconds across all fields.
    pub retrieval_timeout_ms: u64,
    /// `top_k` used when a caller does not supply one.
    pub default_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldBoost::new("content", 1.0),
                FieldBoost::new("file_name", 2.0),
            ],
            oversample_factor: 3,
            retrieval_timeout_ms: 5_000,
            default_top_k: 10,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - at least one field is configured, none with a blank name
    /// - every boost is finite and non-negative
    /// - `oversample_factor`, `retrieval_timeout_ms` and `default_top_k` are
    ///   greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.fields.is_empty() {
            return Err(SearchError::Config(
                "at least one search field must be configured".into(),
            ));
        }
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(SearchError::Config("field names must not be blank".into()));
            }
            if !field.boost.is_finite() || field.boost < 0.0 {
                return Err(SearchError::Config(format!(
                    "boost for field `{}` must be finite and non-negative",
                    field.name
                )));
            }
        }
        if self.oversample_factor == 0 {
            return Err(SearchError::Config(
                "oversample_factor must be greater than 0".into(),
            ));
        }
        if self.retrieval_timeout_ms == 0 {
            return Err(SearchError::Config(
                "retrieval_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.default_top_k == 0 {
            return Err(SearchError::Config(
                "default_top_k must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Raw hits to request from the store for a given `top_k`.
    pub fn oversample_limit(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.oversample_factor)
    }
}

//! Tunable options for one `Aggregator::analyze` run.
//!
//! Everything an embedding application can set without touching analyzer
//! internals. No file-based loader lives here — the core exposes no CLI or
//! filesystem layout — but every type is `Serialize`/`Deserialize` so a
//! caller can load it from TOML/JSON/env on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options passed to the aggregator for a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerOptions {
    /// Minimum site count a pattern must reach to survive filtering.
    pub min_occurrences: usize,

    /// Whether patterns retain a bounded sample of observed raw values.
    pub include_examples: bool,

    /// Cap on the number of example values kept per pattern. Defaults to 5,
    /// overridable here.
    pub max_examples: usize,

    /// Whether the semantic analyzer filters naming-convention outliers.
    pub semantic_filtering: bool,

    /// Whether the aggregator computes `PlatformDiscriminationSummary`.
    pub focus_platform_discrimination: bool,

    /// Inclusive date range for the preprocessor's record filter.
    pub date_range: Option<DateRange>,

    /// Tunable scoring constants, kept here rather than as magic numbers
    /// scattered through the analyzers.
    pub scoring: ScoringConstants,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            min_occurrences: default_min_occurrences(),
            include_examples: true,
            max_examples: default_max_examples(),
            semantic_filtering: true,
            focus_platform_discrimination: false,
            date_range: None,
            scoring: ScoringConstants::default(),
        }
    }
}

fn default_min_occurrences() -> usize {
    10
}

fn default_max_examples() -> usize {
    5
}

/// Inclusive `[start, end]` date range applied by the preprocessor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let after_start = self.start.map(|s| timestamp >= s).unwrap_or(true);
        let before_end = self.end.map(|e| timestamp <= e).unwrap_or(true);
        after_start && before_end
    }
}

/// Constants used by meta-pattern confidence scoring and similar heuristics
/// that the source material left undocumented.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConstants {
    /// Weight given to raw frequency when scoring a meta-tag pattern's
    /// discovery confidence.
    pub meta_frequency_weight: f64,

    /// Weight given to CMS-variety when scoring a meta-tag pattern's
    /// discovery confidence.
    pub meta_cms_variety_weight: f64,

    /// Minimum mutual information for a co-occurrence pair to be retained.
    pub cooccurrence_mi_threshold: f64,

    /// Minimum conditional probability for a co-occurrence pair to be
    /// retained (alternative to the MI threshold).
    pub cooccurrence_conditional_threshold: f64,

    /// `overallOccurrences` floor above which the bias analyzer uses the
    /// large-corpus platform-specificity formula instead of the
    /// coefficient-of-variation fallback.
    pub specificity_large_corpus_floor: u64,
}

impl Default for ScoringConstants {
    fn default() -> Self {
        Self {
            meta_frequency_weight: 0.5,
            meta_cms_variety_weight: 1.2,
            cooccurrence_mi_threshold: 0.3,
            cooccurrence_conditional_threshold: 0.75,
            specificity_large_corpus_floor: 30,
        }
    }
}

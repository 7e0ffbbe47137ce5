//! `PatternData` and `PlatformDiscrimination`.

use crate::errors::{AnalysisError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// One observed pattern (a header name, a `"{kind}:{key}"` meta tag, or a
/// script-URL family) and its coverage across the corpus.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatternData {
    pub pattern: String,
    pub site_count: usize,
    pub frequency: f64,
    /// Sorted normalized URLs; `.len() == site_count` is an invariant
    /// checked by [`PatternData::validate`].
    pub sites: BTreeSet<String>,
    /// Bounded sample of observed raw values, capped at `max_examples`.
    pub examples: Vec<String>,
    pub platform_discrimination: Option<PlatformDiscrimination>,
}

impl PatternData {
    pub fn new(
        pattern: impl Into<String>,
        sites: BTreeSet<String>,
        total_sites: usize,
        mut examples: Vec<String>,
        max_examples: usize,
    ) -> Self {
        let site_count = sites.len();
        let frequency = if total_sites == 0 {
            0.0
        } else {
            site_count as f64 / total_sites as f64
        };
        examples.truncate(max_examples);
        Self {
            pattern: pattern.into(),
            site_count,
            frequency,
            sites,
            examples,
            platform_discrimination: None,
        }
    }

    /// Checks `site_count == sites.len()` and
    /// `|frequency - site_count/total_sites| < 1e-10`.
    pub fn validate(&self, total_sites: usize) -> Result<()> {
        if self.site_count != self.sites.len() {
            return Err(AnalysisError::invariant_violation(
                self.pattern.clone(),
                format!(
                    "site_count {} != sites.len() {}",
                    self.site_count,
                    self.sites.len()
                ),
            ));
        }
        let expected = if total_sites == 0 {
            0.0
        } else {
            self.site_count as f64 / total_sites as f64
        };
        if (self.frequency - expected).abs() >= 1e-10 {
            return Err(AnalysisError::invariant_violation(
                self.pattern.clone(),
                format!(
                    "frequency {} deviates from site_count/total_sites {}",
                    self.frequency, expected
                ),
            ));
        }
        Ok(())
    }
}

/// Attached to a `PatternData` when platform-discrimination scoring is
/// requested (`AnalyzerOptions::focus_platform_discrimination`).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlatformDiscrimination {
    pub discriminative_score: f64,
    pub platform_specificity: std::collections::BTreeMap<String, f64>,
    pub cross_platform_frequency: std::collections::BTreeMap<String, f64>,
    pub discrimination_metrics: DiscriminationMetrics,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiscriminationMetrics {
    pub entropy: f64,
    pub max_specificity: f64,
    pub target_platform: Option<String>,
    pub is_infrastructure_noise: bool,
}

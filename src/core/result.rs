//! `AnalysisResult<T>`: the shape every analyzer stage returns.

use super::pattern::PatternData;
use crate::config::AnalyzerOptions;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub analyzer_name: String,
    pub analyzed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub patterns_before_filter: usize,
    pub patterns_after_filter: usize,
    pub options: AnalyzerOptions,
}

/// Generic analyzer output: a pattern map plus bookkeeping metadata and an
/// optional analyzer-specific payload (validation metrics, vendor catalog,
/// co-occurrence tables, ...).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult<T> {
    pub patterns: BTreeMap<String, PatternData>,
    pub total_sites: usize,
    pub metadata: AnalysisMetadata,
    pub analyzer_specific: Option<T>,
}

impl<T> AnalysisResult<T> {
    pub fn new(
        analyzer_name: impl Into<String>,
        patterns: BTreeMap<String, PatternData>,
        total_sites: usize,
        patterns_before_filter: usize,
        duration_ms: u64,
        analyzed_at: DateTime<Utc>,
        options: AnalyzerOptions,
        analyzer_specific: Option<T>,
    ) -> Self {
        let patterns_after_filter = patterns.len();
        Self {
            patterns,
            total_sites,
            metadata: AnalysisMetadata {
                analyzer_name: analyzer_name.into(),
                analyzed_at,
                duration_ms,
                patterns_before_filter,
                patterns_after_filter,
                options,
            },
            analyzer_specific,
        }
    }
}

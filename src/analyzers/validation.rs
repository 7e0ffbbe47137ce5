//! Validation stage: runs significance/quality checks over the
//! three basic analyzer results and annotates
//! `PreprocessedData.metadata.validation`.

use crate::config::AnalyzerOptions;
use crate::core::{AnalysisResult, PatternData, QualityMetrics, StatisticalMetrics, ValidationSummary};

pub fn analyze(
    headers: &AnalysisResult<()>,
    meta_tags: &AnalysisResult<()>,
    scripts: &AnalysisResult<()>,
    total_sites: usize,
    options: &AnalyzerOptions,
) -> ValidationSummary {
    let all_patterns: Vec<&PatternData> = headers
        .patterns
        .values()
        .chain(meta_tags.patterns.values())
        .chain(scripts.patterns.values())
        .collect();

    let total = all_patterns.len();
    let mut validated_patterns = std::collections::BTreeSet::new();
    let mut significant = 0usize;

    for pattern in &all_patterns {
        let passes = pattern.validate(total_sites).is_ok()
            && pattern.site_count >= options.min_occurrences
            && pattern.sites.len() == pattern.site_count;
        if passes {
            validated_patterns.insert(pattern.pattern.clone());
        }

        let significance_floor = options.min_occurrences.max(5);
        if pattern.site_count >= significance_floor && (0.0..=1.0).contains(&pattern.frequency) {
            significant += 1;
        }
    }

    let overall_score = if total == 0 {
        1.0
    } else {
        validated_patterns.len() as f64 / total as f64
    };

    ValidationSummary {
        overall_passed: validated_patterns.len() == total,
        quality_metrics: QualityMetrics { overall_score },
        validated_patterns,
        statistical_metrics: StatisticalMetrics {
            significant_patterns: significant,
        },
    }
}

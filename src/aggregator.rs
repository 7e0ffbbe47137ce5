//! The aggregator: runs every stage in dependency order, wires
//! cross-stage data through an [`AnalysisContext`], and assembles the final
//! report.
//!
//! One [`Aggregator`] instance is meant to be held for the lifetime of an
//! embedding application; `analyze` rejects a second concurrent call rather
//! than interleaving two runs against the same preprocessor cache.

use crate::analyzers::bias::{self, BiasReport};
use crate::analyzers::cooccurrence::{self, CooccurrenceData};
use crate::analyzers::{discovery, headers, meta_tags, scripts, semantic, validation, vendor};
use crate::cache::PreprocessorCache;
use crate::config::AnalyzerOptions;
use crate::core::{
    AnalysisContext, AnalysisResult, DiscoveryData, FilteringStats, SemanticData, VendorData,
};
use crate::errors::{AnalysisError, Result};
use crate::observability::{enter_stage, Stage};
use crate::preprocess::{self, LoadOptions};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Serialize, Default)]
pub struct PlatformQualityMetrics {
    pub signal_to_noise_ratio: f64,
    pub platform_coverage_score: f64,
    pub detection_confidence_boost: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PlatformDiscriminationSummary {
    pub total_patterns_analyzed: usize,
    pub discriminatory_patterns: usize,
    pub infrastructure_noise_filtered: usize,
    pub average_discrimination_score: f64,
    pub noise_reduction_percentage: f64,
    pub top_discriminatory_patterns: Vec<String>,
    pub platform_specificity_distribution: BTreeMap<String, f64>,
    pub quality_metrics: PlatformQualityMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedResults {
    pub headers: AnalysisResult<()>,
    pub meta_tags: AnalysisResult<()>,
    pub scripts: AnalysisResult<()>,
    pub vendor: VendorData,
    pub semantic: SemanticData,
    pub discovery: DiscoveryData,
    pub cooccurrence: CooccurrenceData,
    pub bias: BiasReport,
    pub total_sites: usize,
    pub filtering_stats: FilteringStats,
    pub summary: PlatformDiscriminationSummary,
}

fn check_deadline(deadline: Option<Instant>) -> Result<()> {
    if let Some(d) = deadline {
        if Instant::now() >= d {
            return Err(AnalysisError::cancelled());
        }
    }
    Ok(())
}

fn summarize(headers: &AnalysisResult<()>, options: &AnalyzerOptions) -> PlatformDiscriminationSummary {
    if !options.focus_platform_discrimination {
        return PlatformDiscriminationSummary::default();
    }

    let total_patterns_analyzed = headers.patterns.len();
    let scored: Vec<(&String, &crate::core::PlatformDiscrimination)> = headers
        .patterns
        .iter()
        .filter_map(|(name, pattern)| pattern.platform_discrimination.as_ref().map(|d| (name, d)))
        .collect();

    let discriminatory_patterns = scored.iter().filter(|(_, d)| d.discriminative_score > 0.3).count();
    let infrastructure_noise_filtered = scored
        .iter()
        .filter(|(_, d)| d.discrimination_metrics.is_infrastructure_noise)
        .count();

    let average_discrimination_score = if scored.is_empty() {
        0.0
    } else {
        scored.iter().map(|(_, d)| d.discriminative_score).sum::<f64>() / scored.len() as f64
    };

    let noise_reduction_percentage = if total_patterns_analyzed == 0 {
        0.0
    } else {
        infrastructure_noise_filtered as f64 / total_patterns_analyzed as f64 * 100.0
    };

    let mut ranked = scored.clone();
    ranked.sort_by(|a, b| {
        b.1.discriminative_score
            .partial_cmp(&a.1.discriminative_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    let top_discriminatory_patterns: Vec<String> = ranked.into_iter().take(10).map(|(name, _)| name.clone()).collect();

    let mut per_cms_sum: BTreeMap<String, f64> = BTreeMap::new();
    let mut per_cms_count: BTreeMap<String, usize> = BTreeMap::new();
    for (_, d) in &scored {
        for (cms, specificity) in &d.platform_specificity {
            *per_cms_sum.entry(cms.clone()).or_insert(0.0) += specificity;
            *per_cms_count.entry(cms.clone()).or_insert(0) += 1;
        }
    }
    let platform_specificity_distribution: BTreeMap<String, f64> = per_cms_sum
        .into_iter()
        .map(|(cms, sum)| {
            let count = per_cms_count[&cms] as f64;
            (cms, sum / count)
        })
        .collect();

    let highly_specific_platforms = platform_specificity_distribution.values().filter(|v| **v >= 0.7).count();
    let quality_metrics = PlatformQualityMetrics {
        signal_to_noise_ratio: discriminatory_patterns as f64 / infrastructure_noise_filtered.max(1) as f64,
        platform_coverage_score: (highly_specific_platforms as f64 / 3.0).min(1.0),
        detection_confidence_boost: 0.5 * average_discrimination_score,
    };

    PlatformDiscriminationSummary {
        total_patterns_analyzed,
        discriminatory_patterns,
        infrastructure_noise_filtered,
        average_discrimination_score,
        noise_reduction_percentage,
        top_discriminatory_patterns,
        platform_specificity_distribution,
        quality_metrics,
    }
}

/// Drives every stage of the pipeline in dependency order.
pub struct Aggregator {
    cache: PreprocessorCache,
    running: Arc<AtomicBool>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            cache: PreprocessorCache::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_cache(cache: PreprocessorCache) -> Self {
        Self {
            cache,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn analyze(
        &self,
        source: &Path,
        options: &AnalyzerOptions,
        force_reload: bool,
        deadline: Option<Instant>,
    ) -> Result<AggregatedResults> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AnalysisError::load("analysis already in progress on this aggregator"));
        }
        let _guard = RunGuard { running: self.running.clone() };
        self.run(source, options, force_reload, deadline)
    }

    fn run(
        &self,
        source: &Path,
        options: &AnalyzerOptions,
        force_reload: bool,
        deadline: Option<Instant>,
    ) -> Result<AggregatedResults> {
        let load_options = LoadOptions {
            date_range: options.date_range.clone(),
            force_reload,
        };
        let data = preprocess::load(source, &load_options, &self.cache)?;
        check_deadline(deadline)?;

        let headers_result = {
            let _stage = enter_stage(Stage::Headers);
            headers::analyze(&data, options)
        };
        let meta_tags_result = {
            let _stage = enter_stage(Stage::MetaTags);
            meta_tags::analyze(&data, options)
        };
        let scripts_result = {
            let _stage = enter_stage(Stage::Scripts);
            scripts::analyze(&data, options)
        };
        check_deadline(deadline)?;

        let mut data = data;
        {
            let _stage = enter_stage(Stage::Validation);
            let validation = validation::analyze(&headers_result, &meta_tags_result, &scripts_result, data.total_sites, options);
            data.metadata.validation = Some(validation);
        }

        let mut context = AnalysisContext::new();
        {
            let _stage = enter_stage(Stage::Vendor);
            let vendor_data = vendor::analyze(&headers_result, &meta_tags_result, &scripts_result, data.total_sites);
            context.set_vendor(vendor_data);
        }
        check_deadline(deadline)?;

        {
            let _stage = enter_stage(Stage::Semantic);
            let semantic_data = semantic::analyze(&headers_result, context.require_vendor());
            context.set_semantic(semantic_data);
        }

        let site_cms = data.site_cms_map();
        {
            let _stage = enter_stage(Stage::Discovery);
            let discovery_data = discovery::analyze(
                &headers_result,
                context.require_semantic(),
                context.require_vendor(),
                &site_cms,
                data.total_sites,
                options,
            );
            context.set_discovery(discovery_data);
        }
        check_deadline(deadline)?;

        let cooccurrence_data = {
            let _stage = enter_stage(Stage::Cooccurrence);
            cooccurrence::analyze(
                &headers_result,
                context.require_vendor(),
                &site_cms,
                &data.site_index,
                data.total_sites,
                options,
                move || deadline.map(|d| Instant::now() >= d).unwrap_or(false),
            )?
        };
        check_deadline(deadline)?;

        let bias_report = {
            let _stage = enter_stage(Stage::Bias);
            bias::analyze(&data, &headers_result, options)
        };

        let summary = {
            let _stage = enter_stage(Stage::Summarize);
            summarize(&headers_result, options)
        };

        info!(
            total_sites = data.total_sites,
            patterns = headers_result.patterns.len(),
            "analysis complete"
        );

        Ok(AggregatedResults {
            headers: headers_result,
            meta_tags: meta_tags_result,
            scripts: scripts_result,
            vendor: context.vendor.expect("vendor set during aggregation"),
            semantic: context.semantic.expect("semantic set during aggregation"),
            discovery: context.discovery.expect("discovery set during aggregation"),
            cooccurrence: cooccurrence_data,
            bias: bias_report,
            total_sites: data.total_sites,
            filtering_stats: data.filtering_stats,
            summary,
        })
    }
}

struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const RECORD: &str = r#"{
        "url": "https://example.com",
        "timestamp": "2024-06-15T00:00:00Z",
        "httpHeaders": {"server": "nginx", "x-pingback": "https://example.com/xmlrpc.php"},
        "metaTags": [{"name": "generator", "content": "WordPress 6.2"}],
        "scripts": [{"src": "/wp-content/themes/t/a.js"}],
        "detectionResults": [{"cms": "WordPress", "confidence": 0.9}]
    }"#;

    #[test]
    fn end_to_end_run_over_a_tiny_corpus_succeeds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.json");
        std::fs::write(&path, RECORD).unwrap();

        let aggregator = Aggregator::new();
        let options = AnalyzerOptions {
            min_occurrences: 1,
            ..Default::default()
        };
        let results = aggregator.analyze(&path, &options, false, None).unwrap();
        assert_eq!(results.total_sites, 1);
        assert!(results.headers.patterns.contains_key("server"));
        assert_eq!(results.vendor.vendors_by_pattern["x-pingback"], "WordPress");
    }

    #[test]
    fn concurrent_analyze_calls_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.json");
        std::fs::write(&path, RECORD).unwrap();

        let aggregator = Aggregator::new();
        aggregator.running.store(true, Ordering::SeqCst);
        let err = aggregator
            .analyze(&path, &AnalyzerOptions::default(), false, None)
            .unwrap_err();
        assert_eq!(err.category(), "Load");
        aggregator.running.store(false, Ordering::SeqCst);
    }

    #[test]
    fn empty_corpus_propagates_as_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        std::fs::write(&path, "").unwrap();

        let aggregator = Aggregator::new();
        let err = aggregator
            .analyze(&path, &AnalyzerOptions::default(), false, None)
            .unwrap_err();
        assert_eq!(err.category(), "EmptyCorpus");
    }
}

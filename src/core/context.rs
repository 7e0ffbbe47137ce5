//! Cross-stage data injected into `PreprocessedData` as later analyzers run.
//! `AnalysisContext` is passed by reference and populated progressively by
//! the aggregator; each analyzer declares the keys it requires, and the
//! aggregator asserts presence before invoking analyze.
//!
//! The shapes here are owned by `core` rather than by the analyzers that
//! populate them, since both the vendor/semantic/discovery analyzers and the
//! later bias/co-occurrence analyzers need to agree on them without the
//! later analyzers depending on the earlier ones' modules.

use crate::classifier::HeaderCategory;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Produced by the validation stage: runs significance/quality
/// checks over the basic analyzers' results and is attached to
/// `PreprocessedData.metadata.validation`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ValidationSummary {
    pub overall_passed: bool,
    pub quality_metrics: QualityMetrics,
    /// Pattern keys (across headers/meta/scripts) that pass the per-pattern
    /// test: `siteCount >= minOccurrences`, `sites.size == siteCount`,
    /// frequency within tolerance.
    pub validated_patterns: BTreeSet<String>,
    pub statistical_metrics: StatisticalMetrics,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct QualityMetrics {
    pub overall_score: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct StatisticalMetrics {
    pub significant_patterns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorStat {
    pub site_count: usize,
    pub coverage: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct VendorSummary {
    pub total_vendors_detected: usize,
    pub high_confidence_vendors: usize,
    pub technology_categories: Vec<String>,
}

/// Required key: `"vendor"`. Populated by the vendor analyzer,
/// consumed by pattern discovery's emerging-vendor clustering and by the
/// bias analyzer's per-header correlation labels.
#[derive(Debug, Clone, Serialize, Default)]
pub struct VendorData {
    /// pattern key (header name or `"{kind}:{key}"`) -> vendor name.
    pub vendors_by_pattern: BTreeMap<String, String>,
    pub patterns_by_vendor: BTreeMap<String, BTreeSet<String>>,
    pub vendor_stats: BTreeMap<String, VendorStat>,
    pub summary: VendorSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    Kebab,
    Snake,
    Camel,
    Upper,
    Mixed,
    NonStandard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    Standard,
    VendorSpecific,
    PlatformSpecific,
    Custom,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderSemanticAnalysis {
    pub header_name: String,
    pub category: HeaderCategory,
    pub naming_convention: NamingConvention,
    pub semantic_words: Vec<String>,
    pub pattern_type: PatternType,
    pub hierarchy_level: usize,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SemanticInsights {
    pub category_distribution: BTreeMap<String, usize>,
    pub vendor_distribution: BTreeMap<String, usize>,
    pub naming_conventions: BTreeMap<String, usize>,
    pub pattern_types: BTreeMap<String, usize>,
    pub top_vendors: Vec<String>,
    pub top_categories: Vec<String>,
}

/// Required key: `"semantic"`. Populated by the semantic analyzer,
/// consumed by pattern discovery's anomaly detection and by the bias
/// analyzer when deciding whether a header is infrastructure noise.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SemanticData {
    pub headers: BTreeMap<String, HeaderSemanticAnalysis>,
    pub insights: SemanticInsights,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderFamily {
    pub family_key: String,
    pub kind: FamilyKind,
    pub members: BTreeSet<String>,
    pub sites: BTreeSet<String>,
    pub frequency: f64,
    /// First K member header names, sorted by descending site count then
    /// lexically, case-normalized (dedup is case-insensitive).
    pub examples: Vec<String>,
    pub confidence: f64,
    pub potential_vendor: Option<String>,
    /// CMS name -> share of this family's site-occurrences attributable to
    /// that CMS.
    pub cms_correlation: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyKind {
    Prefix,
    Suffix,
    Contains,
    Regex,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmergingVendor {
    pub common_prefix: String,
    pub naming_convention: NamingConvention,
    pub member_patterns: BTreeSet<String>,
    pub sites: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticAnomaly {
    pub header_name: String,
    pub expected_category: HeaderCategory,
    pub actual_category: HeaderCategory,
    pub confidence: f64,
    pub reason: String,
}

/// Required key: `"discovery"`. Populated by pattern discovery,
/// consumed by the bias analyzer's warning generation (an emerging vendor
/// with no CMS correlation yet is surfaced as a bias blind spot).
#[derive(Debug, Clone, Serialize, Default)]
pub struct DiscoveryData {
    pub families: Vec<HeaderFamily>,
    pub emerging_vendors: Vec<EmergingVendor>,
    pub semantic_anomalies: Vec<SemanticAnomaly>,
    /// Discovery is capped at 50 patterns; how many were dropped
    /// once the cap was hit.
    pub truncated_count: usize,
}

/// Progressively populated as the aggregator runs later stages. Each
/// `Option` starts `None` and is set exactly once by its owning analyzer.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub vendor: Option<VendorData>,
    pub semantic: Option<SemanticData>,
    pub discovery: Option<DiscoveryData>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_vendor(&mut self, data: VendorData) {
        self.vendor = Some(data);
    }

    pub fn set_semantic(&mut self, data: SemanticData) {
        self.semantic = Some(data);
    }

    pub fn set_discovery(&mut self, data: DiscoveryData) {
        self.discovery = Some(data);
    }

    /// Asserts a required key is present before a dependent analyzer runs.
    /// Panics with the missing key name: a missing required key is a driver
    /// wiring bug, never a user-facing condition.
    pub fn require_vendor(&self) -> &VendorData {
        self.vendor
            .as_ref()
            .expect("analysis context missing required key: vendor")
    }

    pub fn require_semantic(&self) -> &SemanticData {
        self.semantic
            .as_ref()
            .expect("analysis context missing required key: semantic")
    }

    pub fn require_discovery(&self) -> &DiscoveryData {
        self.discovery
            .as_ref()
            .expect("analysis context missing required key: discovery")
    }
}

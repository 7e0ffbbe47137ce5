//! Bias analyzer: how concentrated the corpus is on a handful of
//! platforms, and how much that concentration should discount each header's
//! apparent signal.

use crate::classifier::{self, FilterRecommendation};
use crate::config::AnalyzerOptions;
use crate::core::{AnalysisResult, PlatformDiscrimination, PreprocessedData};
use crate::discrimination;
use crate::stats::hhi_normalized;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Header names a site carries that hint at CDN fronting, used to rebucket
/// undetected sites rather than leave them all lumped into `Unknown`.
const CDN_HEADER_HINTS: &[&str] = &["cf-ray", "cf-cache-status", "x-amz-cf-id", "x-served-by", "fastly-debug-digest"];

/// Header names that hint at a managed/enterprise hosting stack rather than
/// a self-hosted CMS.
const ENTERPRISE_HEADER_HINTS: &[&str] = &["x-sucuri-id", "x-enterprise-id", "x-akamai-transformed", "x-edge-location"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmsBucket {
    pub site_count: usize,
    pub percentage: f64,
}

/// `P(header|cms)` for one CMS, plus the raw counts it was derived from.
#[derive(Debug, Clone, Serialize)]
pub struct PerCmsFrequency {
    pub occurrences: usize,
    pub total: usize,
    pub frequency: f64,
}

/// `P(cms|header)` for one CMS, plus the raw count it was derived from.
#[derive(Debug, Clone, Serialize)]
pub struct CmsGivenHeader {
    pub count: usize,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderCorrelation {
    pub header_name: String,
    pub overall_frequency: f64,
    pub overall_occurrences: usize,
    pub per_cms_frequency: BTreeMap<String, PerCmsFrequency>,
    pub cms_given_header: BTreeMap<String, CmsGivenHeader>,
    pub bias_adjusted_frequency: f64,
    pub platform_discrimination: PlatformDiscrimination,
    pub confidence: BiasConfidence,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasReport {
    pub cms_distribution: BTreeMap<String, CmsBucket>,
    pub concentration_score: f64,
    pub warnings: Vec<String>,
    pub header_correlations: Vec<HeaderCorrelation>,
}

fn matching_hint_count(data: &PreprocessedData, url: &str, hints: &[&str]) -> usize {
    data.sites
        .get(url)
        .map(|site| hints.iter().filter(|h| site.has_header(h)).count())
        .unwrap_or(0)
}

/// Rebuckets undetected sites into `CDN`/`Enterprise` when at least two
/// matching header hints are present, rather than leaving every one of them
/// indistinguishable inside `Unknown`.
fn bucketed_cms_distribution(data: &PreprocessedData) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (url, site) in &data.sites {
        let label = if site.cms != crate::core::UNKNOWN_CMS {
            site.cms.clone()
        } else {
            let cdn_hits = matching_hint_count(data, url, CDN_HEADER_HINTS);
            let enterprise_hits = matching_hint_count(data, url, ENTERPRISE_HEADER_HINTS);
            if cdn_hits >= 2 && cdn_hits >= enterprise_hits {
                "CDN".to_string()
            } else if enterprise_hits >= 2 {
                "Enterprise".to_string()
            } else {
                crate::core::UNKNOWN_CMS.to_string()
            }
        };
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

fn build_warnings(cms_distribution: &BTreeMap<String, CmsBucket>, concentration: f64, total_sites: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    if concentration > 0.6 {
        warnings.push(format!("corpus concentration score {concentration:.2} exceeds 0.6"));
    }
    for (cms, bucket) in cms_distribution {
        if bucket.percentage > 60.0 {
            warnings.push(format!("{cms} represents {:.1}% of the corpus", bucket.percentage));
        }
    }
    let distinct_real_cms = cms_distribution
        .keys()
        .filter(|cms| !discrimination::SYNTHETIC_CMS_BUCKETS.contains(&cms.as_str()) && cms.as_str() != crate::core::UNKNOWN_CMS)
        .count();
    if distinct_real_cms <= 2 {
        warnings.push(format!("only {distinct_real_cms} distinct CMS platforms detected"));
    }
    if total_sites > 0 {
        if let Some(unknown) = cms_distribution.get(crate::core::UNKNOWN_CMS) {
            if unknown.percentage > 30.0 {
                warnings.push(format!("{:.1}% of sites have no CMS detection", unknown.percentage));
            }
        }
    }
    warnings
}

/// Every site carrying `name` in either its mainpage or robots.txt headers.
fn sites_with_header(data: &PreprocessedData, name: &str) -> BTreeSet<String> {
    data.sites
        .iter()
        .filter(|(_, site)| site.has_header(name))
        .map(|(url, _)| url.clone())
        .collect()
}

/// Raw per-CMS occurrence counts for a header's (unioned) site set.
fn count_in_cms(header_sites: &BTreeSet<String>, site_cms: &BTreeMap<String, String>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for site in header_sites {
        if let Some(cms) = site_cms.get(site) {
            *counts.entry(cms.clone()).or_insert(0) += 1;
        }
    }
    counts
}

fn per_cms_frequency(
    counts: &BTreeMap<String, usize>,
    cms_totals: &BTreeMap<String, usize>,
) -> BTreeMap<String, PerCmsFrequency> {
    cms_totals
        .iter()
        .map(|(cms, &total)| {
            let occurrences = *counts.get(cms).unwrap_or(&0);
            let frequency = if total == 0 { 0.0 } else { occurrences as f64 / total as f64 };
            (
                cms.clone(),
                PerCmsFrequency {
                    occurrences,
                    total,
                    frequency,
                },
            )
        })
        .collect()
}

fn cms_given_header(counts: &BTreeMap<String, usize>, overall_occurrences: usize) -> BTreeMap<String, CmsGivenHeader> {
    counts
        .iter()
        .map(|(cms, &count)| {
            let probability = if overall_occurrences == 0 {
                0.0
            } else {
                count as f64 / overall_occurrences as f64
            };
            (cms.clone(), CmsGivenHeader { count, probability })
        })
        .collect()
}

/// Equal-weight average of `P(header|cms)` over CMS whose corpus share
/// exceeds 5% and that aren't `Unknown`; falls back to the simple mean of
/// `P(header|cms)` across all CMS when no CMS qualifies.
fn bias_adjusted_frequency(
    per_cms_frequency: &BTreeMap<String, PerCmsFrequency>,
    cms_distribution: &BTreeMap<String, CmsBucket>,
) -> f64 {
    let mean = |values: Vec<f64>| -> f64 {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };

    let eligible: Vec<f64> = per_cms_frequency
        .iter()
        .filter(|(cms, _)| {
            cms.as_str() != crate::core::UNKNOWN_CMS
                && cms_distribution.get(cms.as_str()).map(|b| b.percentage > 5.0).unwrap_or(false)
        })
        .map(|(_, v)| v.frequency)
        .collect();

    if eligible.is_empty() {
        mean(per_cms_frequency.values().map(|v| v.frequency).collect())
    } else {
        mean(eligible)
    }
}

/// `high` by default; demoted to `low` for a platform-specific header, or
/// when the top detected CMS dominates both the header and the corpus; to
/// `medium` for a rare header with moderate specificity.
fn confidence_and_warning(
    discrimination: &PlatformDiscrimination,
    overall_frequency: f64,
    per_cms_frequency: &BTreeMap<String, PerCmsFrequency>,
    cms_distribution: &BTreeMap<String, CmsBucket>,
) -> (BiasConfidence, Option<String>) {
    let specificity = discrimination.discriminative_score;

    if specificity > 0.7 {
        return (BiasConfidence::Low, Some("platform-specific".to_string()));
    }

    if let Some(top_cms) = &discrimination.discrimination_metrics.target_platform {
        let p_header_given_top = per_cms_frequency.get(top_cms).map(|v| v.frequency).unwrap_or(0.0);
        let top_percentage = cms_distribution.get(top_cms).map(|b| b.percentage).unwrap_or(0.0);
        if p_header_given_top > 0.8 && top_percentage > 50.0 {
            return (BiasConfidence::Low, Some(format!("high correlation with {top_cms}")));
        }
    }

    if overall_frequency < 0.1 && specificity > 0.5 {
        return (BiasConfidence::Medium, Some("low frequency with high concentration".to_string()));
    }

    (BiasConfidence::High, None)
}

pub fn analyze(data: &PreprocessedData, headers: &AnalysisResult<()>, options: &AnalyzerOptions) -> BiasReport {
    let total_sites = data.total_sites;
    let bucketed = bucketed_cms_distribution(data);

    let cms_distribution: BTreeMap<String, CmsBucket> = bucketed
        .into_iter()
        .map(|(cms, count)| {
            let percentage = if total_sites == 0 {
                0.0
            } else {
                count as f64 / total_sites as f64 * 100.0
            };
            (cms, CmsBucket { site_count: count, percentage })
        })
        .collect();

    let percentages: Vec<f64> = cms_distribution.values().map(|b| b.percentage).collect();
    let concentration_score = hhi_normalized(&percentages);
    let warnings = build_warnings(&cms_distribution, concentration_score, total_sites);

    let site_cms = data.site_cms_map();
    let cms_totals = data.cms_totals();
    let floor = options.scoring.specificity_large_corpus_floor;

    let mut header_correlations = Vec::new();
    for name in headers.patterns.keys() {
        let classification = classifier::classify(name);
        if classification.filter_recommendation == FilterRecommendation::AlwaysFilter {
            continue;
        }
        let is_infrastructure_noise = classification.filter_recommendation != FilterRecommendation::NeverFilter
            && matches!(classification.category, crate::classifier::HeaderCategory::Infrastructure | crate::classifier::HeaderCategory::Generic);

        let header_sites = sites_with_header(data, name);
        let overall_occurrences = header_sites.len();
        let overall_frequency = if total_sites == 0 {
            0.0
        } else {
            overall_occurrences as f64 / total_sites as f64
        };

        let discrimination = discrimination::compute(
            &header_sites,
            &site_cms,
            &cms_totals,
            total_sites,
            floor,
            is_infrastructure_noise,
        );

        let counts = count_in_cms(&header_sites, &site_cms);
        let per_cms_frequency = per_cms_frequency(&counts, &cms_totals);
        let cms_given_header = cms_given_header(&counts, overall_occurrences);
        let bias_adjusted_frequency = bias_adjusted_frequency(&per_cms_frequency, &cms_distribution);
        let (confidence, warning) = confidence_and_warning(&discrimination, overall_frequency, &per_cms_frequency, &cms_distribution);

        header_correlations.push(HeaderCorrelation {
            header_name: name.clone(),
            overall_frequency,
            overall_occurrences,
            per_cms_frequency,
            cms_given_header,
            bias_adjusted_frequency,
            platform_discrimination: discrimination,
            confidence,
            warning,
        });
    }
    header_correlations.sort_by(|a, b| a.header_name.cmp(&b.header_name));

    BiasReport {
        cms_distribution,
        concentration_score,
        warnings,
        header_correlations,
    }
}

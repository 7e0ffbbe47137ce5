//! Platform-discrimination scoring, shared by the basic pattern analyzers
//! and the bias analyzer's per-header correlation.

use crate::core::{DiscriminationMetrics, PlatformDiscrimination};
use crate::stats::coefficient_of_variation;
use std::collections::{BTreeMap, BTreeSet};

/// CMS buckets excluded from "dominant platform" selection: every synthetic
/// bucket, not just `Unknown`.
pub const SYNTHETIC_CMS_BUCKETS: &[&str] = &["Unknown", "Enterprise", "CDN"];

fn is_synthetic(cms: &str) -> bool {
    SYNTHETIC_CMS_BUCKETS.contains(&cms)
}

fn shannon_entropy_bits(frequencies: &BTreeMap<String, f64>) -> f64 {
    let total: f64 = frequencies.values().sum();
    if total <= 0.0 {
        return 0.0;
    }
    frequencies
        .values()
        .filter(|f| **f > 0.0)
        .map(|f| {
            let p = f / total;
            -p * p.log2()
        })
        .sum()
}

/// Compute `PlatformDiscrimination` for one pattern, given the set of
/// normalized site URLs carrying it, the per-site CMS label, and the total
/// site count per CMS across the whole corpus.
pub fn compute(
    pattern_sites: &BTreeSet<String>,
    site_cms: &BTreeMap<String, String>,
    cms_totals: &BTreeMap<String, usize>,
    total_sites: usize,
    large_corpus_floor: u64,
    is_infrastructure_noise: bool,
) -> PlatformDiscrimination {
    let occurrences = pattern_sites.len();
    let overall_frequency = if total_sites == 0 {
        0.0
    } else {
        occurrences as f64 / total_sites as f64
    };

    let mut count_in_cms: BTreeMap<String, usize> = BTreeMap::new();
    for site in pattern_sites {
        if let Some(cms) = site_cms.get(site) {
            *count_in_cms.entry(cms.clone()).or_insert(0) += 1;
        }
    }

    let mut cross_platform_frequency = BTreeMap::new();
    let mut p_cms_given_header = BTreeMap::new();
    for (cms, &cms_total) in cms_totals {
        let in_cms = *count_in_cms.get(cms).unwrap_or(&0);
        let p_header_given_cms = if cms_total == 0 {
            0.0
        } else {
            in_cms as f64 / cms_total as f64
        };
        cross_platform_frequency.insert(cms.clone(), p_header_given_cms);
        let p_cms = if occurrences == 0 {
            0.0
        } else {
            in_cms as f64 / occurrences as f64
        };
        p_cms_given_header.insert(cms.clone(), p_cms);
    }

    let top = p_cms_given_header
        .iter()
        .filter(|(cms, _)| !is_synthetic(cms))
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));

    let specificity_of = |cms: &str| -> f64 {
        let p_top = *p_cms_given_header.get(cms).unwrap_or(&0.0);
        if occurrences as u64 >= large_corpus_floor {
            if p_top < 0.4 {
                return 0.0;
            }
            let concentration = (2.0 * p_top).min(1.0);
            let sample_size = (((occurrences as f64).log10()) / 100f64.log10()).min(1.0);
            let p_header_given_top = *cross_platform_frequency.get(cms).unwrap_or(&0.0);
            let background_contrast = (p_header_given_top / overall_frequency.max(1e-3) / 2.0).min(1.0);
            (0.5 * concentration + 0.3 * sample_size + 0.2 * background_contrast).clamp(0.0, 1.0)
        } else {
            let values: Vec<f64> = cross_platform_frequency.values().copied().collect();
            coefficient_of_variation(&values)
        }
    };

    let mut platform_specificity = BTreeMap::new();
    for cms in cms_totals.keys() {
        platform_specificity.insert(cms.clone(), specificity_of(cms));
    }

    let (target_platform, max_specificity) = match top {
        Some((cms, _)) => (Some(cms.clone()), specificity_of(cms)),
        None => (None, 0.0),
    };

    let entropy = shannon_entropy_bits(&cross_platform_frequency);

    PlatformDiscrimination {
        discriminative_score: max_specificity,
        platform_specificity,
        cross_platform_frequency,
        discrimination_metrics: DiscriminationMetrics {
            entropy,
            max_specificity,
            target_platform,
            is_infrastructure_noise,
        },
    }
}

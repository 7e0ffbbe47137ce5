//! Co-occurrence analyzer: which header pairs tend to appear
//! together, which headers form a vendor's "signature," and which header
//! combinations best discriminate a CMS.
//!
//! Site membership is intersected through interned [`SiteId`]s rather than
//! string sets: a sorted `Vec<SiteId>` merge-join is linear instead
//! of hashing strings on every pair.

use crate::config::AnalyzerOptions;
use crate::core::{AnalysisResult, SiteIndex, VendorData};
use crate::errors::{AnalysisError, Result};
use crate::stats;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Checked every this-many pair evaluations in the O(n²) header-pair loop, so
/// a caller's deadline/cancellation token is honored on a large corpus
/// without per-iteration overhead.
const CANCEL_CHECK_INTERVAL: u64 = 65_536;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CooccurrencePair {
    pub header_a: String,
    pub header_b: String,
    pub co_occurrence_count: usize,
    pub mutual_information: f64,
    pub conditional_probability: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TechnologySignature {
    pub vendor: String,
    pub required_headers: Vec<String>,
    pub optional_headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlatformCombination {
    pub cms: String,
    pub headers: BTreeSet<String>,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CooccurrenceData {
    pub pairs: Vec<CooccurrencePair>,
    pub technology_signatures: Vec<TechnologySignature>,
    pub platform_combinations: Vec<PlatformCombination>,
}

fn sorted_site_ids(sites: &BTreeSet<String>, index: &SiteIndex) -> Vec<u32> {
    let mut ids: Vec<u32> = sites.iter().filter_map(|url| index.id_of(url).map(|id| id.0)).collect();
    ids.sort_unstable();
    ids
}

fn intersection_len(a: &[u32], b: &[u32]) -> usize {
    let (mut i, mut j, mut count) = (0usize, 0usize, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    count
}

fn compute_pairs(
    headers: &AnalysisResult<()>,
    site_index: &SiteIndex,
    total_sites: usize,
    options: &AnalyzerOptions,
    should_cancel: &mut impl FnMut() -> bool,
) -> Result<Vec<CooccurrencePair>> {
    let names: Vec<&String> = headers.patterns.keys().collect();
    let ids: BTreeMap<&String, Vec<u32>> = names
        .iter()
        .map(|name| (*name, sorted_site_ids(&headers.patterns[*name].sites, site_index)))
        .collect();

    let mut pairs = Vec::new();
    let mut iterations: u64 = 0;

    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            iterations += 1;
            if iterations % CANCEL_CHECK_INTERVAL == 0 && should_cancel() {
                return Err(AnalysisError::cancelled());
            }

            let a_ids = &ids[names[i]];
            let b_ids = &ids[names[j]];
            let both = intersection_len(a_ids, b_ids) as u64;
            let len_a = a_ids.len() as u64;
            let len_b = b_ids.len() as u64;
            let only_a = len_a - both;
            let only_b = len_b - both;
            let union = both + only_a + only_b;
            let neither = (total_sites as u64).saturating_sub(union);

            let mi = stats::mutual_information_2x2(both, only_a, only_b, neither);
            let conditional_probability = if len_a == 0 || len_b == 0 {
                0.0
            } else {
                (both as f64 / len_a as f64).max(both as f64 / len_b as f64)
            };

            if both == 0 {
                continue;
            }
            if mi >= options.scoring.cooccurrence_mi_threshold
                || conditional_probability >= options.scoring.cooccurrence_conditional_threshold
            {
                pairs.push(CooccurrencePair {
                    header_a: names[i].clone(),
                    header_b: names[j].clone(),
                    co_occurrence_count: both as usize,
                    mutual_information: mi,
                    conditional_probability,
                });
            }
        }
    }

    pairs.sort_by(|a, b| {
        b.mutual_information
            .partial_cmp(&a.mutual_information)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.header_a.cmp(&b.header_a))
            .then_with(|| a.header_b.cmp(&b.header_b))
    });
    Ok(pairs)
}

fn compute_technology_signatures(headers: &AnalysisResult<()>, vendor: &VendorData) -> Vec<TechnologySignature> {
    let mut signatures = Vec::new();
    for (vendor_name, patterns) in &vendor.patterns_by_vendor {
        let counts: Vec<(&String, usize)> = patterns
            .iter()
            .filter_map(|p| headers.patterns.get(p).map(|pd| (p, pd.site_count)))
            .collect();
        let Some(&max_count) = counts.iter().map(|(_, c)| c).max() else {
            continue;
        };
        if max_count == 0 {
            continue;
        }

        let mut required = Vec::new();
        let mut optional = Vec::new();
        for (pattern, count) in counts {
            let relative = count as f64 / max_count as f64;
            if relative >= 0.9 {
                required.push(pattern.clone());
            } else if relative >= 0.5 {
                optional.push(pattern.clone());
            }
        }
        required.sort();
        optional.sort();
        if !required.is_empty() || !optional.is_empty() {
            signatures.push(TechnologySignature {
                vendor: vendor_name.clone(),
                required_headers: required,
                optional_headers: optional,
            });
        }
    }
    signatures.sort_by(|a, b| a.vendor.cmp(&b.vendor));
    signatures
}

fn compute_platform_combinations(
    headers: &AnalysisResult<()>,
    site_cms: &BTreeMap<String, String>,
) -> Vec<PlatformCombination> {
    let mut cms_sites: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (site, cms) in site_cms {
        cms_sites.entry(cms.clone()).or_default().insert(site.clone());
    }

    let mut combinations = Vec::new();
    for (cms, sites) in &cms_sites {
        if sites.is_empty() {
            continue;
        }
        let mut ranked: Vec<(&String, usize)> = headers
            .patterns
            .iter()
            .map(|(name, pattern)| (name, pattern.sites.intersection(sites).count()))
            .filter(|(_, count)| *count > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let top: Vec<&String> = ranked.into_iter().take(8).map(|(name, _)| name).collect();

        let mut best: Vec<(BTreeSet<String>, f64)> = Vec::new();
        for size in 2..=4.min(top.len()) {
            for combo in top.iter().copied().combinations(size) {
                let mut combo_sites: Option<BTreeSet<String>> = None;
                for name in &combo {
                    let member_sites = &headers.patterns[name.as_str()].sites;
                    combo_sites = Some(match combo_sites {
                        None => member_sites.clone(),
                        Some(existing) => existing.intersection(member_sites).cloned().collect(),
                    });
                }
                let Some(combo_sites) = combo_sites else { continue };
                if combo_sites.is_empty() {
                    continue;
                }
                let coverage = combo_sites.intersection(sites).count() as f64 / sites.len() as f64;
                let outside = combo_sites.len() as f64 - combo_sites.intersection(sites).count() as f64;
                let exclusivity = 1.0 - (outside / combo_sites.len() as f64);
                let strength = coverage * exclusivity;
                best.push((combo.iter().map(|s| s.to_string()).collect(), strength));
            }
        }
        best.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (headers_set, strength) in best.into_iter().take(3) {
            combinations.push(PlatformCombination {
                cms: cms.clone(),
                headers: headers_set,
                strength,
            });
        }
    }
    combinations
}

pub fn analyze(
    headers: &AnalysisResult<()>,
    vendor: &VendorData,
    site_cms: &BTreeMap<String, String>,
    site_index: &SiteIndex,
    total_sites: usize,
    options: &AnalyzerOptions,
    mut should_cancel: impl FnMut() -> bool,
) -> Result<CooccurrenceData> {
    let pairs = compute_pairs(headers, site_index, total_sites, options, &mut should_cancel)?;
    let technology_signatures = compute_technology_signatures(headers, vendor);
    let platform_combinations = compute_platform_combinations(headers, site_cms);

    Ok(CooccurrenceData {
        pairs,
        technology_signatures,
        platform_combinations,
    })
}

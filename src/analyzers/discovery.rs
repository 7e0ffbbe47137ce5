//! Pattern discovery: groups observed headers into families by
//! naming shape, clusters unrecognized vendor prefixes, and flags headers
//! whose name implies a different category than the classifier assigned.
//!
//! Capped at 50 families (sorted by confidence, then frequency) so a corpus
//! with a long tail of one-off headers doesn't blow up the report.

use crate::classifier::{self, HeaderCategory};
use crate::config::AnalyzerOptions;
use crate::core::{
    AnalysisResult, DiscoveryData, EmergingVendor, FamilyKind, HeaderFamily, NamingConvention,
    SemanticAnomaly, SemanticData, VendorData,
};
use std::collections::{BTreeMap, BTreeSet};

const MAX_FAMILIES: usize = 50;
const MIN_FAMILY_MEMBERS: usize = 3;

fn segments(name: &str) -> Vec<&str> {
    name.split(['-', '_']).filter(|s| !s.is_empty()).collect()
}

fn naming_convention_of(name: &str) -> NamingConvention {
    if name.contains('-') {
        NamingConvention::Kebab
    } else if name.contains('_') {
        NamingConvention::Snake
    } else if name.chars().any(|c| c.is_ascii_uppercase()) {
        NamingConvention::Camel
    } else {
        NamingConvention::NonStandard
    }
}

struct Grouped<'a> {
    key: String,
    members: BTreeSet<&'a str>,
}

fn group_by<'a>(headers: &'a [String], keyer: impl Fn(&'a str) -> Option<String>) -> Vec<Grouped<'a>> {
    let mut groups: BTreeMap<String, BTreeSet<&'a str>> = BTreeMap::new();
    for name in headers {
        if let Some(key) = keyer(name.as_str()) {
            groups.entry(key).or_default().insert(name.as_str());
        }
    }
    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_FAMILY_MEMBERS)
        .map(|(key, members)| Grouped { key, members })
        .collect()
}

fn build_family(
    family_key: String,
    kind: FamilyKind,
    members: &BTreeSet<&str>,
    headers: &AnalysisResult<()>,
    vendor: &VendorData,
    site_cms: &BTreeMap<String, String>,
    total_sites: usize,
) -> HeaderFamily {
    let mut sites = BTreeSet::new();
    for member in members {
        if let Some(pattern) = headers.patterns.get(*member) {
            sites.extend(pattern.sites.iter().cloned());
        }
    }
    let frequency = if total_sites == 0 {
        0.0
    } else {
        sites.len() as f64 / total_sites as f64
    };

    let mut cms_counts: BTreeMap<String, usize> = BTreeMap::new();
    for site in &sites {
        if let Some(cms) = site_cms.get(site) {
            *cms_counts.entry(cms.clone()).or_insert(0) += 1;
        }
    }
    let cms_correlation: BTreeMap<String, f64> = cms_counts
        .into_iter()
        .map(|(cms, count)| (cms, count as f64 / sites.len().max(1) as f64))
        .collect();

    let mut examples: Vec<String> = members.iter().map(|m| m.to_string()).collect();
    examples.sort_by(|a, b| {
        let a_sites = headers.patterns.get(a.as_str()).map(|p| p.site_count).unwrap_or(0);
        let b_sites = headers.patterns.get(b.as_str()).map(|p| p.site_count).unwrap_or(0);
        b_sites.cmp(&a_sites).then_with(|| a.cmp(b))
    });

    let potential_vendor = members.iter().find_map(|m| vendor.vendors_by_pattern.get(*m).cloned());

    let member_count_score = (members.len() as f64 / 6.0).min(1.0);
    let coverage_score = frequency;
    let confidence = (0.5 * member_count_score + 0.5 * coverage_score).clamp(0.0, 1.0);

    HeaderFamily {
        family_key,
        kind,
        members: members.iter().map(|s| s.to_string()).collect(),
        sites,
        frequency,
        examples,
        confidence,
        potential_vendor,
        cms_correlation,
    }
}

fn detect_emerging_vendors(headers: &AnalysisResult<()>, vendor: &VendorData) -> Vec<EmergingVendor> {
    let mut by_prefix: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for name in headers.patterns.keys() {
        if vendor.vendors_by_pattern.contains_key(name) {
            continue;
        }
        let parts = segments(name);
        if parts.len() < 2 {
            continue;
        }
        by_prefix.entry(parts[0].to_string()).or_default().insert(name.clone());
    }

    by_prefix
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .filter_map(|(prefix, members)| {
            let mut sites = BTreeSet::new();
            for member in &members {
                if let Some(pattern) = headers.patterns.get(member) {
                    sites.extend(pattern.sites.iter().cloned());
                }
            }
            if sites.len() < 2 {
                return None;
            }
            Some(EmergingVendor {
                common_prefix: prefix.clone(),
                naming_convention: naming_convention_of(members.iter().next().unwrap()),
                member_patterns: members,
                sites,
            })
        })
        .collect()
}

const WORD_CATEGORY_HINTS: &[(&str, HeaderCategory)] = &[
    ("cart", HeaderCategory::Ecommerce),
    ("checkout", HeaderCategory::Ecommerce),
    ("order", HeaderCategory::Ecommerce),
    ("session", HeaderCategory::Security),
    ("token", HeaderCategory::Security),
    ("csrf", HeaderCategory::Security),
    ("auth", HeaderCategory::Security),
    ("cache", HeaderCategory::Caching),
    ("cdn", HeaderCategory::Caching),
    ("admin", HeaderCategory::Cms),
    ("theme", HeaderCategory::Cms),
    ("plugin", HeaderCategory::Cms),
];

fn detect_semantic_anomalies(semantic: &SemanticData) -> Vec<SemanticAnomaly> {
    let mut anomalies = Vec::new();
    for analysis in semantic.headers.values() {
        for (word, expected_category) in WORD_CATEGORY_HINTS {
            if *expected_category == analysis.category {
                continue;
            }
            if analysis.semantic_words.iter().any(|w| w == word) {
                anomalies.push(SemanticAnomaly {
                    header_name: analysis.header_name.clone(),
                    expected_category: *expected_category,
                    actual_category: analysis.category,
                    confidence: 0.5,
                    reason: format!(
                        "header name contains '{word}', suggesting {expected_category:?}, but classified as {actual:?}",
                        actual = analysis.category
                    ),
                });
                break;
            }
        }
    }
    anomalies
}

pub fn analyze(
    headers: &AnalysisResult<()>,
    semantic: &SemanticData,
    vendor: &VendorData,
    site_cms: &BTreeMap<String, String>,
    total_sites: usize,
    options: &AnalyzerOptions,
) -> DiscoveryData {
    let names: Vec<String> = headers.patterns.keys().cloned().collect();

    let prefix_groups = group_by(&names, |name| segments(name).first().map(|s| s.to_string()));
    let suffix_groups = group_by(&names, |name| segments(name).last().map(|s| s.to_string()));
    let contains_groups = group_by(&names, |name| {
        let parts = segments(name);
        if parts.len() > 2 {
            Some(parts[1..parts.len() - 1].join("-"))
        } else {
            None
        }
    });

    let mut families = Vec::new();
    for (kind, groups) in [
        (FamilyKind::Prefix, prefix_groups),
        (FamilyKind::Suffix, suffix_groups),
        (FamilyKind::Contains, contains_groups),
    ] {
        for group in groups {
            let family = build_family(
                group.key,
                kind,
                &group.members,
                headers,
                vendor,
                site_cms,
                total_sites,
            );
            if family.sites.len() >= options.min_occurrences {
                families.push(family);
            }
        }
    }

    families.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.frequency.partial_cmp(&a.frequency).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.family_key.cmp(&b.family_key))
    });

    let truncated_count = families.len().saturating_sub(MAX_FAMILIES);
    families.truncate(MAX_FAMILIES);

    DiscoveryData {
        families,
        emerging_vendors: detect_emerging_vendors(headers, vendor),
        semantic_anomalies: detect_semantic_anomalies(semantic),
        truncated_count,
    }
}

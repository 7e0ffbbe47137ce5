//! Vendor analyzer: maps observed header/meta/script patterns to
//! vendors/technologies via (a) the header classifier table, (b) the script
//! URL classifier, (c) meta-value regexes (generator content).

use crate::classifier;
use crate::core::{AnalysisResult, VendorData, VendorStat, VendorSummary};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static GENERATOR_VENDOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(wordpress|drupal|joomla|shopify|wix|squarespace)").unwrap());

fn titlecase_vendor(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "wordpress" => "WordPress".to_string(),
        "drupal" => "Drupal".to_string(),
        "joomla" => "Joomla".to_string(),
        "shopify" => "Shopify".to_string(),
        "wix" => "Wix".to_string(),
        "squarespace" => "Squarespace".to_string(),
        other => other
            .split(['-', '_'])
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn meta_vendor(examples: &[String]) -> Option<String> {
    examples.iter().find_map(|value| {
        GENERATOR_VENDOR
            .captures(value)
            .and_then(|c| c.get(1))
            .map(|m| titlecase_vendor(m.as_str()))
    })
}

fn script_vendor(pattern_key: &str) -> Option<String> {
    if let Some(name) = pattern_key.strip_prefix("library:") {
        return Some(titlecase_vendor(name));
    }
    if let Some(name) = pattern_key.strip_prefix("tracking:") {
        return Some(titlecase_vendor(name));
    }
    None
}

pub fn analyze(
    headers: &AnalysisResult<()>,
    meta_tags: &AnalysisResult<()>,
    scripts: &AnalysisResult<()>,
    total_sites: usize,
) -> VendorData {
    let mut vendors_by_pattern = BTreeMap::new();
    let mut patterns_by_vendor: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut vendor_sites: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    let mut record = |vendor: String, key: &str, sites: &BTreeSet<String>| {
        vendors_by_pattern.insert(key.to_string(), vendor.clone());
        patterns_by_vendor.entry(vendor.clone()).or_default().insert(key.to_string());
        let entry = vendor_sites.entry(vendor).or_default();
        for site in sites {
            entry.insert(site.clone());
        }
    };

    for (key, pattern) in &headers.patterns {
        if let Some(vendor) = classifier::classify(key).vendor {
            record(vendor.to_string(), key, &pattern.sites);
        }
    }
    for (key, pattern) in &meta_tags.patterns {
        if let Some(vendor) = meta_vendor(&pattern.examples) {
            record(vendor, key, &pattern.sites);
        }
    }
    for (key, pattern) in &scripts.patterns {
        if let Some(vendor) = script_vendor(key) {
            record(vendor, key, &pattern.sites);
        }
    }

    let vendor_stats: BTreeMap<String, VendorStat> = vendor_sites
        .iter()
        .map(|(vendor, sites)| {
            let coverage = if total_sites == 0 {
                0.0
            } else {
                sites.len() as f64 / total_sites as f64
            };
            (
                vendor.clone(),
                VendorStat {
                    site_count: sites.len(),
                    coverage,
                },
            )
        })
        .collect();

    let high_confidence_vendors = vendor_stats.values().filter(|s| s.coverage >= 0.1).count();
    let technology_categories: Vec<String> = patterns_by_vendor.keys().cloned().collect();

    VendorData {
        vendors_by_pattern,
        patterns_by_vendor,
        vendor_stats,
        summary: VendorSummary {
            total_vendors_detected: vendor_sites.len(),
            high_confidence_vendors,
            technology_categories,
        },
    }
}

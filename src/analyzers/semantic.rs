//! Semantic analyzer: classifies headers into
//! categories/naming conventions, consuming the vendor injection.

use crate::classifier::{self, HeaderCategory};
use crate::core::{
    AnalysisResult, HeaderSemanticAnalysis, NamingConvention, PatternType, SemanticData,
    SemanticInsights, VendorData,
};
use std::collections::BTreeMap;

fn naming_convention(name: &str) -> NamingConvention {
    let has_hyphen = name.contains('-');
    let has_underscore = name.contains('_');
    let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());

    if has_hyphen && has_underscore {
        NamingConvention::Mixed
    } else if has_hyphen {
        if has_upper {
            NamingConvention::Mixed
        } else {
            NamingConvention::Kebab
        }
    } else if has_underscore {
        if has_upper {
            NamingConvention::Mixed
        } else {
            NamingConvention::Snake
        }
    } else if has_upper && !has_lower {
        NamingConvention::Upper
    } else if has_upper && has_lower {
        NamingConvention::Camel
    } else if has_lower {
        NamingConvention::NonStandard
    } else {
        NamingConvention::NonStandard
    }
}

fn semantic_words(name: &str) -> Vec<String> {
    name.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn hierarchy_level(name: &str) -> usize {
    name.split(['-', '_']).filter(|w| !w.is_empty()).count()
}

fn pattern_type(category: HeaderCategory, has_vendor: bool) -> PatternType {
    match (category, has_vendor) {
        (HeaderCategory::Cms | HeaderCategory::Ecommerce, true) => PatternType::PlatformSpecific,
        (_, true) => PatternType::VendorSpecific,
        (HeaderCategory::Custom, false) => PatternType::Custom,
        (_, false) => PatternType::Standard,
    }
}

fn category_label(category: HeaderCategory) -> &'static str {
    match category {
        HeaderCategory::Infrastructure => "infrastructure",
        HeaderCategory::Generic => "generic",
        HeaderCategory::Security => "security",
        HeaderCategory::Caching => "caching",
        HeaderCategory::Cms => "cms",
        HeaderCategory::Ecommerce => "ecommerce",
        HeaderCategory::Analytics => "analytics",
        HeaderCategory::Framework => "framework",
        HeaderCategory::Custom => "custom",
    }
}

fn naming_convention_label(nc: NamingConvention) -> &'static str {
    match nc {
        NamingConvention::Kebab => "kebab",
        NamingConvention::Snake => "snake",
        NamingConvention::Camel => "camel",
        NamingConvention::Upper => "upper",
        NamingConvention::Mixed => "mixed",
        NamingConvention::NonStandard => "non-standard",
    }
}

fn pattern_type_label(pt: PatternType) -> &'static str {
    match pt {
        PatternType::Standard => "standard",
        PatternType::VendorSpecific => "vendor-specific",
        PatternType::PlatformSpecific => "platform-specific",
        PatternType::Custom => "custom",
    }
}

fn top_n(histogram: &BTreeMap<String, usize>, n: usize) -> Vec<String> {
    let mut entries: Vec<(&String, &usize)> = histogram.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().take(n).map(|(k, _)| k.clone()).collect()
}

pub fn analyze(headers: &AnalysisResult<()>, vendor: &VendorData) -> SemanticData {
    let mut analyses = BTreeMap::new();
    let mut category_distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut vendor_distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut naming_conventions: BTreeMap<String, usize> = BTreeMap::new();
    let mut pattern_types: BTreeMap<String, usize> = BTreeMap::new();

    for header_name in headers.patterns.keys() {
        let classification = classifier::classify(header_name);
        let injected_vendor = vendor.vendors_by_pattern.get(header_name);
        let nc = naming_convention(header_name);
        let pt = pattern_type(classification.category, injected_vendor.is_some());

        *category_distribution.entry(category_label(classification.category).to_string()).or_insert(0) += 1;
        *naming_conventions.entry(naming_convention_label(nc).to_string()).or_insert(0) += 1;
        *pattern_types.entry(pattern_type_label(pt).to_string()).or_insert(0) += 1;
        if let Some(v) = injected_vendor {
            *vendor_distribution.entry(v.clone()).or_insert(0) += 1;
        }

        analyses.insert(
            header_name.clone(),
            HeaderSemanticAnalysis {
                header_name: header_name.clone(),
                category: classification.category,
                naming_convention: nc,
                semantic_words: semantic_words(header_name),
                pattern_type: pt,
                hierarchy_level: hierarchy_level(header_name),
            },
        );
    }

    let top_vendors = top_n(&vendor_distribution, 10);
    let top_categories = top_n(&category_distribution, 10);

    SemanticData {
        headers: analyses,
        insights: SemanticInsights {
            category_distribution,
            vendor_distribution,
            naming_conventions,
            pattern_types,
            top_vendors,
            top_categories,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerOptions;
    use crate::core::{PatternData, VendorStat, VendorSummary};
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn headers_result(names: &[&str]) -> AnalysisResult<()> {
        let mut patterns = BTreeMap::new();
        for name in names {
            patterns.insert(
                name.to_string(),
                PatternData::new(*name, BTreeSet::from(["a".to_string()]), 1, vec![], 5),
            );
        }
        let before = patterns.len();
        AnalysisResult::new("headers", patterns, 1, before, 0, Utc::now(), AnalyzerOptions::default(), None)
    }

    #[test]
    fn kebab_case_header_is_classified_kebab() {
        let result = headers_result(&["x-wp-total"]);
        let vendor = VendorData::default();
        let semantic = analyze(&result, &vendor);
        assert_eq!(semantic.headers["x-wp-total"].naming_convention, NamingConvention::Kebab);
        assert_eq!(semantic.headers["x-wp-total"].hierarchy_level, 3);
    }

    #[test]
    fn vendor_injected_header_is_platform_specific() {
        let result = headers_result(&["x-wp-total"]);
        let mut vendor = VendorData::default();
        vendor.vendors_by_pattern.insert("x-wp-total".to_string(), "WordPress".to_string());
        vendor.vendor_stats.insert("WordPress".to_string(), VendorStat { site_count: 1, coverage: 1.0 });
        vendor.summary = VendorSummary::default();

        let semantic = analyze(&result, &vendor);
        assert_eq!(semantic.headers["x-wp-total"].pattern_type, PatternType::PlatformSpecific);
        assert_eq!(semantic.insights.vendor_distribution["WordPress"], 1);
    }

    #[test]
    fn infrastructure_header_without_vendor_is_standard() {
        let result = headers_result(&["server"]);
        let vendor = VendorData::default();
        let semantic = analyze(&result, &vendor);
        assert_eq!(semantic.headers["server"].pattern_type, PatternType::Standard);
    }
}

//! Header classifier: a pure, deterministic, case-insensitive
//! function from header name to `{category, vendor?, filterRecommendation,
//! discriminativeScorePrior}`.
//!
//! The classification table is process-wide immutable state loaded once via
//! `once_cell::sync::Lazy`: immutable, loaded at startup, shared lock-free.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderCategory {
    Infrastructure,
    Generic,
    Security,
    Caching,
    Cms,
    Ecommerce,
    Analytics,
    Framework,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterRecommendation {
    AlwaysFilter,
    ContextDependent,
    NeverFilter,
}

impl HeaderCategory {
    /// Always-filter for infrastructure+generic; context-
    /// dependent for caching+analytics+framework; never-filter for
    /// cms+ecommerce+security+custom.
    pub fn filter_recommendation(&self) -> FilterRecommendation {
        use HeaderCategory::*;
        match self {
            Infrastructure | Generic => FilterRecommendation::AlwaysFilter,
            Caching | Analytics | Framework => FilterRecommendation::ContextDependent,
            Cms | Ecommerce | Security | Custom => FilterRecommendation::NeverFilter,
        }
    }

    fn discriminative_score_prior(&self) -> f64 {
        use HeaderCategory::*;
        match self {
            Infrastructure | Generic => 0.1,
            Caching | Analytics | Framework => 0.4,
            Security => 0.5,
            Custom => 0.5,
            Cms | Ecommerce => 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: HeaderCategory,
    pub vendor: Option<&'static str>,
    pub filter_recommendation: FilterRecommendation,
    pub discriminative_score_prior: f64,
}

struct TableEntry {
    category: HeaderCategory,
    vendor: Option<&'static str>,
}

static EXACT_TABLE: Lazy<HashMap<&'static str, TableEntry>> = Lazy::new(|| {
    use HeaderCategory::*;
    let mut m = HashMap::new();
    let mut add = |name: &'static str, category: HeaderCategory, vendor: Option<&'static str>| {
        m.insert(name, TableEntry { category, vendor });
    };

    // infrastructure
    for h in [
        "server",
        "content-length",
        "connection",
        "date",
        "vary",
        "accept-ranges",
        "strict-transport-security",
        "content-security-policy",
        "x-content-type-options",
        "x-frame-options",
    ] {
        add(h, Infrastructure, None);
    }

    // generic
    for h in [
        "cache-control",
        "expires",
        "etag",
        "last-modified",
        "content-type",
        "content-encoding",
        "age",
        "pragma",
        "via",
        "x-cache",
        "cf-ray",
        "cf-cache-status",
        "x-forwarded-for",
    ] {
        add(h, Generic, None);
    }
    add("cf-ray", Generic, Some("Cloudflare"));
    add("cf-cache-status", Generic, Some("Cloudflare"));

    // cms
    add("x-pingback", Cms, Some("WordPress"));
    add("x-generator", Cms, None);

    // security
    for h in ["x-xss-protection", "referrer-policy", "permissions-policy"] {
        add(h, Security, None);
    }

    // caching
    for h in ["x-varnish", "x-cache-hits", "surrogate-control"] {
        add(h, Caching, None);
    }

    // analytics
    for h in ["x-analytics", "x-ga-session"] {
        add(h, Analytics, None);
    }

    // ecommerce
    add("x-shopid", Ecommerce, Some("Shopify"));

    // framework
    for h in ["x-powered-by", "x-aspnet-version", "x-runtime"] {
        add(h, Framework, None);
    }

    m
});

/// Prefix families that aren't worth enumerating header-by-header:
/// `x-drupal-*`, `x-wp-*`, `x-shopify-*`, `x-amz-cf-*`, ...
struct PrefixRule {
    prefix: &'static str,
    category: HeaderCategory,
    vendor: Option<&'static str>,
}

static PREFIX_RULES: &[PrefixRule] = &[
    PrefixRule {
        prefix: "x-drupal-",
        category: HeaderCategory::Cms,
        vendor: Some("Drupal"),
    },
    PrefixRule {
        prefix: "x-wp-",
        category: HeaderCategory::Cms,
        vendor: Some("WordPress"),
    },
    PrefixRule {
        prefix: "x-shopify-",
        category: HeaderCategory::Ecommerce,
        vendor: Some("Shopify"),
    },
    PrefixRule {
        prefix: "x-amz-cf-",
        category: HeaderCategory::Generic,
        vendor: Some("Amazon CloudFront"),
    },
    PrefixRule {
        prefix: "x-magento-",
        category: HeaderCategory::Ecommerce,
        vendor: Some("Magento"),
    },
    PrefixRule {
        prefix: "x-akamai-",
        category: HeaderCategory::Generic,
        vendor: Some("Akamai"),
    },
];

/// `x-generator` values matching a CMS name reclassify the header as `Cms`
/// even though the header name alone is ambiguous.
static CMS_GENERATOR_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)wordpress|drupal|joomla|shopify|wix|squarespace").unwrap());

/// Classify a header by name alone. Case-insensitive; deterministic.
pub fn classify(name: &str) -> Classification {
    let key = name.trim().to_lowercase();

    if let Some(entry) = EXACT_TABLE.get(key.as_str()) {
        return Classification {
            category: entry.category,
            vendor: entry.vendor,
            filter_recommendation: entry.category.filter_recommendation(),
            discriminative_score_prior: entry.category.discriminative_score_prior(),
        };
    }

    for rule in PREFIX_RULES {
        if key.starts_with(rule.prefix) {
            return Classification {
                category: rule.category,
                vendor: rule.vendor,
                filter_recommendation: rule.category.filter_recommendation(),
                discriminative_score_prior: rule.category.discriminative_score_prior(),
            };
        }
    }

    let category = HeaderCategory::Custom;
    Classification {
        category,
        vendor: None,
        filter_recommendation: category.filter_recommendation(),
        discriminative_score_prior: category.discriminative_score_prior(),
    }
}

/// Reclassify an `x-generator`-style header whose value names a CMS: the
/// header moves from `Custom`/`Framework` into `Cms`.
pub fn classify_generator_value(value: &str) -> Option<HeaderCategory> {
    if CMS_GENERATOR_VALUE.is_match(value) {
        Some(HeaderCategory::Cms)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        let lower = classify("server");
        let upper = classify("SERVER");
        let mixed = classify("SeRvEr");
        assert_eq!(lower.category, upper.category);
        assert_eq!(lower.category, mixed.category);
    }

    #[test]
    fn infrastructure_and_generic_are_always_filter() {
        assert_eq!(
            classify("server").filter_recommendation,
            FilterRecommendation::AlwaysFilter
        );
        assert_eq!(
            classify("cache-control").filter_recommendation,
            FilterRecommendation::AlwaysFilter
        );
    }

    #[test]
    fn cms_headers_are_never_filter() {
        assert_eq!(classify("x-pingback").category, HeaderCategory::Cms);
        assert_eq!(
            classify("x-pingback").filter_recommendation,
            FilterRecommendation::NeverFilter
        );
    }

    #[test]
    fn prefix_family_matches_vendor() {
        let c = classify("x-wp-total");
        assert_eq!(c.category, HeaderCategory::Cms);
        assert_eq!(c.vendor, Some("WordPress"));
    }

    #[test]
    fn unknown_header_defaults_to_custom_never_filter() {
        let c = classify("x-my-bespoke-header");
        assert_eq!(c.category, HeaderCategory::Custom);
        assert_eq!(c.filter_recommendation, FilterRecommendation::NeverFilter);
    }

    #[test]
    fn generator_value_reclassifies_as_cms() {
        assert_eq!(
            classify_generator_value("WordPress 6.2"),
            Some(HeaderCategory::Cms)
        );
        assert_eq!(classify_generator_value("Custom Engine 1.0"), None);
    }
}

use corpus_signal_analyzer::core::PatternData;
use corpus_signal_analyzer::discrimination;
use corpus_signal_analyzer::stats::hhi_normalized;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn site_set(n: usize) -> BTreeSet<String> {
    (0..n).map(|i| format!("site{i}.example")).collect()
}

proptest! {
    /// `site_count == sites.len()` and `frequency == site_count/total_sites`.
    #[test]
    fn pattern_data_frequency_matches_site_count(site_count in 0usize..40, extra_total in 0usize..40) {
        let total_sites = site_count + extra_total;
        let sites = site_set(site_count);
        let pattern = PatternData::new("server", sites, total_sites.max(1), vec![], 5);
        prop_assert_eq!(pattern.site_count, site_count);
        prop_assert!(pattern.validate(total_sites.max(1)).is_ok());
    }

    /// `concentration_score` stays in [0,1], and hits 1 iff a single share covers 100%.
    #[test]
    fn hhi_is_bounded_and_maxed_by_a_single_share(shares in prop::collection::vec(0.0f64..100.0, 1..8)) {
        let total: f64 = shares.iter().sum();
        // normalize to percentages that sum to 100 so the single-share case is meaningful
        let normalized: Vec<f64> = if total > 0.0 {
            shares.iter().map(|s| s / total * 100.0).collect()
        } else {
            shares.clone()
        };
        let score = hhi_normalized(&normalized);
        prop_assert!(score >= 0.0 && score <= 1.0);
        if normalized.len() == 1 {
            prop_assert!((score - 1.0).abs() < 1e-9);
        }
    }

    /// An empty corpus yields a concentration score of 0.
    #[test]
    fn hhi_of_empty_corpus_is_zero(_unused in 0..1) {
        prop_assert_eq!(hhi_normalized(&[]), 0.0);
    }

    /// `platform_specificity` stays within [0,1] across arbitrary
    /// site/CMS distributions.
    #[test]
    fn discrimination_specificity_is_bounded(
        wp_sites in 0usize..25,
        drupal_sites in 0usize..25,
        pattern_sites in 0usize..25,
    ) {
        let wp_sites = wp_sites.max(1);
        let drupal_sites = drupal_sites.max(1);
        let total = wp_sites + drupal_sites;
        let pattern_sites = pattern_sites.min(total);

        let mut site_cms = BTreeMap::new();
        for i in 0..wp_sites {
            site_cms.insert(format!("wp{i}"), "WordPress".to_string());
        }
        for i in 0..drupal_sites {
            site_cms.insert(format!("drupal{i}"), "Drupal".to_string());
        }
        let mut cms_totals = BTreeMap::new();
        cms_totals.insert("WordPress".to_string(), wp_sites);
        cms_totals.insert("Drupal".to_string(), drupal_sites);

        let mut all_sites: Vec<&String> = site_cms.keys().collect();
        all_sites.truncate(pattern_sites);
        let sites: BTreeSet<String> = all_sites.into_iter().cloned().collect();

        let result = discrimination::compute(&sites, &site_cms, &cms_totals, total, 30, false);
        prop_assert!(result.discriminative_score >= 0.0 && result.discriminative_score <= 1.0);
        for specificity in result.platform_specificity.values() {
            prop_assert!(*specificity >= 0.0 && *specificity <= 1.0);
        }
    }
}

/// Boundary: `minOccurrences > totalSites` yields empty pattern maps, not an error.
#[test]
fn min_occurrences_above_total_sites_yields_empty_patterns_not_an_error() {
    use corpus_signal_analyzer::aggregator::Aggregator;
    use corpus_signal_analyzer::config::AnalyzerOptions;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{
            "url": "https://a.example",
            "timestamp": "2024-06-15T00:00:00Z",
            "httpHeaders": {"server": "nginx"},
            "detectionResults": [{"cms": "WordPress", "confidence": 0.9}]
        }"#,
    )
    .unwrap();

    let aggregator = Aggregator::new();
    let options = AnalyzerOptions {
        min_occurrences: 1_000_000,
        ..Default::default()
    };
    let results = aggregator.analyze(dir.path(), &options, false, None).unwrap();
    assert!(results.headers.patterns.is_empty());
}

/// Boundary: a single-site corpus gives every pattern frequency 0 or 1, and a
/// concentration score of exactly 1 (one CMS, 100% of the corpus).
#[test]
fn single_site_corpus_has_binary_frequencies_and_full_concentration() {
    use corpus_signal_analyzer::aggregator::Aggregator;
    use corpus_signal_analyzer::config::AnalyzerOptions;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{
            "url": "https://a.example",
            "timestamp": "2024-06-15T00:00:00Z",
            "httpHeaders": {"server": "nginx", "x-powered-by": "PHP"},
            "detectionResults": [{"cms": "WordPress", "confidence": 0.9}]
        }"#,
    )
    .unwrap();

    let aggregator = Aggregator::new();
    let options = AnalyzerOptions { min_occurrences: 1, ..Default::default() };
    let results = aggregator.analyze(dir.path(), &options, false, None).unwrap();

    for pattern in results.headers.patterns.values() {
        assert!(pattern.frequency == 0.0 || pattern.frequency == 1.0);
    }
    assert_eq!(results.bias.concentration_score, 1.0);
}

/// Normalizing a URL twice is idempotent, so preprocessing
/// the already-normalized output produces the same site key.
#[test]
fn url_normalization_is_idempotent_across_many_inputs() {
    use corpus_signal_analyzer::url_normalize::normalize;

    let inputs = [
        "HTTPS://Example.COM:443/Path/?q=1#frag",
        "http://Sub.Example.com:80/",
        "https://example.com/a/b?x=1&y=2",
        "HTTP://ALLCAPS.EXAMPLE.COM/page",
    ];
    for input in inputs {
        let once = normalize(input).unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice, "normalize should be idempotent for {input}");
    }
}

/// The same header family is produced regardless of the case of
/// the input header names, since ingestion lowercases header keys.
#[test]
fn header_case_does_not_affect_the_resulting_pattern_key() {
    use corpus_signal_analyzer::aggregator::Aggregator;
    use corpus_signal_analyzer::config::AnalyzerOptions;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{
            "url": "https://a.example",
            "timestamp": "2024-06-15T00:00:00Z",
            "httpHeaders": {"X-Pingback": "https://a.example/xmlrpc.php"},
            "detectionResults": [{"cms": "WordPress", "confidence": 0.9}]
        }"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.json"),
        r#"{
            "url": "https://b.example",
            "timestamp": "2024-06-15T00:00:00Z",
            "httpHeaders": {"x-pingback": "https://b.example/xmlrpc.php"},
            "detectionResults": [{"cms": "WordPress", "confidence": 0.9}]
        }"#,
    )
    .unwrap();

    let aggregator = Aggregator::new();
    let options = AnalyzerOptions { min_occurrences: 1, ..Default::default() };
    let results = aggregator.analyze(dir.path(), &options, false, None).unwrap();

    assert_eq!(results.headers.patterns["x-pingback"].site_count, 2);
    assert!(!results.headers.patterns.contains_key("X-Pingback"));
}

/// A discovered header family's site set is a superset of the
/// union of sites carrying each of its member headers.
#[test]
fn discovered_family_sites_are_a_superset_of_member_header_sites() {
    use corpus_signal_analyzer::aggregator::Aggregator;
    use corpus_signal_analyzer::config::AnalyzerOptions;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    for i in 0..3 {
        std::fs::write(
            dir.path().join(format!("wp{i}.json")),
            format!(
                r#"{{
                    "url": "https://wp{i}.example",
                    "timestamp": "2024-06-15T00:00:00Z",
                    "httpHeaders": {{"x-wp-total": "1", "x-wp-cache": "HIT", "x-wp-version": "6.2"}},
                    "detectionResults": [{{"cms": "WordPress", "confidence": 0.9}}]
                }}"#
            ),
        )
        .unwrap();
    }
    for i in 0..2 {
        std::fs::write(
            dir.path().join(format!("wp-plugins-{i}.json")),
            format!(
                r#"{{
                    "url": "https://wp-plugins-{i}.example",
                    "timestamp": "2024-06-15T00:00:00Z",
                    "httpHeaders": {{"x-wp-total": "1", "x-wp-plugins": "akismet"}},
                    "detectionResults": [{{"cms": "WordPress", "confidence": 0.9}}]
                }}"#
            ),
        )
        .unwrap();
    }

    let aggregator = Aggregator::new();
    let options = AnalyzerOptions { min_occurrences: 1, ..Default::default() };
    let results = aggregator.analyze(dir.path(), &options, false, None).unwrap();

    let family = results
        .discovery
        .families
        .iter()
        .find(|f| f.family_key == "x" && f.members.contains("x-wp-total"))
        .expect("expected an x-wp-* family");

    for member in &family.members {
        if let Some(pattern) = results.headers.patterns.get(member) {
            assert!(
                pattern.sites.is_subset(&family.sites),
                "family sites must be a superset of member `{member}`'s sites"
            );
        }
    }
    assert!(family.examples.len() >= 3);
}

/// Re-applying `min_occurrences` to an already-filtered result is a no-op.
#[test]
fn reapplying_min_occurrences_to_a_filtered_result_changes_nothing() {
    use corpus_signal_analyzer::aggregator::Aggregator;
    use corpus_signal_analyzer::config::AnalyzerOptions;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{
            "url": "https://a.example",
            "timestamp": "2024-06-15T00:00:00Z",
            "httpHeaders": {"server": "nginx"},
            "detectionResults": []
        }"#,
    )
    .unwrap();

    let aggregator = Aggregator::new();
    let options = AnalyzerOptions { min_occurrences: 1, ..Default::default() };
    let results = aggregator.analyze(dir.path(), &options, false, None).unwrap();

    let still_present = results
        .headers
        .patterns
        .values()
        .filter(|p| p.site_count >= options.min_occurrences)
        .count();
    assert_eq!(still_present, results.headers.patterns.len());
}

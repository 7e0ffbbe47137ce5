//! Scripts analyzer: pattern key is the script URL classifier's
//! output family (`path:*`, `library:*`, `tracking:*`, `domain:*`,
//! `other:{hash8}`).
//!
//! `SiteData` only retains script *URLs*, so the
//! `inline:*` family the classifier supports is reachable only when a
//! future data-model revision starts retaining inline script bodies; it is
//! exercised directly against [`crate::script_classify`] in that module's
//! own tests.

use super::common::{attach_platform_discrimination, finalize, RawPattern};
use crate::config::AnalyzerOptions;
use crate::core::{AnalysisResult, PreprocessedData};
use crate::script_classify::classify_script;
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Instant;
use url::Url;

fn site_host(normalized_url: &str) -> Option<String> {
    Url::parse(normalized_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

pub fn analyze(data: &PreprocessedData, options: &AnalyzerOptions) -> AnalysisResult<()> {
    let started = Instant::now();
    let mut raw: BTreeMap<String, RawPattern> = BTreeMap::new();

    for (url, site) in &data.sites {
        let host = site_host(&site.normalized_url);
        for src in &site.scripts {
            let key = classify_script(Some(src), None, host.as_deref());
            let entry = raw.entry(key).or_default();
            entry.sites.insert(url.clone());
            if entry.examples.len() < options.max_examples.max(1) * 4 {
                entry.examples.push(src.clone());
            }
        }
    }

    let (mut patterns, before) = finalize(raw, data.total_sites, options);
    attach_platform_discrimination(&mut patterns, data, options, |_| None);

    AnalysisResult::new(
        "scripts",
        patterns,
        data.total_sites,
        before,
        started.elapsed().as_millis() as u64,
        Utc::now(),
        options.clone(),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FilteringStats, SiteData};
    use std::collections::{BTreeMap as Map, BTreeSet};

    fn site(url: &str, scripts: &[&str]) -> SiteData {
        SiteData {
            url: url.to_string(),
            normalized_url: url.to_string(),
            cms: "Unknown".to_string(),
            confidence: 0.0,
            headers: Map::new(),
            robots_headers: Map::new(),
            meta_tags: Map::new(),
            scripts: scripts.iter().map(|s| s.to_string()).collect(),
            technologies: BTreeSet::new(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn wp_content_scripts_cluster_under_one_pattern() {
        let mut sites = Map::new();
        sites.insert(
            "https://a.example".to_string(),
            site("https://a.example", &["/wp-content/themes/t/a.js"]),
        );
        sites.insert(
            "https://b.example".to_string(),
            site("https://b.example", &["/wp-content/plugins/p/b.js"]),
        );
        let data = PreprocessedData::new(sites, FilteringStats::default());
        let options = AnalyzerOptions {
            min_occurrences: 1,
            ..Default::default()
        };

        let result = analyze(&data, &options);
        assert_eq!(result.patterns["path:wp-content"].site_count, 2);
    }
}

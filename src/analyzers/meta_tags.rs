//! MetaTags analyzer: pattern key is `"{kind}:{key}"`; a site
//! with several distinct values for the same key still counts once (set
//! semantics on site membership), but every distinct value is kept as an
//! example.

use super::common::{attach_platform_discrimination, finalize, RawPattern};
use crate::config::AnalyzerOptions;
use crate::core::{AnalysisResult, PreprocessedData};
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Instant;

pub fn analyze(data: &PreprocessedData, options: &AnalyzerOptions) -> AnalysisResult<()> {
    let started = Instant::now();
    let mut raw: BTreeMap<String, RawPattern> = BTreeMap::new();

    for (url, site) in &data.sites {
        for (pattern_key, values) in &site.meta_tags {
            let entry = raw.entry(pattern_key.clone()).or_default();
            entry.sites.insert(url.clone());
            for value in values {
                if entry.examples.len() < options.max_examples.max(1) * 4 {
                    entry.examples.push(value.clone());
                }
            }
        }
    }

    let (mut patterns, before) = finalize(raw, data.total_sites, options);
    attach_platform_discrimination(&mut patterns, data, options, |_| None);

    AnalysisResult::new(
        "meta_tags",
        patterns,
        data.total_sites,
        before,
        started.elapsed().as_millis() as u64,
        Utc::now(),
        options.clone(),
        None,
    )
}

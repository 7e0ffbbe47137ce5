//! Headers analyzer: one pattern per distinct header name,
//! one increment per site regardless of how many values it had.

use super::common::{attach_platform_discrimination, finalize, RawPattern};
use crate::classifier;
use crate::config::AnalyzerOptions;
use crate::core::{AnalysisResult, PreprocessedData};
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Instant;

pub fn analyze(data: &PreprocessedData, options: &AnalyzerOptions) -> AnalysisResult<()> {
    let started = Instant::now();
    let mut raw: BTreeMap<String, RawPattern> = BTreeMap::new();

    for (url, site) in &data.sites {
        for (name, values) in &site.headers {
            let entry = raw.entry(name.clone()).or_default();
            entry.sites.insert(url.clone());
            if let Some(example) = values.iter().next() {
                if entry.examples.len() < options.max_examples.max(1) * 4 {
                    entry.examples.push(example.clone());
                }
            }
        }
    }

    let (mut patterns, before) = finalize(raw, data.total_sites, options);
    attach_platform_discrimination(&mut patterns, data, options, |name| {
        Some(classifier::classify(name).category)
    });

    AnalysisResult::new(
        "headers",
        patterns,
        data.total_sites,
        before,
        started.elapsed().as_millis() as u64,
        Utc::now(),
        options.clone(),
        None,
    )
}

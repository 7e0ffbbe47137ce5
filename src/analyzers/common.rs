//! Shared plumbing for the three basic pattern analyzers:
//! build patterns once, filter by `minOccurrences` exactly once ("never
//! twice — this was a historical bug"), then optionally attach
//! platform-discrimination scoring.

use crate::classifier::HeaderCategory;
use crate::config::AnalyzerOptions;
use crate::core::{PatternData, PreprocessedData};
use crate::discrimination;
use std::collections::{BTreeMap, BTreeSet};

/// Raw per-pattern accumulation before filtering: the set of sites carrying
/// it and a bounded sample of observed raw values.
#[derive(Default)]
pub struct RawPattern {
    pub sites: BTreeSet<String>,
    pub examples: Vec<String>,
}

/// Build `PatternData` for every accumulated raw pattern, then drop the ones
/// with `site_count < min_occurrences`. Returns `(patterns_after_filter,
/// patterns_before_filter_count)`.
pub fn finalize(
    raw: BTreeMap<String, RawPattern>,
    total_sites: usize,
    options: &AnalyzerOptions,
) -> (BTreeMap<String, PatternData>, usize) {
    let before = raw.len();
    let examples_cap = if options.include_examples { options.max_examples } else { 0 };

    let patterns: BTreeMap<String, PatternData> = raw
        .into_iter()
        .filter_map(|(key, value)| {
            let pattern = PatternData::new(key.clone(), value.sites, total_sites, value.examples, examples_cap);
            if pattern.site_count < options.min_occurrences {
                None
            } else {
                Some((key, pattern))
            }
        })
        .collect();

    (patterns, before)
}

/// Attach `PlatformDiscrimination` to every surviving pattern, only
/// computed when `AnalyzerOptions::focus_platform_discrimination` is set.
/// `category_of` classifies a pattern key into infrastructure-noise status
/// for `DiscriminationMetrics::is_infrastructure_noise`; headers pass the
/// real classifier, meta/script analyzers pass a constant `false`.
pub fn attach_platform_discrimination(
    patterns: &mut BTreeMap<String, PatternData>,
    data: &PreprocessedData,
    options: &AnalyzerOptions,
    category_of: impl Fn(&str) -> Option<HeaderCategory>,
) {
    if !options.focus_platform_discrimination {
        return;
    }

    let site_cms = data.site_cms_map();
    let cms_totals = data.cms_totals();

    for (key, pattern) in patterns.iter_mut() {
        let is_noise = matches!(
            category_of(key),
            Some(HeaderCategory::Infrastructure) | Some(HeaderCategory::Generic)
        );
        let discrimination = discrimination::compute(
            &pattern.sites,
            &site_cms,
            &cms_totals,
            data.total_sites,
            options.scoring.specificity_large_corpus_floor,
            is_noise,
        );
        pattern.platform_discrimination = Some(discrimination);
    }
}

//! `PreprocessedData`: the output of the preprocessing stage and the input
//! every analyzer stage reads from.

use super::context::ValidationSummary;
use super::site_data::SiteData;
use super::site_index::SiteIndex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts of records rejected during preprocessing, by reason.
#[derive(Debug, Clone, Serialize, Default)]
pub struct FilteringStats {
    pub date_filter: usize,
    pub duplicate: usize,
    pub malformed: usize,
}

impl FilteringStats {
    pub fn total_rejected(&self) -> usize {
        self.date_filter + self.duplicate + self.malformed
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PreprocessedMetadata {
    pub version: String,
    /// Set by the validation stage.
    pub validation: Option<ValidationSummary>,
}

/// Sites keyed by normalized URL, plus bookkeeping the aggregator and
/// analyzers read before doing any real work.
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessedData {
    pub sites: BTreeMap<String, SiteData>,
    pub total_sites: usize,
    pub filtering_stats: FilteringStats,
    pub metadata: PreprocessedMetadata,
    /// Interned site ids for the analyzers that do per-site-pair work
    /// (co-occurrence) and want `u32` comparisons instead of string keys.
    pub site_index: SiteIndex,
}

impl PreprocessedData {
    pub fn new(sites: BTreeMap<String, SiteData>, filtering_stats: FilteringStats) -> Self {
        let mut site_index = SiteIndex::new();
        for normalized_url in sites.keys() {
            site_index.intern(normalized_url);
        }
        let total_sites = sites.len();
        Self {
            sites,
            total_sites,
            filtering_stats,
            metadata: PreprocessedMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                validation: None,
            },
            site_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// normalizedUrl -> cms label, used by platform-discrimination scoring.
    pub fn site_cms_map(&self) -> BTreeMap<String, String> {
        self.sites
            .iter()
            .map(|(url, site)| (url.clone(), site.cms.clone()))
            .collect()
    }

    /// cms label -> number of sites carrying it.
    pub fn cms_totals(&self) -> BTreeMap<String, usize> {
        let mut totals = BTreeMap::new();
        for site in self.sites.values() {
            *totals.entry(site.cms.clone()).or_insert(0) += 1;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::{BTreeMap as Map, BTreeSet};

    fn site(url: &str) -> SiteData {
        SiteData {
            url: url.to_string(),
            normalized_url: url.to_string(),
            cms: "Unknown".to_string(),
            confidence: 0.0,
            headers: Map::new(),
            robots_headers: Map::new(),
            meta_tags: Map::new(),
            scripts: BTreeSet::new(),
            technologies: BTreeSet::new(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn total_sites_matches_map_len() {
        let mut sites = Map::new();
        sites.insert("a.example".to_string(), site("a.example"));
        sites.insert("b.example".to_string(), site("b.example"));
        let data = PreprocessedData::new(sites, FilteringStats::default());
        assert_eq!(data.total_sites, 2);
        assert_eq!(data.site_index.len(), 2);
    }

    #[test]
    fn filtering_stats_total_sums_reasons() {
        let stats = FilteringStats {
            date_filter: 2,
            duplicate: 1,
            malformed: 3,
        };
        assert_eq!(stats.total_rejected(), 6);
    }

    #[test]
    fn empty_sites_map_is_empty() {
        let data = PreprocessedData::new(Map::new(), FilteringStats::default());
        assert!(data.is_empty());
    }

    #[test]
    fn cms_totals_counts_per_label() {
        let mut sites = Map::new();
        let mut wp = site("a.example");
        wp.cms = "WordPress".to_string();
        sites.insert("a.example".to_string(), wp);
        sites.insert("b.example".to_string(), site("b.example"));
        let data = PreprocessedData::new(sites, FilteringStats::default());
        let totals = data.cms_totals();
        assert_eq!(totals["WordPress"], 1);
        assert_eq!(totals["Unknown"], 1);
        assert_eq!(data.site_cms_map()["a.example"], "WordPress");
    }
}

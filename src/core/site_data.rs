//! `SiteData`: the per-unique-site record the preprocessor builds by
//! collapsing every `CaptureRecord` that normalizes to the same site key
//!.

use super::capture::{CaptureRecord, MetaTagRecord, UNKNOWN_CMS};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub url: String,
    pub normalized_url: String,
    pub cms: String,
    pub confidence: f64,
    /// Mainpage headers: header name -> set of distinct observed values.
    pub headers: BTreeMap<String, BTreeSet<String>>,
    /// Headers from `robotsTxt.httpHeaders`, kept separate since the bias
    /// analyzer unions mainpage and robots.txt headers per-site.
    pub robots_headers: BTreeMap<String, BTreeSet<String>>,
    /// `"{kind}:{key}"` -> set of distinct content values.
    pub meta_tags: BTreeMap<String, BTreeSet<String>>,
    pub scripts: BTreeSet<String>,
    pub technologies: BTreeSet<String>,
    pub captured_at: DateTime<Utc>,
}

impl SiteData {
    /// Build the first `SiteData` for a normalized URL from one capture
    /// record. Later records for the same normalized URL are folded in via
    /// [`SiteData::merge`].
    pub fn from_record(record: &CaptureRecord, normalized_url: String) -> Self {
        let mut site = Self {
            url: record.url.clone(),
            normalized_url,
            cms: UNKNOWN_CMS.to_string(),
            confidence: 0.0,
            headers: BTreeMap::new(),
            robots_headers: BTreeMap::new(),
            meta_tags: BTreeMap::new(),
            scripts: BTreeSet::new(),
            technologies: BTreeSet::new(),
            captured_at: record.timestamp,
        };
        site.absorb(record);
        site
    }

    /// Union a capture record's headers/meta/scripts into this site, and
    /// keep the highest-confidence detection result.
    pub fn merge(&mut self, record: &CaptureRecord) {
        self.absorb(record);
        if record.timestamp > self.captured_at {
            self.captured_at = record.timestamp;
        }
    }

    fn absorb(&mut self, record: &CaptureRecord) {
        for (name, values) in &record.http_headers {
            let key = name.trim().to_lowercase();
            let entry = self.headers.entry(key).or_default();
            for v in values.clone().into_vec() {
                entry.insert(v);
            }
        }

        if let Some(robots) = &record.robots_txt {
            for (name, values) in &robots.http_headers {
                let key = name.trim().to_lowercase();
                let entry = self.robots_headers.entry(key).or_default();
                for v in values.clone().into_vec() {
                    entry.insert(v);
                }
            }
        }

        for tag in &record.meta_tags {
            let MetaTagRecord { content, .. } = tag;
            self.meta_tags
                .entry(tag.pattern_key())
                .or_default()
                .insert(content.clone());
        }

        for script in &record.scripts {
            if let Some(src) = &script.src {
                self.scripts.insert(src.clone());
            }
        }

        // Highest confidence in this record wins; ties broken lexically so
        // the choice is deterministic regardless of input ordering.
        if let Some(local_best) = record.detection_results.iter().max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.cms.cmp(&a.cms))
        }) {
            let replaces_current = self.cms == UNKNOWN_CMS
                || local_best.confidence > self.confidence
                || (local_best.confidence == self.confidence && local_best.cms < self.cms);
            if replaces_current {
                self.cms = local_best.cms.clone();
                self.confidence = local_best.confidence;
            }
        }
    }

    /// Headers a site carries, unioning mainpage and robots.txt values for a
    /// given header name. Used by the bias analyzer.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name) || self.robots_headers.contains_key(name)
    }
}

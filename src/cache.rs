//! In-process preprocessor cache: keyed by
//! `{source, dateRange, forceReload}`, guarded by a mutex, process lifetime
//! unless explicitly cleared.
//!
//! Deliberately NOT disk-persistent — unlike a long-lived crawl cache this
//! core never serializes intermediate results to disk (an explicit
//! non-goal); it only avoids rescanning the same source within one process.

use crate::config::DateRange;
use crate::core::PreprocessedData;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    date_range: Option<(Option<i64>, Option<i64>)>,
}

impl CacheKey {
    fn new(source: &str, date_range: Option<&DateRange>) -> Self {
        Self {
            source: source.to_string(),
            date_range: date_range.map(|r| {
                (
                    r.start.map(|d| d.timestamp()),
                    r.end.map(|d| d.timestamp()),
                )
            }),
        }
    }
}

/// Shared preprocessor cache. Cheap to clone (`Arc`-backed); intended to be
/// held once per embedding application and passed to the preprocessor on
/// each call.
#[derive(Debug, Clone, Default)]
pub struct PreprocessorCache {
    entries: Arc<Mutex<HashMap<CacheKey, Arc<PreprocessedData>>>>,
}

impl PreprocessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cached result for `(source, date_range)` unless
    /// `force_reload` is set, in which case the cache is bypassed (but still
    /// overwritten by the caller's subsequent `insert`).
    pub fn get(&self, source: &str, date_range: Option<&DateRange>, force_reload: bool) -> Option<Arc<PreprocessedData>> {
        if force_reload {
            return None;
        }
        let key = CacheKey::new(source, date_range);
        self.entries.lock().get(&key).cloned()
    }

    pub fn insert(&self, source: &str, date_range: Option<&DateRange>, data: Arc<PreprocessedData>) {
        let key = CacheKey::new(source, date_range);
        self.entries.lock().insert(key, data);
    }

    /// Empties the cache.
    pub fn clear_cache(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FilteringStats;
    use std::collections::BTreeMap;

    fn empty_data() -> Arc<PreprocessedData> {
        Arc::new(PreprocessedData::new(BTreeMap::new(), FilteringStats::default()))
    }

    #[test]
    fn miss_then_hit() {
        let cache = PreprocessorCache::new();
        assert!(cache.get("corpus.jsonl", None, false).is_none());
        cache.insert("corpus.jsonl", None, empty_data());
        assert!(cache.get("corpus.jsonl", None, false).is_some());
    }

    #[test]
    fn force_reload_bypasses_cache() {
        let cache = PreprocessorCache::new();
        cache.insert("corpus.jsonl", None, empty_data());
        assert!(cache.get("corpus.jsonl", None, true).is_none());
    }

    #[test]
    fn clear_cache_empties_entries() {
        let cache = PreprocessorCache::new();
        cache.insert("corpus.jsonl", None, empty_data());
        assert_eq!(cache.len(), 1);
        cache.clear_cache();
        assert!(cache.is_empty());
    }

    #[test]
    fn distinct_date_ranges_are_distinct_keys() {
        let cache = PreprocessorCache::new();
        let range = DateRange {
            start: Some(chrono::Utc::now()),
            end: None,
        };
        cache.insert("corpus.jsonl", None, empty_data());
        assert!(cache.get("corpus.jsonl", Some(&range), false).is_none());
    }
}

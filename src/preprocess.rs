//! Data preprocessor: reads capture records, normalizes URLs to
//! a single site key, deduplicates per site, and emits `PreprocessedData`.

use crate::cache::PreprocessorCache;
use crate::config::DateRange;
use crate::core::{CaptureRecord, FilteringStats, PreprocessedData, SiteData};
use crate::errors::{AnalysisError, Result};
use crate::observability::{enter_stage, Stage};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Preprocessor-only options; deliberately separate from
/// `AnalyzerOptions` since `forceReload` is meaningless to any other stage.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub date_range: Option<DateRange>,
    pub force_reload: bool,
}

/// Load and preprocess a corpus from `source` (a single capture file, or a
/// directory of them), honoring the optional cache.
pub fn load(source: &Path, options: &LoadOptions, cache: &PreprocessorCache) -> Result<PreprocessedData> {
    let _stage = enter_stage(Stage::Preprocess);
    let source_key = source.to_string_lossy().to_string();

    if let Some(cached) = cache.get(&source_key, options.date_range.as_ref(), options.force_reload) {
        debug!(source = %source_key, "preprocessor cache hit");
        return Ok((*cached).clone());
    }

    let records = read_records(source)?;
    let mut sites: BTreeMap<String, SiteData> = BTreeMap::new();
    let mut stats = FilteringStats::default();

    for record in records {
        if let Some(range) = &options.date_range {
            if !range.contains(record.timestamp) {
                stats.date_filter += 1;
                continue;
            }
        }

        let normalized = match crate::url_normalize::normalize(&record.url) {
            Some(n) => n,
            None => {
                stats.malformed += 1;
                continue;
            }
        };

        match sites.get_mut(&normalized) {
            Some(existing) => {
                existing.merge(&record);
                stats.duplicate += 1;
            }
            None => {
                sites.insert(normalized.clone(), SiteData::from_record(&record, normalized));
            }
        }
    }

    if sites.is_empty() {
        return Err(AnalysisError::empty_corpus(0, 1));
    }

    let data = PreprocessedData::new(sites, stats);
    cache.insert(&source_key, options.date_range.as_ref(), Arc::new(data.clone()));
    Ok(data)
}

/// Read every `CaptureRecord` under `source`. Malformed entries (unparseable
/// JSON, missing `url`) are dropped and logged, never surfaced as errors —
/// only a wholly unreadable source is a hard failure.
fn read_records(source: &Path) -> Result<Vec<CaptureRecord>> {
    let mut files = Vec::new();
    if source.is_dir() {
        for entry in WalkDir::new(source).follow_links(true).into_iter().filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        }) {
            if entry.file_type().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
    } else {
        files.push(source.to_path_buf());
    }

    if files.is_empty() {
        return Err(AnalysisError::load(format!(
            "no capture files found under {}",
            source.display()
        )));
    }

    let mut records = Vec::new();
    let mut any_read = false;
    for file in files {
        match std::fs::read_to_string(&file) {
            Ok(contents) => {
                any_read = true;
                records.extend(parse_file(&file, &contents));
            }
            Err(err) => {
                warn!(file = %file.display(), error = %err, "skipping unreadable file");
            }
        }
    }

    if !any_read {
        return Err(AnalysisError::load(format!(
            "failed to read any capture file under {}",
            source.display()
        )));
    }

    Ok(records)
}

/// One file may be a JSON array, a single JSON object, or newline-delimited
/// JSON (`.jsonl`); each malformed line/entry is dropped with a warning.
fn parse_file(file: &Path, contents: &str) -> Vec<CaptureRecord> {
    let is_jsonl = file.extension().map(|e| e == "jsonl").unwrap_or(false);

    if is_jsonl {
        return contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<CaptureRecord>(line) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "dropping malformed record");
                    None
                }
            })
            .collect();
    }

    if let Ok(many) = serde_json::from_str::<Vec<CaptureRecord>>(contents) {
        return many;
    }
    match serde_json::from_str::<CaptureRecord>(contents) {
        Ok(record) => vec![record],
        Err(err) => {
            warn!(file = %file.display(), error = %err, "dropping malformed file");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const RECORD: &str = r#"{
        "url": "https://example.com",
        "timestamp": "2024-06-15T00:00:00Z",
        "httpHeaders": {"server": "nginx"},
        "detectionResults": [{"cms": "WordPress", "confidence": 0.9}]
    }"#;

    #[test]
    fn loads_single_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.json");
        std::fs::write(&path, RECORD).unwrap();

        let data = load(&path, &LoadOptions::default(), &PreprocessorCache::new()).unwrap();
        assert_eq!(data.total_sites, 1);
        assert!(data.sites.contains_key("https://example.com"));
    }

    #[test]
    fn loads_directory_of_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), RECORD).unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            RECORD.replace("example.com", "other.example"),
        )
        .unwrap();

        let data = load(dir.path(), &LoadOptions::default(), &PreprocessorCache::new()).unwrap();
        assert_eq!(data.total_sites, 2);
    }

    #[test]
    fn duplicate_urls_merge_into_one_site() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        std::fs::write(&path, format!("{RECORD}\n{RECORD}\n")).unwrap();

        let data = load(&path, &LoadOptions::default(), &PreprocessorCache::new()).unwrap();
        assert_eq!(data.total_sites, 1);
        assert_eq!(data.filtering_stats.duplicate, 1);
    }

    #[test]
    fn malformed_records_are_dropped_and_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        std::fs::write(&path, format!("{RECORD}\nnot valid json\n")).unwrap();

        let data = load(&path, &LoadOptions::default(), &PreprocessorCache::new()).unwrap();
        assert_eq!(data.total_sites, 1);
    }

    #[test]
    fn date_range_filters_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        let early = RECORD.replace("2024-06-15", "2024-01-01");
        std::fs::write(&path, format!("{RECORD}\n{early}\n")).unwrap();

        let range = DateRange {
            start: Some(
                chrono::DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&chrono::Utc),
            ),
            end: None,
        };
        let options = LoadOptions {
            date_range: Some(range),
            force_reload: false,
        };

        let data = load(&path, &options, &PreprocessorCache::new()).unwrap();
        assert_eq!(data.total_sites, 1);
        assert_eq!(data.filtering_stats.date_filter, 1);
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        std::fs::write(&path, "").unwrap();

        let err = load(&path, &LoadOptions::default(), &PreprocessorCache::new()).unwrap_err();
        assert_eq!(err.category(), "EmptyCorpus");
    }

    #[test]
    fn cache_hit_avoids_rereading_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.json");
        std::fs::write(&path, RECORD).unwrap();
        let cache = PreprocessorCache::new();

        let first = load(&path, &LoadOptions::default(), &cache).unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = load(&path, &LoadOptions::default(), &cache).unwrap();
        assert_eq!(first.total_sites, second.total_sites);
    }
}

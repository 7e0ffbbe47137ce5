//! Corpus frequency, co-occurrence and CMS-bias analysis over web-page
//! capture records: a staged pipeline (preprocess → basic pattern analyzers
//! → validation → vendor → semantic → discovery → co-occurrence → bias →
//! summarize) that turns raw crawl captures into a multi-dimensional report
//! on HTTP headers, meta tags, scripts, vendor signatures, CMS correlation,
//! and corpus bias.
//!
//! The crate exposes no CLI or filesystem layout of its own; an embedding
//! application drives [`aggregator::Aggregator`] against its own capture
//! storage.

pub mod aggregator;
pub mod analyzers;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod core;
pub mod discrimination;
pub mod errors;
pub mod observability;
pub mod preprocess;
pub mod script_classify;
pub mod stats;
pub mod url_normalize;

pub use aggregator::{Aggregator, AggregatedResults, PlatformDiscriminationSummary, PlatformQualityMetrics};
pub use config::{AnalyzerOptions, DateRange, ScoringConstants};
pub use errors::{AnalysisError, Result};
pub use preprocess::LoadOptions;

//! Crate-wide error type for the corpus analysis pipeline.
//!
//! All public entry points (the preprocessor, every analyzer, the aggregator)
//! return [`Result<T>`] with a single [`AnalysisError`] taxonomy rather than
//! leaking `anyhow::Error` across module boundaries. Internal helpers are
//! still free to use `anyhow::Result` for convenience; the boundary mapping
//! happens via `impl From<anyhow::Error> for AnalysisError` below.
//!
//! # Example
//!
//! ```rust
//! use corpus_signal_analyzer::errors::AnalysisError;
//!
//! let err = AnalysisError::empty_corpus(0, 1);
//! assert!(err.to_string().contains("insufficient data"));
//! ```

use thiserror::Error;

/// The four error kinds the pipeline can terminate with.
///
/// The aggregator returns exactly one of these; partial results are never
/// returned alongside an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// The input source was unreachable or unparseable.
    #[error("failed to load corpus: {message}")]
    Load { message: String },

    /// Zero sites survived preprocessing/filtering.
    #[error("insufficient data: found {found} sites, minimum required: {minimum}")]
    EmptyCorpus { found: usize, minimum: usize },

    /// A `PatternData` (or other result) failed one of its structural
    /// invariants. Treated as a bug in the analyzer that produced it, not a
    /// data-quality issue — propagated as fatal with the offending key.
    #[error("invariant violation on pattern `{pattern_key}`: {detail}")]
    InvariantViolation { pattern_key: String, detail: String },

    /// A caller-provided deadline elapsed, or cancellation was requested, at
    /// a stage boundary.
    #[error("analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    pub fn empty_corpus(found: usize, minimum: usize) -> Self {
        Self::EmptyCorpus { found, minimum }
    }

    pub fn invariant_violation(pattern_key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            pattern_key: pattern_key.into(),
            detail: detail.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    /// Short category name, useful for grouped diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Load { .. } => "Load",
            Self::EmptyCorpus { .. } => "EmptyCorpus",
            Self::InvariantViolation { .. } => "InvariantViolation",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        Self::load(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::load(format!("malformed capture record: {err}"))
    }
}

/// Bridges internal `anyhow`-based helpers (preprocessor file I/O, etc.) to
/// the public error taxonomy. Falls back to `Load` since every current
/// `anyhow`-returning helper sits on the ingestion path.
impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        Self::load(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Render a batch of errors as a numbered list, for diagnostics that surface
/// more than one failure at once (e.g. several invariant violations found
/// during a debug validation pass).
pub fn format_error_list(errors: &[AnalysisError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_corpus_message() {
        let err = AnalysisError::empty_corpus(0, 1);
        assert_eq!(
            err.to_string(),
            "insufficient data: found 0 sites, minimum required: 1"
        );
    }

    #[test]
    fn load_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: AnalysisError = io_err.into();
        assert_eq!(err.category(), "Load");
    }

    #[test]
    fn invariant_violation_carries_pattern_key() {
        let err = AnalysisError::invariant_violation("server", "siteCount != sites.len()");
        assert!(err.to_string().contains("server"));
        assert_eq!(err.category(), "InvariantViolation");
    }

    #[test]
    fn format_error_list_numbers_entries() {
        let errors = vec![AnalysisError::load("bad file"), AnalysisError::cancelled()];
        let rendered = format_error_list(&errors);
        assert!(rendered.contains("1."));
        assert!(rendered.contains("2."));
    }
}

//! Thread-local stage tracking for structured logging.
//!
//! Per-thread current stage via `thread_local!` (composes with rayon's
//! per-site parallel iteration), RAII guard restoring the previous stage on
//! drop. No crash reporting or panic hook here — the aggregator logs stage
//! durations via `tracing` directly.

use std::cell::RefCell;

thread_local! {
    static CURRENT_STAGE: RefCell<Option<Stage>> = const { RefCell::new(None) };
}

/// The nine named pipeline stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess,
    Headers,
    MetaTags,
    Scripts,
    Validation,
    Vendor,
    Semantic,
    Discovery,
    Cooccurrence,
    Bias,
    Summarize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Preprocess => "preprocess",
            Self::Headers => "headers",
            Self::MetaTags => "meta_tags",
            Self::Scripts => "scripts",
            Self::Validation => "validation",
            Self::Vendor => "vendor",
            Self::Semantic => "semantic",
            Self::Discovery => "discovery",
            Self::Cooccurrence => "cooccurrence",
            Self::Bias => "bias",
            Self::Summarize => "summarize",
        };
        write!(f, "{name}")
    }
}

/// RAII guard restoring the previous stage on drop, enabling nested tracking
/// if ever needed.
pub struct StageGuard {
    previous: Option<Stage>,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        CURRENT_STAGE.with(|s| *s.borrow_mut() = self.previous);
    }
}

/// Enter a stage for the current thread, returning a guard that restores the
/// previous stage on drop.
#[must_use]
pub fn enter_stage(stage: Stage) -> StageGuard {
    CURRENT_STAGE.with(|s| {
        let previous = *s.borrow();
        *s.borrow_mut() = Some(stage);
        StageGuard { previous }
    })
}

/// The stage the current thread is in, if any.
pub fn current_stage() -> Option<Stage> {
    CURRENT_STAGE.with(|s| *s.borrow())
}

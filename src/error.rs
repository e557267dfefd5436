//! Error and outcome types surfaced across the public API (spec.md §7).
//!
//! The table in spec.md §7 splits conditions into two kinds: the ones
//! *surfaced to the caller* and the ones *recovered locally* with a log
//! line. Only the former are `thiserror`-derived `Result::Err` types here,
//! matching the teacher's `ScaleError`/`DrawableError` pattern; the latter
//! (`LateOutput`, `StaleInput`, `Gap`, `CursorDrift`) never leave
//! `mixer::assemble_one` as errors — they are `tracing::warn!` events plus
//! in-place state changes.

/// Failure resolving a `MixKernel` at `attach` time (spec.md §4.1).
///
/// `#[non_exhaustive]` because attach-time resolution is the one place a
/// future failure mode (e.g. a format the resolver recognizes but refuses
/// for a documented reason) could be added without breaking callers who
/// match on this today.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AttachError {
    #[error("no mix kernel available for the requested format")]
    NoKernel,
}

/// Result of one `assemble_one` tick (spec.md §4.2).
///
/// Not a `Result`: "not enough data yet" is the expected steady state
/// between producer writes, not a failure (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleOutcome {
    /// A block was assembled and handed to the `PlayoutSink`.
    Ready,
    /// Nothing to do this tick; `run` should stop calling `assemble_one`.
    NotReady,
}

impl AssembleOutcome {
    pub fn is_ready(self) -> bool {
        matches!(self, AssembleOutcome::Ready)
    }
}

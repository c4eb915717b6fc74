//! Statistics of the most recent call.

use framegraph_core::types::RunId;
use std::time::Duration;

/// Counters collected while executing one call.
///
/// A per-call summary read back through [`Session::stats`] and reset at the
/// start of every call. Nothing is exported or aggregated across calls.
///
/// [`Session::stats`]: crate::session::Session::stats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Id of the call, `None` before the first call.
    pub run_id: Option<RunId>,
    /// Steps taken from the ready queue.
    pub steps: u64,
    /// Op steps executed (excluding constants, variables, placeholders).
    pub ops_executed: u64,
    /// Values written to the output store.
    pub values_stored: usize,
    /// Deepest frame nesting reached (0 = outer frame only).
    pub max_frame_depth: usize,
    /// Highest iteration number reached in any frame.
    pub max_iteration: u64,
    /// Wall-clock time of the call.
    pub elapsed: Duration,
}

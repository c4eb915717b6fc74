//! FrameGraph Executor - dataflow graph execution engine.
//!
//! This crate provides the execution infrastructure for framegraph:
//! - Dependency tracker with a once-only ready queue
//! - Subgraph selection for requested outputs
//! - Frame-aware step resolution for Switch/Merge/Enter/Exit/NextIteration
//! - Session executor with listeners and execution statistics
//! - Tracing subscriber setup
//! - Scalar test handler and recording listener

#![warn(missing_docs)]

pub mod dependency;
pub mod observability;
pub mod session;
pub mod testing;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::dependency::{DependencyList, DependencyTracker};
    pub use crate::observability::{LogFormat, TracingConfig, TracingGuard, init_tracing};
    pub use crate::session::{
        ExecStep, ExecType, ExecutionStats, OutputRequest, OutputStore, Resolver, Session,
        SessionConfig, Subgraph,
    };
    pub use crate::testing::{ListenerEvent, RecordingListener, ScalarOpHandler};
    pub use framegraph_core::prelude::*;
}

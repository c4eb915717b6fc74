//! Prelude for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! # Example
//!
//! ```
//! use framegraph_core::prelude::*;
//! ```

// Core types
pub use crate::types::{FrameIter, OUTER_FRAME, RunId, VarId};

// Error handling
pub use crate::error::{FrameGraphError, Result, ResultExt};

// Graph model
pub use crate::graph::{
    Graph, GraphBuilder, GraphDefinition, OpDefinition, OpKind, OpNode, Variable,
    VariableDefinition, VariableKind,
};

// Traits
pub use crate::traits::{
    At, ExecutionContext, InputSlot, InputSource, Listener, OpHandler, OpInputs, Operation,
};

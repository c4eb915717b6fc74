//! FrameGraph Core Library
//!
//! This crate provides the graph model, identity types and extension traits
//! for the framegraph execution engine.
//!
//! # Overview
//!
//! A graph is a static set of variables and ops. Conditionals and loops are
//! expressed with five control-flow ops (Switch, Merge, Enter, Exit,
//! NextIteration), so the same op can run many times in different loop
//! frames and iterations. Values are therefore identified by a [`VarId`]:
//! a variable name plus the [`FrameIter`] it was produced in.
//!
//! # Key Components
//!
//! - **Graph**: Validated, immutable graph built from a [`GraphDefinition`]
//! - **Types**: Frame/iteration and value identities
//! - **Traits**: [`OpHandler`] for computing ops, [`Listener`] for observing them
//!
//! # Example
//!
//! ```
//! use framegraph_core::prelude::*;
//!
//! let graph = GraphBuilder::new()
//!     .placeholder("a")
//!     .constant("b")
//!     .op("add", "add", &["a", "b"], &["c"])
//!     .build()?;
//!
//! assert_eq!(graph.producer_of("c").map(|op| op.name.as_str()), Some("add"));
//! # Ok::<(), FrameGraphError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod prelude;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{FrameGraphError, Result};
pub use graph::{Graph, GraphBuilder, GraphDefinition, OpKind, OpNode, Variable, VariableKind};
pub use traits::{At, Listener, OpHandler, OpInputs, Operation};
pub use types::{FrameIter, OUTER_FRAME, RunId, VarId};

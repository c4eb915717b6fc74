//! Testing utilities for graph execution.
//!
//! This module provides a scalar [`OpHandler`](framegraph_core::traits::OpHandler)
//! and a recording listener, enabling exact-value tests of graphs with
//! conditionals and loops.
//!
//! # Example
//!
//! ```
//! use framegraph_core::graph::GraphBuilder;
//! use framegraph_executor::session::Session;
//! use framegraph_executor::testing::ScalarOpHandler;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let graph = GraphBuilder::new()
//!     .placeholder("a")
//!     .constant("b")
//!     .op("add", "add", &["a", "b"], &["c"])
//!     .build()?;
//!
//! let handler = ScalarOpHandler::new().with_value("b", 3.0);
//! let mut session = Session::new(Arc::new(graph), handler);
//! let out = session.output_simple(&["c"], HashMap::from([("a".to_string(), 2.0)]))?;
//! assert_eq!(out["c"], 5.0);
//! # Ok::<(), framegraph_core::FrameGraphError>(())
//! ```

mod listener;
mod scalar;

pub use listener::{ListenerEvent, RecordingListener};
pub use scalar::{PreparedScalarOp, ScalarFn, ScalarOpHandler};

//! Graph structure: ops, variables, and the definitions they are built from.
//!
//! The graph is owned outside the execution engine and is read-only while a
//! session runs. It can be built fluently with [`GraphBuilder`] or from a
//! serializable [`GraphDefinition`] (YAML).

mod builder;
mod definition;
mod model;
mod op;
mod variable;

pub use builder::GraphBuilder;
pub use definition::{GraphDefinition, OpDefinition, VariableDefinition};
pub use model::Graph;
pub use op::{OpKind, OpNode};
pub use variable::{Variable, VariableKind};

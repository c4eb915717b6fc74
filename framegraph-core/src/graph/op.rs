//! Operation nodes and their kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an operation.
///
/// Plain ops are opaque to the scheduler; the five control-flow kinds
/// implement conditionals and loops over an otherwise static graph and are
/// each special-cased by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpKind {
    /// A regular operation. `op_type` selects the implementation in the op
    /// handler (e.g. "add", "matmul", "loop_cond").
    Op {
        /// Implementation selector.
        op_type: String,
    },
    /// Forwards its input into iteration 0 of a child frame.
    Enter {
        /// Name of the frame being entered.
        frame_name: String,
        /// Loop-invariant input: the value is valid in every iteration.
        #[serde(default)]
        is_constant: bool,
    },
    /// Forwards its input from a frame back to the parent frame.
    Exit,
    /// Forwards its input to the next iteration of the current frame.
    NextIteration,
    /// Forwards whichever of its two inputs becomes available first.
    Merge,
    /// Forwards its data input to output 0 when the predicate is true, to
    /// output 1 otherwise.
    Switch,
}

impl OpKind {
    /// Create a plain op kind.
    pub fn op(op_type: impl Into<String>) -> Self {
        Self::Op {
            op_type: op_type.into(),
        }
    }

    /// Create an Enter kind.
    pub fn enter(frame_name: impl Into<String>, is_constant: bool) -> Self {
        Self::Enter {
            frame_name: frame_name.into(),
            is_constant,
        }
    }

    /// Whether this is one of the five control-flow kinds.
    #[must_use]
    pub fn is_control_flow(&self) -> bool {
        !matches!(self, Self::Op { .. })
    }

    /// Short name used in logs and validation messages.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Op { op_type } => op_type,
            Self::Enter { .. } => "enter",
            Self::Exit => "exit",
            Self::NextIteration => "next_iteration",
            Self::Merge => "merge",
            Self::Switch => "switch",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter {
                frame_name,
                is_constant: true,
            } => write!(f, "enter({}, constant)", frame_name),
            Self::Enter { frame_name, .. } => write!(f, "enter({})", frame_name),
            other => f.write_str(other.name()),
        }
    }
}

/// An operation in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpNode {
    /// Unique op name.
    pub name: String,
    /// Op kind.
    pub kind: OpKind,
    /// Input variable names, in declared order.
    pub inputs: Vec<String>,
    /// Output variable names, in declared order.
    pub outputs: Vec<String>,
    /// Ops that must execute before this op.
    pub control_deps: Vec<String>,
    /// Variables that must be available before this op executes.
    pub var_control_deps: Vec<String>,
    /// Ops and variables that list this op as a control dependency.
    /// Derived when the graph is built.
    pub control_dep_for: Vec<String>,
}

impl OpNode {
    /// Create an op with inputs and outputs and no control dependencies.
    pub fn new(
        name: impl Into<String>,
        kind: OpKind,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs,
            outputs,
            control_deps: Vec::new(),
            var_control_deps: Vec::new(),
            control_dep_for: Vec::new(),
        }
    }

    /// Position of `var` among the declared outputs.
    #[must_use]
    pub fn output_index(&self, var: &str) -> Option<usize> {
        self.outputs.iter().position(|o| o == var)
    }

    /// Whether the op has no data inputs and no control dependencies.
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.inputs.is_empty() && self.control_deps.is_empty() && self.var_control_deps.is_empty()
    }

    /// Whether this is a Switch op.
    #[must_use]
    pub fn is_switch(&self) -> bool {
        matches!(self.kind, OpKind::Switch)
    }
}

//! Graph variables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of value a variable holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Fixed value owned by the graph.
    Constant,
    /// Trainable parameter owned by the graph.
    Variable,
    /// Value supplied by the caller on every request.
    Placeholder,
    /// Output of an op.
    Array,
}

impl VariableKind {
    /// Whether values of this kind are the same in every frame and
    /// iteration.
    #[must_use]
    pub fn is_frame_invariant(&self) -> bool {
        !matches!(self, Self::Array)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Constant => "constant",
            Self::Variable => "variable",
            Self::Placeholder => "placeholder",
            Self::Array => "array",
        };
        f.write_str(s)
    }
}

/// A named value in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Unique variable name.
    pub name: String,
    /// Variable kind.
    pub kind: VariableKind,
    /// Ops that must execute before this variable is usable.
    pub control_deps: Vec<String>,
    /// The op producing this variable (set for `Array` variables).
    pub output_of_op: Option<String>,
    /// Ops consuming this variable as a data input.
    pub inputs_for_op: Vec<String>,
    /// Ops listing this variable as a variable control dependency.
    pub control_deps_for_op: Vec<String>,
}

impl Variable {
    /// Create a variable with no links.
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            control_deps: Vec::new(),
            output_of_op: None,
            inputs_for_op: Vec::new(),
            control_deps_for_op: Vec::new(),
        }
    }

    /// Whether this is a placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.kind == VariableKind::Placeholder
    }
}

//! Execution steps: the unit of scheduling.

use framegraph_core::types::FrameIter;
use std::fmt;

/// What an execution step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExecType {
    /// Execute an op.
    Op,
    /// Make a trainable variable available.
    Variable,
    /// Make a constant available.
    Constant,
    /// Make a placeholder available.
    Placeholder,
    /// Output 0 (true branch) of a Switch was produced.
    SwitchLeft,
    /// Output 1 (false branch) of a Switch was produced.
    SwitchRight,
    /// Root of the dependency graph, satisfied when execution starts.
    ExecStart,
    /// An op that constants/variables wait on has executed.
    ControlDep,
}

impl fmt::Display for ExecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Op => "OP",
            Self::Variable => "VARIABLE",
            Self::Constant => "CONSTANT",
            Self::Placeholder => "PLACEHOLDER",
            Self::SwitchLeft => "SWITCH_L",
            Self::SwitchRight => "SWITCH_R",
            Self::ExecStart => "EXEC_START",
            Self::ControlDep => "CONTROL_DEP",
        };
        f.write_str(s)
    }
}

/// One schedulable step: an op (or variable) in a specific frame/iteration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecStep {
    /// Step type.
    pub kind: ExecType,
    /// Op or variable name.
    pub name: String,
    /// Frame/iteration the step runs in. `None` for the start marker and
    /// control-dependency shims.
    pub frame_iter: Option<FrameIter>,
}

const EXEC_START: &str = "__exec_start__";

impl ExecStep {
    /// Create a step.
    pub fn new(kind: ExecType, name: impl Into<String>, frame_iter: Option<FrameIter>) -> Self {
        Self {
            kind,
            name: name.into(),
            frame_iter,
        }
    }

    /// Execute `op` in `frame_iter`.
    pub fn op(name: impl Into<String>, frame_iter: FrameIter) -> Self {
        Self::new(ExecType::Op, name, Some(frame_iter))
    }

    /// Trainable variable, pinned to the outer frame.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ExecType::Variable, name, Some(FrameIter::outer()))
    }

    /// Constant, pinned to the outer frame.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::new(ExecType::Constant, name, Some(FrameIter::outer()))
    }

    /// Placeholder, pinned to the outer frame.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(ExecType::Placeholder, name, Some(FrameIter::outer()))
    }

    /// One branch of Switch `op` in `frame_iter`. `index` 0 is the true
    /// branch.
    pub fn switch_branch(op: impl Into<String>, index: usize, frame_iter: FrameIter) -> Self {
        let kind = if index == 0 {
            ExecType::SwitchLeft
        } else {
            ExecType::SwitchRight
        };
        Self::new(kind, op, Some(frame_iter))
    }

    /// The start marker.
    pub fn exec_start() -> Self {
        Self::new(ExecType::ExecStart, EXEC_START, None)
    }

    /// Shim satisfied once `op` has executed in any frame.
    pub fn control_dep(op: impl Into<String>) -> Self {
        Self::new(ExecType::ControlDep, op, None)
    }

    /// Output index selected by a Switch branch step.
    pub fn switch_index(&self) -> Option<usize> {
        match self.kind {
            ExecType::SwitchLeft => Some(0),
            ExecType::SwitchRight => Some(1),
            _ => None,
        }
    }

    /// Whether this step makes a constant, variable or placeholder available.
    pub fn is_frame_invariant(&self) -> bool {
        matches!(
            self.kind,
            ExecType::Constant | ExecType::Variable | ExecType::Placeholder
        )
    }

    /// Frame/iteration, or the outer frame when the step has none.
    pub fn frame_iter_or_outer(&self) -> FrameIter {
        self.frame_iter.clone().unwrap_or_else(FrameIter::outer)
    }
}

impl fmt::Display for ExecStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.frame_iter {
            Some(fi) => write!(f, "{}({} @ {})", self.kind, self.name, fi),
            None => write!(f, "{}({})", self.kind, self.name),
        }
    }
}

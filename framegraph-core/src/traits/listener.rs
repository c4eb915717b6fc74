//! Execution listeners.

use crate::graph::OpNode;
use crate::types::{FrameIter, VarId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the graph is being executed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Plain forward pass.
    #[default]
    Inference,
    /// Forward pass during training.
    Training,
    /// Validation pass during training.
    TrainingValidation,
    /// Evaluation pass.
    Evaluation,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inference => "inference",
            Self::Training => "training",
            Self::TrainingValidation => "training_validation",
            Self::Evaluation => "evaluation",
        };
        f.write_str(s)
    }
}

/// Position in a training or inference loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct At {
    /// Epoch number.
    pub epoch: u64,
    /// Iteration within the epoch.
    pub iteration: u64,
    /// What the execution is for.
    pub operation: Operation,
}

impl At {
    /// Create a position.
    pub fn new(epoch: u64, iteration: u64, operation: Operation) -> Self {
        Self {
            epoch,
            iteration,
            operation,
        }
    }

    /// Inference at epoch 0, iteration 0.
    pub fn inference() -> Self {
        Self::default()
    }
}

/// Observer of op executions.
///
/// All methods have empty defaults. A listener is skipped entirely when
/// [`is_active`](Listener::is_active) returns false for the current
/// operation.
pub trait Listener<T>: Send + Sync {
    /// Whether the listener wants callbacks for `operation`.
    fn is_active(&self, _operation: Operation) -> bool {
        true
    }

    /// Called before an op executes.
    fn pre_op_execution(&self, _at: &At, _op: &OpNode, _frame_iter: &FrameIter) {}

    /// Called after an op executed, with every declared output.
    fn op_execution(
        &self,
        _at: &At,
        _op: &OpNode,
        _frame_iter: &FrameIter,
        _outputs: &[Option<T>],
    ) {
    }

    /// Called when a required activation becomes available.
    ///
    /// `op` is `None` for constants, variables and placeholders.
    fn activation_available(&self, _at: &At, _op: Option<&OpNode>, _var_id: &VarId, _value: &T) {}
}

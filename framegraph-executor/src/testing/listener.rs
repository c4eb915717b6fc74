//! Listener that records every callback.

use framegraph_core::graph::OpNode;
use framegraph_core::traits::{At, Listener, Operation};
use framegraph_core::types::{FrameIter, VarId};
use parking_lot::Mutex;

/// A recorded listener callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent<T> {
    /// An op is about to execute.
    PreOp {
        /// Op name.
        op: String,
        /// Frame/iteration it executes in.
        frame_iter: FrameIter,
    },
    /// An op executed.
    OpExecuted {
        /// Op name.
        op: String,
        /// Frame/iteration it executed in.
        frame_iter: FrameIter,
        /// Number of produced (non-absent) outputs.
        produced: usize,
    },
    /// A required value became available.
    Activation {
        /// Producing op, `None` for constants, variables and placeholders.
        op: Option<String>,
        /// Identity of the value.
        var_id: VarId,
        /// The value.
        value: T,
    },
}

/// [`Listener`] that records callbacks for later assertions.
#[derive(Debug)]
pub struct RecordingListener<T> {
    events: Mutex<Vec<ListenerEvent<T>>>,
    only: Option<Operation>,
}

impl<T> Default for RecordingListener<T> {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            only: None,
        }
    }
}

impl<T: Clone> RecordingListener<T> {
    /// Create a listener active for every operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a listener active only for `operation`.
    pub fn only(operation: Operation) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            only: Some(operation),
        }
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<ListenerEvent<T>> {
        self.events.lock().clone()
    }

    /// Names of executed ops, in order.
    pub fn executed_ops(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::OpExecuted { op, .. } => Some(op.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded activations as `(identity, value)` pairs.
    pub fn activations(&self) -> Vec<(VarId, T)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::Activation { var_id, value, .. } => {
                    Some((var_id.clone(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl<T: Clone + Send> Listener<T> for RecordingListener<T> {
    fn is_active(&self, operation: Operation) -> bool {
        self.only.is_none_or(|only| only == operation)
    }

    fn pre_op_execution(&self, _at: &At, op: &OpNode, frame_iter: &FrameIter) {
        self.events.lock().push(ListenerEvent::PreOp {
            op: op.name.clone(),
            frame_iter: frame_iter.clone(),
        });
    }

    fn op_execution(&self, _at: &At, op: &OpNode, frame_iter: &FrameIter, outputs: &[Option<T>]) {
        self.events.lock().push(ListenerEvent::OpExecuted {
            op: op.name.clone(),
            frame_iter: frame_iter.clone(),
            produced: outputs.iter().filter(|o| o.is_some()).count(),
        });
    }

    fn activation_available(&self, _at: &At, op: Option<&OpNode>, var_id: &VarId, value: &T) {
        self.events.lock().push(ListenerEvent::Activation {
            op: op.map(|o| o.name.clone()),
            var_id: var_id.clone(),
            value: value.clone(),
        });
    }
}

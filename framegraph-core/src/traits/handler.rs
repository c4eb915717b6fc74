//! Op handler trait and the resolved inputs handed to it.

use super::listener::At;
use crate::error::{FrameGraphError, Result};
use crate::graph::{OpNode, Variable};
use crate::types::{FrameIter, RunId, VarId};
use std::collections::{HashMap, HashSet};

/// Where a resolved op input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// Produced by an op in a specific frame/iteration.
    Frame,
    /// A trainable variable, held in the outer frame.
    OuterVariable,
    /// A constant or placeholder, held in the outer frame.
    ConstantOrPlaceholder,
    /// Not available for this execution (the unused side of a Merge).
    Absent,
}

/// One declared input of an op, resolved for a single execution.
#[derive(Debug)]
pub struct InputSlot<'a, T> {
    /// Declared input variable name.
    pub name: &'a str,
    /// Identity the value was read from.
    pub var_id: Option<VarId>,
    /// Where the value came from.
    pub source: InputSource,
    /// The value, if available.
    pub value: Option<&'a T>,
}

/// The inputs of one op execution, aligned with the op's declared inputs.
#[derive(Debug)]
pub struct OpInputs<'a, T> {
    op: &'a str,
    slots: Vec<InputSlot<'a, T>>,
}

impl<'a, T> OpInputs<'a, T> {
    /// Create resolved inputs for `op`.
    pub fn new(op: &'a str, slots: Vec<InputSlot<'a, T>>) -> Self {
        Self { op, slots }
    }

    /// Name of the op these inputs belong to.
    pub fn op(&self) -> &str {
        self.op
    }

    /// Number of declared inputs.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the op has no declared inputs.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value of the input at `idx`, if present.
    pub fn get(&self, idx: usize) -> Option<&'a T> {
        self.slots.get(idx).and_then(|s| s.value)
    }

    /// Value of the input at `idx`, failing if it is absent.
    pub fn require(&self, idx: usize) -> Result<&'a T> {
        self.get(idx).ok_or_else(|| {
            FrameGraphError::op_failed(self.op, format!("input {} is not available", idx))
        })
    }

    /// Value of the first input named `name`.
    pub fn by_name(&self, name: &str) -> Option<&'a T> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.value)
    }

    /// Present inputs with their positions.
    pub fn present(&self) -> impl Iterator<Item = (usize, &'a T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.map(|v| (i, v)))
    }

    /// All slots.
    pub fn slots(&self) -> &[InputSlot<'a, T>] {
        &self.slots
    }

    /// Identities of inputs produced inside a frame/iteration.
    pub fn frame_var_ids(&self) -> impl Iterator<Item = &VarId> {
        self.ids_from(InputSource::Frame)
    }

    /// Identities of trainable-variable inputs.
    pub fn outer_var_ids(&self) -> impl Iterator<Item = &VarId> {
        self.ids_from(InputSource::OuterVariable)
    }

    /// Names of constant and placeholder inputs.
    pub fn constant_and_placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|s| s.source == InputSource::ConstantOrPlaceholder)
            .map(|s| s.name)
    }

    fn ids_from(&self, source: InputSource) -> impl Iterator<Item = &VarId> {
        self.slots
            .iter()
            .filter(move |s| s.source == source)
            .filter_map(|s| s.var_id.as_ref())
    }
}

/// Per-execution context passed to the op handler.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// The top-level call this execution belongs to.
    pub run_id: RunId,
    /// Step counter within the call.
    pub step: u64,
    /// Training/inference position.
    pub at: &'a At,
    /// Every variable the caller needs (outputs plus activations).
    pub required: &'a HashSet<String>,
}

/// Executes the numeric side of ops on behalf of the scheduler.
///
/// The scheduler decides *when* and in *which frame/iteration* an op runs;
/// the handler decides *what* it computes. Execution happens in two phases
/// so that a handler can bind inputs and allocate outputs before running
/// the kernel.
///
/// # Control-flow ops
///
/// Handlers are also called for the five control-flow kinds and must
/// implement their forwarding semantics:
/// - Enter, Exit, NextIteration: forward input 0 to output 0.
/// - Merge: forward whichever input is present.
/// - Switch: forward input 0 to output 0 when input 1 is true, to output 1
///   otherwise, returning `None` for the other output.
///
/// Errors returned from the handler abort the execution and are returned
/// to the caller unchanged.
pub trait OpHandler<T> {
    /// An op bound to its inputs, ready to execute.
    type Prepared;

    /// Fetch the value of a constant or trainable variable.
    fn constant_or_variable(&mut self, variable: &Variable) -> Result<T>;

    /// Bind inputs to an executable op instance.
    fn parameterize(
        &mut self,
        op: &OpNode,
        frame_iter: &FrameIter,
        inputs: &OpInputs<'_, T>,
        placeholders: &HashMap<String, T>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Self::Prepared>;

    /// Execute a prepared op.
    ///
    /// Returns one entry per declared output, in declared order. `None`
    /// means the output was not produced, which is only legal for Switch.
    fn execute(
        &mut self,
        prepared: Self::Prepared,
        frame_iter: &FrameIter,
        inputs: &OpInputs<'_, T>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Vec<Option<T>>>;

    /// Transform placeholder values before execution starts.
    fn preprocess_placeholders(
        &mut self,
        placeholders: HashMap<String, T>,
        _at: &At,
    ) -> Result<HashMap<String, T>> {
        Ok(placeholders)
    }

    /// Transform the output map before it is returned.
    fn postprocess_output(&mut self, outputs: HashMap<String, T>) -> Result<HashMap<String, T>> {
        Ok(outputs)
    }
}

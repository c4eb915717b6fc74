//! Mapping from variables and ops to the execution steps they depend on.

use super::step::ExecStep;
use crate::dependency::DependencyTracker;
use framegraph_core::error::{FrameGraphError, Result};
use framegraph_core::graph::{Graph, OpKind, OpNode, VariableKind};
use framegraph_core::types::FrameIter;

/// Resolves which step produces a variable in a given frame/iteration and
/// registers op dependencies with the tracker.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    graph: &'a Graph,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over `graph`.
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// The step that makes `var` available to a consumer running in
    /// `frame_iter`.
    pub fn exec_step_for_var(&self, var: &str, frame_iter: &FrameIter) -> Result<ExecStep> {
        let variable = self.graph.require_variable(var)?;
        match variable.kind {
            VariableKind::Constant => Ok(ExecStep::constant(var)),
            VariableKind::Variable => Ok(ExecStep::variable(var)),
            VariableKind::Placeholder => Ok(ExecStep::placeholder(var)),
            VariableKind::Array => {
                let op = self.graph.producer_of(var).ok_or_else(|| {
                    FrameGraphError::internal(format!("array variable '{}' has no producer", var))
                })?;
                match &op.kind {
                    OpKind::Switch => {
                        let idx = op.output_index(var).filter(|i| *i < 2).ok_or_else(|| {
                            FrameGraphError::internal(format!(
                                "'{}' is not a branch output of switch '{}'",
                                var, op.name
                            ))
                        })?;
                        Ok(ExecStep::switch_branch(&op.name, idx, frame_iter.clone()))
                    }
                    OpKind::Enter {
                        is_constant: true, ..
                    } => Ok(ExecStep::op(
                        &op.name,
                        self.constant_enter_frame(op, frame_iter),
                    )),
                    _ => Ok(ExecStep::op(&op.name, frame_iter.clone())),
                }
            }
        }
    }

    /// Frame/iteration in which a constant Enter's output is available.
    ///
    /// The value is produced once, in iteration 0. When the Enter's input
    /// is itself a constant Enter output, the parent is pinned the same way.
    fn constant_enter_frame(&self, enter: &OpNode, frame_iter: &FrameIter) -> FrameIter {
        let frame = match &enter.kind {
            OpKind::Enter { frame_name, .. } => frame_name.clone(),
            _ => frame_iter.frame.clone(),
        };

        let parent = frame_iter.parent().map(|parent| {
            match enter
                .inputs
                .first()
                .and_then(|input| self.graph.producer_of(input))
            {
                Some(upstream)
                    if matches!(
                        upstream.kind,
                        OpKind::Enter {
                            is_constant: true,
                            ..
                        }
                    ) =>
                {
                    self.constant_enter_frame(upstream, parent)
                }
                _ => parent.clone(),
            }
        });

        FrameIter::new(frame, 0, parent)
    }

    /// Register the dependencies of executing `op` in `frame_iter`.
    ///
    /// For NextIteration the registered step runs in the following
    /// iteration, while its inputs are resolved in `frame_iter`.
    pub fn add_dependencies_for_op(
        &self,
        tracker: &mut DependencyTracker<ExecStep>,
        op: &OpNode,
        frame_iter: &FrameIter,
    ) -> Result<()> {
        let is_next_iteration = matches!(op.kind, OpKind::NextIteration);
        let step_frame = if is_next_iteration {
            frame_iter.next_iteration()
        } else {
            frame_iter.clone()
        };
        let step = ExecStep::op(&op.name, step_frame.clone());

        if !is_next_iteration && tracker.has_dependency(&step) {
            return Ok(());
        }

        match op.kind {
            OpKind::Merge => {
                let first = self.exec_step_for_var(&op.inputs[0], frame_iter)?;
                let second = self.exec_step_for_var(&op.inputs[1], frame_iter)?;
                tracker.add_or_dependency(step.clone(), first, second)?;
            }
            _ => {
                for input in &op.inputs {
                    let dep = self.exec_step_for_var(input, frame_iter)?;
                    tracker.add_dependency(step.clone(), dep)?;
                }
            }
        }

        for cd in &op.control_deps {
            tracker.add_dependency(step.clone(), ExecStep::op(cd, step_frame.clone()))?;
        }

        for var in &op.var_control_deps {
            let dep = self.exec_step_for_var(var, &step_frame)?;
            tracker.add_dependency(step.clone(), dep)?;
        }

        tracing::trace!(step = %step, "Registered op dependencies");
        Ok(())
    }
}

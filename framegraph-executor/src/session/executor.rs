//! Session executor.
//!
//! A [`Session`] computes requested variables of a [`Graph`] by scheduling
//! execution steps through a [`DependencyTracker`]. Steps are keyed by op
//! name *and* frame/iteration, so loop bodies run once per iteration and
//! nested loops run once per enclosing iteration.
//!
//! ## Lifecycle of a call
//!
//! 1. Validate the request (non-empty, known names)
//! 2. Select the subgraph needed for the request and check placeholders
//! 3. Seed constants, variables, placeholders and zero-input ops behind the
//!    start marker
//! 4. Repeatedly take a ready step, execute it, register the dependencies of
//!    its consumers and mark it satisfied, until every required variable has
//!    a value
//!
//! All per-call state (tracker, subgraph, store, stats) belongs to the
//! session and is reset at the start of each call.

use super::config::SessionConfig;
use super::request::OutputRequest;
use super::resolver::Resolver;
use super::stats::ExecutionStats;
use super::step::{ExecStep, ExecType};
use super::store::OutputStore;
use super::subgraph::Subgraph;
use crate::dependency::{DependencyList, DependencyTracker};
use framegraph_core::error::{FrameGraphError, Result};
use framegraph_core::graph::{Graph, OpKind, OpNode, VariableKind};
use framegraph_core::traits::{
    At, ExecutionContext, InputSlot, InputSource, Listener, OpHandler, OpInputs,
};
use framegraph_core::types::{FrameIter, RunId, VarId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Per-call bookkeeping that does not outlive a call.
struct Run<T> {
    run_id: RunId,
    at: At,
    listeners: Vec<Arc<dyn Listener<T>>>,
    placeholders: HashMap<String, T>,
    required: HashSet<String>,
    /// Required variable -> identity of its most recent value.
    produced: HashMap<String, VarId>,
    current: FrameIter,
    steps: u64,
    ops_executed: u64,
    max_frame_depth: usize,
    max_iteration: u64,
}

impl<T> Run<T> {
    fn remaining(&self) -> usize {
        self.required.len() - self.produced.len()
    }

    fn missing(&self, limit: usize) -> Vec<String> {
        let mut missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !self.produced.contains_key(*name))
            .cloned()
            .collect();
        missing.sort();
        missing.truncate(limit);
        missing
    }

    fn observe_frame(&mut self, frame_iter: &FrameIter) {
        self.max_frame_depth = self.max_frame_depth.max(frame_iter.depth());
        self.max_iteration = self.max_iteration.max(frame_iter.iteration);
    }
}

/// Executes a graph for requested outputs, handling conditionals and
/// (nested) loops.
pub struct Session<T, H> {
    graph: Arc<Graph>,
    handler: H,
    config: SessionConfig,
    tracker: DependencyTracker<ExecStep>,
    subgraph: Subgraph,
    store: OutputStore<T>,
    stats: ExecutionStats,
}

impl<T, H> Session<T, H>
where
    T: Clone,
    H: OpHandler<T>,
{
    /// Create a session with default configuration.
    pub fn new(graph: Arc<Graph>, handler: H) -> Self {
        Self::with_config(graph, handler, SessionConfig::default())
    }

    /// Create a session with the given configuration.
    pub fn with_config(graph: Arc<Graph>, handler: H, config: SessionConfig) -> Self {
        Self {
            graph,
            handler,
            config,
            tracker: DependencyTracker::new(),
            subgraph: Subgraph::default(),
            store: OutputStore::new(),
            stats: ExecutionStats::default(),
        }
    }

    /// The graph being executed.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The op handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The op handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Values computed by the most recent call.
    pub fn store(&self) -> &OutputStore<T> {
        &self.store
    }

    /// Statistics of the most recent call.
    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Subgraph selected by the most recent call.
    pub fn subgraph(&self) -> &Subgraph {
        &self.subgraph
    }

    /// Compute `outputs` given placeholder values.
    pub fn output_simple(
        &mut self,
        outputs: &[&str],
        placeholders: HashMap<String, T>,
    ) -> Result<HashMap<String, T>> {
        self.output(
            OutputRequest::new()
                .outputs_from(outputs.iter().copied())
                .placeholders(placeholders),
        )
    }

    /// Compute the requested outputs.
    ///
    /// Returns one entry per requested output. Required activations are
    /// only delivered to listeners.
    ///
    /// Execution stops as soon as every required variable has a value, and
    /// each output holds the most recent value stored for it at that point.
    /// A variable inside a loop therefore depends on what else is required:
    /// requested alone it yields its first-iteration value, requested next
    /// to the loop's exit it yields the value from the final iteration.
    #[instrument(
        skip_all,
        fields(
            run_id = tracing::field::Empty,
            graph = self.graph.name().unwrap_or("<unnamed>"),
            outputs = request.outputs.len(),
            activations = request.required_activations.len(),
        )
    )]
    pub fn output(&mut self, request: OutputRequest<T>) -> Result<HashMap<String, T>> {
        let started = Instant::now();
        let run_id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let OutputRequest {
            outputs,
            placeholders,
            required_activations,
            listeners,
            at,
        } = request;

        if outputs.is_empty() && required_activations.is_empty() {
            return Err(FrameGraphError::EmptyRequest);
        }
        for name in outputs.iter().chain(&required_activations) {
            self.graph.require_variable(name)?;
        }
        for name in placeholders.keys() {
            if !self.graph.variable(name).is_some_and(|v| v.is_placeholder()) {
                tracing::warn!(name = %name, "Ignoring value supplied for a non-placeholder");
            }
        }

        self.reset(run_id);

        let placeholders = self.handler.preprocess_placeholders(placeholders, &at)?;
        let required: HashSet<String> = outputs
            .iter()
            .chain(&required_activations)
            .cloned()
            .collect();

        let graph = Arc::clone(&self.graph);
        self.subgraph = Subgraph::select(&graph, &required)?;

        for ph in graph.placeholders() {
            if self.subgraph.contains_var(&ph.name) && !placeholders.contains_key(&ph.name) {
                return Err(FrameGraphError::MissingPlaceholder {
                    name: ph.name.clone(),
                });
            }
        }

        let mut run = Run {
            run_id,
            at,
            listeners: listeners
                .into_iter()
                .filter(|l| l.is_active(at.operation))
                .collect(),
            placeholders,
            required,
            produced: HashMap::new(),
            current: FrameIter::outer(),
            steps: 0,
            ops_executed: 0,
            max_frame_depth: 0,
            max_iteration: 0,
        };

        self.seed(&graph)?;
        let result = self.run(&graph, &mut run);

        self.stats = ExecutionStats {
            run_id: Some(run_id),
            steps: run.steps,
            ops_executed: run.ops_executed,
            values_stored: self.store.len(),
            max_frame_depth: run.max_frame_depth,
            max_iteration: run.max_iteration,
            elapsed: started.elapsed(),
        };
        result?;

        let mut out = HashMap::with_capacity(outputs.len());
        for name in &outputs {
            let value = run
                .produced
                .get(name)
                .and_then(|id| self.store.get(id))
                .cloned()
                .ok_or_else(|| {
                    FrameGraphError::internal(format!("output '{}' was not stored", name))
                })?;
            out.insert(name.clone(), value);
        }
        let out = self.handler.postprocess_output(out)?;

        tracing::info!(
            run_id = %run_id,
            steps = self.stats.steps,
            ops = self.stats.ops_executed,
            "Execution completed"
        );
        Ok(out)
    }

    fn reset(&mut self, run_id: RunId) {
        self.tracker.clear();
        self.subgraph = Subgraph::default();
        self.store.clear();
        self.stats = ExecutionStats {
            run_id: Some(run_id),
            ..ExecutionStats::default()
        };
    }

    /// Register every step that can run without upstream values.
    fn seed(&mut self, graph: &Graph) -> Result<()> {
        let start = ExecStep::exec_start();

        for name in self.subgraph.vars() {
            let var = graph.require_variable(name)?;
            let step = match var.kind {
                VariableKind::Constant => ExecStep::constant(name),
                VariableKind::Variable => ExecStep::variable(name),
                VariableKind::Placeholder => ExecStep::placeholder(name),
                VariableKind::Array => continue,
            };
            self.tracker.add_dependency(step.clone(), start.clone())?;
            if step.kind != ExecType::Placeholder {
                for cd in &var.control_deps {
                    self.tracker
                        .add_dependency(step.clone(), ExecStep::control_dep(cd))?;
                }
            }
        }

        for name in self.subgraph.zero_input_ops() {
            self.tracker
                .add_dependency(ExecStep::op(name, FrameIter::outer()), start.clone())?;
        }

        self.tracker.mark_satisfied(start, true);
        tracing::debug!(ready = self.tracker.queued(), "Seeded execution");
        Ok(())
    }

    fn run(&mut self, graph: &Graph, run: &mut Run<T>) -> Result<()> {
        let resolver = Resolver::new(graph);

        while run.remaining() > 0 {
            if let Some(limit) = self.config.max_steps {
                if run.steps >= limit {
                    tracing::warn!(limit, remaining = run.remaining(), "Step limit exceeded");
                    return Err(FrameGraphError::StepLimitExceeded {
                        limit,
                        remaining: run.remaining(),
                    });
                }
            }

            let Some(step) = self.next_step(&run.current) else {
                let missing = run.missing(self.config.max_missing_reported);
                tracing::warn!(
                    step = run.steps,
                    remaining = run.remaining(),
                    missing = ?missing,
                    "No executable steps available"
                );
                return Err(FrameGraphError::SchedulingStall {
                    step: run.steps,
                    remaining: run.remaining(),
                    missing,
                });
            };

            run.steps += 1;
            if let Some(fi) = &step.frame_iter {
                if *fi != run.current {
                    run.current = fi.clone();
                }
                run.observe_frame(fi);
            }
            tracing::debug!(step = %step, n = run.steps, "Executing step");

            match step.kind {
                ExecType::Constant | ExecType::Variable => {
                    let var = graph.require_variable(&step.name)?;
                    let value = self.handler.constant_or_variable(var)?;
                    self.store_value(run, None, VarId::outer(&step.name), value)?;
                    self.finish_frame_invariant(graph, &resolver, &step)?;
                }
                ExecType::Placeholder => {
                    let value = run.placeholders.get(&step.name).cloned().ok_or_else(|| {
                        FrameGraphError::MissingPlaceholder {
                            name: step.name.clone(),
                        }
                    })?;
                    self.store_value(run, None, VarId::outer(&step.name), value)?;
                    self.finish_frame_invariant(graph, &resolver, &step)?;
                }
                ExecType::Op => {
                    run.ops_executed += 1;
                    self.execute_op(graph, &resolver, run, &step)?;
                }
                ExecType::SwitchLeft
                | ExecType::SwitchRight
                | ExecType::ExecStart
                | ExecType::ControlDep => {
                    return Err(FrameGraphError::internal(format!(
                        "step {} cannot be executed",
                        step
                    )));
                }
            }
        }

        Ok(())
    }

    fn next_step(&mut self, current: &FrameIter) -> Option<ExecStep> {
        if self.config.prefer_current_frame {
            let in_frame = self
                .tracker
                .new_all_satisfied_matching(|s| s.frame_iter.as_ref() == Some(current));
            if in_frame.is_some() {
                return in_frame;
            }
        }
        self.tracker.new_all_satisfied()
    }

    fn finish_frame_invariant(
        &mut self,
        graph: &Graph,
        resolver: &Resolver<'_>,
        step: &ExecStep,
    ) -> Result<()> {
        let outer = FrameIter::outer();
        self.propagate(graph, resolver, &[step.name.as_str()], &[], &outer)?;
        self.tracker.mark_satisfied(step.clone(), true);
        Ok(())
    }

    fn execute_op(
        &mut self,
        graph: &Graph,
        resolver: &Resolver<'_>,
        run: &mut Run<T>,
        step: &ExecStep,
    ) -> Result<()> {
        let op = graph.require_op(&step.name)?;
        let frame_iter = step.frame_iter_or_outer();
        let out_frame = match &op.kind {
            OpKind::Enter { frame_name, .. } => frame_iter.enter(frame_name),
            OpKind::Exit => {
                frame_iter
                    .parent()
                    .cloned()
                    .ok_or_else(|| FrameGraphError::InvalidControlFlow {
                        op: op.name.clone(),
                        cause: format!("exit executed without an enclosing frame ({})", frame_iter),
                    })?
            }
            _ => frame_iter.clone(),
        };

        for l in &run.listeners {
            l.pre_op_execution(&run.at, op, &frame_iter);
        }

        let deps = self.tracker.dependencies(step);
        let outputs = {
            let inputs = resolve_inputs(graph, op, &deps, &self.tracker, &self.store)?;
            let ctx = ExecutionContext {
                run_id: run.run_id,
                step: run.steps,
                at: &run.at,
                required: &run.required,
            };
            let prepared =
                self.handler
                    .parameterize(op, &frame_iter, &inputs, &run.placeholders, &ctx)?;
            self.handler.execute(prepared, &frame_iter, &inputs, &ctx)?
        };

        if outputs.len() != op.outputs.len() {
            return Err(FrameGraphError::OutputArity {
                op: op.name.clone(),
                expected: op.outputs.len(),
                actual: outputs.len(),
            });
        }

        for l in &run.listeners {
            l.op_execution(&run.at, op, &frame_iter, &outputs);
        }

        if op.is_switch() {
            self.finish_switch(graph, resolver, run, op, &frame_iter, outputs)?;
        } else {
            for (name, value) in op.outputs.iter().zip(outputs) {
                let value = value.ok_or_else(|| {
                    FrameGraphError::op_failed(&op.name, format!("no value for output '{}'", name))
                })?;
                self.store_value(run, Some(op), VarId::new(name, out_frame.clone()), value)?;
            }

            // Enter and Exit complete in the frame their outputs live in
            let done = ExecStep::op(&op.name, out_frame.clone());
            let produced: Vec<&str> = op.outputs.iter().map(String::as_str).collect();
            self.propagate(graph, resolver, &produced, &op.control_dep_for, &out_frame)?;
            self.tracker.mark_satisfied(done, true);
        }

        if !op.control_dep_for.is_empty() {
            let shim = ExecStep::control_dep(&op.name);
            if !self.tracker.is_satisfied(&shim) {
                self.tracker.mark_satisfied(shim, true);
            }
        }

        Ok(())
    }

    fn finish_switch(
        &mut self,
        graph: &Graph,
        resolver: &Resolver<'_>,
        run: &mut Run<T>,
        op: &OpNode,
        frame_iter: &FrameIter,
        outputs: Vec<Option<T>>,
    ) -> Result<()> {
        let present = outputs.iter().filter(|o| o.is_some()).count();
        if present != 1 {
            return Err(FrameGraphError::SwitchInvariant {
                op: op.name.clone(),
                present,
            });
        }

        let (idx, value) = outputs
            .into_iter()
            .enumerate()
            .find_map(|(i, o)| o.map(|v| (i, v)))
            .ok_or_else(|| FrameGraphError::internal("switch output vanished"))?;
        let branch_var = &op.outputs[idx];

        self.store_value(run, Some(op), VarId::new(branch_var, frame_iter.clone()), value)?;

        let branch = ExecStep::switch_branch(&op.name, idx, frame_iter.clone());
        tracing::trace!(step = %branch, "Switch branch taken");
        self.propagate(graph, resolver, &[branch_var.as_str()], &[], frame_iter)?;
        self.tracker.mark_satisfied(branch, true);
        Ok(())
    }

    /// Register dependencies for consumers of `vars` and for ops listed in
    /// `control_dep_for`, restricted to the subgraph.
    fn propagate(
        &mut self,
        graph: &Graph,
        resolver: &Resolver<'_>,
        vars: &[&str],
        control_dep_for: &[String],
        frame_iter: &FrameIter,
    ) -> Result<()> {
        for name in vars {
            let var = graph.require_variable(name)?;
            for consumer in var.inputs_for_op.iter().chain(&var.control_deps_for_op) {
                self.add_op_dependencies(graph, resolver, consumer, frame_iter)?;
            }
        }
        for name in control_dep_for {
            if graph.op(name).is_some() {
                self.add_op_dependencies(graph, resolver, name, frame_iter)?;
            }
        }
        Ok(())
    }

    fn add_op_dependencies(
        &mut self,
        graph: &Graph,
        resolver: &Resolver<'_>,
        op_name: &str,
        frame_iter: &FrameIter,
    ) -> Result<()> {
        if !self.subgraph.contains_op(op_name) {
            return Ok(());
        }
        let op = graph.require_op(op_name)?;
        resolver.add_dependencies_for_op(&mut self.tracker, op, frame_iter)
    }

    fn store_value(
        &mut self,
        run: &mut Run<T>,
        op: Option<&OpNode>,
        id: VarId,
        value: T,
    ) -> Result<()> {
        self.store.insert(id.clone(), value)?;
        if run.required.contains(&id.variable) {
            if let Some(stored) = self.store.get(&id) {
                for l in &run.listeners {
                    l.activation_available(&run.at, op, &id, stored);
                }
            }
            run.produced.insert(id.variable.clone(), id);
        }
        Ok(())
    }
}

/// Build the inputs of `op` from the steps it was scheduled behind.
fn resolve_inputs<'a, T>(
    graph: &'a Graph,
    op: &'a OpNode,
    deps: &DependencyList<ExecStep>,
    tracker: &DependencyTracker<ExecStep>,
    store: &'a OutputStore<T>,
) -> Result<OpInputs<'a, T>> {
    let candidates: Vec<&ExecStep> = deps
        .dependencies
        .iter()
        .chain(
            deps.or_dependencies
                .iter()
                .flat_map(|(a, b)| [a, b])
                .filter(|s| tracker.is_satisfied(s)),
        )
        .collect();

    let mut slots = Vec::with_capacity(op.inputs.len());
    for name in &op.inputs {
        let var = graph.require_variable(name)?;
        let slot = match var.kind {
            VariableKind::Constant | VariableKind::Placeholder => {
                outer_slot(name, InputSource::ConstantOrPlaceholder, store)
            }
            VariableKind::Variable => outer_slot(name, InputSource::OuterVariable, store),
            VariableKind::Array => {
                let producer = graph.producer_of(name).ok_or_else(|| {
                    FrameGraphError::internal(format!("array variable '{}' has no producer", name))
                })?;
                let idx = producer.output_index(name);
                let dep = candidates.iter().find(|d| {
                    d.name == producer.name
                        && match d.kind {
                            ExecType::Op => true,
                            ExecType::SwitchLeft | ExecType::SwitchRight => d.switch_index() == idx,
                            _ => false,
                        }
                });
                match dep.and_then(|d| d.frame_iter.clone()) {
                    Some(fi) => {
                        let id = VarId::new(name, fi);
                        let value = store.get(&id);
                        InputSlot {
                            name,
                            var_id: Some(id),
                            source: if value.is_some() {
                                InputSource::Frame
                            } else {
                                InputSource::Absent
                            },
                            value,
                        }
                    }
                    None => InputSlot {
                        name,
                        var_id: None,
                        source: InputSource::Absent,
                        value: None,
                    },
                }
            }
        };

        if slot.value.is_none() && !matches!(op.kind, OpKind::Merge) {
            return Err(FrameGraphError::internal(format!(
                "input '{}' of op '{}' is not available",
                name, op.name
            )));
        }
        slots.push(slot);
    }

    Ok(OpInputs::new(&op.name, slots))
}

fn outer_slot<'a, T>(
    name: &'a str,
    source: InputSource,
    store: &'a OutputStore<T>,
) -> InputSlot<'a, T> {
    let id = VarId::outer(name);
    let value = store.get(&id);
    InputSlot {
        name,
        var_id: Some(id),
        source,
        value,
    }
}

//! Scalar op handler for tests and examples.

use framegraph_core::error::{FrameGraphError, Result};
use framegraph_core::graph::{OpKind, OpNode, Variable};
use framegraph_core::traits::{ExecutionContext, OpHandler, OpInputs};
use framegraph_core::types::FrameIter;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Implementation of a plain op over `f64` values.
pub type ScalarFn = Arc<dyn Fn(&[f64]) -> Result<Vec<f64>> + Send + Sync>;

/// A registered plain op type.
struct ScalarOp {
    /// Required number of inputs, `None` for any.
    arity: Option<usize>,
    f: ScalarFn,
}

/// An op bound to its input values.
#[derive(Debug, Clone)]
pub struct PreparedScalarOp {
    name: String,
    kind: OpKind,
    values: Vec<Option<f64>>,
}

/// [`OpHandler`] over `f64` scalars.
///
/// Plain ops are looked up by `op_type` in a registry of closures; the
/// five control-flow kinds get their standard forwarding semantics. A
/// Switch predicate is true when it is non-zero.
///
/// Every op execution is recorded, so tests can assert how often and in
/// which frame/iteration an op ran.
///
/// Built-in op types: `add`, `sub`, `mul`, `neg`, `identity`, `add_one`,
/// `zero`, `less`, `greater`, `sum` (any number of inputs). Built-ins check
/// their input count and fail with an op error on a mismatch; closures
/// added through [`with_op`](Self::with_op) receive whatever inputs the op
/// declares.
pub struct ScalarOpHandler {
    values: HashMap<String, f64>,
    ops: HashMap<String, ScalarOp>,
    executed: Vec<(String, FrameIter)>,
}

impl Default for ScalarOpHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarOpHandler {
    /// Create a handler with the built-in op types.
    pub fn new() -> Self {
        let mut handler = Self {
            values: HashMap::new(),
            ops: HashMap::new(),
            executed: Vec::new(),
        };
        handler.register("add", Some(2), |x| Ok(vec![x[0] + x[1]]));
        handler.register("sub", Some(2), |x| Ok(vec![x[0] - x[1]]));
        handler.register("mul", Some(2), |x| Ok(vec![x[0] * x[1]]));
        handler.register("neg", Some(1), |x| Ok(vec![-x[0]]));
        handler.register("identity", Some(1), |x| Ok(vec![x[0]]));
        handler.register("add_one", Some(1), |x| Ok(vec![x[0] + 1.0]));
        handler.register("zero", Some(0), |_| Ok(vec![0.0]));
        handler.register("less", Some(2), |x| Ok(vec![bool_value(x[0] < x[1])]));
        handler.register("greater", Some(2), |x| Ok(vec![bool_value(x[0] > x[1])]));
        handler.register("sum", None, |x| Ok(vec![x.iter().sum()]));
        handler
    }

    /// Set the value of a constant or trainable variable.
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Register (or replace) a plain op type.
    pub fn with_op<F>(mut self, op_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[f64]) -> Result<Vec<f64>> + Send + Sync + 'static,
    {
        self.register(op_type, None, f);
        self
    }

    fn register<F>(&mut self, op_type: impl Into<String>, arity: Option<usize>, f: F)
    where
        F: Fn(&[f64]) -> Result<Vec<f64>> + Send + Sync + 'static,
    {
        self.ops.insert(
            op_type.into(),
            ScalarOp {
                arity,
                f: Arc::new(f),
            },
        );
    }

    /// Every op executed so far, with its frame/iteration, in order.
    pub fn executed(&self) -> &[(String, FrameIter)] {
        &self.executed
    }

    /// How many times `op` executed.
    pub fn execution_count(&self, op: &str) -> usize {
        self.executed.iter().filter(|(name, _)| name == op).count()
    }

    /// Forget recorded executions.
    pub fn clear_executed(&mut self) {
        self.executed.clear();
    }
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl fmt::Debug for ScalarOpHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut op_types: Vec<&String> = self.ops.keys().collect();
        op_types.sort();
        f.debug_struct("ScalarOpHandler")
            .field("values", &self.values)
            .field("op_types", &op_types)
            .field("executed", &self.executed.len())
            .finish()
    }
}

impl OpHandler<f64> for ScalarOpHandler {
    type Prepared = PreparedScalarOp;

    fn constant_or_variable(&mut self, variable: &Variable) -> Result<f64> {
        self.values
            .get(&variable.name)
            .copied()
            .ok_or_else(|| FrameGraphError::ConfigValue {
                field: variable.name.clone(),
                cause: format!("no value configured for {}", variable.kind),
            })
    }

    fn parameterize(
        &mut self,
        op: &OpNode,
        _frame_iter: &FrameIter,
        inputs: &OpInputs<'_, f64>,
        _placeholders: &HashMap<String, f64>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<PreparedScalarOp> {
        if let OpKind::Op { op_type } = &op.kind {
            let scalar = self.ops.get(op_type).ok_or_else(|| {
                FrameGraphError::op_failed(&op.name, format!("unknown op type '{}'", op_type))
            })?;
            if let Some(arity) = scalar.arity {
                if inputs.len() != arity {
                    return Err(FrameGraphError::op_failed(
                        &op.name,
                        format!("'{}' expects {} inputs, got {}", op_type, arity, inputs.len()),
                    ));
                }
            }
        }
        Ok(PreparedScalarOp {
            name: op.name.clone(),
            kind: op.kind.clone(),
            values: (0..inputs.len()).map(|i| inputs.get(i).copied()).collect(),
        })
    }

    fn execute(
        &mut self,
        prepared: PreparedScalarOp,
        frame_iter: &FrameIter,
        _inputs: &OpInputs<'_, f64>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<Vec<Option<f64>>> {
        let PreparedScalarOp { name, kind, values } = prepared;
        let input = |idx: usize| -> Result<f64> {
            values.get(idx).copied().flatten().ok_or_else(|| {
                FrameGraphError::op_failed(&name, format!("input {} is not available", idx))
            })
        };

        let outputs = match &kind {
            OpKind::Op { op_type } => {
                let args = (0..values.len()).map(input).collect::<Result<Vec<_>>>()?;
                let op = self.ops.get(op_type).ok_or_else(|| {
                    FrameGraphError::op_failed(&name, format!("unknown op type '{}'", op_type))
                })?;
                (op.f)(&args)?.into_iter().map(Some).collect()
            }
            OpKind::Enter { .. } | OpKind::Exit | OpKind::NextIteration => vec![Some(input(0)?)],
            OpKind::Merge => {
                let value = values.iter().flatten().next().copied().ok_or_else(|| {
                    FrameGraphError::op_failed(&name, "merge has no available input")
                })?;
                vec![Some(value)]
            }
            OpKind::Switch => {
                let data = input(0)?;
                if input(1)? != 0.0 {
                    vec![Some(data), None]
                } else {
                    vec![None, Some(data)]
                }
            }
        };

        self.executed.push((name, frame_iter.clone()));
        Ok(outputs)
    }
}

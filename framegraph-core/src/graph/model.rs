//! Graph representation and structural validation.

use super::definition::{GraphDefinition, OpDefinition, VariableDefinition};
use super::op::{OpKind, OpNode};
use super::variable::{Variable, VariableKind};
use crate::error::{FrameGraphError, Result};
use crate::types::OUTER_FRAME;
use std::collections::HashMap;

/// A computation graph: variables, ops, and the links between them.
///
/// Graphs are immutable once built and are shared read-only by every
/// execution. Build one with [`GraphBuilder`](super::GraphBuilder) or from a
/// [`GraphDefinition`].
#[derive(Debug, Clone)]
pub struct Graph {
    /// Optional name for logs.
    name: Option<String>,
    /// Ops keyed by name.
    ops: HashMap<String, OpNode>,
    /// Variables keyed by name.
    variables: HashMap<String, Variable>,
    /// Op names in declaration order.
    op_order: Vec<String>,
    /// Variable names in declaration order.
    variable_order: Vec<String>,
}

impl Graph {
    /// Build and validate a graph from a definition.
    pub fn from_definition(def: &GraphDefinition) -> Result<Self> {
        let mut graph = Self {
            name: def.name.clone(),
            ops: HashMap::new(),
            variables: HashMap::new(),
            op_order: Vec::new(),
            variable_order: Vec::new(),
        };

        // First pass: declared variables
        for var in &def.variables {
            graph.insert_variable(var)?;
        }

        // Second pass: ops, creating array variables for their outputs
        for op in &def.ops {
            graph.insert_op(op)?;
        }

        // Third pass: back-references
        graph.link()?;

        graph.validate()?;

        tracing::debug!(
            graph = graph.name.as_deref().unwrap_or("<unnamed>"),
            ops = graph.ops.len(),
            variables = graph.variables.len(),
            "Graph built"
        );

        Ok(graph)
    }

    /// Parse a YAML definition and build the graph.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_definition(&GraphDefinition::from_yaml(yaml)?)
    }

    fn insert_variable(&mut self, def: &VariableDefinition) -> Result<()> {
        if self.variables.contains_key(&def.name) {
            return Err(FrameGraphError::DuplicateName {
                entity: "variable",
                name: def.name.clone(),
            });
        }
        let mut var = Variable::new(&def.name, def.kind);
        var.control_deps = def.control_deps.clone();
        self.variable_order.push(def.name.clone());
        self.variables.insert(def.name.clone(), var);
        Ok(())
    }

    fn insert_op(&mut self, def: &OpDefinition) -> Result<()> {
        if self.ops.contains_key(&def.name) {
            return Err(FrameGraphError::DuplicateName {
                entity: "op",
                name: def.name.clone(),
            });
        }

        for out in &def.outputs {
            match self.variables.get_mut(out) {
                Some(var) => {
                    if var.kind != VariableKind::Array {
                        return Err(FrameGraphError::InvalidGraph {
                            cause: format!(
                                "op '{}' outputs '{}', which is declared as a {}",
                                def.name, out, var.kind
                            ),
                        });
                    }
                    if let Some(producer) = &var.output_of_op {
                        return Err(FrameGraphError::InvalidGraph {
                            cause: format!(
                                "variable '{}' is produced by both '{}' and '{}'",
                                out, producer, def.name
                            ),
                        });
                    }
                    var.output_of_op = Some(def.name.clone());
                }
                None => {
                    let mut var = Variable::new(out, VariableKind::Array);
                    var.output_of_op = Some(def.name.clone());
                    self.variable_order.push(out.clone());
                    self.variables.insert(out.clone(), var);
                }
            }
        }

        let mut op = OpNode::new(
            &def.name,
            def.kind.clone(),
            def.inputs.clone(),
            def.outputs.clone(),
        );
        op.control_deps = def.control_deps.clone();
        op.var_control_deps = def.var_control_deps.clone();
        self.op_order.push(def.name.clone());
        self.ops.insert(def.name.clone(), op);
        Ok(())
    }

    /// Fill in consumer lists and control-dependency reverse indexes.
    fn link(&mut self) -> Result<()> {
        for op_name in &self.op_order {
            let op = &self.ops[op_name];
            let inputs = op.inputs.clone();
            let var_cds = op.var_control_deps.clone();
            let op_cds = op.control_deps.clone();

            for input in &inputs {
                let var = self.variables.get_mut(input).ok_or_else(|| {
                    FrameGraphError::InvalidGraph {
                        cause: format!("op '{}' has unknown input '{}'", op_name, input),
                    }
                })?;
                if !var.inputs_for_op.contains(op_name) {
                    var.inputs_for_op.push(op_name.clone());
                }
            }

            for name in &var_cds {
                let var = self.variables.get_mut(name).ok_or_else(|| {
                    FrameGraphError::InvalidGraph {
                        cause: format!(
                            "op '{}' has unknown variable control dependency '{}'",
                            op_name, name
                        ),
                    }
                })?;
                if !var.control_deps_for_op.contains(op_name) {
                    var.control_deps_for_op.push(op_name.clone());
                }
            }

            for name in &op_cds {
                let dep = self
                    .ops
                    .get_mut(name)
                    .ok_or_else(|| FrameGraphError::UnknownOp { name: name.clone() })?;
                if !dep.control_dep_for.contains(op_name) {
                    dep.control_dep_for.push(op_name.clone());
                }
            }
        }

        for var_name in &self.variable_order {
            for op_name in self.variables[var_name].control_deps.clone() {
                let dep = self
                    .ops
                    .get_mut(&op_name)
                    .ok_or_else(|| FrameGraphError::UnknownOp {
                        name: op_name.clone(),
                    })?;
                if !dep.control_dep_for.contains(var_name) {
                    dep.control_dep_for.push(var_name.clone());
                }
            }
        }

        Ok(())
    }

    /// Validate the graph structure.
    ///
    /// Checks that every array variable has a producer and that each
    /// control-flow op has the arity the scheduler relies on.
    pub fn validate(&self) -> Result<()> {
        for var in self.variables() {
            match (var.kind, &var.output_of_op) {
                (VariableKind::Array, None) => {
                    return Err(FrameGraphError::InvalidGraph {
                        cause: format!("array variable '{}' has no producing op", var.name),
                    });
                }
                (VariableKind::Array, Some(_)) => {}
                (kind, Some(op)) => {
                    return Err(FrameGraphError::InvalidGraph {
                        cause: format!("{} '{}' cannot be the output of op '{}'", kind, var.name, op),
                    });
                }
                (_, None) => {}
            }

            if !var.control_deps.is_empty()
                && !matches!(var.kind, VariableKind::Constant | VariableKind::Variable)
            {
                tracing::warn!(
                    variable = %var.name,
                    kind = %var.kind,
                    "Control dependencies are only honored on constants and variables"
                );
            }
        }

        for op in self.ops() {
            self.validate_op(op)?;
        }

        Ok(())
    }

    fn validate_op(&self, op: &OpNode) -> Result<()> {
        let arity = |inputs: usize, outputs: usize| -> Result<()> {
            if op.inputs.len() != inputs || op.outputs.len() != outputs {
                return Err(FrameGraphError::InvalidControlFlow {
                    op: op.name.clone(),
                    cause: format!(
                        "{} requires {} inputs and {} outputs, found {} and {}",
                        op.kind.name(),
                        inputs,
                        outputs,
                        op.inputs.len(),
                        op.outputs.len()
                    ),
                });
            }
            Ok(())
        };

        match &op.kind {
            OpKind::Op { op_type } => {
                if op_type.is_empty() {
                    return Err(FrameGraphError::InvalidGraph {
                        cause: format!("op '{}' has an empty op_type", op.name),
                    });
                }
                Ok(())
            }
            OpKind::Enter { frame_name, .. } => {
                if frame_name.is_empty() || frame_name == OUTER_FRAME {
                    return Err(FrameGraphError::InvalidControlFlow {
                        op: op.name.clone(),
                        cause: format!("cannot enter frame '{}'", frame_name),
                    });
                }
                arity(1, 1)
            }
            OpKind::Exit | OpKind::NextIteration => arity(1, 1),
            OpKind::Switch => arity(2, 2),
            OpKind::Merge => {
                if op.inputs.len() != 2 || op.outputs.is_empty() {
                    return Err(FrameGraphError::InvalidControlFlow {
                        op: op.name.clone(),
                        cause: format!(
                            "merge requires 2 inputs and at least 1 output, found {} and {}",
                            op.inputs.len(),
                            op.outputs.len()
                        ),
                    });
                }
                Ok(())
            }
        }
    }

    /// Graph name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get an op by name.
    pub fn op(&self, name: &str) -> Option<&OpNode> {
        self.ops.get(name)
    }

    /// Get an op by name, failing if it does not exist.
    pub fn require_op(&self, name: &str) -> Result<&OpNode> {
        self.ops.get(name).ok_or_else(|| FrameGraphError::UnknownOp {
            name: name.to_string(),
        })
    }

    /// Get a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Get a variable by name, failing if it does not exist.
    pub fn require_variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| FrameGraphError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// Whether a variable exists.
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// The op producing `var`, if it is an array variable.
    pub fn producer_of(&self, var: &str) -> Option<&OpNode> {
        self.variables
            .get(var)
            .and_then(|v| v.output_of_op.as_deref())
            .and_then(|op| self.ops.get(op))
    }

    /// All ops, in declaration order.
    pub fn ops(&self) -> impl Iterator<Item = &OpNode> {
        self.op_order.iter().map(|name| &self.ops[name])
    }

    /// All variables, in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variable_order.iter().map(|name| &self.variables[name])
    }

    /// All placeholder variables.
    pub fn placeholders(&self) -> impl Iterator<Item = &Variable> {
        self.variables().filter(|v| v.is_placeholder())
    }

    /// Number of ops.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Convert back to a plain definition.
    ///
    /// Array variables are omitted; they are implied by op outputs.
    pub fn to_definition(&self) -> GraphDefinition {
        GraphDefinition {
            name: self.name.clone(),
            variables: self
                .variables()
                .filter(|v| v.kind != VariableKind::Array)
                .map(|v| VariableDefinition {
                    name: v.name.clone(),
                    kind: v.kind,
                    control_deps: v.control_deps.clone(),
                })
                .collect(),
            ops: self
                .ops()
                .map(|op| OpDefinition {
                    name: op.name.clone(),
                    kind: op.kind.clone(),
                    inputs: op.inputs.clone(),
                    outputs: op.outputs.clone(),
                    control_deps: op.control_deps.clone(),
                    var_control_deps: op.var_control_deps.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(ops: Vec<OpDefinition>, vars: Vec<VariableDefinition>) -> GraphDefinition {
        GraphDefinition {
            name: Some("test".to_string()),
            variables: vars,
            ops,
        }
    }

    #[test]
    fn links_consumers_and_producers() {
        let graph = Graph::from_definition(&def(
            vec![
                OpDefinition::new("add", OpKind::op("add"), &["a", "b"], &["c"]),
                OpDefinition::new("neg", OpKind::op("neg"), &["c"], &["d"]),
            ],
            vec![
                VariableDefinition::new("a", VariableKind::Placeholder),
                VariableDefinition::new("b", VariableKind::Constant),
            ],
        ))
        .unwrap();

        assert_eq!(graph.variable("c").unwrap().kind, VariableKind::Array);
        assert_eq!(graph.producer_of("c").unwrap().name, "add");
        assert_eq!(graph.variable("c").unwrap().inputs_for_op, vec!["neg"]);
        assert_eq!(graph.variable("a").unwrap().inputs_for_op, vec!["add"]);
        assert_eq!(graph.placeholders().count(), 1);
    }

    #[test]
    fn control_dep_reverse_index() {
        let mut gated = OpDefinition::new("gated", OpKind::op("noop"), &[], &["g"]);
        gated.control_deps.push("first".to_string());
        let mut konst = VariableDefinition::new("k", VariableKind::Constant);
        konst.control_deps.push("first".to_string());

        let graph = Graph::from_definition(&def(
            vec![
                OpDefinition::new("first", OpKind::op("noop"), &[], &["f"]),
                gated,
            ],
            vec![konst],
        ))
        .unwrap();

        let first = graph.op("first").unwrap();
        assert_eq!(first.control_dep_for, vec!["gated", "k"]);
    }

    #[test]
    fn unknown_input_rejected() {
        let err = Graph::from_definition(&def(
            vec![OpDefinition::new("add", OpKind::op("add"), &["a", "zzz"], &["c"])],
            vec![VariableDefinition::new("a", VariableKind::Placeholder)],
        ))
        .unwrap_err();
        assert_eq!(err.code(), "E201");
    }

    #[test]
    fn duplicate_producer_rejected() {
        let err = Graph::from_definition(&def(
            vec![
                OpDefinition::new("one", OpKind::op("noop"), &[], &["x"]),
                OpDefinition::new("two", OpKind::op("noop"), &[], &["x"]),
            ],
            vec![],
        ))
        .unwrap_err();
        assert!(err.to_string().contains("produced by both"));
    }

    #[test]
    fn switch_arity_checked() {
        let err = Graph::from_definition(&def(
            vec![OpDefinition::new("sw", OpKind::Switch, &["a", "p"], &["t"])],
            vec![
                VariableDefinition::new("a", VariableKind::Placeholder),
                VariableDefinition::new("p", VariableKind::Placeholder),
            ],
        ))
        .unwrap_err();
        assert_eq!(err.code(), "E204");
    }

    #[test]
    fn enter_outer_frame_rejected() {
        let err = Graph::from_definition(&def(
            vec![OpDefinition::new(
                "enter",
                OpKind::enter(OUTER_FRAME, false),
                &["a"],
                &["a_in"],
            )],
            vec![VariableDefinition::new("a", VariableKind::Placeholder)],
        ))
        .unwrap_err();
        assert_eq!(err.code(), "E204");
    }

    #[test]
    fn definition_round_trips_declared_structure() {
        let original = def(
            vec![OpDefinition::new("add", OpKind::op("add"), &["a", "a"], &["c"])],
            vec![VariableDefinition::new("a", VariableKind::Placeholder)],
        );
        let graph = Graph::from_definition(&original).unwrap();
        assert_eq!(graph.to_definition(), original);
    }
}

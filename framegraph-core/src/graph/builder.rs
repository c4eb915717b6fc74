//! GraphBuilder - fluent construction of graphs in code.

use super::definition::{GraphDefinition, OpDefinition, VariableDefinition};
use super::model::Graph;
use super::op::OpKind;
use super::variable::VariableKind;
use crate::error::Result;

/// Builder that accumulates a [`GraphDefinition`] and validates it into a
/// [`Graph`].
///
/// # Example
///
/// ```
/// use framegraph_core::graph::GraphBuilder;
///
/// let graph = GraphBuilder::new()
///     .placeholder("a")
///     .placeholder("b")
///     .op("add", "add", &["a", "b"], &["c"])
///     .build()
///     .unwrap();
/// assert!(graph.has_variable("c"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    def: GraphDefinition,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the graph name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.def.name = Some(name.into());
        self
    }

    /// Declare a variable of the given kind.
    pub fn variable_of(mut self, name: impl Into<String>, kind: VariableKind) -> Self {
        self.def.variables.push(VariableDefinition::new(name, kind));
        self
    }

    /// Declare a placeholder.
    pub fn placeholder(self, name: impl Into<String>) -> Self {
        self.variable_of(name, VariableKind::Placeholder)
    }

    /// Declare a constant.
    pub fn constant(self, name: impl Into<String>) -> Self {
        self.variable_of(name, VariableKind::Constant)
    }

    /// Declare a trainable variable.
    pub fn variable(self, name: impl Into<String>) -> Self {
        self.variable_of(name, VariableKind::Variable)
    }

    /// Add a plain op.
    pub fn op(
        self,
        name: impl Into<String>,
        op_type: impl Into<String>,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Self {
        self.add_op(OpDefinition::new(name, OpKind::op(op_type), inputs, outputs))
    }

    /// Add an Enter op forwarding `input` into `frame` as `output`.
    pub fn enter(
        self,
        name: impl Into<String>,
        frame: impl Into<String>,
        is_constant: bool,
        input: &str,
        output: &str,
    ) -> Self {
        self.add_op(OpDefinition::new(
            name,
            OpKind::enter(frame, is_constant),
            &[input],
            &[output],
        ))
    }

    /// Add an Exit op.
    pub fn exit(self, name: impl Into<String>, input: &str, output: &str) -> Self {
        self.add_op(OpDefinition::new(name, OpKind::Exit, &[input], &[output]))
    }

    /// Add a NextIteration op.
    pub fn next_iteration(self, name: impl Into<String>, input: &str, output: &str) -> Self {
        self.add_op(OpDefinition::new(
            name,
            OpKind::NextIteration,
            &[input],
            &[output],
        ))
    }

    /// Add a Merge op over two inputs.
    pub fn merge(self, name: impl Into<String>, first: &str, second: &str, output: &str) -> Self {
        self.add_op(OpDefinition::new(
            name,
            OpKind::Merge,
            &[first, second],
            &[output],
        ))
    }

    /// Add a Switch op routing `data` to `if_true` or `if_false`.
    pub fn switch(
        self,
        name: impl Into<String>,
        data: &str,
        predicate: &str,
        if_true: &str,
        if_false: &str,
    ) -> Self {
        self.add_op(OpDefinition::new(
            name,
            OpKind::Switch,
            &[data, predicate],
            &[if_true, if_false],
        ))
    }

    /// Add an op from a full definition.
    pub fn add_op(mut self, op: OpDefinition) -> Self {
        self.def.ops.push(op);
        self
    }

    /// Make `op` wait for `dependency` to execute.
    ///
    /// Has no effect if `op` has not been added yet.
    pub fn control_dep(mut self, op: &str, dependency: &str) -> Self {
        if let Some(def) = self.def.ops.iter_mut().find(|d| d.name == op) {
            def.control_deps.push(dependency.to_string());
        }
        self
    }

    /// Make `op` wait for variable `dependency` to be available.
    ///
    /// Has no effect if `op` has not been added yet.
    pub fn var_control_dep(mut self, op: &str, dependency: &str) -> Self {
        if let Some(def) = self.def.ops.iter_mut().find(|d| d.name == op) {
            def.var_control_deps.push(dependency.to_string());
        }
        self
    }

    /// Make constant/variable `var` unavailable until op `dependency` ran.
    ///
    /// Has no effect if `var` has not been declared yet.
    pub fn variable_control_dep(mut self, var: &str, dependency: &str) -> Self {
        if let Some(def) = self.def.variables.iter_mut().find(|d| d.name == var) {
            def.control_deps.push(dependency.to_string());
        }
        self
    }

    /// The accumulated definition.
    pub fn definition(&self) -> &GraphDefinition {
        &self.def
    }

    /// Validate and build the graph.
    pub fn build(self) -> Result<Graph> {
        Graph::from_definition(&self.def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_loop_skeleton() {
        let graph = GraphBuilder::new()
            .name("counter")
            .constant("zero")
            .placeholder("limit")
            .enter("enter_i", "loop", false, "zero", "i_enter")
            .enter("enter_n", "loop", true, "limit", "n")
            .merge("merge_i", "i_enter", "i_next", "i")
            .op("less", "less", &["i", "n"], &["cond"])
            .switch("switch_i", "i", "cond", "i_body", "i_done")
            .op("inc", "add_one", &["i_body"], &["i_plus"])
            .next_iteration("next_i", "i_plus", "i_next")
            .exit("exit_i", "i_done", "result")
            .build()
            .unwrap();

        assert_eq!(graph.name(), Some("counter"));
        assert_eq!(graph.op_count(), 8);
        assert_eq!(
            graph.op("enter_n").unwrap().kind,
            OpKind::enter("loop", true)
        );
        let i = graph.variable("i").unwrap();
        assert_eq!(i.inputs_for_op, vec!["less", "switch_i"]);
    }

    #[test]
    fn control_deps_recorded() {
        let graph = GraphBuilder::new()
            .constant("k")
            .op("init", "noop", &[], &["init_out"])
            .op("use_k", "identity", &["k"], &["k2"])
            .control_dep("use_k", "init")
            .variable_control_dep("k", "init")
            .build()
            .unwrap();

        assert_eq!(graph.op("use_k").unwrap().control_deps, vec!["init"]);
        assert_eq!(graph.variable("k").unwrap().control_deps, vec!["init"]);
        assert_eq!(graph.op("init").unwrap().control_dep_for, vec!["use_k", "k"]);
    }
}

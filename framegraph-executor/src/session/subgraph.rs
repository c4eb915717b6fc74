//! Selection of the part of a graph needed for a set of variables.

use framegraph_core::error::Result;
use framegraph_core::graph::Graph;
use std::collections::{HashSet, VecDeque};

enum Item {
    Var(String),
    Op(String),
}

/// Variables and ops needed to compute a set of required variables.
#[derive(Debug, Clone, Default)]
pub struct Subgraph {
    vars: HashSet<String>,
    ops: HashSet<String>,
    var_order: Vec<String>,
    zero_input_ops: Vec<String>,
}

impl Subgraph {
    /// Walk backwards from `required` through producers, data inputs and
    /// control dependencies.
    pub fn select<'a, I>(graph: &Graph, required: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut sub = Self::default();
        let mut queue: VecDeque<Item> = required.into_iter().cloned().map(Item::Var).collect();

        while let Some(item) = queue.pop_front() {
            match item {
                Item::Var(name) => {
                    if sub.vars.contains(&name) {
                        continue;
                    }
                    let var = graph.require_variable(&name)?;
                    if let Some(op) = &var.output_of_op {
                        queue.push_back(Item::Op(op.clone()));
                    }
                    queue.extend(var.control_deps.iter().cloned().map(Item::Op));
                    sub.vars.insert(name);
                }
                Item::Op(name) => {
                    if sub.ops.contains(&name) {
                        continue;
                    }
                    let op = graph.require_op(&name)?;
                    queue.extend(op.inputs.iter().cloned().map(Item::Var));
                    queue.extend(op.control_deps.iter().cloned().map(Item::Op));
                    queue.extend(op.var_control_deps.iter().cloned().map(Item::Var));
                    sub.ops.insert(name);
                }
            }
        }

        sub.var_order = graph
            .variables()
            .filter(|var| sub.vars.contains(&var.name))
            .map(|var| var.name.clone())
            .collect();
        sub.zero_input_ops = graph
            .ops()
            .filter(|op| op.is_source() && sub.ops.contains(&op.name))
            .map(|op| op.name.clone())
            .collect();

        tracing::debug!(
            vars = sub.vars.len(),
            ops = sub.ops.len(),
            zero_input_ops = sub.zero_input_ops.len(),
            "Subgraph selected"
        );

        Ok(sub)
    }

    /// Whether the variable is part of the subgraph.
    pub fn contains_var(&self, name: &str) -> bool {
        self.vars.contains(name)
    }

    /// Whether the op is part of the subgraph.
    pub fn contains_op(&self, name: &str) -> bool {
        self.ops.contains(name)
    }

    /// Ops with no inputs and no control dependencies, in graph order.
    pub fn zero_input_ops(&self) -> &[String] {
        &self.zero_input_ops
    }

    /// Variables in the subgraph, in graph declaration order.
    pub fn vars(&self) -> impl Iterator<Item = &String> {
        self.var_order.iter()
    }

    /// Number of ops in the subgraph.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Number of variables in the subgraph.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }
}

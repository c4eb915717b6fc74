//! Common test utilities for integration tests.

#![allow(dead_code)]

use framegraph_core::graph::{Graph, GraphBuilder};
use framegraph_executor::session::{Session, SessionConfig};
use framegraph_executor::testing::ScalarOpHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// Placeholder/constant values as a map.
pub fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Scalar handler with the constants used by the graphs below.
pub fn scalar_handler() -> ScalarOpHandler {
    ScalarOpHandler::new()
        .with_value("zero", 0.0)
        .with_value("one", 1.0)
        .with_value("two", 2.0)
        .with_value("hundred", 100.0)
        .with_value("outer_n", 2.0)
        .with_value("inner_n", 3.0)
}

/// Session over `graph` with the default scalar handler.
pub fn session(graph: Graph) -> Session<f64, ScalarOpHandler> {
    Session::new(Arc::new(graph), scalar_handler())
}

/// Session over `graph` with a custom configuration.
pub fn session_with(graph: Graph, config: SessionConfig) -> Session<f64, ScalarOpHandler> {
    Session::with_config(Arc::new(graph), scalar_handler(), config)
}

/// `c = a + b`, plus `d = -c`.
pub fn add_graph() -> Graph {
    GraphBuilder::new()
        .name("add")
        .placeholder("a")
        .placeholder("b")
        .op("add", "add", &["a", "b"], &["c"])
        .op("neg", "neg", &["c"], &["d"])
        .build()
        .unwrap()
}

/// `y = cond ? x * 2 : x + 100`
pub fn conditional_graph() -> Graph {
    GraphBuilder::new()
        .name("conditional")
        .placeholder("x")
        .placeholder("cond")
        .constant("two")
        .constant("hundred")
        .switch("switch", "x", "cond", "x_t", "x_f")
        .op("double", "mul", &["x_t", "two"], &["y_t"])
        .op("shift", "add", &["x_f", "hundred"], &["y_f"])
        .merge("merge", "y_t", "y_f", "y")
        .build()
        .unwrap()
}

/// `i = 0; while i < n { i += 1 }; result = i`
pub fn counter_graph() -> Graph {
    GraphBuilder::new()
        .name("counter")
        .constant("zero")
        .placeholder("n")
        .enter("enter_i", "loop", false, "zero", "i_enter")
        .enter("enter_n", "loop", true, "n", "n_in")
        .merge("merge_i", "i_enter", "i_next", "i")
        .op("less", "less", &["i", "n_in"], &["cond"])
        .switch("switch_i", "i", "cond", "i_body", "i_done")
        .op("inc", "add_one", &["i_body"], &["i_plus"])
        .next_iteration("next_i", "i_plus", "i_next")
        .exit("exit_i", "i_done", "result")
        .build()
        .unwrap()
}

/// Nested loops:
///
/// ```text
/// total = 0
/// for i in 0..outer_n {
///     acc = 0
///     for j in 0..inner_n { acc += i + 1 }
///     total += acc
/// }
/// ```
///
/// With outer_n = 2 and inner_n = 3: total = 3 * 1 + 3 * 2 = 9.
///
/// The inner accumulator is reset by a `zero` op that runs once per outer
/// iteration, gated by a control dependency on the outer pivot. `inner_n`
/// and `one` reach the inner frame through two constant Enters.
pub fn nested_graph() -> Graph {
    GraphBuilder::new()
        .name("nested")
        .constant("zero")
        .constant("one")
        .constant("outer_n")
        .constant("inner_n")
        // Outer frame
        .enter("enter_i", "outer", false, "zero", "i_in")
        .enter("enter_t", "outer", false, "zero", "t_in")
        .enter("enter_on", "outer", true, "outer_n", "on")
        .enter("enter_one_o", "outer", true, "one", "one_o")
        .enter("enter_in_o", "outer", true, "inner_n", "in_o")
        .merge("merge_i", "i_in", "i_next", "i")
        .merge("merge_t", "t_in", "t_next", "t")
        .op("less_o", "less", &["i", "on"], &["c_o"])
        .switch("switch_i", "i", "c_o", "i_body", "i_done")
        .switch("switch_t", "t", "c_o", "t_body", "t_done")
        .op("pivot", "identity", &["i_body"], &["i_cur"])
        .op("inc_i", "add", &["i_cur", "one_o"], &["i_plus"])
        .next_iteration("next_i", "i_plus", "i_next")
        .op("zero_fill", "zero", &[], &["z"])
        .control_dep("zero_fill", "pivot")
        // Inner frame
        .enter("enter_j", "inner", false, "z", "j_in")
        .enter("enter_acc", "inner", false, "z", "acc_in")
        .enter("enter_m", "inner", true, "in_o", "m")
        .enter("enter_one_i", "inner", true, "one_o", "one_i")
        .enter("enter_d", "inner", true, "i_plus", "d")
        .merge("merge_j", "j_in", "j_next", "j")
        .merge("merge_acc", "acc_in", "acc_next", "acc")
        .op("less_i", "less", &["j", "m"], &["c_i"])
        .switch("switch_j", "j", "c_i", "j_body", "j_done")
        .switch("switch_acc", "acc", "c_i", "acc_body", "acc_done")
        .op("inc_j", "add", &["j_body", "one_i"], &["j_plus"])
        .next_iteration("next_j", "j_plus", "j_next")
        .op("inc_acc", "add", &["acc_body", "d"], &["acc_plus"])
        .next_iteration("next_acc", "acc_plus", "acc_next")
        .exit("exit_acc", "acc_done", "inner_final")
        // Back in the outer frame
        .op("add_t", "add", &["t_body", "inner_final"], &["t_plus"])
        .next_iteration("next_t", "t_plus", "t_next")
        .exit("exit_t", "t_done", "total")
        .build()
        .unwrap()
}

/// Counter graph in YAML form.
pub const COUNTER_YAML: &str = r#"
name: counter
variables:
  - name: zero
    kind: constant
  - name: n
    kind: placeholder
ops:
  - name: enter_i
    kind: { type: enter, frame_name: loop }
    inputs: [zero]
    outputs: [i_enter]
  - name: enter_n
    kind: { type: enter, frame_name: loop, is_constant: true }
    inputs: [n]
    outputs: [n_in]
  - name: merge_i
    kind: { type: merge }
    inputs: [i_enter, i_next]
    outputs: [i]
  - name: less
    kind: { type: op, op_type: less }
    inputs: [i, n_in]
    outputs: [cond]
  - name: switch_i
    kind: { type: switch }
    inputs: [i, cond]
    outputs: [i_body, i_done]
  - name: inc
    kind: { type: op, op_type: add_one }
    inputs: [i_body]
    outputs: [i_plus]
  - name: next_i
    kind: { type: next_iteration }
    inputs: [i_plus]
    outputs: [i_next]
  - name: exit_i
    kind: { type: exit }
    inputs: [i_done]
    outputs: [result]
"#;

//! Integration tests for loops built from Enter/Merge/Switch/NextIteration/Exit.
//!
//! Loop bodies run once per iteration, constant Enters run once per frame,
//! and nested loops restart their iteration count for every outer
//! iteration.

mod common;

use common::{counter_graph, nested_graph, session, session_with, values};
use framegraph_core::prelude::*;
use framegraph_executor::session::SessionConfig;
use std::collections::HashSet;

#[test]
fn counter_counts_to_n() {
    let mut session = session(counter_graph());
    let out = session
        .output_simple(&["result"], values(&[("n", 5.0)]))
        .unwrap();

    assert_eq!(out["result"], 5.0);
    let handler = session.handler();
    assert_eq!(handler.execution_count("inc"), 5);
    assert_eq!(handler.execution_count("next_i"), 5);
    assert_eq!(handler.execution_count("merge_i"), 6);
    assert_eq!(handler.execution_count("less"), 6);
    assert_eq!(handler.execution_count("exit_i"), 1);
    assert_eq!(handler.execution_count("enter_n"), 1);
}

#[test]
fn counter_body_runs_once_per_iteration() {
    let mut session = session(counter_graph());
    session
        .output_simple(&["result"], values(&[("n", 4.0)]))
        .unwrap();

    let iterations: Vec<u64> = session
        .handler()
        .executed()
        .iter()
        .filter(|(name, _)| name == "inc")
        .map(|(_, fi)| {
            assert_eq!(fi.frame, "loop");
            assert!(fi.parent().is_some_and(FrameIter::is_outer));
            fi.iteration
        })
        .collect();
    assert_eq!(iterations, vec![0, 1, 2, 3]);
}

#[test]
fn counter_with_zero_iterations() {
    let mut session = session(counter_graph());
    let out = session
        .output_simple(&["result"], values(&[("n", 0.0)]))
        .unwrap();

    assert_eq!(out["result"], 0.0);
    assert_eq!(session.handler().execution_count("inc"), 0);
    assert_eq!(session.handler().execution_count("merge_i"), 1);
}

#[test]
fn exit_value_lives_in_outer_frame() {
    let mut session = session(counter_graph());
    session
        .output_simple(&["result"], values(&[("n", 2.0)]))
        .unwrap();

    let store = session.store();
    assert_eq!(store.get(&VarId::outer("result")), Some(&2.0));

    let loop_frame = |i| FrameIter::new("loop", i, Some(FrameIter::outer()));
    assert_eq!(store.get(&VarId::new("i", loop_frame(0))), Some(&0.0));
    assert_eq!(store.get(&VarId::new("i", loop_frame(2))), Some(&2.0));
    assert_eq!(store.values_of("i").count(), 3);
}

#[test]
fn constant_enter_value_pinned_to_first_iteration() {
    let mut session = session(counter_graph());
    session
        .output_simple(&["result"], values(&[("n", 3.0)]))
        .unwrap();

    let n_in: Vec<&VarId> = session
        .store()
        .iter()
        .map(|(id, _)| id)
        .filter(|id| id.variable == "n_in")
        .collect();
    assert_eq!(n_in.len(), 1);
    assert_eq!(n_in[0].iteration(), 0);
}

#[test]
fn loop_stats() {
    let mut session = session(counter_graph());
    session
        .output_simple(&["result"], values(&[("n", 3.0)]))
        .unwrap();

    let stats = session.stats();
    assert_eq!(stats.max_frame_depth, 1);
    assert_eq!(stats.max_iteration, 3);
    assert_eq!(stats.values_stored, session.store().len());
    assert!(stats.ops_executed >= 20);
    assert!(stats.steps > stats.ops_executed);
}

#[test]
fn nested_loops() {
    let mut session = session(nested_graph());
    let out = session.output_simple(&["total"], values(&[])).unwrap();
    assert_eq!(out["total"], 9.0);

    let handler = session.handler();
    assert_eq!(handler.execution_count("pivot"), 2);
    assert_eq!(handler.execution_count("zero_fill"), 2);
    assert_eq!(handler.execution_count("enter_d"), 2);
    assert_eq!(handler.execution_count("inc_j"), 6);
    assert_eq!(handler.execution_count("inc_acc"), 6);
    assert_eq!(handler.execution_count("exit_acc"), 2);
    assert_eq!(handler.execution_count("exit_t"), 1);
}

#[test]
fn nested_constant_enters_run_once() {
    let mut session = session(nested_graph());
    session.output_simple(&["total"], values(&[])).unwrap();

    let handler = session.handler();
    assert_eq!(handler.execution_count("enter_on"), 1);
    assert_eq!(handler.execution_count("enter_in_o"), 1);
    assert_eq!(handler.execution_count("enter_m"), 1);
    assert_eq!(handler.execution_count("enter_one_i"), 1);
}

#[test]
fn nested_inner_iterations_restart() {
    let mut session = session(nested_graph());
    session.output_simple(&["total"], values(&[])).unwrap();

    let mut seen: Vec<(u64, u64)> = session
        .handler()
        .executed()
        .iter()
        .filter(|(name, _)| name == "inc_j")
        .map(|(_, fi)| {
            assert_eq!(fi.frame, "inner");
            let outer = fi.parent().unwrap();
            assert_eq!(outer.frame, "outer");
            (outer.iteration, fi.iteration)
        })
        .collect();
    seen.sort();
    assert_eq!(seen, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
}

#[test]
fn every_op_runs_once_per_frame_iteration() {
    let mut session = session(nested_graph());
    session.output_simple(&["total"], values(&[])).unwrap();

    let executed = session.handler().executed();
    let unique: HashSet<_> = executed.iter().collect();
    assert_eq!(unique.len(), executed.len());
}

#[test]
fn nested_stats() {
    let mut session = session(nested_graph());
    session.output_simple(&["total"], values(&[])).unwrap();

    let stats = session.stats();
    assert_eq!(stats.max_frame_depth, 2);
    assert_eq!(stats.max_iteration, 3);
}

#[test]
fn nested_without_frame_preference() {
    let config = SessionConfig::default().with_prefer_current_frame(false);
    let mut session = session_with(nested_graph(), config);

    let out = session.output_simple(&["total"], values(&[])).unwrap();
    assert_eq!(out["total"], 9.0);
}

#[test]
fn nested_loops_repeatable() {
    let mut session = session(nested_graph());
    let first = session.output_simple(&["total"], values(&[])).unwrap();
    let second = session.output_simple(&["total"], values(&[])).unwrap();
    assert_eq!(first, second);
    assert_eq!(session.handler().execution_count("exit_t"), 2);
}

#[test]
fn step_limit_aborts_long_loops() {
    let config = SessionConfig::default().with_max_steps(50);
    let mut session = session_with(counter_graph(), config);

    let err = session
        .output_simple(&["result"], values(&[("n", 1000.0)]))
        .unwrap_err();
    assert!(matches!(
        err,
        FrameGraphError::StepLimitExceeded {
            limit: 50,
            remaining: 1
        }
    ));
    assert_eq!(session.stats().steps, 50);
}

/// Twelve outputs, all behind the false branch of a switch.
fn fan_out_graph() -> (Graph, Vec<String>) {
    let mut builder = GraphBuilder::new()
        .placeholder("x")
        .placeholder("p")
        .switch("sw", "x", "p", "x_t", "x_f");
    let mut outputs = Vec::new();
    for i in 0..12 {
        let out = format!("y{i:02}");
        builder = builder.op(format!("id{i}"), "identity", &["x_f"], &[out.as_str()]);
        outputs.push(out);
    }
    (builder.build().unwrap(), outputs)
}

#[test]
fn stall_reports_bounded_missing_list() {
    let (graph, outputs) = fan_out_graph();
    let requested: Vec<&str> = outputs.iter().map(String::as_str).collect();
    let mut session = session(graph);

    let err = session
        .output_simple(&requested, values(&[("x", 1.0), ("p", 1.0)]))
        .unwrap_err();
    assert_eq!(err.code(), "E301");
    match err {
        FrameGraphError::SchedulingStall {
            remaining, missing, ..
        } => {
            assert_eq!(remaining, 12);
            assert_eq!(missing.len(), 10);
            assert_eq!(missing[0], "y00");
        }
        other => panic!("expected a stall, got {other}"),
    }
}

#[test]
fn stall_report_limit_is_configurable() {
    let (graph, outputs) = fan_out_graph();
    let requested: Vec<&str> = outputs.iter().map(String::as_str).collect();
    let config = SessionConfig::default().with_max_missing_reported(3);
    let mut session = session_with(graph, config);

    let err = session
        .output_simple(&requested, values(&[("x", 1.0), ("p", 1.0)]))
        .unwrap_err();
    assert!(matches!(
        err,
        FrameGraphError::SchedulingStall { ref missing, .. } if missing.len() == 3
    ));
}

#[test]
fn loop_variable_value_depends_on_other_outputs() {
    let mut session = session(counter_graph());

    let alone = session.output_simple(&["i"], values(&[("n", 3.0)])).unwrap();
    assert_eq!(alone["i"], 0.0);
    assert_eq!(session.handler().execution_count("inc"), 0);

    let with_exit = session
        .output_simple(&["result", "i"], values(&[("n", 3.0)]))
        .unwrap();
    assert_eq!(with_exit["result"], 3.0);
    assert_eq!(with_exit["i"], 3.0);
}

//! Integration tests for execution listeners.

mod common;

use common::{add_graph, counter_graph, session, values};
use framegraph_core::prelude::*;
use framegraph_executor::session::OutputRequest;
use framegraph_executor::testing::{ListenerEvent, RecordingListener};
use std::sync::Arc;

#[test]
fn callbacks_in_execution_order() {
    let listener = Arc::new(RecordingListener::<f64>::new());
    let mut session = session(add_graph());

    session
        .output(
            OutputRequest::new()
                .output("d")
                .placeholders(values(&[("a", 2.0), ("b", 3.0)]))
                .listener(listener.clone()),
        )
        .unwrap();

    let outer = FrameIter::outer();
    assert_eq!(
        listener.events(),
        vec![
            ListenerEvent::PreOp {
                op: "add".into(),
                frame_iter: outer.clone(),
            },
            ListenerEvent::OpExecuted {
                op: "add".into(),
                frame_iter: outer.clone(),
                produced: 1,
            },
            ListenerEvent::PreOp {
                op: "neg".into(),
                frame_iter: outer.clone(),
            },
            ListenerEvent::OpExecuted {
                op: "neg".into(),
                frame_iter: outer.clone(),
                produced: 1,
            },
            ListenerEvent::Activation {
                op: Some("neg".into()),
                var_id: VarId::outer("d"),
                value: -5.0,
            },
        ]
    );
}

#[test]
fn required_activations_are_reported_not_returned() {
    let listener = Arc::new(RecordingListener::<f64>::new());
    let mut session = session(add_graph());

    let out = session
        .output(
            OutputRequest::new()
                .output("d")
                .activation("c")
                .activation("a")
                .placeholders(values(&[("a", 2.0), ("b", 3.0)]))
                .listener(listener.clone()),
        )
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out["d"], -5.0);

    let mut activations = listener.activations();
    activations.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(
        activations,
        vec![
            (VarId::outer("a"), 2.0),
            (VarId::outer("c"), 5.0),
            (VarId::outer("d"), -5.0),
        ]
    );
}

#[test]
fn activation_only_request() {
    let listener = Arc::new(RecordingListener::<f64>::new());
    let mut session = session(add_graph());

    let out = session
        .output(
            OutputRequest::new()
                .activation("c")
                .placeholders(values(&[("a", 1.0), ("b", 1.0)]))
                .listener(listener.clone()),
        )
        .unwrap();

    assert!(out.is_empty());
    assert_eq!(listener.activations(), vec![(VarId::outer("c"), 2.0)]);
}

#[test]
fn activation_per_loop_iteration() {
    let listener = Arc::new(RecordingListener::<f64>::new());
    let mut session = session(counter_graph());

    let out = session
        .output(
            OutputRequest::new()
                .output("result")
                .activation("i")
                .placeholder("n", 3.0)
                .listener(listener.clone()),
        )
        .unwrap();
    assert_eq!(out["result"], 3.0);

    let per_iteration: Vec<(u64, f64)> = listener
        .activations()
        .into_iter()
        .filter(|(id, _)| id.variable == "i")
        .map(|(id, value)| (id.iteration(), value))
        .collect();
    assert_eq!(
        per_iteration,
        vec![(0, 0.0), (1, 1.0), (2, 2.0), (3, 3.0)]
    );
}

#[test]
fn switch_reports_one_produced_output() {
    let listener = Arc::new(RecordingListener::<f64>::new());
    let mut session = session(counter_graph());

    session
        .output(
            OutputRequest::new()
                .output("result")
                .placeholder("n", 1.0)
                .listener(listener.clone()),
        )
        .unwrap();

    let switch_events: Vec<usize> = listener
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ListenerEvent::OpExecuted { op, produced, .. } if op == "switch_i" => Some(produced),
            _ => None,
        })
        .collect();
    assert_eq!(switch_events, vec![1, 1]);
}

#[test]
fn inactive_listener_is_skipped() {
    let training_only = Arc::new(RecordingListener::<f64>::only(Operation::Training));
    let always = Arc::new(RecordingListener::<f64>::new());
    let mut session = session(add_graph());

    session
        .output(
            OutputRequest::new()
                .output("c")
                .placeholders(values(&[("a", 2.0), ("b", 3.0)]))
                .listener(training_only.clone())
                .listener(always.clone()),
        )
        .unwrap();

    assert!(training_only.is_empty());
    assert_eq!(always.executed_ops(), vec!["add".to_string()]);
}

#[test]
fn listener_active_for_matching_operation() {
    let training_only = Arc::new(RecordingListener::<f64>::only(Operation::Training));
    let mut session = session(add_graph());

    session
        .output(
            OutputRequest::new()
                .output("c")
                .placeholders(values(&[("a", 2.0), ("b", 3.0)]))
                .at(At::new(1, 7, Operation::Training))
                .listener(training_only.clone()),
        )
        .unwrap();

    assert_eq!(training_only.executed_ops(), vec!["add".to_string()]);
}

#[test]
fn activation_order_follows_declaration_order() {
    let graph = GraphBuilder::new()
        .placeholder("z")
        .placeholder("a")
        .op("add", "add", &["z", "a"], &["s"])
        .build()
        .unwrap();
    let mut session = session(graph);

    let mut runs = Vec::new();
    for _ in 0..3 {
        let listener = Arc::new(RecordingListener::<f64>::new());
        session
            .output(
                OutputRequest::new()
                    .output("s")
                    .activation("z")
                    .activation("a")
                    .placeholders(values(&[("z", 1.0), ("a", 2.0)]))
                    .listener(listener.clone()),
            )
            .unwrap();
        runs.push(listener.events());

        let order: Vec<String> = listener
            .activations()
            .into_iter()
            .map(|(id, _)| id.variable)
            .collect();
        assert_eq!(order, vec!["z", "a", "s"]);
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

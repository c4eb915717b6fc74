//! Generic "Y depends on X" bookkeeping used by the session scheduler.

mod tracker;

pub use tracker::{DependencyList, DependencyTracker};

//! Session execution.
//!
//! This module provides the frame-aware scheduler:
//! - [`Session`] - Executes requested outputs of a graph
//! - [`Subgraph`] - Ancestors of the requested variables
//! - [`Resolver`] - Maps variables to the steps producing them
//! - [`ExecStep`] - Unit of scheduling, keyed by frame/iteration
//! - [`OutputStore`] - Values computed by a call

mod config;
mod executor;
mod request;
mod resolver;
mod stats;
mod step;
mod store;
mod subgraph;

pub use config::SessionConfig;
pub use executor::Session;
pub use request::OutputRequest;
pub use resolver::Resolver;
pub use stats::ExecutionStats;
pub use step::{ExecStep, ExecType};
pub use store::OutputStore;
pub use subgraph::Subgraph;

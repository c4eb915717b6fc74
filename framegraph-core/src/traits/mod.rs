//! Traits implemented by users of the execution engine.

mod handler;
mod listener;

pub use handler::{ExecutionContext, InputSlot, InputSource, OpHandler, OpInputs};
pub use listener::{At, Listener, Operation};

//! Core identity types.

mod frame;
mod ids;

pub use frame::{FrameIter, OUTER_FRAME, VarId};
pub use ids::RunId;

//! Frame/iteration identity for values produced inside nested loops.
//!
//! A value in a graph with loops is identified not only by its variable name
//! but by the loop context that produced it: the frame (loop nesting level),
//! the iteration within that frame, and the chain of enclosing frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the outermost frame. Values computed outside any loop live here.
pub const OUTER_FRAME: &str = "main";

/// Position within (possibly nested) loops.
///
/// Frames nest through Enter ops, advance their iteration through
/// NextIteration ops, and pop back to the parent through Exit ops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameIter {
    /// Frame name.
    pub frame: String,
    /// Iteration within the frame.
    pub iteration: u64,
    /// The frame/iteration this frame was entered from.
    pub parent: Option<Box<FrameIter>>,
}

impl FrameIter {
    /// Create a frame/iteration.
    pub fn new(frame: impl Into<String>, iteration: u64, parent: Option<FrameIter>) -> Self {
        Self {
            frame: frame.into(),
            iteration,
            parent: parent.map(Box::new),
        }
    }

    /// The outermost frame at iteration 0.
    #[must_use]
    pub fn outer() -> Self {
        Self::new(OUTER_FRAME, 0, None)
    }

    /// Whether this is exactly the outer frame at iteration 0.
    #[must_use]
    pub fn is_outer(&self) -> bool {
        self.frame == OUTER_FRAME && self.iteration == 0 && self.parent.is_none()
    }

    /// The enclosing frame, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&FrameIter> {
        self.parent.as_deref()
    }

    /// Same frame and parent, different iteration.
    #[must_use]
    pub fn with_iteration(&self, iteration: u64) -> Self {
        Self {
            frame: self.frame.clone(),
            iteration,
            parent: self.parent.clone(),
        }
    }

    /// Same frame and parent, iteration + 1.
    #[must_use]
    pub fn next_iteration(&self) -> Self {
        self.with_iteration(self.iteration + 1)
    }

    /// Iteration 0 of `frame`, entered from `self`.
    #[must_use]
    pub fn enter(&self, frame: impl Into<String>) -> Self {
        Self::new(frame, 0, Some(self.clone()))
    }

    /// Same frame and iteration, different parent.
    #[must_use]
    pub fn with_parent(&self, parent: Option<FrameIter>) -> Self {
        Self {
            frame: self.frame.clone(),
            iteration: self.iteration,
            parent: parent.map(Box::new),
        }
    }

    /// Nesting depth: 0 for a frame without parent.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cur = self.parent();
        while let Some(p) = cur {
            depth += 1;
            cur = p.parent();
        }
        depth
    }
}

impl Default for FrameIter {
    fn default() -> Self {
        Self::outer()
    }
}

impl fmt::Display for FrameIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.frame, self.iteration)?;
        if let Some(parent) = self.parent() {
            write!(f, " <- {}", parent)?;
        }
        Ok(())
    }
}

/// Identity of a computed value: variable name plus the frame/iteration it
/// was produced in.
///
/// Within one execution at most one value is stored per `VarId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId {
    /// Variable name.
    pub variable: String,
    /// Frame/iteration context.
    pub frame_iter: FrameIter,
}

impl VarId {
    /// Create a variable identity in the given context.
    pub fn new(variable: impl Into<String>, frame_iter: FrameIter) -> Self {
        Self {
            variable: variable.into(),
            frame_iter,
        }
    }

    /// Identity of a frame/iteration-invariant value (constant, variable,
    /// placeholder): outer frame, iteration 0.
    pub fn outer(variable: impl Into<String>) -> Self {
        Self::new(variable, FrameIter::outer())
    }

    /// Frame name.
    #[must_use]
    pub fn frame(&self) -> &str {
        &self.frame_iter.frame
    }

    /// Iteration.
    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.frame_iter.iteration
    }

    /// Parent frame.
    #[must_use]
    pub fn parent_frame(&self) -> Option<&FrameIter> {
        self.frame_iter.parent()
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.variable, self.frame_iter)
    }
}

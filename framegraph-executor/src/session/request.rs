//! Output requests.

use framegraph_core::traits::{At, Listener};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Everything a single [`Session::output`](super::Session::output) call
/// needs: what to compute, placeholder values, and who is listening.
///
/// # Example
///
/// ```
/// use framegraph_executor::session::OutputRequest;
///
/// let request: OutputRequest<f64> = OutputRequest::new()
///     .output("c")
///     .placeholder("a", 2.0)
///     .placeholder("b", 3.0);
/// assert_eq!(request.outputs(), ["c".to_string()]);
/// ```
pub struct OutputRequest<T> {
    pub(crate) outputs: Vec<String>,
    pub(crate) placeholders: HashMap<String, T>,
    pub(crate) required_activations: Vec<String>,
    pub(crate) listeners: Vec<Arc<dyn Listener<T>>>,
    pub(crate) at: At,
}

impl<T> Default for OutputRequest<T> {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            placeholders: HashMap::new(),
            required_activations: Vec::new(),
            listeners: Vec::new(),
            at: At::default(),
        }
    }
}

impl<T> OutputRequest<T> {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an output variable.
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    /// Request several output variables.
    pub fn outputs_from<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Supply a placeholder value.
    pub fn placeholder(mut self, name: impl Into<String>, value: T) -> Self {
        self.placeholders.insert(name.into(), value);
        self
    }

    /// Supply several placeholder values.
    pub fn placeholders(mut self, values: HashMap<String, T>) -> Self {
        self.placeholders.extend(values);
        self
    }

    /// Require an activation, delivered to listeners but not returned.
    pub fn activation(mut self, name: impl Into<String>) -> Self {
        self.required_activations.push(name.into());
        self
    }

    /// Attach a listener.
    pub fn listener(mut self, listener: Arc<dyn Listener<T>>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Set the training/inference position.
    pub fn at(mut self, at: At) -> Self {
        self.at = at;
        self
    }

    /// Requested outputs.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Requested activations.
    pub fn required_activations(&self) -> &[String] {
        &self.required_activations
    }
}

impl<T> fmt::Debug for OutputRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut placeholders: Vec<&String> = self.placeholders.keys().collect();
        placeholders.sort();
        f.debug_struct("OutputRequest")
            .field("outputs", &self.outputs)
            .field("placeholders", &placeholders)
            .field("required_activations", &self.required_activations)
            .field("listeners", &self.listeners.len())
            .field("at", &self.at)
            .finish()
    }
}

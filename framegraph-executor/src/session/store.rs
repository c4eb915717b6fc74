//! Per-call storage of computed values.

use framegraph_core::error::{FrameGraphError, Result};
use framegraph_core::types::VarId;
use std::collections::HashMap;

/// Values computed during one call, keyed by variable and frame/iteration.
///
/// Each [`VarId`] can be written once.
#[derive(Debug)]
pub struct OutputStore<T> {
    values: HashMap<VarId, T>,
}

impl<T> Default for OutputStore<T> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<T> OutputStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, failing if one is already present.
    pub fn insert(&mut self, id: VarId, value: T) -> Result<()> {
        if self.values.contains_key(&id) {
            return Err(FrameGraphError::DuplicateValue {
                var_id: id.to_string(),
            });
        }
        self.values.insert(id, value);
        Ok(())
    }

    /// Get a stored value.
    pub fn get(&self, id: &VarId) -> Option<&T> {
        self.values.get(id)
    }

    /// Whether a value is stored.
    pub fn contains(&self, id: &VarId) -> bool {
        self.values.contains_key(id)
    }

    /// Every stored value for `variable`, across frames and iterations.
    pub fn values_of<'s>(&'s self, variable: &'s str) -> impl Iterator<Item = (&'s VarId, &'s T)> {
        self.values
            .iter()
            .filter(move |(id, _)| id.variable == variable)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Iterate over all stored values.
    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &T)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegraph_core::types::FrameIter;

    #[test]
    fn rejects_second_write() {
        let mut store = OutputStore::new();
        store.insert(VarId::outer("x"), 1.0).unwrap();
        let err = store.insert(VarId::outer("x"), 2.0).unwrap_err();
        assert_eq!(err.code(), "E402");
        assert_eq!(store.get(&VarId::outer("x")), Some(&1.0));
    }

    #[test]
    fn same_variable_in_different_iterations() {
        let mut store = OutputStore::new();
        let it0 = FrameIter::outer().enter("loop");
        let it1 = it0.next_iteration();
        store.insert(VarId::new("i", it0), 0.0).unwrap();
        store.insert(VarId::new("i", it1), 1.0).unwrap();
        assert_eq!(store.values_of("i").count(), 2);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}

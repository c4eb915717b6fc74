//! Dependency tracking with a ready queue.

use framegraph_core::error::{FrameGraphError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

/// The dependencies recorded for a single dependent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyList<T> {
    /// Dependencies that must all be satisfied.
    pub dependencies: Vec<T>,
    /// Pairs of which at least one member must be satisfied.
    pub or_dependencies: Vec<(T, T)>,
}

impl<T> DependencyList<T> {
    /// Whether no dependencies are recorded.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.or_dependencies.is_empty()
    }
}

impl<T> Default for DependencyList<T> {
    fn default() -> Self {
        Self {
            dependencies: Vec::new(),
            or_dependencies: Vec::new(),
        }
    }
}

/// Tracks "Y depends on X" relations and queues dependents as soon as all of
/// their dependencies are satisfied.
///
/// Each dependent enters the ready queue at most once over the tracker's
/// lifetime (until [`clear`](Self::clear)). Dependencies may be added after
/// the dependent became ready; if the dependent is still queued it is pulled
/// back out, and if it was already taken from the queue the new dependency
/// must already be satisfied.
#[derive(Debug)]
pub struct DependencyTracker<T> {
    /// Dependent -> dependencies that must all be satisfied.
    dependencies: HashMap<T, Vec<T>>,
    /// Dependent -> pairs of which one must be satisfied.
    or_dependencies: HashMap<T, Vec<(T, T)>>,
    /// Dependency -> dependents (plain relations).
    reverse: HashMap<T, Vec<T>>,
    /// Dependency -> dependents (or relations).
    or_reverse: HashMap<T, Vec<T>>,
    /// Satisfied dependencies.
    satisfied: HashSet<T>,
    /// Dependents that have ever been queued.
    all_satisfied: HashSet<T>,
    /// Ready dependents not yet taken, in the order they became ready.
    queue: VecDeque<T>,
}

impl<T> Default for DependencyTracker<T> {
    fn default() -> Self {
        Self {
            dependencies: HashMap::new(),
            or_dependencies: HashMap::new(),
            reverse: HashMap::new(),
            or_reverse: HashMap::new(),
            satisfied: HashSet::new(),
            all_satisfied: HashSet::new(),
            queue: VecDeque::new(),
        }
    }
}

impl<T> DependencyTracker<T>
where
    T: Clone + Eq + Hash + fmt::Display,
{
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no relations are recorded and nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.or_dependencies.is_empty() && self.queue.is_empty()
    }

    /// Forget all relations, satisfied state and queued dependents.
    pub fn clear(&mut self) {
        self.dependencies.clear();
        self.or_dependencies.clear();
        self.reverse.clear();
        self.or_reverse.clear();
        self.satisfied.clear();
        self.all_satisfied.clear();
        self.queue.clear();
    }

    /// Whether `x` is marked satisfied.
    pub fn is_satisfied(&self, x: &T) -> bool {
        self.satisfied.contains(x)
    }

    /// Whether any relation is recorded for dependent `y`.
    pub fn has_dependency(&self, y: &T) -> bool {
        self.dependencies.get(y).is_some_and(|d| !d.is_empty())
            || self.or_dependencies.get(y).is_some_and(|d| !d.is_empty())
    }

    /// All relations recorded for dependent `y`.
    pub fn dependencies(&self, y: &T) -> DependencyList<T> {
        DependencyList {
            dependencies: self.dependencies.get(y).cloned().unwrap_or_default(),
            or_dependencies: self.or_dependencies.get(y).cloned().unwrap_or_default(),
        }
    }

    /// Record that `y` depends on `x`.
    pub fn add_dependency(&mut self, y: T, x: T) -> Result<()> {
        let deps = self.dependencies.entry(y.clone()).or_default();
        if !deps.contains(&x) {
            deps.push(x.clone());
        }
        push_unique(self.reverse.entry(x).or_default(), &y);
        self.check_and_update(&y)
    }

    /// Record that `y` depends on at least one of `x1` and `x2`.
    pub fn add_or_dependency(&mut self, y: T, x1: T, x2: T) -> Result<()> {
        let pairs = self.or_dependencies.entry(y.clone()).or_default();
        let pair = (x1.clone(), x2.clone());
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
        push_unique(self.or_reverse.entry(x1).or_default(), &y);
        push_unique(self.or_reverse.entry(x2).or_default(), &y);
        self.check_and_update(&y)
    }

    /// Remove the relation "`y` depends on `x`", including or-pairs
    /// containing `x`.
    pub fn remove_dependency(&mut self, y: &T, x: &T) {
        if let Some(deps) = self.dependencies.get_mut(y) {
            deps.retain(|d| d != x);
            if deps.is_empty() {
                self.dependencies.remove(y);
            }
        }
        if let Some(set) = self.reverse.get_mut(x) {
            set.retain(|d| d != y);
            if set.is_empty() {
                self.reverse.remove(x);
            }
        }

        if let Some(pairs) = self.or_dependencies.get_mut(y) {
            pairs.retain(|(a, b)| a != x && b != x);
            if pairs.is_empty() {
                self.or_dependencies.remove(y);
            }
        }
        if let Some(set) = self.or_reverse.get_mut(x) {
            set.retain(|d| d != y);
            if set.is_empty() {
                self.or_reverse.remove(x);
            }
        }

        if self.has_dependency(y) && self.is_all_satisfied(y) && !self.all_satisfied.contains(y) {
            self.enqueue(y.clone());
        }
    }

    /// Whether every plain dependency of `y` is satisfied and every or-pair
    /// has at least one satisfied member.
    pub fn is_all_satisfied(&self, y: &T) -> bool {
        let plain = self
            .dependencies
            .get(y)
            .is_none_or(|deps| deps.iter().all(|d| self.satisfied.contains(d)));
        let or = self.or_dependencies.get(y).is_none_or(|pairs| {
            pairs
                .iter()
                .all(|(a, b)| self.satisfied.contains(a) || self.satisfied.contains(b))
        });
        plain && or
    }

    /// Mark `x` satisfied (or unsatisfied) and update the ready queue.
    pub fn mark_satisfied(&mut self, x: T, satisfied: bool) {
        if satisfied {
            if !self.satisfied.insert(x.clone()) {
                return;
            }
            let dependents: Vec<T> = self
                .reverse
                .get(&x)
                .into_iter()
                .chain(self.or_reverse.get(&x))
                .flatten()
                .cloned()
                .collect();
            for y in dependents {
                if !self.all_satisfied.contains(&y) && self.is_all_satisfied(&y) {
                    self.enqueue(y);
                }
            }
        } else {
            if !self.satisfied.remove(&x) {
                return;
            }
            let dependents: Vec<T> = self
                .reverse
                .get(&x)
                .into_iter()
                .chain(self.or_reverse.get(&x))
                .flatten()
                .cloned()
                .collect();
            for y in dependents {
                if self.is_queued(&y) && !self.is_all_satisfied(&y) {
                    self.dequeue(&y);
                }
            }
        }
    }

    /// Whether any dependent is waiting in the ready queue.
    pub fn has_new_all_satisfied(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of dependents waiting in the ready queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Take the oldest ready dependent.
    pub fn new_all_satisfied(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    /// Take the oldest ready dependent matching `predicate`.
    pub fn new_all_satisfied_matching<F>(&mut self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let idx = self.queue.iter().position(predicate)?;
        self.queue.remove(idx)
    }

    fn is_queued(&self, y: &T) -> bool {
        self.queue.contains(y)
    }

    fn enqueue(&mut self, y: T) {
        self.all_satisfied.insert(y.clone());
        self.queue.push_back(y);
    }

    fn dequeue(&mut self, y: &T) {
        self.queue.retain(|q| q != y);
        self.all_satisfied.remove(y);
    }

    /// Re-evaluate `y` after a relation was added.
    fn check_and_update(&mut self, y: &T) -> Result<()> {
        let ready = self.is_all_satisfied(y);
        if ready {
            if !self.all_satisfied.contains(y) {
                self.enqueue(y.clone());
            }
            return Ok(());
        }

        if self.all_satisfied.contains(y) {
            if self.is_queued(y) {
                self.dequeue(y);
            } else {
                let dependency = self
                    .first_unsatisfied(y)
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                return Err(FrameGraphError::DependencyRetracted {
                    step: y.to_string(),
                    dependency,
                });
            }
        }
        Ok(())
    }

    fn first_unsatisfied(&self, y: &T) -> Option<&T> {
        let plain = self
            .dependencies
            .get(y)
            .and_then(|deps| deps.iter().find(|d| !self.satisfied.contains(*d)));
        plain.or_else(|| {
            self.or_dependencies.get(y).and_then(|pairs| {
                pairs
                    .iter()
                    .find(|(a, b)| !self.satisfied.contains(a) && !self.satisfied.contains(b))
                    .map(|(a, _)| a)
            })
        })
    }
}

fn push_unique<T: PartialEq + Clone>(list: &mut Vec<T>, item: &T) {
    if !list.contains(item) {
        list.push(item.clone());
    }
}

use crate::node::NodeId;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Append-only set of nodes already claimed by some crawl task.
///
/// `add` is the only gate: there is deliberately no `contains`, so callers
/// cannot split the check from the insert.
#[derive(Debug, Default)]
pub struct VisitedSet {
    nodes: Mutex<HashSet<NodeId>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true iff this call is the first to add `node`.
    pub fn add(&self, node: &NodeId) -> bool {
        // A panic elsewhere can't leave the set half-updated, so a poisoned
        // lock still holds a consistent set.
        let mut nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        nodes.insert(node.clone())
    }

    pub fn len(&self) -> usize {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Dependency Graph
//!
//! Tracks which derived atoms read which other atoms inside one store.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph where:
//!
//! - Nodes are atoms (primitive or derived)
//! - Edges are reads: if derived atom D reads atom A, there is an edge A -> D
//!
//! When a primitive atom is written we walk the graph to find every derived
//! atom that may now be stale, mark it dirty, and hand the affected atoms back
//! in dependency order so listeners are notified inputs-first.
//!
//! Edges are replaced wholesale every time a derived atom recomputes, since a
//! read function may branch and read a different set of atoms each time.

use std::collections::{HashMap, HashSet, VecDeque};

use super::atom::{AtomId, AtomKind};

/// Dirty state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The cached value is up-to-date.
    Clean,

    /// An input changed; the cached value must be recomputed before use.
    Dirty,
}

/// A node in the dependency graph.
#[derive(Debug)]
pub struct AtomNode {
    id: AtomId,
    kind: AtomKind,
    dirty: DirtyState,

    /// Atoms this node reads from.
    dependencies: HashSet<AtomId>,

    /// Atoms that read from this node.
    dependents: HashSet<AtomId>,
}

impl AtomNode {
    fn new(id: AtomId, kind: AtomKind) -> Self {
        Self {
            id,
            kind,
            dirty: match kind {
                AtomKind::Primitive => DirtyState::Clean,
                // Start dirty to force the first computation
                AtomKind::Derived => DirtyState::Dirty,
            },
            dependencies: HashSet::new(),
            dependents: HashSet::new(),
        }
    }

    /// Get the node's atom ID.
    pub fn id(&self) -> AtomId {
        self.id
    }

    /// Get the node's kind.
    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    /// Get the current dirty state.
    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    /// Get all dependencies.
    pub fn dependencies(&self) -> &HashSet<AtomId> {
        &self.dependencies
    }

    /// Get all dependents.
    pub fn dependents(&self) -> &HashSet<AtomId> {
        &self.dependents
    }
}

/// The per-store dependency graph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<AtomId, AtomNode>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node for the atom unless one exists.
    pub fn ensure_node(&mut self, id: AtomId, kind: AtomKind) {
        self.nodes
            .entry(id)
            .or_insert_with(|| AtomNode::new(id, kind));
    }

    /// Get a reference to a node.
    pub fn get_node(&self, id: AtomId) -> Option<&AtomNode> {
        self.nodes.get(&id)
    }

    /// Check whether a derived atom has an up-to-date cached value.
    ///
    /// Unknown atoms are never fresh.
    pub fn is_fresh(&self, id: AtomId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.dirty == DirtyState::Clean)
    }

    /// Mark the node as clean.
    pub fn mark_clean(&mut self, id: AtomId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.dirty = DirtyState::Clean;
        }
    }

    /// Replace the dependencies of `dependent` with `dependencies`.
    pub fn set_dependencies(&mut self, dependent: AtomId, dependencies: &[(AtomId, AtomKind)]) {
        self.ensure_node(dependent, AtomKind::Derived);

        let previous = self
            .nodes
            .get_mut(&dependent)
            .map(|node| std::mem::take(&mut node.dependencies))
            .unwrap_or_default();

        for dependency in previous {
            if let Some(node) = self.nodes.get_mut(&dependency) {
                node.dependents.remove(&dependent);
            }
        }

        for &(dependency, kind) in dependencies {
            self.ensure_node(dependency, kind);
            if let Some(node) = self.nodes.get_mut(&dependency) {
                node.dependents.insert(dependent);
            }
            if let Some(node) = self.nodes.get_mut(&dependent) {
                node.dependencies.insert(dependency);
            }
        }
    }

    /// Mark an atom as written and propagate dirty flags to its dependents.
    ///
    /// Returns the affected dependents in topological order. The written atom
    /// itself is not included.
    pub fn mark_changed(&mut self, source_id: AtomId) -> Vec<AtomId> {
        let mut affected = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(source) = self.nodes.get(&source_id) {
            queue.extend(source.dependents.iter().copied());
        }

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }

            if let Some(node) = self.nodes.get_mut(&id) {
                node.dirty = DirtyState::Dirty;
                affected.push(id);
                queue.extend(node.dependents.iter().copied());
            }
        }

        self.topological_sort(affected)
    }

    /// Order nodes so that dependencies come before dependents.
    fn topological_sort(&self, nodes: Vec<AtomId>) -> Vec<AtomId> {
        let node_set: HashSet<_> = nodes.iter().copied().collect();
        let mut in_degree: HashMap<AtomId, usize> = HashMap::new();
        let mut result = Vec::with_capacity(nodes.len());
        let mut queue = VecDeque::new();

        // Only count edges inside the affected set
        for &id in &nodes {
            if let Some(node) = self.nodes.get(&id) {
                let degree = node
                    .dependencies
                    .iter()
                    .filter(|d| node_set.contains(d))
                    .count();
                in_degree.insert(id, degree);
                if degree == 0 {
                    queue.push_back(id);
                }
            }
        }

        // Kahn's algorithm
        while let Some(id) = queue.pop_front() {
            result.push(id);

            if let Some(node) = self.nodes.get(&id) {
                for dependent in &node.dependents {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(*dependent);
                        }
                    }
                }
            }
        }

        result
    }

    /// Remove a node and every edge touching it.
    ///
    /// Dependents lose the edge and are marked dirty, so their next read
    /// recomputes and records their dependencies again.
    pub fn remove_node(&mut self, id: AtomId) -> bool {
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };

        for dependency in &node.dependencies {
            if let Some(dep) = self.nodes.get_mut(dependency) {
                dep.dependents.remove(&id);
            }
        }
        for dependent in &node.dependents {
            if let Some(dep) = self.nodes.get_mut(dependent) {
                dep.dependencies.remove(&id);
                dep.dirty = DirtyState::Dirty;
            }
        }
        true
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

//! The directed-graph ADT.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

/// A directed graph over arbitrary node identities.
///
/// Nodes are owned values of `T`; edges are ordered pairs of them. The
/// node set and the edge set are managed independently: `add_edge`
/// auto-adds the source as a node, but the target only becomes a node
/// when it is added explicitly. This lets the graph carry edges that
/// point at identities outside the tracked node population, which is
/// exactly what a dependency analyzer needs to talk about unresolved
/// references.
///
/// Incoming adjacency is answered from a reversed copy of the graph that
/// is built on first use and cached. Every mutation marks the cache
/// stale; the next `incoming` call rebuilds it.
pub struct Graph<T: Eq + Hash + Clone> {
  nodes: HashSet<T>,
  edges: HashMap<T, HashSet<T>>,
  reversed: RwLock<Option<Box<Graph<T>>>>,
}

impl<T: Eq + Hash + Clone> Graph<T> {
  /// Creates a new, empty graph.
  pub fn new() -> Self {
    Self {
      nodes: HashSet::new(),
      edges: HashMap::new(),
      reversed: RwLock::new(None),
    }
  }

  /// Adds a node. Returns `true` if the node was not present before.
  pub fn add_node(&mut self, node: T) -> bool {
    let inserted = self.nodes.insert(node);
    if inserted {
      self.invalidate();
    }
    inserted
  }

  /// Adds a directed edge, auto-adding `from` as a node if absent.
  ///
  /// The target is recorded in the edge set but is not added to the node
  /// set; call [`Graph::add_node`] for that.
  pub fn add_edge(&mut self, from: T, to: T) -> bool {
    self.nodes.insert(from.clone());
    let inserted = self.edges.entry(from).or_default().insert(to);
    self.invalidate();
    inserted
  }

  /// Removes a node together with every edge that starts or ends at it.
  /// Returns `true` if the node was present.
  pub fn remove_node(&mut self, node: &T) -> bool {
    let removed = self.nodes.remove(node);
    let had_outgoing = self.edges.remove(node).is_some();
    let mut purged = false;
    self.edges.retain(|_, targets| {
      purged |= targets.remove(node);
      !targets.is_empty()
    });
    if removed || had_outgoing || purged {
      self.invalidate();
    }
    removed
  }

  /// Removes a single edge. Returns `true` if the edge was present.
  pub fn remove_edge(&mut self, from: &T, to: &T) -> bool {
    let mut removed = false;
    if let Some(targets) = self.edges.get_mut(from) {
      removed = targets.remove(to);
      if targets.is_empty() {
        self.edges.remove(from);
      }
    }
    if removed {
      self.invalidate();
    }
    removed
  }

  /// Whether `node` is a member of the node set.
  pub fn has_node(&self, node: &T) -> bool {
    self.nodes.contains(node)
  }

  /// Whether the edge `from -> to` exists.
  pub fn has_edge(&self, from: &T, to: &T) -> bool {
    self.edges.get(from).map_or(false, |targets| targets.contains(to))
  }

  /// Number of nodes.
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Number of edges.
  pub fn edge_count(&self) -> usize {
    self.edges.values().map(HashSet::len).sum()
  }

  /// Whether the graph holds no nodes.
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Iterates the node set in unspecified order.
  pub fn nodes(&self) -> impl Iterator<Item = &T> {
    self.nodes.iter()
  }

  /// The targets of every edge starting at `node`, in unspecified order.
  pub fn outgoing(&self, node: &T) -> Vec<T> {
    self
      .edges
      .get(node)
      .map(|targets| targets.iter().cloned().collect())
      .unwrap_or_default()
  }

  /// Number of edges starting at `node`.
  pub fn out_degree(&self, node: &T) -> usize {
    self.edges.get(node).map_or(0, HashSet::len)
  }

  /// The sources of every edge ending at `node`, in unspecified order.
  ///
  /// Served from a cached reversed copy of the graph; the first call
  /// after a mutation rebuilds the cache.
  pub fn incoming(&self, node: &T) -> Vec<T> {
    {
      let cache = self.reversed.read();
      if let Some(rev) = cache.as_ref() {
        return rev.outgoing(node);
      }
    }
    let mut cache = self.reversed.write();
    cache
      .get_or_insert_with(|| Box::new(self.reverse()))
      .outgoing(node)
  }

  /// Builds a new graph with every edge direction flipped.
  ///
  /// All nodes are carried over; edge targets that were not nodes become
  /// nodes in the reversed graph, since they turn into edge sources.
  pub fn reverse(&self) -> Graph<T> {
    let mut reversed = Graph::new();
    for node in &self.nodes {
      reversed.add_node(node.clone());
    }
    for (from, targets) in &self.edges {
      for to in targets {
        reversed.add_edge(to.clone(), from.clone());
      }
    }
    reversed
  }

  /// Best-effort topological ordering, dependencies first.
  ///
  /// Repeatedly scans a working copy and peels off every node whose
  /// remaining out-degree is zero. When the copy drains completely the
  /// result is a full dependency-first ordering. When a full pass peels
  /// nothing the remainder contains a cycle and the partial order built
  /// so far is returned; callers that need a total order must check
  /// acyclicity separately.
  pub fn topological_order(&self) -> Vec<T> {
    let mut work = self.clone();
    let mut order = Vec::with_capacity(work.node_count());
    while !work.is_empty() {
      let ready: Vec<T> = work
        .nodes()
        .filter(|node| work.out_degree(node) == 0)
        .cloned()
        .collect();
      if ready.is_empty() {
        // Residual cycle: every remaining node still depends on something.
        break;
      }
      for node in ready {
        work.remove_node(&node);
        order.push(node);
      }
    }
    order
  }

  fn invalidate(&mut self) {
    *self.reversed.get_mut() = None;
  }

  #[cfg(test)]
  fn reverse_cache_is_warm(&self) -> bool {
    self.reversed.read().is_some()
  }
}

impl<T: Eq + Hash + Clone> Default for Graph<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Eq + Hash + Clone> Clone for Graph<T> {
  fn clone(&self) -> Self {
    // The reverse cache is not cloned; the copy rebuilds it on demand.
    Self {
      nodes: self.nodes.clone(),
      edges: self.edges.clone(),
      reversed: RwLock::new(None),
    }
  }
}

impl<T: Eq + Hash + Clone + fmt::Debug> fmt::Debug for Graph<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Graph")
      .field("nodes", &self.nodes)
      .field("edges", &self.edges)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reverse_cache_rebuilds_after_mutation() {
    let mut graph = Graph::new();
    graph.add_edge(1, 2);
    graph.add_node(2);

    assert_eq!(graph.incoming(&2), vec![1]);
    assert!(graph.reverse_cache_is_warm());

    // Any mutation marks the cache stale.
    graph.add_edge(3, 2);
    assert!(!graph.reverse_cache_is_warm());

    let mut incoming = graph.incoming(&2);
    incoming.sort_unstable();
    assert_eq!(incoming, vec![1, 3]);
    assert!(graph.reverse_cache_is_warm());
  }

  #[test]
  fn clone_does_not_share_cache_or_state() {
    let mut graph = Graph::new();
    graph.add_edge("a", "b");
    graph.add_node("b");
    let _ = graph.incoming(&"b");

    let mut copy = graph.clone();
    assert!(!copy.reverse_cache_is_warm());

    copy.add_edge("c", "b");
    assert!(!graph.has_node(&"c"));
    assert!(copy.has_node(&"c"));
  }
}

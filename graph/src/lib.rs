//! # Filament Graph
//!
//! A small, generic directed-graph ADT used as the backbone of the
//! `filament` dependency-injection runtime, usable on its own for any
//! dependency-shaped bookkeeping.
//!
//! The node type is arbitrary: anything `Eq + Hash + Clone` works as a
//! node identity. The graph offers node/edge mutation, outgoing and
//! incoming adjacency queries (incoming is served from a lazily built,
//! invalidate-on-mutation reversed copy), reversal, cloning, and a
//! best-effort topological ordering that degrades to a partial order in
//! the presence of cycles instead of failing.
//!
//! ## Quick Start
//!
//! ```
//! use filament_graph::Graph;
//!
//! let mut graph = Graph::new();
//! graph.add_edge("app", "database");
//! graph.add_edge("database", "config");
//! graph.add_node("config");
//!
//! // Dependencies come first in the peeled ordering.
//! let order = graph.topological_order();
//! assert_eq!(order, vec!["config", "database", "app"]);
//! ```

mod digraph;

pub use digraph::Graph;

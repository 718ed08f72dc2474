//! Pre-flight analysis of the dependency graph: constructor-cycle
//! detection, missing-binding diagnostics, and the wiring report.
//!
//! The validator never fails by itself — it returns a [`Validation`]
//! value and leaves the decision to the host. The contract is
//! validate-then-inject: a host that receives `ok == false` is expected
//! to refuse startup instead of calling the injector, because a
//! constructor-level cycle cannot be resolved by the two-phase protocol.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use filament_graph::Graph;

use crate::context::Context;
use crate::core::TypeKey;
use crate::indexer::Indexer;
use crate::registry::Registry;

/// A required dependency on an interface with no implementation bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingBinding {
  pub dependent: TypeKey,
  pub dependency: TypeKey,
}

impl fmt::Display for MissingBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "no implementation found for {} required by {}",
      self.dependency, self.dependent
    )
  }
}

/// The structured result of a validation run.
///
/// `cycles` holds every constructor-level cycle in dependency order;
/// `report` is the rendered, deterministic wiring report that was (or
/// can be) logged. `ok` is true iff both diagnostic lists are empty.
#[derive(Debug, Clone)]
pub struct Validation {
  pub ok: bool,
  pub cycles: Vec<Vec<TypeKey>>,
  pub missing: Vec<MissingBinding>,
  pub report: String,
}

impl fmt::Display for Validation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.report)
  }
}

/// Builds and analyzes the dependency graphs of one closure.
pub struct GraphValidator<'a> {
  registry: &'a Registry,
}

impl<'a> GraphValidator<'a> {
  pub fn new(registry: &'a Registry) -> Self {
    Self { registry }
  }

  /// Runs the full analysis: cycle detection on the constructor graph,
  /// missing-binding detection on the full graph, report rendering.
  pub fn validate(&self, indexer: &Indexer, context: &Context) -> Validation {
    let full = self.full_graph(indexer);
    let constructor = self.constructor_graph(indexer);
    let cycles = find_cycles(&constructor);
    let missing = self.missing_bindings(indexer, context, &full);
    let ok = cycles.is_empty() && missing.is_empty();
    let report = self.render(indexer, context, &cycles, &missing, ok);
    Validation {
      ok,
      cycles,
      missing,
      report,
    }
  }

  /// The full dependency graph: every required edge of every closure
  /// member, of any origin. Edge targets become nodes even when they
  /// fall outside the closure.
  pub fn full_graph(&self, indexer: &Indexer) -> Graph<TypeKey> {
    self.build_graph(indexer, |registry, key| registry.required_dependencies(key))
  }

  /// The constructor graph: required constructor edges only. This is the
  /// subgraph whose cycles the two-phase protocol cannot break.
  pub fn constructor_graph(&self, indexer: &Indexer) -> Graph<TypeKey> {
    self.build_graph(indexer, |registry, key| {
      registry.required_constructor_dependencies(key)
    })
  }

  fn build_graph(
    &self,
    indexer: &Indexer,
    edges_of: impl Fn(&Registry, TypeKey) -> Vec<TypeKey>,
  ) -> Graph<TypeKey> {
    let mut graph = Graph::new();
    for &key in indexer.closure() {
      graph.add_node(key);
      for target in edges_of(self.registry, key) {
        graph.add_node(target);
        graph.add_edge(key, target);
      }
    }
    graph
  }

  /// Walks the full graph's edges and reports every required edge whose
  /// target is an interface outside the closure with no implementation
  /// bound — no registered implementer in the closure and no assignable
  /// pre-existing instance. Concrete external targets are assumed
  /// synthesizable and never reported.
  fn missing_bindings(
    &self,
    indexer: &Indexer,
    context: &Context,
    full: &Graph<TypeKey>,
  ) -> Vec<MissingBinding> {
    let mut missing = Vec::new();
    let mut members = indexer.closure().to_vec();
    members.sort();
    for dependent in members {
      let mut targets = full.outgoing(&dependent);
      targets.sort();
      for dependency in targets {
        if indexer.contains(dependency) || !dependency.is_interface() {
          continue;
        }
        let bound_in_closure = self
          .registry
          .implementers(dependency)
          .iter()
          .any(|implementer| indexer.contains(*implementer));
        if !bound_in_closure && context.peek(dependency).is_none() {
          missing.push(MissingBinding {
            dependent,
            dependency,
          });
        }
      }
    }
    missing
  }

  fn render(
    &self,
    indexer: &Indexer,
    context: &Context,
    cycles: &[Vec<TypeKey>],
    missing: &[MissingBinding],
    ok: bool,
  ) -> String {
    let mut out = String::new();
    let mut members = indexer.closure().to_vec();
    members.sort();
    let _ = writeln!(out, "wiring report: {} types in closure", members.len());
    for key in &members {
      let marker = if context.contains(*key) { " [instance]" } else { "" };
      let _ = writeln!(out, "  {}{}", key, marker);
      for edge in self.registry.dependency_edges(*key) {
        let mut flags = String::new();
        if edge.optional {
          flags.push_str(" [optional]");
        }
        if !indexer.contains(edge.target) {
          flags.push_str(" [external]");
        }
        let _ = writeln!(out, "    -> {}{}", edge.target, flags);
      }
    }
    if cycles.is_empty() {
      let _ = writeln!(out, "no constructor cycles");
    } else {
      let _ = writeln!(out, "constructor cycles:");
      for (index, cycle) in cycles.iter().enumerate() {
        let mut path: Vec<&str> = cycle.iter().map(TypeKey::name).collect();
        if let Some(first) = cycle.first() {
          path.push(first.name());
        }
        let _ = writeln!(out, "  {}. {}", index + 1, path.join(" -> "));
      }
    }
    if missing.is_empty() {
      let _ = writeln!(out, "no missing bindings");
    } else {
      let _ = writeln!(out, "missing bindings:");
      for (index, binding) in missing.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, binding);
      }
    }
    let _ = write!(out, "wiring {}", if ok { "ok" } else { "invalid" });
    out
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
  White,
  Gray,
  Black,
}

/// Collects every cycle in `graph` with a three-color depth-first walk.
///
/// When an edge reaches a node that is currently in progress, the cycle
/// is reconstructed from the explicit visitation stack: everything from
/// the first occurrence of the back-edge target up to the current node,
/// which reads in dependency order.
fn find_cycles(graph: &Graph<TypeKey>) -> Vec<Vec<TypeKey>> {
  let mut color: HashMap<TypeKey, Color> =
    graph.nodes().map(|node| (*node, Color::White)).collect();
  let mut stack = Vec::new();
  let mut cycles = Vec::new();

  let mut roots: Vec<TypeKey> = graph.nodes().copied().collect();
  roots.sort();
  for root in roots {
    if color.get(&root) == Some(&Color::White) {
      visit(graph, root, &mut color, &mut stack, &mut cycles);
    }
  }
  cycles
}

fn visit(
  graph: &Graph<TypeKey>,
  node: TypeKey,
  color: &mut HashMap<TypeKey, Color>,
  stack: &mut Vec<TypeKey>,
  cycles: &mut Vec<Vec<TypeKey>>,
) {
  color.insert(node, Color::Gray);
  stack.push(node);
  let mut targets = graph.outgoing(&node);
  targets.sort();
  for target in targets {
    match color.get(&target).copied().unwrap_or(Color::White) {
      Color::White => visit(graph, target, color, stack, cycles),
      Color::Gray => {
        if let Some(position) = stack.iter().position(|key| *key == target) {
          cycles.push(stack[position..].to_vec());
        }
      }
      Color::Black => {}
    }
  }
  stack.pop();
  color.insert(node, Color::Black);
}

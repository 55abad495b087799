// registry/src/graph.rs

//! The static dependency graph of a registry.
//!
//! Built by [`Registry::dependency_graph`](crate::Registry::dependency_graph)
//! without running any constructor or factory. Used by `validate` to look
//! for cycles and renderable as Graphviz DOT for debugging.

use crate::core::{EntryKind, TypeKey};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::Write;

#[derive(Debug, Clone)]
struct Node {
  kind: EntryKind,
  dependencies: Vec<TypeKey>,
}

/// Dependency graph over registered identities, in registration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
  nodes: IndexMap<TypeKey, Node>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  /// On the current DFS path.
  Open,
  /// Fully explored, no cycle through it.
  Done,
}

impl DependencyGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a node, or updates the kind of an existing one.
  pub fn add_node(&mut self, key: TypeKey, kind: EntryKind) {
    self
      .nodes
      .entry(key)
      .and_modify(|node| node.kind = kind)
      .or_insert_with(|| Node {
        kind,
        dependencies: Vec::new(),
      });
  }

  /// Adds the edge `from -> to`. `from` must already be a node.
  pub fn add_dependency(&mut self, from: TypeKey, to: TypeKey) {
    if let Some(node) = self.nodes.get_mut(&from) {
      node.dependencies.push(to);
    }
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn nodes(&self) -> impl Iterator<Item = (TypeKey, EntryKind)> + '_ {
    self.nodes.iter().map(|(key, node)| (*key, node.kind))
  }

  pub fn kind_of(&self, key: &TypeKey) -> Option<EntryKind> {
    self.nodes.get(key).map(|node| node.kind)
  }

  /// Out-edges of `key`, empty for unknown keys.
  pub fn dependencies_of(&self, key: &TypeKey) -> &[TypeKey] {
    self
      .nodes
      .get(key)
      .map(|node| node.dependencies.as_slice())
      .unwrap_or(&[])
  }

  /// Returns one cycle, if any, as the path `a -> b -> ... -> a`.
  ///
  /// Iterative depth-first search with an explicit stack and three colours
  /// (unvisited, open, done). Only an edge into a node that is still open
  /// closes a cycle, so shared sub-dependencies (diamonds) are never
  /// reported. Runs in `O(nodes + edges)`.
  pub fn find_cycle(&self) -> Option<Vec<TypeKey>> {
    let mut marks: HashMap<TypeKey, Mark> = HashMap::with_capacity(self.nodes.len());

    for &start in self.nodes.keys() {
      if marks.contains_key(&start) {
        continue;
      }
      marks.insert(start, Mark::Open);
      // Each frame is a node and the index of its next edge to follow.
      let mut stack: Vec<(TypeKey, usize)> = vec![(start, 0)];

      while let Some((node, cursor)) = stack.last_mut() {
        let node = *node;
        let Some(&next) = self.dependencies_of(&node).get(*cursor) else {
          marks.insert(node, Mark::Done);
          stack.pop();
          continue;
        };
        *cursor += 1;

        match marks.get(&next).copied() {
          Some(Mark::Open) => {
            let from = stack.iter().position(|(key, _)| *key == next).unwrap_or(0);
            let mut path: Vec<TypeKey> = stack[from..].iter().map(|(key, _)| *key).collect();
            path.push(next);
            return Some(path);
          }
          Some(Mark::Done) => {}
          None => {
            marks.insert(next, Mark::Open);
            stack.push((next, 0));
          }
        }
      }
    }
    None
  }

  pub fn has_cycle(&self) -> bool {
    self.find_cycle().is_some()
  }

  /// Renders the graph in Graphviz DOT format.
  pub fn to_dot(&self) -> String {
    let mut dot = String::from("digraph registry {\n");
    dot.push_str("  rankdir=LR;\n");
    for (key, node) in &self.nodes {
      let shape = match node.kind {
        EntryKind::Construct => "box",
        EntryKind::Factory => "diamond",
        EntryKind::Instance => "ellipse",
      };
      let _ = writeln!(
        dot,
        "  \"{}\" [label=\"{}\\n({})\", shape={}];",
        key.name(),
        key.name(),
        node.kind,
        shape
      );
    }
    for (key, node) in &self.nodes {
      for dependency in &node.dependencies {
        let _ = writeln!(dot, "  \"{}\" -> \"{}\";", key.name(), dependency.name());
      }
    }
    dot.push_str("}\n");
    dot
  }
}

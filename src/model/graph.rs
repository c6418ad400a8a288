//! Inheritance graph and structural checks over the model.

use crate::ids::EntityId;
use crate::model::entity::{Entity, Relationship};
use petgraph::algo::{has_path_connecting, is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

/// Base-to-derived edges between entities
#[derive(Debug, Default)]
pub struct InheritanceGraph {
    graph: DiGraph<EntityId, ()>,
    index: FxHashMap<EntityId, NodeIndex>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph holding every inheritance relationship of `relationships`
    pub fn from_relationships(entities: &[Entity], relationships: &[Relationship]) -> Self {
        let mut graph = Self::new();
        for entity in entities {
            graph.add_entity(entity.id);
        }
        for rel in relationships.iter().filter(|r| r.is_inheritance()) {
            let from = graph.add_entity(rel.from);
            let to = graph.add_entity(rel.to);
            graph.graph.add_edge(from, to, ());
        }
        graph
    }

    pub fn add_entity(&mut self, id: EntityId) -> NodeIndex {
        if let Some(&node) = self.index.get(&id) {
            return node;
        }
        let node = self.graph.add_node(id);
        self.index.insert(id, node);
        node
    }

    /// Add `base -> derived` unless it would close a cycle. Returns whether
    /// the edge was added.
    pub fn try_inherit(&mut self, base: EntityId, derived: EntityId) -> bool {
        let base_node = self.add_entity(base);
        let derived_node = self.add_entity(derived);
        if base_node == derived_node
            || has_path_connecting(&self.graph, derived_node, base_node, None)
        {
            return false;
        }
        self.graph.add_edge(base_node, derived_node, ());
        true
    }

    /// Whether `derived` inherits from `base`, directly or through other bases
    pub fn derives_from(&self, derived: EntityId, base: EntityId) -> bool {
        match (self.index.get(&derived), self.index.get(&base)) {
            (Some(&derived), Some(&base)) => {
                derived != base && has_path_connecting(&self.graph, base, derived, None)
            }
            _ => false,
        }
    }

    /// Bases before derived classes; `None` if the graph has a cycle
    pub fn topological_order(&self) -> Option<Vec<EntityId>> {
        let order = toposort(&self.graph, None).ok()?;
        Some(order.into_iter().map(|node| self.graph[node]).collect())
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Every entity has at most one parent, parent and child agree, and
/// following parents always ends at a root
pub fn is_nesting_forest(entities: &[Entity]) -> bool {
    let by_id: FxHashMap<EntityId, &Entity> = entities.iter().map(|e| (e.id, e)).collect();

    for entity in entities {
        let mut listed_by = entities.iter().filter(|e| e.children.contains(&entity.id));
        match (entity.parent, listed_by.next()) {
            (None, None) => {}
            (Some(parent), Some(owner)) if owner.id == parent => {}
            _ => return false,
        }
        if listed_by.next().is_some() {
            return false;
        }

        let mut steps = 0;
        let mut current = entity.parent;
        while let Some(id) = current {
            steps += 1;
            if steps > entities.len() {
                return false;
            }
            current = by_id.get(&id).and_then(|e| e.parent);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cycle_is_refused() {
        let mut graph = InheritanceGraph::new();
        let (a, b, c) = (EntityId(0), EntityId(1), EntityId(2));

        assert!(graph.try_inherit(a, b));
        assert!(graph.try_inherit(b, c));
        assert!(!graph.try_inherit(c, a));
        assert!(!graph.try_inherit(a, a));
        assert!(graph.is_acyclic());
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.derives_from(c, a));
        assert!(!graph.derives_from(a, c));
        assert!(!graph.derives_from(a, a));
    }

    #[test]
    fn test_diamond_orders_bases_first() {
        let mut graph = InheritanceGraph::new();
        let (top, left, right, bottom) = (EntityId(0), EntityId(1), EntityId(2), EntityId(3));
        graph.add_entity(bottom);
        assert!(graph.try_inherit(top, left));
        assert!(graph.try_inherit(top, right));
        assert!(graph.try_inherit(left, bottom));
        assert!(graph.try_inherit(right, bottom));

        let order = graph.topological_order().unwrap();
        let position = |id: EntityId| order.iter().position(|x| *x == id).unwrap();
        assert!(position(top) < position(left));
        assert!(position(top) < position(right));
        assert!(position(left) < position(bottom));
        assert!(position(right) < position(bottom));
    }
}

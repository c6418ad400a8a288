//! Entity model
//!
//! The immutable output of the pipeline: every declared namespace, record
//! and enum as an [`Entity`], and the [`Relationship`]s between them. Entity
//! ids are dense, so an entity is found by indexing.

pub mod builder;
pub mod entity;
pub mod graph;

pub use builder::{BuildOptions, ModelBuilder};
pub use entity::{BaseRef, Entity, Member, Relationship, RelationshipKind, TemplateInfo};
pub use graph::InheritanceGraph;

use crate::error::ResolutionWarning;
use crate::ids::EntityId;
use crate::resolver::QualifiedName;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct EntityModel {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    warnings: Vec<ResolutionWarning>,
    by_display: FxHashMap<String, EntityId>,
    by_local: FxHashMap<String, Vec<EntityId>>,
}

impl EntityModel {
    pub(crate) fn new(
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        warnings: Vec<ResolutionWarning>,
    ) -> Self {
        let mut by_display = FxHashMap::default();
        let mut by_local: FxHashMap<String, Vec<EntityId>> = FxHashMap::default();
        for entity in &entities {
            by_display.insert(entity.name.to_string(), entity.id);
            if let Some(local) = entity.name.local_name() {
                by_local.entry(local.to_string()).or_default().push(entity.id);
            }
        }
        Self {
            entities,
            relationships,
            warnings,
            by_display,
            by_local,
        }
    }

    /// All entities in declaration order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }

    /// Entity by displayed qualified name, e.g. `a::b::C` or
    /// `outer::(anonymous union 2)`
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.by_display.get(name).and_then(|id| self.entity(*id))
    }

    pub fn find_qualified(&self, name: &QualifiedName) -> Option<&Entity> {
        self.find(&name.to_string())
    }

    /// Every entity whose last name segment is `local`
    pub fn entities_named(&self, local: &str) -> Vec<&Entity> {
        self.by_local
            .get(local)
            .map(|ids| ids.iter().filter_map(|id| self.entity(*id)).collect())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, id: EntityId) -> Option<&Entity> {
        self.entity(id)?.parent.and_then(|p| self.entity(p))
    }

    pub fn children_of(&self, id: EntityId) -> Vec<&Entity> {
        self.entity(id)
            .map(|e| e.children.iter().filter_map(|c| self.entity(*c)).collect())
            .unwrap_or_default()
    }

    /// Resolved direct bases, in base-list order
    pub fn bases_of(&self, id: EntityId) -> Vec<&Entity> {
        self.entity(id)
            .map(|e| {
                e.bases
                    .iter()
                    .filter_map(|b| b.target)
                    .filter_map(|t| self.entity(t))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entities deriving directly from `id`
    pub fn derived_of(&self, id: EntityId) -> Vec<&Entity> {
        self.relationships
            .iter()
            .filter(|r| r.is_inheritance() && r.from == id)
            .filter_map(|r| self.entity(r.to))
            .collect()
    }

    pub fn inheritance_graph(&self) -> InheritanceGraph {
        InheritanceGraph::from_relationships(&self.entities, &self.relationships)
    }

    pub fn is_inheritance_acyclic(&self) -> bool {
        self.inheritance_graph().is_acyclic()
    }

    pub fn is_nesting_forest(&self) -> bool {
        graph::is_nesting_forest(&self.entities)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

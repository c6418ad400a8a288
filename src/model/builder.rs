//! Entity model construction
//!
//! The builder runs once over a [`ResolvedTree`]: it creates one entity per
//! resolved declaration, then adds relationships in a fixed order (nesting,
//! inheritance, composition, dependency) and finally derives abstractness
//! over the inheritance DAG.

use crate::error::{ModelInvariantViolation, ResolutionWarning};
use crate::ids::EntityId;
use crate::model::entity::*;
use crate::model::graph::InheritanceGraph;
use crate::model::EntityModel;
use crate::parser::ast::SourceLocation;
use crate::resolver::{
    referenced_types, strip_template_args, DeclPayload, Lookup, QualifiedName, ResolvedDecl,
    ResolvedTree,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

/// Which optional relationships and warnings to produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Add dependency edges from method parameter types
    pub dependencies: bool,
    /// Warn about member types that name no known entity
    pub report_unresolved_types: bool,
}

/// Override identity of a method: name, parameter types and constness
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Signature {
    name: String,
    params: Vec<String>,
    is_const: bool,
}

impl Signature {
    fn of(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            params: member.params().iter().map(|p| p.type_ref.clone()).collect(),
            is_const: member.is_const(),
        }
    }
}

pub struct ModelBuilder<'a> {
    tree: &'a ResolvedTree,
    options: &'a BuildOptions,
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    warnings: Vec<ResolutionWarning>,
    inheritance: InheritanceGraph,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(tree: &'a ResolvedTree, options: &'a BuildOptions) -> Self {
        Self {
            tree,
            options,
            entities: Vec::with_capacity(tree.len()),
            relationships: Vec::new(),
            warnings: Vec::new(),
            inheritance: InheritanceGraph::new(),
        }
    }

    pub fn build(mut self) -> Result<EntityModel, ModelInvariantViolation> {
        self.check_unique_names()?;

        for decl in self.tree.decls() {
            let entity = entity_from(decl);
            self.inheritance.add_entity(entity.id);
            self.entities.push(entity);
        }

        self.add_nesting();
        self.add_inheritance();
        self.add_composition();
        if self.options.dependencies {
            self.add_dependencies();
        }
        self.compute_abstractness();

        for warning in &self.warnings {
            warn!("{}", warning);
        }
        info!(
            entities = self.entities.len(),
            relationships = self.relationships.len(),
            warnings = self.warnings.len(),
            "built entity model"
        );

        Ok(EntityModel::new(self.entities, self.relationships, self.warnings))
    }

    fn check_unique_names(&self) -> Result<(), ModelInvariantViolation> {
        let mut seen: FxHashMap<&QualifiedName, &ResolvedDecl> = FxHashMap::default();
        for decl in self.tree.decls() {
            if let Some(first) = seen.insert(&decl.name, decl) {
                return Err(ModelInvariantViolation::DuplicateDefinition {
                    name: decl.name.to_string(),
                    first_file: first.source.clone(),
                    first: first.location,
                    second_file: decl.source.clone(),
                    second: decl.location,
                });
            }
        }
        Ok(())
    }

    fn add_nesting(&mut self) {
        for entity in &self.entities {
            for &child in &entity.children {
                self.relationships.push(Relationship {
                    from: entity.id,
                    to: child,
                    kind: RelationshipKind::Nesting,
                });
            }
        }
    }

    /// Bases are looked up from the scope enclosing the derived entity
    fn add_inheritance(&mut self) {
        let tree = self.tree;
        for decl in tree.decls() {
            let DeclPayload::Record { bases, .. } = &decl.payload else {
                continue;
            };
            let derived = entity_id(decl);
            let scope = decl.name.parent().unwrap_or_default();

            for (i, base) in bases.iter().enumerate() {
                if names_template_param(&base.text, &decl.template_scope) {
                    continue;
                }

                match tree.lookup(&base.text, &scope) {
                    Lookup::Resolved(id) => {
                        let target = EntityId::from_raw(id.to_raw());
                        if !self.inheritance.try_inherit(target, derived) {
                            self.warnings.push(ResolutionWarning::InheritanceCycle {
                                derived: decl.name.to_string(),
                                base: base.text.clone(),
                                file: decl.source.clone(),
                                location: base.location,
                            });
                            continue;
                        }
                        self.entities[derived.index()].bases[i].target = Some(target);
                        self.relationships.push(Relationship {
                            from: target,
                            to: derived,
                            kind: RelationshipKind::Inheritance {
                                access: base.access,
                                is_virtual: base.is_virtual,
                            },
                        });
                    }
                    Lookup::Unresolved => self.warnings.push(ResolutionWarning::UnresolvedBase {
                        entity: decl.name.to_string(),
                        base: base.text.clone(),
                        file: decl.source.clone(),
                        location: base.location,
                    }),
                    Lookup::Ambiguous(candidates) => {
                        self.warnings.push(ambiguous(decl, &base.text, candidates, base.location))
                    }
                }
            }
        }
    }

    /// One edge per (field, entity) pair; field types are looked up from
    /// inside the owner
    fn add_composition(&mut self) {
        let tree = self.tree;
        for decl in tree.decls() {
            let DeclPayload::Record { members, .. } = &decl.payload else {
                continue;
            };
            let owner = entity_id(decl);
            let mut seen: FxHashSet<(&str, EntityId)> = FxHashSet::default();

            for member in members.iter().filter(|m| !m.is_method()) {
                for reference in referenced_types(&member.type_ref) {
                    if names_template_param(&reference.name, &decl.template_scope) {
                        continue;
                    }
                    match tree.lookup(&reference.name, &decl.name) {
                        Lookup::Resolved(id) => {
                            let target = EntityId::from_raw(id.to_raw());
                            if !seen.insert((member.name.as_str(), target)) {
                                continue;
                            }
                            debug!(owner = %decl.name, member = %member.name, "composition");
                            self.relationships.push(Relationship {
                                from: owner,
                                to: target,
                                kind: RelationshipKind::Composition {
                                    member: member.name.clone(),
                                    by_reference: reference.by_reference,
                                },
                            });
                        }
                        Lookup::Unresolved => {
                            if self.options.report_unresolved_types {
                                self.warnings.push(ResolutionWarning::UnresolvedType {
                                    entity: decl.name.to_string(),
                                    member: member.name.clone(),
                                    reference: reference.name.clone(),
                                    file: decl.source.clone(),
                                    location: member.location,
                                });
                            }
                        }
                        Lookup::Ambiguous(candidates) => self.warnings.push(ambiguous(
                            decl,
                            &reference.name,
                            candidates,
                            member.location,
                        )),
                    }
                }
            }
        }
    }

    fn add_dependencies(&mut self) {
        let tree = self.tree;
        for decl in tree.decls() {
            let DeclPayload::Record { members, .. } = &decl.payload else {
                continue;
            };
            let owner = entity_id(decl);
            let mut seen: FxHashSet<(&str, EntityId)> = FxHashSet::default();

            for method in members.iter().filter(|m| m.is_method()) {
                for param in method.params() {
                    for reference in referenced_types(&param.type_ref) {
                        if names_template_param(&reference.name, &decl.template_scope)
                            || names_template_param(&reference.name, &method.template_params)
                        {
                            continue;
                        }
                        let Lookup::Resolved(id) = tree.lookup(&reference.name, &decl.name) else {
                            continue;
                        };
                        let target = EntityId::from_raw(id.to_raw());
                        if target == owner || !seen.insert((method.name.as_str(), target)) {
                            continue;
                        }
                        self.relationships.push(Relationship {
                            from: owner,
                            to: target,
                            kind: RelationshipKind::Dependency {
                                method: method.name.clone(),
                            },
                        });
                    }
                }
            }
        }
    }

    /// Pure-virtual signatures flow from bases to derived entities in
    /// topological order; an entity is abstract while any stays open. A
    /// concrete implementation inherited through another base closes a
    /// signature, as does an implicit override of a pure destructor.
    fn compute_abstractness(&mut self) {
        let order = self
            .inheritance
            .topological_order()
            .unwrap_or_else(|| self.entities.iter().map(|e| e.id).collect());

        // Each signature is paired with the entity that declared it
        let mut open: FxHashMap<EntityId, FxHashSet<(Signature, EntityId)>> = FxHashMap::default();
        let mut concrete: FxHashMap<EntityId, FxHashSet<(Signature, EntityId)>> = FxHashMap::default();
        for id in order {
            let entity = &self.entities[id.index()];
            let mut pending: FxHashSet<(Signature, EntityId)> = FxHashSet::default();
            let mut implemented: FxHashSet<(Signature, EntityId)> = FxHashSet::default();

            for base in entity.bases.iter().filter_map(|b| b.target) {
                if let Some(inherited) = open.get(&base) {
                    pending.extend(inherited.iter().cloned());
                }
                if let Some(inherited) = concrete.get(&base) {
                    implemented.extend(inherited.iter().cloned());
                }
            }
            // An inherited implementation only overrides pure methods of
            // its own bases
            pending.retain(|(sig, declarer)| {
                !sig.name.starts_with('~')
                    && !implemented.iter().any(|(other, implementer)| {
                        other == sig && self.inheritance.derives_from(*implementer, *declarer)
                    })
            });

            for method in entity.methods() {
                let signature = Signature::of(method);
                pending.retain(|(sig, _)| *sig != signature);
                implemented.retain(|(sig, _)| *sig != signature);
                if method.is_pure_virtual() {
                    pending.insert((signature, id));
                } else {
                    implemented.insert((signature, id));
                }
            }

            let is_abstract = !pending.is_empty();
            if is_abstract {
                debug!(entity = %entity.name, open = pending.len(), "abstract");
            }
            self.entities[id.index()].is_abstract = is_abstract;
            open.insert(id, pending);
            concrete.insert(id, implemented);
        }
    }
}

fn entity_id(decl: &ResolvedDecl) -> EntityId {
    EntityId::from_raw(decl.id.to_raw())
}

fn entity_from(decl: &ResolvedDecl) -> Entity {
    let mut entity = Entity {
        id: entity_id(decl),
        name: decl.name.clone(),
        kind: decl.kind,
        members: Vec::new(),
        bases: Vec::new(),
        children: decl.children.iter().map(|c| EntityId::from_raw(c.to_raw())).collect(),
        parent: decl.parent.map(|p| EntityId::from_raw(p.to_raw())),
        is_abstract: false,
        template: decl.template.as_ref().map(|t| TemplateInfo {
            params: t.params.clone(),
            text: t.text.clone(),
        }),
        enum_values: Vec::new(),
        is_scoped_enum: false,
        is_inline_namespace: false,
        is_definition: decl.payload.is_definition(),
        source: decl.source.clone(),
        location: decl.location,
    };

    match &decl.payload {
        DeclPayload::Namespace { is_inline } => entity.is_inline_namespace = *is_inline,
        DeclPayload::Record { bases, members, .. } => {
            entity.members = members.iter().map(Member::from).collect();
            entity.bases = bases
                .iter()
                .map(|b| BaseRef {
                    text: b.text.clone(),
                    access: b.access,
                    is_virtual: b.is_virtual,
                    target: None,
                })
                .collect();
        }
        DeclPayload::Enum {
            values, is_scoped, ..
        } => {
            entity.enum_values = values.clone();
            entity.is_scoped_enum = *is_scoped;
        }
    }
    entity
}

/// `T`, `T::value_type` or `typename T::type` where `T` is in scope
fn names_template_param(reference: &str, params: &[String]) -> bool {
    let stripped = strip_template_args(reference);
    let stripped = stripped.trim_start_matches("typename ").trim_start_matches("::");
    let first = stripped.split("::").next().unwrap_or_default().trim();
    params.iter().any(|p| p == first)
}

fn ambiguous(
    decl: &ResolvedDecl,
    reference: &str,
    candidates: Vec<QualifiedName>,
    location: SourceLocation,
) -> ResolutionWarning {
    ResolutionWarning::Ambiguous {
        entity: decl.name.to_string(),
        reference: reference.to_string(),
        candidates: candidates.iter().map(ToString::to_string).collect(),
        file: decl.source.clone(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Access, TranslationUnit};
    use crate::parser::parse_header;
    use crate::resolver::{resolve, EntityKind};
    use pretty_assertions::assert_eq;

    fn build_with(sources: &[&str], options: &BuildOptions) -> Result<EntityModel, ModelInvariantViolation> {
        let units: Vec<TranslationUnit> = sources
            .iter()
            .map(|s| parse_header(s).unwrap().unit)
            .collect();
        let tree = resolve(units.iter().map(|u| ("test.hpp", u)));
        ModelBuilder::new(&tree, options).build()
    }

    fn build(source: &str) -> EntityModel {
        build_with(&[source], &BuildOptions::default()).unwrap()
    }

    fn entity<'m>(model: &'m EntityModel, name: &str) -> &'m Entity {
        model.find(name).unwrap_or_else(|| panic!("no entity {}", name))
    }

    #[test]
    fn test_pure_virtual_overridden_in_derived() {
        let model = build(
            "class Base { public: virtual void run() = 0; virtual ~Base() = 0; };\n\
             class Derived : public Base { public: void run() override; };",
        );

        assert!(entity(&model, "Base").is_abstract);
        assert!(!entity(&model, "Derived").is_abstract);
    }

    #[test]
    fn test_signature_mismatch_keeps_derived_abstract() {
        let model = build(
            "class Shape { public: virtual double area() const = 0; };\n\
             class Square : public Shape { public: double area(); };\n\
             class Fixed : public Square { public: double area() const override; };",
        );

        assert!(entity(&model, "Square").is_abstract);
        assert!(!entity(&model, "Fixed").is_abstract);
    }

    #[test]
    fn test_protected_and_public_pure_virtuals() {
        let model = build(
            "class Iface { public: virtual int get() const = 0; protected: virtual void set(int v) = 0; };\n\
             class Impl : public Iface { public: int get() const override; protected: void set(int v) override; };",
        );

        let base = entity(&model, "Iface");
        let derived = entity(&model, "Impl");
        assert!(base.is_abstract);
        assert!(!derived.is_abstract);

        let edges: Vec<&Relationship> = model.relationships().iter().filter(|r| r.is_inheritance()).collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, base.id);
        assert_eq!(edges[0].to, derived.id);
        assert_eq!(
            edges[0].kind,
            RelationshipKind::Inheritance {
                access: Access::Public,
                is_virtual: false
            }
        );
    }

    #[test]
    fn test_diamond_keeps_both_edges() {
        let model = build(
            "struct Top { virtual void f() = 0; };\n\
             struct Left : virtual Top {};\n\
             struct Right : virtual Top { void f() override; };\n\
             struct Bottom : Left, Right {};",
        );

        let bottom = entity(&model, "Bottom");
        assert_eq!(model.bases_of(bottom.id).len(), 2);
        assert!(entity(&model, "Left").is_abstract);
        assert!(!entity(&model, "Right").is_abstract);
        // Right's override dominates the path through Left
        assert!(!bottom.is_abstract);
        assert!(model.is_inheritance_acyclic());
    }

    #[test]
    fn test_unrelated_base_does_not_implement_pure_method() {
        let model = build(
            "struct I { virtual void f() = 0; };\n\
             struct Impl { void f(); };\n\
             struct D : I, Impl {};\n\
             struct Fixed : I, Impl { void f() override; };",
        );

        assert!(entity(&model, "I").is_abstract);
        assert!(!entity(&model, "Impl").is_abstract);
        assert!(entity(&model, "D").is_abstract);
        assert!(!entity(&model, "Fixed").is_abstract);
    }

    #[test]
    fn test_base_resolves_from_enclosing_scope() {
        let model = build(
            "class Class04 {};\n\
             namespace Interface { class Class04 {}; class User : public Class04 {}; }\n\
             class Other : public Interface::Class04 {};",
        );

        let user = entity(&model, "Interface::User");
        assert_eq!(user.bases[0].target, Some(entity(&model, "Interface::Class04").id));
        let other = entity(&model, "Other");
        assert_eq!(other.bases[0].target, Some(entity(&model, "Interface::Class04").id));
    }

    #[test]
    fn test_unresolved_and_template_bases() {
        let model = build("template <typename T> class Wrapper : public T, public std::vector<int> {};");

        let wrapper = entity(&model, "Wrapper");
        assert!(wrapper.bases.iter().all(|b| b.target.is_none()));
        assert_eq!(model.warnings().len(), 1);
        assert!(matches!(
            &model.warnings()[0],
            ResolutionWarning::UnresolvedBase { base, .. } if base == "std::vector<int>"
        ));
    }

    #[test]
    fn test_inheritance_cycle_is_refused() {
        let model = build("class A : public B {};\nclass B : public A {};");

        assert_eq!(model.relationships().iter().filter(|r| r.is_inheritance()).count(), 1);
        assert!(model
            .warnings()
            .iter()
            .any(|w| matches!(w, ResolutionWarning::InheritanceCycle { .. })));
        assert!(model.is_inheritance_acyclic());
    }

    #[test]
    fn test_composition_per_member_and_entity() {
        let model = build(
            "class Engine {};\nclass Wheel {};\n\
             class Car {\n\
               Engine engine;\n\
               Wheel* wheels[4];\n\
               std::pair<Wheel, Wheel> spare;\n\
               Car* next;\n\
               int speed;\n\
             };",
        );

        let car = entity(&model, "Car").id;
        let composed: Vec<(String, String, bool)> = model
            .relationships()
            .iter()
            .filter(|r| r.from == car)
            .filter_map(|r| match &r.kind {
                RelationshipKind::Composition { member, by_reference } => Some((
                    member.clone(),
                    model.entity(r.to).unwrap().name.to_string(),
                    *by_reference,
                )),
                _ => None,
            })
            .collect();

        assert_eq!(
            composed,
            vec![
                ("engine".to_string(), "Engine".to_string(), false),
                ("wheels".to_string(), "Wheel".to_string(), true),
                ("spare".to_string(), "Wheel".to_string(), false),
                ("next".to_string(), "Car".to_string(), true),
            ]
        );
        assert!(model.warnings().is_empty());
    }

    #[test]
    fn test_member_type_uses_nearest_scope() {
        let model = build(
            "class Node {};\n\
             namespace tree { class Node {}; class Root { Node child; }; }",
        );

        let root = entity(&model, "tree::Root").id;
        let target = model
            .relationships()
            .iter()
            .find(|r| r.from == root && r.is_composition())
            .map(|r| r.to);
        assert_eq!(target, Some(entity(&model, "tree::Node").id));
    }

    #[test]
    fn test_template_params_are_not_composed() {
        let model = build(
            "class T {};\n\
             template <typename T> class Box { T value; T* next; };\n\
             template <typename K> class Outer { struct Inner { K key; }; };",
        );

        assert_eq!(model.relationships().iter().filter(|r| r.is_composition()).count(), 0);
    }

    #[test]
    fn test_unresolved_types_reported_only_on_request() {
        let source = "class Holder { Missing item; int count; std::string label; };";
        let quiet = build_with(&[source], &BuildOptions::default()).unwrap();
        assert!(quiet.warnings().is_empty());

        let options = BuildOptions {
            report_unresolved_types: true,
            ..BuildOptions::default()
        };
        let loud = build_with(&[source], &options).unwrap();
        let reported: Vec<String> = loud
            .warnings()
            .iter()
            .filter_map(|w| match w {
                ResolutionWarning::UnresolvedType { reference, .. } => Some(reference.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(reported, vec!["Missing", "std::string"]);
    }

    #[test]
    fn test_dependencies_from_parameters() {
        let source = "class Config {};\nclass Service { public: void apply(const Config& c); void reset(Service* s); };";
        let without = build_with(&[source], &BuildOptions::default()).unwrap();
        assert!(!without.relationships().iter().any(Relationship::is_dependency));

        let options = BuildOptions {
            dependencies: true,
            ..BuildOptions::default()
        };
        let model = build_with(&[source], &options).unwrap();
        let deps: Vec<&Relationship> = model.relationships().iter().filter(|r| r.is_dependency()).collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].from, entity(&model, "Service").id);
        assert_eq!(deps[0].to, entity(&model, "Config").id);
    }

    #[test]
    fn test_nesting_edges_and_forest() {
        let model = build("namespace ns { class Outer { struct Inner {}; enum Mode { A, B }; }; }");

        let outer = entity(&model, "ns::Outer");
        let nested: Vec<EntityKind> = model.children_of(outer.id).iter().map(|e| e.kind).collect();
        assert_eq!(nested, vec![EntityKind::Struct, EntityKind::Enum]);
        assert_eq!(model.relationships().iter().filter(|r| r.is_nesting()).count(), 3);
        assert_eq!(model.parent_of(outer.id).map(|e| e.kind), Some(EntityKind::Namespace));
        assert!(model.is_nesting_forest());
    }

    #[test]
    fn test_redefinition_is_a_violation() {
        let err = build_with(&["class A {};", "class A { int x; };"], &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, ModelInvariantViolation::DuplicateDefinition { ref name, .. } if name == "A"));
    }

    #[test]
    fn test_deleted_operator_is_kept() {
        let model = build("class NoCopy { public: NoCopy& operator=(const NoCopy&) = delete; };");

        let member = &entity(&model, "NoCopy").members[0];
        assert_eq!(member.name, "operator=");
        assert!(member.is_deleted());
    }
}

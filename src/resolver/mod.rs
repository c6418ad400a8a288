//! Scope resolution
//!
//! Walks the raw declaration trees of every parsed header depth-first,
//! assigns each declaration its [`QualifiedName`], merges reopened namespaces
//! and forward declarations, and builds the [`ScopeIndex`] used to resolve
//! type references.
//!
//! The scope path is a value handed down the recursion; nothing is looked up
//! until every declaration of every input has been registered, so a type may
//! be referenced before (or in a different file than) its definition.

pub mod name;
pub mod scope;
pub mod types;

pub use name::{AnonymousKind, EntityKind, QualifiedName, Segment};
pub use scope::{Lookup, ScopeIndex};
pub use types::{referenced_types, strip_template_args, TypeReference};

use crate::ids::DeclId;
use crate::parser::ast::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

/// Declaration-specific content carried from the raw tree
#[derive(Debug, Clone, PartialEq)]
pub enum DeclPayload {
    Namespace {
        is_inline: bool,
    },
    Record {
        bases: Vec<BaseSpecifier>,
        members: Vec<RawMember>,
        is_definition: bool,
    },
    Enum {
        values: Vec<String>,
        is_scoped: bool,
        underlying: Option<String>,
        is_definition: bool,
    },
}

impl DeclPayload {
    pub fn is_definition(&self) -> bool {
        match self {
            DeclPayload::Namespace { .. } => true,
            DeclPayload::Record { is_definition, .. } | DeclPayload::Enum { is_definition, .. } => {
                *is_definition
            }
        }
    }
}

/// A declaration with its resolved identity
#[derive(Debug, Clone)]
pub struct ResolvedDecl {
    pub id: DeclId,
    pub name: QualifiedName,
    pub kind: EntityKind,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    pub payload: DeclPayload,
    pub template: Option<TemplateHeader>,
    /// Template parameter names of this declaration and every enclosing one
    pub template_scope: Vec<String>,
    /// Name of the input the (defining) declaration came from
    pub source: String,
    pub location: SourceLocation,
}

/// Arena of resolved declarations plus the lookup index
#[derive(Debug, Default)]
pub struct ResolvedTree {
    decls: Vec<ResolvedDecl>,
    roots: Vec<DeclId>,
    index: ScopeIndex,
}

impl ResolvedTree {
    pub fn decls(&self) -> &[ResolvedDecl] {
        &self.decls
    }

    pub fn get(&self, id: DeclId) -> Option<&ResolvedDecl> {
        self.decls.get(id.index())
    }

    /// Top-level declarations in input order
    pub fn roots(&self) -> &[DeclId] {
        &self.roots
    }

    pub fn index(&self) -> &ScopeIndex {
        &self.index
    }

    pub fn lookup(&self, reference: &str, from_scope: &QualifiedName) -> Lookup {
        self.index.lookup(reference, from_scope)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// Resolve the parsed headers, in input order
pub fn resolve<'a, I>(units: I) -> ResolvedTree
where
    I: IntoIterator<Item = (&'a str, &'a TranslationUnit)>,
{
    let mut resolver = Resolver::default();
    for (source, unit) in units {
        resolver.walk(&unit.declarations, &QualifiedName::global(), None, &[], source);
    }
    resolver.finish()
}

#[derive(Default)]
struct Resolver {
    decls: Vec<ResolvedDecl>,
    roots: Vec<DeclId>,
    by_name: FxHashMap<QualifiedName, DeclId>,
    inline_namespaces: FxHashSet<QualifiedName>,
    next_anonymous: u32,
}

impl Resolver {
    fn walk(
        &mut self,
        decls: &[RawDeclaration],
        scope: &QualifiedName,
        parent: Option<DeclId>,
        template_scope: &[String],
        source: &str,
    ) {
        for decl in decls {
            match decl {
                RawDeclaration::Namespace(ns) => {
                    self.declare_namespace(ns, scope, parent, template_scope, source)
                }
                RawDeclaration::Record(record) => {
                    self.declare_record(record, None, scope, parent, template_scope, source)
                }
                RawDeclaration::Enum(e) => self.declare_enum(e, scope, parent, template_scope, source),
                RawDeclaration::Template(t) => match t.declaration.as_ref() {
                    RawDeclaration::Record(record) => self.declare_record(
                        record,
                        Some(&t.header),
                        scope,
                        parent,
                        template_scope,
                        source,
                    ),
                    other => self.walk(std::slice::from_ref(other), scope, parent, template_scope, source),
                },
            }
        }
    }

    fn declare_namespace(
        &mut self,
        ns: &NamespaceDecl,
        scope: &QualifiedName,
        parent: Option<DeclId>,
        template_scope: &[String],
        source: &str,
    ) {
        let segment = match &ns.name {
            Some(name) => Segment::Named(name.clone()),
            None => self.anonymous(AnonymousKind::Namespace),
        };
        let name = scope.child(segment);

        let id = match self.by_name.get(&name).copied() {
            Some(existing) if self.decls[existing.index()].kind == EntityKind::Namespace => {
                debug!(namespace = %name, "reopened namespace");
                existing
            }
            _ => self.push(ResolvedDecl {
                id: DeclId::default(),
                name: name.clone(),
                kind: EntityKind::Namespace,
                parent,
                children: Vec::new(),
                payload: DeclPayload::Namespace {
                    is_inline: ns.is_inline,
                },
                template: None,
                template_scope: template_scope.to_vec(),
                source: source.to_string(),
                location: ns.location,
            }),
        };

        if ns.is_inline {
            self.inline_namespaces.insert(name.clone());
        }
        self.walk(&ns.body, &name, Some(id), template_scope, source);
    }

    fn declare_record(
        &mut self,
        record: &RecordDecl,
        header: Option<&TemplateHeader>,
        scope: &QualifiedName,
        parent: Option<DeclId>,
        template_scope: &[String],
        source: &str,
    ) {
        let kind = match record.kind {
            RecordKind::Class => EntityKind::Class,
            RecordKind::Struct => EntityKind::Struct,
            RecordKind::Union => EntityKind::Union,
        };
        let name = if record.is_anonymous() {
            scope.child(self.anonymous(kind.into()))
        } else {
            record
                .name
                .iter()
                .fold(scope.clone(), |q, segment| q.child(Segment::Named(segment.clone())))
        };

        // class Outer::Inner { ... } attaches to Outer when Outer is known
        let parent = if record.name.len() > 1 {
            name.parent()
                .and_then(|p| self.by_name.get(&p).copied())
                .or(parent)
        } else {
            parent
        };

        let mut own_scope = template_scope.to_vec();
        if let Some(header) = header {
            own_scope.extend(header.params.iter().cloned());
        }

        let payload = DeclPayload::Record {
            bases: record.bases.clone(),
            members: record.members.clone(),
            is_definition: record.is_definition,
        };

        let id = match self.merge_target(&name, record.is_definition) {
            Some(existing) => {
                if record.is_definition {
                    let decl = &mut self.decls[existing.index()];
                    decl.kind = kind;
                    decl.payload = payload;
                    if let Some(header) = header {
                        decl.template = Some(header.clone());
                    }
                    decl.template_scope = own_scope.clone();
                    decl.source = source.to_string();
                    decl.location = record.location;
                    debug!(record = %name, "definition completes forward declaration");
                }
                existing
            }
            None => self.push(ResolvedDecl {
                id: DeclId::default(),
                name: name.clone(),
                kind,
                parent,
                children: Vec::new(),
                payload,
                template: header.cloned(),
                template_scope: own_scope.clone(),
                source: source.to_string(),
                location: record.location,
            }),
        };

        self.walk(&record.nested, &name, Some(id), &own_scope, source);
    }

    fn declare_enum(
        &mut self,
        decl: &EnumDecl,
        scope: &QualifiedName,
        parent: Option<DeclId>,
        template_scope: &[String],
        source: &str,
    ) {
        let name = match &decl.name {
            Some(n) => scope.child(Segment::Named(n.clone())),
            None => scope.child(self.anonymous(AnonymousKind::Enum)),
        };
        let payload = DeclPayload::Enum {
            values: decl.values.clone(),
            is_scoped: decl.is_scoped,
            underlying: decl.underlying.clone(),
            is_definition: decl.is_definition,
        };

        match self.merge_target(&name, decl.is_definition) {
            Some(existing) => {
                if decl.is_definition {
                    let target = &mut self.decls[existing.index()];
                    target.kind = EntityKind::Enum;
                    target.payload = payload;
                    target.source = source.to_string();
                    target.location = decl.location;
                }
            }
            None => {
                self.push(ResolvedDecl {
                    id: DeclId::default(),
                    name,
                    kind: EntityKind::Enum,
                    parent,
                    children: Vec::new(),
                    payload,
                    template: None,
                    template_scope: template_scope.to_vec(),
                    source: source.to_string(),
                    location: decl.location,
                });
            }
        }
    }

    /// Existing declaration a new record/enum declaration folds into: the
    /// same qualified name, a non-namespace, and at most one of the two a
    /// full definition. Two definitions are both kept.
    fn merge_target(&self, name: &QualifiedName, is_definition: bool) -> Option<DeclId> {
        let existing = self.by_name.get(name).copied()?;
        let decl = &self.decls[existing.index()];
        let mergeable = decl.kind != EntityKind::Namespace
            && !(decl.payload.is_definition() && is_definition);
        mergeable.then_some(existing)
    }

    fn anonymous(&mut self, kind: AnonymousKind) -> Segment {
        self.next_anonymous += 1;
        Segment::Anonymous {
            kind,
            ordinal: self.next_anonymous,
        }
    }

    fn push(&mut self, mut decl: ResolvedDecl) -> DeclId {
        let id = DeclId::from_raw(self.decls.len() as u32);
        decl.id = id;
        match decl.parent {
            Some(parent) => self.decls[parent.index()].children.push(id),
            None => self.roots.push(id),
        }
        self.by_name.entry(decl.name.clone()).or_insert(id);
        debug!(decl = %decl.name, kind = %decl.kind, "declared");
        self.decls.push(decl);
        id
    }

    fn finish(self) -> ResolvedTree {
        let mut index = ScopeIndex::new();
        for decl in &self.decls {
            let paths = visible_paths(&decl.name, &self.inline_namespaces);
            index.insert(decl.id, decl.name.clone(), decl.kind, paths);
        }
        info!(declarations = self.decls.len(), "resolved scopes");

        ResolvedTree {
            decls: self.decls,
            roots: self.roots,
            index,
        }
    }
}

/// Every way a name can be spelled from the global scope: anonymous
/// segments dropped, inline namespace segments optional. Anonymous
/// declarations themselves cannot be spelled at all.
fn visible_paths(name: &QualifiedName, inline: &FxHashSet<QualifiedName>) -> Vec<Vec<String>> {
    if name.is_anonymous() {
        return Vec::new();
    }

    let segments = name.segments();
    let mut variants: Vec<Vec<String>> = vec![Vec::new()];
    for (k, segment) in segments.iter().enumerate() {
        let Segment::Named(text) = segment else {
            continue;
        };
        let optional = k + 1 < segments.len()
            && inline.contains(&QualifiedName::from_segments(segments[..=k].to_vec()));

        let mut next = Vec::with_capacity(variants.len() * 2);
        for variant in &variants {
            let mut with = variant.clone();
            with.push(text.clone());
            next.push(with);
            if optional {
                next.push(variant.clone());
            }
        }
        variants = next;
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_header;
    use pretty_assertions::assert_eq;

    fn resolve_sources(sources: &[&str]) -> ResolvedTree {
        let units: Vec<TranslationUnit> = sources
            .iter()
            .map(|s| {
                let parsed = parse_header(s).unwrap();
                assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
                parsed.unit
            })
            .collect();
        resolve(units.iter().map(|u| ("test.hpp", u)))
    }

    fn names(tree: &ResolvedTree) -> Vec<String> {
        tree.decls().iter().map(|d| d.name.to_string()).collect()
    }

    #[test]
    fn test_duplicate_short_names_get_distinct_identities() {
        let tree = resolve_sources(&["class Class04 {};\nnamespace Interface { class Class04 {}; }"]);

        assert_eq!(names(&tree), vec!["Class04", "Interface", "Interface::Class04"]);
        assert_eq!(tree.index().named("Class04").len(), 2);
    }

    #[test]
    fn test_reopened_namespace_merges_across_sources() {
        let tree = resolve_sources(&["namespace a { class X; }", "namespace a { class X {}; class Y {}; }"]);

        assert_eq!(names(&tree), vec!["a", "a::X", "a::Y"]);
        let x = tree.get(DeclId(1)).unwrap();
        assert!(x.payload.is_definition());
        assert_eq!(tree.get(DeclId(0)).unwrap().children, vec![DeclId(1), DeclId(2)]);
    }

    #[test]
    fn test_chained_namespace_matches_nested() {
        let chained = resolve_sources(&["namespace a::b { class C; }"]);
        let nested = resolve_sources(&["namespace a { namespace b { class C; } }"]);

        assert_eq!(names(&chained), names(&nested));
    }

    #[test]
    fn test_anonymous_constructs_get_ordinals() {
        let tree = resolve_sources(&[
            "namespace { struct Hidden {}; }\nclass Outer { union { int i; float f; }; union { char c; }; };",
        ]);

        assert_eq!(
            names(&tree),
            vec![
                "(anonymous namespace 1)",
                "(anonymous namespace 1)::Hidden",
                "Outer",
                "Outer::(anonymous union 2)",
                "Outer::(anonymous union 3)",
            ]
        );
        // Named contents of the anonymous namespace stay visible
        assert_eq!(tree.lookup("Hidden", &QualifiedName::global()), Lookup::Resolved(DeclId(1)));
    }

    #[test]
    fn test_double_definition_is_kept_twice() {
        let tree = resolve_sources(&["class A {};", "class A { int x; };"]);
        assert_eq!(names(&tree), vec!["A", "A"]);
    }

    #[test]
    fn test_inline_namespace_members_visible_in_parent() {
        let tree = resolve_sources(&["namespace lib { inline namespace v2 { class Widget {}; } }"]);

        let widget = tree.index().get(&QualifiedName::parse("lib::v2::Widget"));
        assert!(widget.is_some());
        assert_eq!(
            tree.lookup("Widget", &QualifiedName::parse("lib")),
            Lookup::Resolved(widget.unwrap())
        );
        assert_eq!(
            tree.lookup("lib::v2::Widget", &QualifiedName::global()),
            Lookup::Resolved(widget.unwrap())
        );
    }

    #[test]
    fn test_template_scope_accumulates() {
        let tree = resolve_sources(&["template <typename T> class Outer { template <typename U> struct Inner {}; };"]);

        let inner = tree.index().get(&QualifiedName::parse("Outer::Inner")).unwrap();
        assert_eq!(tree.get(inner).unwrap().template_scope, vec!["T", "U"]);
    }

    #[test]
    fn test_out_of_line_definition_completes_nested_forward() {
        let tree = resolve_sources(&["class Outer { class Inner; };\nclass Outer::Inner { int x; };"]);

        assert_eq!(names(&tree), vec!["Outer", "Outer::Inner"]);
        let inner = tree.get(DeclId(1)).unwrap();
        assert_eq!(inner.parent, Some(DeclId(0)));
        assert!(inner.payload.is_definition());
    }
}

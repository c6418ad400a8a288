//! PlantUML class-diagram output.
//!
//! Namespaces become `namespace` blocks and links use dotted paths
//! (`outer.inner.Class`). Nested records are drawn next to their outer
//! record, named `Outer::Inner`, and linked to it with `+--`.

use crate::ids::EntityId;
use crate::model::{Entity, EntityModel, Member, RelationshipKind};
use crate::parser::ast::Access;
use crate::resolver::{AnonymousKind, EntityKind, Segment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// List fields and methods inside each record
    pub members: bool,
    /// Draw relationship edges after the declarations
    pub relationships: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            members: true,
            relationships: true,
        }
    }
}

/// Render the whole model as a `@startuml ... @enduml` document
pub fn render(model: &EntityModel, options: &RenderOptions) -> String {
    let mut renderer = Renderer {
        model,
        options,
        out: String::from("@startuml\n\n"),
        depth: 0,
    };

    for entity in model.entities().iter().filter(|e| e.parent.is_none()) {
        renderer.entity(entity);
    }
    if options.relationships {
        renderer.relationships();
    }

    renderer.out.push_str("\n@enduml\n");
    renderer.out
}

struct Renderer<'a> {
    model: &'a EntityModel,
    options: &'a RenderOptions,
    out: String,
    depth: usize,
}

impl Renderer<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn entity(&mut self, entity: &Entity) {
        match entity.kind {
            EntityKind::Namespace => self.namespace(entity),
            EntityKind::Enum => self.enumeration(entity),
            EntityKind::Class | EntityKind::Struct | EntityKind::Union => self.record(entity),
        }
    }

    fn namespace(&mut self, entity: &Entity) {
        let name = entity.name.last().map(label).unwrap_or_default();
        self.line(&format!("namespace {} {{", name));
        self.depth += 1;
        let model = self.model;
        for child in model.children_of(entity.id) {
            self.entity(child);
        }
        self.depth -= 1;
        self.line("}");
        self.line("");
    }

    fn record(&mut self, entity: &Entity) {
        let mut head = String::new();
        if entity.is_abstract {
            head.push_str("abstract ");
        }
        head.push_str("class ");
        head.push_str(&diagram_name(self.model, entity));
        if let Some(template) = &entity.template {
            head.push_str(&format!(" <{}>", template.text));
        }
        head.push_str(" {");

        self.line(&head);
        if self.options.members {
            self.depth += 1;
            for member in entity.members.iter().filter(|m| !m.is_deleted()) {
                self.line(&member_line(member));
            }
            self.depth -= 1;
        }
        self.line("}");
        self.line("");

        let model = self.model;
        for child in model.children_of(entity.id) {
            self.entity(child);
        }
    }

    fn enumeration(&mut self, entity: &Entity) {
        self.line(&format!("enum {} {{", diagram_name(self.model, entity)));
        self.depth += 1;
        for value in &entity.enum_values {
            self.line(value);
        }
        self.depth -= 1;
        self.line("}");
        self.line("");
    }

    fn relationships(&mut self) {
        let model = self.model;
        let link = |id: EntityId| model.entity(id).map(|e| link_name(model, e));

        for rel in model.relationships().iter().filter(|r| r.is_inheritance()) {
            if let (Some(base), Some(derived)) = (link(rel.from), link(rel.to)) {
                self.line(&format!("{} <|-- {}", base, derived));
            }
        }

        // Several members linking the same pair collapse into one counted edge
        let mut composed: Vec<((EntityId, EntityId, bool), usize)> = Vec::new();
        for rel in model.relationships() {
            if let RelationshipKind::Composition { by_reference, .. } = rel.kind {
                let key = (rel.from, rel.to, by_reference);
                match composed.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, count)) => *count += 1,
                    None => composed.push((key, 1)),
                }
            }
        }
        for ((owner, target, by_reference), count) in composed {
            if let (Some(owner), Some(target)) = (link(owner), link(target)) {
                let count = if count > 1 { format!("\"{}\" ", count) } else { String::new() };
                let arrow = if by_reference { "o--" } else { "*--" };
                self.line(&format!("{} {}{} {}", owner, count, arrow, target));
            }
        }

        for rel in model.relationships().iter().filter(|r| r.is_nesting()) {
            let drawn = |id: EntityId| {
                model
                    .entity(id)
                    .filter(|e| e.kind != EntityKind::Namespace)
                    .map(|e| link_name(model, e))
            };
            if let (Some(outer), Some(inner)) = (drawn(rel.from), drawn(rel.to)) {
                self.line(&format!("{} +-- {}", outer, inner));
            }
        }

        let mut drawn_dependencies: Vec<(EntityId, EntityId)> = Vec::new();
        for rel in model.relationships().iter().filter(|r| r.is_dependency()) {
            if drawn_dependencies.contains(&(rel.from, rel.to)) {
                continue;
            }
            drawn_dependencies.push((rel.from, rel.to));
            if let (Some(owner), Some(used)) = (link(rel.from), link(rel.to)) {
                self.line(&format!("{} <.. {}", used, owner));
            }
        }
    }
}

fn member_line(member: &Member) -> String {
    let mut text = String::from(match member.access {
        Access::Public => "+",
        Access::Protected => "#",
        Access::Private => "-",
    });
    if member.is_static() {
        text.push_str("{static} ");
    }

    if member.is_method() {
        if member.is_pure_virtual() {
            text.push_str("{abstract} ");
        }
        let params: Vec<String> = member
            .params()
            .iter()
            .map(|p| match &p.name {
                Some(name) => format!("{} {}", p.type_ref, name),
                None => p.type_ref.clone(),
            })
            .collect();
        text.push_str(&format!("{}({})", member.name, params.join(", ")));
    } else {
        text.push_str(&member.name);
    }

    if !member.type_ref.is_empty() {
        text.push_str(" : ");
        text.push_str(&member.type_ref);
    }
    if member.is_method() && member.is_const() {
        text.push_str(" {query}");
    }
    text
}

fn label(segment: &Segment) -> String {
    match segment {
        Segment::Named(name) => name.clone(),
        Segment::Anonymous { kind, ordinal } => {
            let kind = match kind {
                AnonymousKind::Namespace => "namespace",
                AnonymousKind::Class => "class",
                AnonymousKind::Struct => "struct",
                AnonymousKind::Union => "union",
                AnonymousKind::Enum => "enum",
            };
            format!("anonymous_{}_{}", kind, ordinal)
        }
    }
}

/// Number of leading name segments that belong to enclosing namespaces
fn namespace_depth(model: &EntityModel, entity: &Entity) -> usize {
    let mut depth = 0;
    let mut current = model.parent_of(entity.id);
    while let Some(parent) = current {
        if parent.kind == EntityKind::Namespace {
            depth += 1;
        }
        current = model.parent_of(parent.id);
    }
    depth
}

/// Name inside the enclosing namespace block, e.g. `Outer::Inner`
fn diagram_name(model: &EntityModel, entity: &Entity) -> String {
    let skip = namespace_depth(model, entity);
    entity.name.segments()[skip.min(entity.name.len())..]
        .iter()
        .map(label)
        .collect::<Vec<_>>()
        .join("::")
}

/// Name usable in a link from anywhere, e.g. `outer.inner.Outer::Inner`
fn link_name(model: &EntityModel, entity: &Entity) -> String {
    let skip = namespace_depth(model, entity).min(entity.name.len());
    let mut parts: Vec<String> = entity.name.segments()[..skip].iter().map(label).collect();
    parts.push(diagram_name(model, entity));
    parts.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildOptions;
    use crate::pipeline::{analyze, SourceText};
    use pretty_assertions::assert_eq;

    fn render_source(source: &str) -> String {
        render_with(source, &BuildOptions::default())
    }

    fn render_with(source: &str, options: &BuildOptions) -> String {
        let analysis = analyze(&[SourceText::new("test.hpp", source)], options).unwrap();
        assert_eq!(analysis.report.error_count(), 0, "{}", analysis.report);
        render(&analysis.model, &RenderOptions::default())
    }

    fn body(diagram: &str) -> &str {
        diagram
            .trim_start_matches("@startuml\n\n")
            .trim_end_matches("\n@enduml\n")
            .trim_end()
    }

    #[test]
    fn test_member_lines() {
        let diagram = render_source(
            "class Test {\n\
             public:\n\
               int & func(int * a);\n\
               static int count(int & a);\n\
               ~Test();\n\
               Test& operator=(const Test&) = delete;\n\
             protected:\n\
               int &member;\n\
             private:\n\
               virtual int * get() const = 0;\n\
             };",
        );

        assert_eq!(
            body(&diagram),
            "abstract class Test {\n\
             \t+func(int* a) : int&\n\
             \t+{static} count(int& a) : int\n\
             \t+~Test()\n\
             \t#member : int&\n\
             \t-{abstract} get() : int* {query}\n\
             }"
        );
    }

    #[test]
    fn test_template_record() {
        let diagram = render_source("template <typename T> class Test { T* func(T& arg); };");

        assert_eq!(
            body(&diagram),
            "class Test <template <typename T>> {\n\
             \t-func(T& arg) : T*\n\
             }"
        );
    }

    #[test]
    fn test_enums() {
        let diagram = render_source("enum Test { A, B = 12, CD };\nenum { X, Y };");

        assert_eq!(
            body(&diagram),
            "enum Test {\n\tA\n\tB\n\tCD\n}\n\n\
             enum anonymous_enum_1 {\n\tX\n\tY\n}"
        );
    }

    #[test]
    fn test_counted_composition_and_aggregation() {
        let diagram = render_source("class B {};\nclass A { B obj; B other; B* ptr; };");

        assert!(diagram.contains("A \"2\" *-- B\n"));
        assert!(diagram.contains("A o-- B\n"));
    }

    #[test]
    fn test_namespaces_keep_short_names_apart() {
        let diagram = render_source(
            "class Class04 {};\n\
             namespace Interface { class Class04 {}; class Impl : public Class04 {}; }\n\
             class Other : public Class04 {};",
        );

        assert!(diagram.contains("namespace Interface {\n\tclass Class04 {\n\t}\n"));
        assert!(diagram.contains("Interface.Class04 <|-- Interface.Impl\n"));
        assert!(diagram.contains("Class04 <|-- Other\n"));
    }

    #[test]
    fn test_nested_records_and_dependencies() {
        let options = BuildOptions {
            dependencies: true,
            ..BuildOptions::default()
        };
        let diagram = render_with(
            "namespace app {\n\
               class Config {};\n\
               class Outer { struct Inner { int x; }; public: void load(const Config& c); };\n\
             }",
            &options,
        );

        assert!(diagram.contains("\tclass Outer::Inner {\n\t\t+x : int\n\t}\n"));
        assert!(diagram.contains("app.Outer +-- app.Outer::Inner\n"));
        assert!(diagram.contains("app.Config <.. app.Outer\n"));
        assert!(!diagram.contains("app +-- "));
    }
}

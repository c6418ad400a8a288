// Model and diagram checks over the header fixtures

use hppuml::model::RelationshipKind;
use hppuml::parser::ast::Access;
use hppuml::resolver::EntityKind;
use hppuml::{analyze, render, Analysis, BuildOptions, EntityModel, RenderOptions, SourceText};
use pretty_assertions::assert_eq;

const CLASSES_1_2: &str = include_str!("fixtures/simple_classes_1_2.hpp");
const CLASSES_3: &str = include_str!("fixtures/simple_classes_3.hpp");

fn run(sources: &[(&str, &str)], options: &BuildOptions) -> Analysis {
    let sources: Vec<SourceText> = sources
        .iter()
        .map(|(name, text)| SourceText::new(*name, *text))
        .collect();
    let analysis = analyze(&sources, options).expect("model should build");
    assert_eq!(analysis.report.error_count(), 0, "{}", analysis.report);
    analysis
}

fn both() -> Analysis {
    run(
        &[
            ("simple_classes_1_2.hpp", CLASSES_1_2),
            ("simple_classes_3.hpp", CLASSES_3),
        ],
        &BuildOptions {
            dependencies: true,
            ..BuildOptions::default()
        },
    )
}

fn compositions(model: &EntityModel, owner: &str) -> Vec<(String, String, bool)> {
    let owner = model.find(owner).expect("owner exists").id;
    model
        .relationships()
        .iter()
        .filter(|r| r.from == owner)
        .filter_map(|r| match &r.kind {
            RelationshipKind::Composition { member, by_reference } => Some((
                member.clone(),
                model.entity(r.to)?.name.to_string(),
                *by_reference,
            )),
            _ => None,
        })
        .collect()
}

#[test]
fn test_simple_classes_1_2_model() {
    let analysis = run(&[("simple_classes_1_2.hpp", CLASSES_1_2)], &BuildOptions::default());
    let model = &analysis.model;

    let names: Vec<String> = model.entities().iter().map(|e| e.name.to_string()).collect();
    assert_eq!(names, vec!["Enum01", "Class01", "Class02", "Class02::ClassNested"]);

    let class01 = model.find("Class01").unwrap();
    let class02 = model.find("Class02").unwrap();
    assert!(class01.is_abstract);
    assert!(!class02.is_abstract);

    let assign = class01.members.iter().find(|m| m.name == "operator=").unwrap();
    assert!(assign.is_deleted());
    assert_eq!(assign.access, Access::Public);

    let template_method = class02.members.iter().find(|m| m.name == "_PrivateMethod").unwrap();
    assert_eq!(template_method.template_params, vec!["T"]);
    assert_eq!(template_method.access, Access::Private);

    let inheritance: Vec<_> = model.relationships().iter().filter(|r| r.is_inheritance()).collect();
    assert_eq!(inheritance.len(), 1);
    assert_eq!((inheritance[0].from, inheritance[0].to), (class01.id, class02.id));

    let nested = model.find("Class02::ClassNested").unwrap();
    assert_eq!(nested.parent, Some(class02.id));
    assert_eq!(model.find("Enum01").unwrap().enum_values, vec!["VALUE_0", "VALUE_1", "VALUE_2"]);
}

#[test]
fn test_simple_classes_3_scopes() {
    let analysis = run(&[("simple_classes_3.hpp", CLASSES_3)], &BuildOptions::default());
    let model = &analysis.model;

    let class04: Vec<String> = model
        .entities_named("Class04")
        .iter()
        .map(|e| e.name.to_string())
        .collect();
    assert_eq!(class04, vec!["Class04", "Interface::Class04"]);

    let derived = model.find("Interface::Class04_derived").unwrap();
    assert_eq!(derived.bases[0].target, Some(model.find("Interface::Class04").unwrap().id));

    let ns_class = model.find("Interface::NestedNamespace::Class04_ns").unwrap();
    assert_eq!(ns_class.bases[0].access, Access::Private);
    assert_eq!(ns_class.bases[0].target, Some(derived.id));
    assert_eq!(
        compositions(model, "Interface::NestedNamespace::Class04_ns"),
        vec![
            ("_s".to_string(), "Interface::Struct".to_string(), false),
            ("_e".to_string(), "Interface::Enum".to_string(), false),
        ]
    );

    let class03 = model.find("Class03").unwrap();
    assert_eq!(class03.template.as_ref().map(|t| t.params.clone()), Some(vec!["T".to_string()]));
    // Class01 and Class02 live in the other fixture
    assert!(compositions(model, "Class03").is_empty());

    assert!(model.find("first_ns::second_ns::A").is_some());
    assert!(model.is_nesting_forest());
    assert!(model.is_inheritance_acyclic());
    assert!(model.warnings().is_empty());
}

#[test]
fn test_anonymous_union_of_structs() {
    let analysis = run(&[("simple_classes_3.hpp", CLASSES_3)], &BuildOptions::default());
    let model = &analysis.model;

    let union = model.find("(anonymous union 1)").unwrap();
    assert_eq!(union.kind, EntityKind::Union);
    let children: Vec<String> = model
        .children_of(union.id)
        .iter()
        .map(|e| e.name.to_string())
        .collect();
    assert_eq!(
        children,
        vec!["(anonymous union 1)::(anonymous struct 2)", "(anonymous union 1)::(anonymous struct 3)"]
    );
    assert_eq!(union.members.len(), 1);
    assert_eq!(union.members[0].type_ref, "float[3]");

    let anonymous = model.entities().iter().filter(|e| e.name.is_anonymous()).count();
    assert_eq!(anonymous, 3);
}

#[test]
fn test_both_fixtures_resolve_across_files() {
    let analysis = both();
    let model = &analysis.model;

    assert_eq!(
        compositions(model, "Class03"),
        vec![
            ("_obj".to_string(), "Class01".to_string(), true),
            ("_data".to_string(), "Class01".to_string(), true),
            ("_obj_list".to_string(), "Class02".to_string(), false),
        ]
    );
    assert_eq!(
        compositions(model, "Interface::Class04"),
        vec![
            ("_obj".to_string(), "Class01".to_string(), true),
            ("_val".to_string(), "Enum01".to_string(), false),
        ]
    );

    let class03 = model.find("Class03").unwrap().id;
    let used: Vec<String> = model
        .relationships()
        .iter()
        .filter(|r| r.is_dependency() && r.from == class03)
        .filter_map(|r| model.entity(r.to).map(|e| e.name.to_string()))
        .collect();
    assert_eq!(used, vec!["Interface::Class04"]);
}

#[test]
fn test_both_fixtures_diagram() {
    let analysis = both();
    let diagram = render(&analysis.model, &RenderOptions::default());

    assert!(diagram.starts_with("@startuml\n"));
    assert!(diagram.ends_with("@enduml\n"));

    for expected in [
        "abstract class Class01 {\n",
        "\t#{abstract} _AbstractMethod(int param) : bool\n",
        "\t+PublicMethod(int param) : bool {query}\n",
        "\t+{static} StaticPublicMethod(bool param) : bool\n",
        "class Class03 <template <typename T>> {\n",
        "\t+~Class03()\n",
        "namespace Interface {\n",
        "namespace first_ns {\n\tnamespace second_ns {\n\t\tclass A {\n\t\t}\n",
        "class anonymous_union_1 {\n\t+vec : float[3]\n}\n",
        "Class01 <|-- Class02\n",
        "Interface.Class04 <|-- Interface.Class04_derived\n",
        "Interface.Class04_derived <|-- Interface.NestedNamespace.Class04_ns\n",
        "Class03 \"2\" o-- Class01\n",
        "Class03 *-- Class02\n",
        "Interface.Class04 *-- Enum01\n",
        "Class02 +-- Class02::ClassNested\n",
        "anonymous_union_1 +-- anonymous_union_1::anonymous_struct_2\n",
        "Interface.Class04 <.. Class03\n",
    ] {
        assert!(diagram.contains(expected), "missing {:?} in\n{}", expected, diagram);
    }
    assert!(!diagram.contains("operator="));
}

//! Integration tests for whole-unit analysis
//!
//! Units are assembled with the tree builder in the shapes the parser hands
//! over, then analyzed through a session.

use delfin_core::operator::BinaryOperator;
use delfin_core::semantic::IssueKind;
use delfin_core::symbol::{DeclarationKind, RoutineKind};
use delfin_core::types::{StructKind, Type};
use delfin_core::{
    AnalysisError, Config, NodeId, NodeKind, Session, SyntaxError, SyntaxTree, TreeBuilder,
};

fn session() -> Session {
    Session::new(&Config::default()).expect("System scope must build")
}

fn uses(b: &mut TreeBuilder, units: &[&str]) -> NodeId {
    let references: Vec<NodeId> = units
        .iter()
        .map(|name| {
            b.leaf(NodeKind::UnitReference {
                name: name.to_string(),
            })
        })
        .collect();
    b.node(NodeKind::UsesClause, references)
}

fn type_section(b: &mut TreeBuilder, declarations: Vec<(&str, NodeId)>) -> NodeId {
    let declarations: Vec<NodeId> = declarations
        .into_iter()
        .map(|(name, type_node)| {
            b.node(
                NodeKind::TypeDeclaration {
                    name: name.to_string(),
                },
                [type_node],
            )
        })
        .collect();
    b.node(NodeKind::TypeSection, declarations)
}

fn var_section(b: &mut TreeBuilder, names: &[&str], type_name: &str) -> NodeId {
    let type_node = b.type_ref(type_name);
    let declaration = b.node(
        NodeKind::VarDeclaration {
            names: names.iter().map(|name| name.to_string()).collect(),
        },
        [type_node],
    );
    b.node(NodeKind::VarSection, [declaration])
}

fn struct_type(
    b: &mut TreeBuilder,
    kind: StructKind,
    ancestors: &[&str],
    members: Vec<NodeId>,
) -> NodeId {
    let mut children = Vec::new();
    if !ancestors.is_empty() {
        let references: Vec<NodeId> = ancestors.iter().map(|name| b.type_ref(name)).collect();
        children.push(b.node(NodeKind::AncestorList, references));
    }
    children.extend(members);
    b.node(NodeKind::StructType { struct_kind: kind }, children)
}

fn helper_for(b: &mut TreeBuilder, target: &str, members: Vec<NodeId>) -> NodeId {
    let target = b.type_ref(target);
    let target = b.node(NodeKind::HelperTarget, [target]);
    let children = std::iter::once(target).chain(members);
    b.node(
        NodeKind::StructType {
            struct_kind: StructKind::RecordHelper,
        },
        children,
    )
}

fn signature(b: &mut TreeBuilder, parameters: &[(&str, &str)], returns: Option<&str>) -> Vec<NodeId> {
    let mut children: Vec<NodeId> = parameters
        .iter()
        .map(|(name, type_name)| {
            let type_node = b.type_ref(type_name);
            b.node(
                NodeKind::Parameter {
                    names: vec![name.to_string()],
                    has_default: false,
                },
                [type_node],
            )
        })
        .collect();
    if let Some(returns) = returns {
        let type_node = b.type_ref(returns);
        children.push(b.node(NodeKind::ReturnType, [type_node]));
    }
    children
}

fn routine_declaration(
    b: &mut TreeBuilder,
    name: &str,
    kind: RoutineKind,
    parameters: &[(&str, &str)],
    returns: Option<&str>,
) -> NodeId {
    let children = signature(b, parameters, returns);
    b.node(
        NodeKind::RoutineDeclaration {
            name: name.to_string(),
            routine_kind: kind,
        },
        children,
    )
}

/// A routine whose body evaluates each of `body` as an expression statement.
fn routine_implementation(
    b: &mut TreeBuilder,
    name: &str,
    kind: RoutineKind,
    parameters: &[(&str, &str)],
    returns: Option<&str>,
    body: Vec<NodeId>,
) -> NodeId {
    let mut children = signature(b, parameters, returns);
    let statements: Vec<NodeId> = body
        .into_iter()
        .map(|expression| b.node(NodeKind::ExpressionStatement, [expression]))
        .collect();
    children.push(b.node(NodeKind::CompoundStatement, statements));
    b.node(
        NodeKind::RoutineImplementation {
            name: name.to_string(),
            routine_kind: kind,
        },
        children,
    )
}

fn run(b: &mut TreeBuilder, body: Vec<NodeId>) -> NodeId {
    routine_implementation(b, "Run", RoutineKind::Procedure, &[], None, body)
}

fn unit(
    mut b: TreeBuilder,
    name: &str,
    interface: Vec<NodeId>,
    implementation: Vec<NodeId>,
) -> SyntaxTree {
    let interface = b.node(NodeKind::InterfaceSection, interface);
    let implementation = b.node(NodeKind::ImplementationSection, implementation);
    let root = b.node(
        NodeKind::Unit {
            name: name.to_string(),
        },
        [interface, implementation],
    );
    b.finish(root)
}

/// `Shapes` exports `TShape` and `Shared`, and keeps `Hidden` private.
fn shapes_unit(name: &str) -> SyntaxTree {
    let mut b = TreeBuilder::new();
    let shape = struct_type(&mut b, StructKind::Class, &[], vec![]);
    let types = type_section(&mut b, vec![("TShape", shape)]);
    let shared = var_section(&mut b, &["Shared"], "Integer");
    let hidden = var_section(&mut b, &["Hidden"], "Integer");
    unit(b, name, vec![types, shared], vec![hidden])
}

#[test]
fn used_unit_interface_is_visible_but_not_local() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let clause = uses(&mut b, &["Shapes"]);
    let own = var_section(&mut b, &["Own"], "TShape");
    let client = unit(b, "Client", vec![clause, own], vec![]);

    let models = session
        .analyze_units(vec![client, shapes_unit("Shapes")])
        .unwrap();
    let (client, shapes) = (&models[0], &models[1]);

    assert_eq!(client.name(), "Client");
    assert!(client.issues().is_empty());
    assert!(session.shallow_find(client.file_scope(), "TShape").is_empty());
    assert_eq!(session.find(client.file_scope(), "TShape").len(), 1);
    assert!(session.find(client.file_scope(), "Hidden").is_empty());
    assert_eq!(session.find(shapes.file_scope(), "Hidden").len(), 1);

    let integer = session.find(client.file_scope(), "integer");
    assert_eq!(
        session.symbols().get(integer[0]).scope,
        session.system_scope()
    );
}

#[test]
fn unit_qualified_reference_reaches_the_interface() {
    let mut session = session();
    let shapes = session.analyze_unit(shapes_unit("Shapes")).unwrap();

    let mut b = TreeBuilder::new();
    let clause = uses(&mut b, &["Shapes"]);
    let unit_name = b.name("Shapes");
    let qualified = b.member(unit_name, "Shared");
    let body = run(&mut b, vec![qualified]);
    let client = session
        .analyze_unit(unit(b, "Client", vec![clause], vec![body]))
        .unwrap();

    assert!(client.issues().is_empty());
    assert_eq!(client.type_of(qualified), Type::INTEGER);
    let declaration = client
        .occurrence_of(qualified)
        .and_then(|occurrence| occurrence.declaration)
        .unwrap();
    let declaration = session.symbols().get(declaration);
    assert_eq!(declaration.kind, DeclarationKind::Variable);
    assert_eq!(declaration.scope, shapes.file_scope());
}

#[test]
fn dotted_unit_name_resolves_as_one_qualifier() {
    let mut session = session();
    session
        .analyze_unit(shapes_unit("Vendor.Shapes"))
        .unwrap();

    let mut b = TreeBuilder::new();
    let clause = uses(&mut b, &["Vendor.Shapes"]);
    let vendor = b.name("Vendor");
    let unit_name = b.member(vendor, "Shapes");
    let qualified = b.member(unit_name, "Shared");
    let body = run(&mut b, vec![qualified]);
    let client = session
        .analyze_unit(unit(b, "Client", vec![clause], vec![body]))
        .unwrap();

    assert!(client.issues().is_empty());
    assert_eq!(client.type_of(qualified), Type::INTEGER);
}

#[test]
fn adding_class_instances_reports_no_applicable_overload() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let foo = struct_type(&mut b, StructKind::Class, &["TObject"], vec![]);
    let types = type_section(&mut b, vec![("TFoo", foo)]);
    let vars = var_section(&mut b, &["Left", "Right"], "TFoo");
    let left = b.name("Left");
    let right = b.name("Right");
    let sum = b.binary(BinaryOperator::Add, left, right);
    let body = run(&mut b, vec![sum]);
    let model = session
        .analyze_unit(unit(b, "Classes", vec![types, vars], vec![body]))
        .unwrap();

    assert!(model.type_of(sum).is_unknown());
    assert!(model.invocation_of(sum).is_none());
    assert_eq!(model.issues().len(), 1);
    match &model.issues()[0].kind {
        IssueKind::NoApplicableOverload { arguments, .. } => {
            assert_eq!(arguments, &["TFoo", "TFoo"]);
        }
        other => panic!("unexpected issue {other:?}"),
    }
}

#[test]
fn record_operator_is_the_only_addition_candidate() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let add = routine_declaration(
        &mut b,
        "Add",
        RoutineKind::Operator,
        &[("Left", "TVec"), ("Right", "TVec")],
        Some("TVec"),
    );
    let vec_record = struct_type(&mut b, StructKind::Record, &[], vec![add]);
    let types = type_section(&mut b, vec![("TVec", vec_record)]);
    let vars = var_section(&mut b, &["V", "W"], "TVec");
    let v = b.name("V");
    let w = b.name("W");
    let sum = b.binary(BinaryOperator::Add, v, w);
    let body = run(&mut b, vec![sum]);
    let model = session
        .analyze_unit(unit(b, "Vectors", vec![types, vars], vec![body]))
        .unwrap();

    let vec_type = model.type_of(vec_record);
    assert!(vec_type.is_struct());
    let signatures: Vec<String> = session
        .collect(&vec_type, BinaryOperator::Add)
        .iter()
        .map(|invocable| invocable.signature())
        .collect();
    assert_eq!(signatures, vec!["Add(TVec, TVec): TVec"]);
    assert!(session.collect(&vec_type, BinaryOperator::Subtract).is_empty());

    assert!(model.issues().is_empty());
    assert_eq!(model.type_of(sum), vec_type);
    assert_eq!(
        model.invocation_of(sum).and_then(|invocable| invocable.declaration()),
        model.declaration_of(add)
    );
}

fn describe_type(uses_order: &[&str]) -> Type {
    let mut session = session();
    for (unit_name, helper_name, returns) in [
        ("TextHelpers", "TTextHelper", "String"),
        ("NumberHelpers", "TNumberHelper", "Integer"),
    ] {
        let mut b = TreeBuilder::new();
        let describe =
            routine_declaration(&mut b, "Describe", RoutineKind::Function, &[], Some(returns));
        let helper = helper_for(&mut b, "Integer", vec![describe]);
        let types = type_section(&mut b, vec![(helper_name, helper)]);
        session
            .analyze_unit(unit(b, unit_name, vec![types], vec![]))
            .unwrap();
    }

    let mut b = TreeBuilder::new();
    let clause = uses(&mut b, uses_order);
    let vars = var_section(&mut b, &["N"], "Integer");
    let receiver = b.name("N");
    let described = b.member(receiver, "Describe");
    let body = run(&mut b, vec![described]);
    let model = session
        .analyze_unit(unit(b, "Client", vec![clause, vars], vec![body]))
        .unwrap();
    assert!(model.issues().is_empty());
    model.type_of(described)
}

#[test]
fn helper_of_the_unit_used_last_wins() {
    assert_eq!(
        describe_type(&["TextHelpers", "NumberHelpers"]),
        Type::INTEGER
    );
    assert_eq!(
        describe_type(&["NumberHelpers", "TextHelpers"]),
        Type::STRING
    );
}

#[test]
fn method_body_sees_self_result_and_inherited_members() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let value = routine_declaration(&mut b, "Value", RoutineKind::Function, &[], Some("Integer"));
    let foo = struct_type(&mut b, StructKind::Class, &[], vec![value]);
    let types = type_section(&mut b, vec![("TFoo", foo)]);

    let result = b.name("Result");
    let receiver = b.name("Self");
    let class_name = b.member(receiver, "ClassName");
    let implementation = routine_implementation(
        &mut b,
        "TFoo.Value",
        RoutineKind::Function,
        &[],
        Some("Integer"),
        vec![result, class_name],
    );
    let model = session
        .analyze_unit(unit(b, "Methods", vec![types], vec![implementation]))
        .unwrap();

    assert!(model.issues().is_empty());
    assert!(model.declaration_of(value).is_some());
    assert_eq!(model.declaration_of(implementation), model.declaration_of(value));
    assert_eq!(model.type_of(result), Type::INTEGER);
    assert_eq!(model.type_of(class_name), Type::STRING);

    assert_eq!(model.type_of(receiver), model.type_of(foo));
}

#[test]
fn implementation_of_an_undeclared_method_is_reported() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let foo = struct_type(&mut b, StructKind::Class, &[], vec![]);
    let types = type_section(&mut b, vec![("TFoo", foo)]);
    let implementation =
        routine_implementation(&mut b, "TFoo.Missing", RoutineKind::Procedure, &[], None, vec![]);
    let model = session
        .analyze_unit(unit(b, "Methods", vec![types], vec![implementation]))
        .unwrap();

    assert_eq!(model.issues().len(), 1);
    assert_eq!(model.issues()[0].node, implementation);
    assert!(model.issues()[0].is_unresolved());
    assert!(model.declaration_of(implementation).is_none());
}

#[test]
fn overloaded_routine_is_chosen_by_argument_type() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let print_number =
        routine_declaration(&mut b, "Print", RoutineKind::Procedure, &[("Value", "Integer")], None);
    let print_text =
        routine_declaration(&mut b, "Print", RoutineKind::Procedure, &[("Value", "String")], None);

    let callee = b.name("Print");
    let five = b.integer(5);
    let number_call = b.call(callee, [five]);
    let callee = b.name("Print");
    let text = b.text("abc");
    let text_call = b.call(callee, [text]);
    let body = run(&mut b, vec![number_call, text_call]);
    let model = session
        .analyze_unit(unit(
            b,
            "Printing",
            vec![print_number, print_text],
            vec![body],
        ))
        .unwrap();

    assert!(model.issues().is_empty());
    let chosen = |call: NodeId| {
        model
            .invocation_of(call)
            .and_then(|invocable| invocable.declaration())
    };
    assert_eq!(chosen(number_call), model.declaration_of(print_number));
    assert_eq!(chosen(text_call), model.declaration_of(print_text));
    assert_eq!(model.type_of(number_call), Type::Void);
}

#[test]
fn arithmetic_on_a_variant_stays_variant() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let declared = var_section(&mut b, &["V"], "Variant");

    let left = b.name("V");
    let one = b.integer(1);
    let plus_number = b.binary(BinaryOperator::Add, left, one);
    let left = b.name("V");
    let text = b.text("abc");
    let plus_text = b.binary(BinaryOperator::Add, left, text);
    let right = b.name("V");
    let two = b.integer(2);
    let number_plus = b.binary(BinaryOperator::Multiply, two, right);
    let body = run(&mut b, vec![plus_number, plus_text, number_plus]);
    let model = session
        .analyze_unit(unit(b, "Variants", vec![declared], vec![body]))
        .unwrap();

    assert!(model.issues().is_empty(), "{:?}", model.issues());
    assert_eq!(model.type_of(plus_number), Type::VARIANT);
    assert_eq!(model.type_of(plus_text), Type::VARIANT);
    assert_eq!(model.type_of(number_plus), Type::VARIANT);
}

#[test]
fn implicit_roots_for_classes_and_interfaces() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let class = struct_type(&mut b, StructKind::Class, &[], vec![]);
    let interface = struct_type(&mut b, StructKind::Interface, &[], vec![]);
    let record = struct_type(&mut b, StructKind::Record, &[], vec![]);
    let types = type_section(
        &mut b,
        vec![("TBar", class), ("IBar", interface), ("TPoint", record)],
    );
    let model = session
        .analyze_unit(unit(b, "Roots", vec![types], vec![]))
        .unwrap();

    let type_named = |name: &str| {
        let found = session.find(model.file_scope(), name);
        session.symbols().get(found[0]).ty.clone()
    };
    let factory = session.types();
    assert!(factory.is_sub_type_of(&type_named("TBar"), &type_named("TObject")));
    assert!(factory.is_sub_type_of(&type_named("IBar"), &type_named("IInterface")));
    assert!(!factory.is_sub_type_of(&type_named("TPoint"), &type_named("TObject")));
    assert!(!factory.is_sub_type_of(&type_named("TObject"), &type_named("TBar")));
}

#[test]
fn forward_declaration_keeps_one_identity() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let forward = b.leaf(NodeKind::ForwardStructType {
        struct_kind: StructKind::Class,
    });
    let head_type = b.type_ref("TNode");
    let head = b.node(
        NodeKind::FieldDeclaration {
            names: vec!["FHead".to_string()],
        },
        [head_type],
    );
    let list = struct_type(&mut b, StructKind::Class, &[], vec![head]);
    let next_type = b.type_ref("TNode");
    let next = b.node(
        NodeKind::FieldDeclaration {
            names: vec!["FNext".to_string()],
        },
        [next_type],
    );
    let node = struct_type(&mut b, StructKind::Class, &[], vec![next]);
    let types = type_section(
        &mut b,
        vec![("TNode", forward), ("TList", list), ("TNode", node)],
    );
    let model = session
        .analyze_unit(unit(b, "Lists", vec![types], vec![]))
        .unwrap();

    assert!(model.issues().is_empty());
    assert_eq!(session.find(model.file_scope(), "TNode").len(), 1);
    assert_eq!(model.type_of(head_type), model.type_of(next_type));
    assert_eq!(model.type_of(forward), model.type_of(node));
    let Type::Struct(completed) = model.type_of(node) else {
        panic!("TNode should be a struct");
    };
    assert!(!session.types().struct_data(&completed).forward);
    assert_eq!(session.types().struct_data(&completed).parents.len(), 1);
}

#[test]
fn enum_elements_resolve_bare_and_qualified() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let red = b.leaf(NodeKind::EnumElement {
        name: "Red".to_string(),
    });
    let green = b.leaf(NodeKind::EnumElement {
        name: "Green".to_string(),
    });
    let colors = b.node(NodeKind::EnumType, [red, green]);
    let types = type_section(&mut b, vec![("TColor", colors)]);
    let bare = b.name("Red");
    let enum_name = b.name("TColor");
    let qualified = b.member(enum_name, "Green");
    let body = run(&mut b, vec![bare, qualified]);
    let model = session
        .analyze_unit(unit(b, "Colors", vec![types], vec![body]))
        .unwrap();

    assert!(model.issues().is_empty());
    let color = model.type_of(colors);
    assert!(color.is_enum());
    assert_eq!(model.type_of(bare), color);
    assert_eq!(model.type_of(qualified), color);
}

#[test]
fn uses_cycle_resolves_after_collection() {
    let mut session = session();

    let mut b = TreeBuilder::new();
    let back = uses(&mut b, &["Second"]);
    let first = unit(b, "First", vec![], vec![back]);

    let mut b = TreeBuilder::new();
    let forth = uses(&mut b, &["First"]);
    let second = unit(b, "Second", vec![forth], vec![]);

    let models = session.analyze_units(vec![first, second]).unwrap();

    assert_eq!(models[0].name(), "First");
    assert!(models.iter().all(|model| model.issues().is_empty()));
    assert_eq!(
        session.scopes().get(models[0].file_scope()).imports,
        vec![models[1].file_scope()]
    );
}

#[test]
fn unknown_used_unit_is_an_issue_not_an_error() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let clause = uses(&mut b, &["Nowhere"]);
    let model = session
        .analyze_unit(unit(b, "Lonely", vec![clause], vec![]))
        .unwrap();

    assert_eq!(model.issues().len(), 1);
    assert_eq!(model.issues()[0].message(), "Unresolved reference 'Nowhere'");
}

#[test]
fn analyzed_units_are_frozen() {
    let mut session = session();
    let model = session.analyze_unit(shapes_unit("Shapes")).unwrap();

    assert!(session.scopes().get(model.file_scope()).frozen);
    assert!(session.scopes().get(session.system_scope()).frozen);
}

#[test]
fn unit_names_are_unique_within_a_session() {
    let mut session = session();
    session.analyze_unit(shapes_unit("Shapes")).unwrap();

    assert!(matches!(
        session.analyze_unit(shapes_unit("SHAPES")),
        Err(AnalysisError::DuplicateUnit { .. })
    ));
    assert!(matches!(
        session.analyze_unit(shapes_unit("System")),
        Err(AnalysisError::DuplicateUnit { .. })
    ));
}

#[test]
fn discarded_unit_can_be_analyzed_again() {
    let mut session = session();
    session.analyze_unit(shapes_unit("Shapes")).unwrap();
    let mut b = TreeBuilder::new();
    let clause = uses(&mut b, &["Shapes"]);
    let client = session
        .analyze_unit(unit(b, "Client", vec![clause], vec![]))
        .unwrap();
    assert_eq!(session.find(client.file_scope(), "Shared").len(), 1);

    assert!(session.discard_unit("shapes"));
    assert!(!session.discard_unit("Shapes"));
    assert!(session.unit_scope("Shapes").is_none());
    assert!(session.find(client.file_scope(), "Shared").is_empty());

    let again = session.analyze_unit(shapes_unit("Shapes")).unwrap();
    assert_eq!(session.unit_scope("Shapes"), Some(again.file_scope()));
}

#[test]
fn unit_scope_names_qualify_short_unit_names() {
    let mut config = Config::default();
    config.analysis.unit_scope_names = vec!["Vendor".to_string()];
    let mut session = Session::new(&config).unwrap();
    let shapes = session.analyze_unit(shapes_unit("Vendor.Shapes")).unwrap();

    assert_eq!(session.unit_scope("Shapes"), Some(shapes.file_scope()));

    let mut b = TreeBuilder::new();
    let clause = uses(&mut b, &["Shapes"]);
    let own = var_section(&mut b, &["Own"], "TShape");
    let client = session
        .analyze_unit(unit(b, "Client", vec![clause, own], vec![]))
        .unwrap();
    assert!(client.issues().is_empty());
}

#[test]
fn types_are_computed_on_demand_before_resolution() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let vars = var_section(&mut b, &["Count"], "Integer");
    let count = b.name("Count");
    let one = b.integer(1);
    let sum = b.binary(BinaryOperator::Add, count, one);
    let body = run(&mut b, vec![sum]);
    let mut model = session
        .collect_unit(unit(b, "Counter", vec![vars], vec![body]))
        .unwrap();

    assert!(model.type_of(sum).is_unknown());
    assert_eq!(session.type_of(&mut model, sum).unwrap(), Type::INTEGER);
    assert_eq!(model.type_of(count), Type::INTEGER);

    session.resolve_unit(&mut model).unwrap();
    session.resolve_unit(&mut model).unwrap();
    assert_eq!(model.type_of(sum), Type::INTEGER);
    assert!(model.issues().is_empty());
}

#[test]
fn broken_tree_is_a_hard_error_and_leaves_no_unit_behind() {
    let mut session = session();
    let mut b = TreeBuilder::new();
    let declaration = b.leaf(NodeKind::VarDeclaration {
        names: vec!["Broken".to_string()],
    });
    let section = b.node(NodeKind::VarSection, [declaration]);
    let broken = unit(b, "Broken", vec![section], vec![]);

    assert!(matches!(
        session.analyze_unit(broken),
        Err(AnalysisError::Syntax(SyntaxError::MissingChild { index: 0, .. }))
    ));
    assert!(session.unit_scope("Broken").is_none());
    assert!(session.analyze_unit(shapes_unit("Broken")).is_ok());
}

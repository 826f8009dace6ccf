//! Arena-indexed syntax tree handed over by the parser
//!
//! Every node gets a stable [`NodeId`] at construction. Semantic annotations
//! live in side tables keyed by that id, never inside the node itself.

use id_arena::{Arena, Id};
use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::symbol::RoutineKind;
use crate::types::{ArrayKind, ProceduralKind, StructKind};

pub type NodeId = Id<Node>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Closed set of syntax kinds produced by the parser.
///
/// Child layout per kind is part of the parser contract; accessors that find a
/// required child missing report a [`SyntaxError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Children: optional sections, or declarations directly for a program.
    Unit { name: String },
    InterfaceSection,
    ImplementationSection,
    /// Children: `UnitReference`.
    UsesClause,
    UnitReference { name: String },

    /// Children: `TypeDeclaration`.
    TypeSection,
    /// Children: `[type node]`.
    TypeDeclaration { name: String },
    /// Children: `VarDeclaration`.
    VarSection,
    /// Children: `[type node]`.
    VarDeclaration { names: Vec<String> },
    /// Children: `ConstDeclaration`.
    ConstSection,
    /// Children: `[type node, expression]` when typed, `[expression]` otherwise.
    ConstDeclaration { name: String, typed: bool },

    /// A possibly dotted reference to a named type.
    TypeReference { name: String },
    /// Children: optional `AncestorList`, optional `HelperTarget`, then members.
    StructType { struct_kind: StructKind },
    /// `TFoo = class;`
    ForwardStructType { struct_kind: StructKind },
    /// Children: `TypeReference`.
    AncestorList,
    /// Children: `[type node]`.
    HelperTarget,
    /// Children: `EnumElement`.
    EnumType,
    EnumElement { name: String },
    /// Children: `[type node]`.
    PointerType { pointer_math: bool },
    /// Children: `[element type node]`, none for `array of const`.
    ArrayType { array_kind: ArrayKind },
    /// Children: `[element type node]`.
    SetType,
    /// Children: `Parameter`*, optional `ReturnType`.
    ProceduralType { procedural_kind: ProceduralKind },
    /// Children: `[type node]`.
    ClassReferenceType,
    /// `type Integer`. Children: `[type node]`.
    TypeType,

    /// Children: `[type node]`.
    FieldDeclaration { names: Vec<String> },
    /// Children: `[type node]`.
    PropertyDeclaration { name: String },
    /// Children: `Parameter`*, optional `ReturnType`.
    RoutineDeclaration {
        name: String,
        routine_kind: RoutineKind,
    },
    /// Children: `Parameter`*, optional `ReturnType`, local sections, nested
    /// routines, then the `CompoundStatement` body.
    RoutineImplementation {
        name: String,
        routine_kind: RoutineKind,
    },
    /// Children: `[type node]`, none for an untyped parameter.
    Parameter {
        names: Vec<String>,
        #[serde(default)]
        has_default: bool,
    },
    /// Children: `[type node]`.
    ReturnType,

    CompoundStatement,
    /// Children: `[target, value]`.
    AssignmentStatement,
    /// Children: `[expression]`.
    ExpressionStatement,
    /// Children: `[condition, then, else?]`.
    IfStatement,
    /// Children: `[condition, body]`.
    WhileStatement,
    AsmBlock { text: String },

    IntegerLiteral { value: u64 },
    RealLiteral { value: f64 },
    TextLiteral { value: String },
    NilLiteral,
    NameReference { name: String },
    /// Children: `[receiver]`.
    MemberAccess { name: String },
    /// Children: `[callee, arguments...]`.
    Invocation,
    /// Children: `[left, right]`.
    BinaryExpression { operator: BinaryOperator },
    /// Children: `[operand]`.
    UnaryExpression { operator: UnaryOperator },
    /// Children: `[expression]`.
    Parenthesized,
    /// Children: elements.
    ArrayConstructor,
    /// Children: `[pointer expression]`.
    Dereference,
    /// Children: `[expression]`.
    AddressOf,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Unit { .. } => "unit",
            NodeKind::InterfaceSection => "interface_section",
            NodeKind::ImplementationSection => "implementation_section",
            NodeKind::UsesClause => "uses_clause",
            NodeKind::UnitReference { .. } => "unit_reference",
            NodeKind::TypeSection => "type_section",
            NodeKind::TypeDeclaration { .. } => "type_declaration",
            NodeKind::VarSection => "var_section",
            NodeKind::VarDeclaration { .. } => "var_declaration",
            NodeKind::ConstSection => "const_section",
            NodeKind::ConstDeclaration { .. } => "const_declaration",
            NodeKind::TypeReference { .. } => "type_reference",
            NodeKind::StructType { .. } => "struct_type",
            NodeKind::ForwardStructType { .. } => "forward_struct_type",
            NodeKind::AncestorList => "ancestor_list",
            NodeKind::HelperTarget => "helper_target",
            NodeKind::EnumType => "enum_type",
            NodeKind::EnumElement { .. } => "enum_element",
            NodeKind::PointerType { .. } => "pointer_type",
            NodeKind::ArrayType { .. } => "array_type",
            NodeKind::SetType => "set_type",
            NodeKind::ProceduralType { .. } => "procedural_type",
            NodeKind::ClassReferenceType => "class_reference_type",
            NodeKind::TypeType => "type_type",
            NodeKind::FieldDeclaration { .. } => "field_declaration",
            NodeKind::PropertyDeclaration { .. } => "property_declaration",
            NodeKind::RoutineDeclaration { .. } => "routine_declaration",
            NodeKind::RoutineImplementation { .. } => "routine_implementation",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::ReturnType => "return_type",
            NodeKind::CompoundStatement => "compound_statement",
            NodeKind::AssignmentStatement => "assignment_statement",
            NodeKind::ExpressionStatement => "expression_statement",
            NodeKind::IfStatement => "if_statement",
            NodeKind::WhileStatement => "while_statement",
            NodeKind::AsmBlock { .. } => "asm_block",
            NodeKind::IntegerLiteral { .. } => "integer_literal",
            NodeKind::RealLiteral { .. } => "real_literal",
            NodeKind::TextLiteral { .. } => "text_literal",
            NodeKind::NilLiteral => "nil_literal",
            NodeKind::NameReference { .. } => "name_reference",
            NodeKind::MemberAccess { .. } => "member_access",
            NodeKind::Invocation => "invocation",
            NodeKind::BinaryExpression { .. } => "binary_expression",
            NodeKind::UnaryExpression { .. } => "unary_expression",
            NodeKind::Parenthesized => "parenthesized",
            NodeKind::ArrayConstructor => "array_constructor",
            NodeKind::Dereference => "dereference",
            NodeKind::AddressOf => "address_of",
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::IntegerLiteral { .. }
                | NodeKind::RealLiteral { .. }
                | NodeKind::TextLiteral { .. }
                | NodeKind::NilLiteral
                | NodeKind::NameReference { .. }
                | NodeKind::MemberAccess { .. }
                | NodeKind::Invocation
                | NodeKind::BinaryExpression { .. }
                | NodeKind::UnaryExpression { .. }
                | NodeKind::Parenthesized
                | NodeKind::ArrayConstructor
                | NodeKind::Dereference
                | NodeKind::AddressOf
        )
    }

    pub fn is_type_node(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeReference { .. }
                | NodeKind::StructType { .. }
                | NodeKind::ForwardStructType { .. }
                | NodeKind::EnumType
                | NodeKind::PointerType { .. }
                | NodeKind::ArrayType { .. }
                | NodeKind::SetType
                | NodeKind::ProceduralType { .. }
                | NodeKind::ClassReferenceType
                | NodeKind::TypeType
        )
    }
}

#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub position: Position,
}

pub struct SyntaxTree {
    arena: Arena<Node>,
    root: Option<NodeId>,
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("node_count", &self.arena.len())
            .field("root", &self.root)
            .finish()
    }
}

impl SyntaxTree {
    pub fn builder() -> TreeBuilder {
        TreeBuilder::new()
    }

    pub fn root(&self) -> Result<NodeId, SyntaxError> {
        self.root.ok_or(SyntaxError::EmptyTree)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.arena[id].kind
    }

    pub fn position(&self, id: NodeId) -> Position {
        self.arena[id].position
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.arena[id].children
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.arena.iter().map(|(_, node)| node)
    }

    /// Required child at `index`; its absence is a parser contract violation.
    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId, SyntaxError> {
        let node = &self.arena[id];
        node.children
            .get(index)
            .copied()
            .ok_or_else(|| SyntaxError::MissingChild {
                kind: node.kind.name(),
                index,
                line: node.position.line,
                column: node.position.column,
            })
    }

    pub fn optional_child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.arena[id].children.get(index).copied()
    }

    pub fn find_child(&self, id: NodeId, predicate: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| predicate(self.kind(child)))
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    pub fn unexpected(&self, id: NodeId, expected: &'static str) -> SyntaxError {
        let node = &self.arena[id];
        SyntaxError::UnexpectedKind {
            expected,
            found: node.kind.name(),
            line: node.position.line,
            column: node.position.column,
        }
    }
}

/// Bottom-up construction: children are created first, then attached to
/// their parent by [`TreeBuilder::node`].
#[derive(Default)]
pub struct TreeBuilder {
    arena: Arena<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    pub fn node(&mut self, kind: NodeKind, children: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.node_at(kind, Position::default(), children)
    }

    pub fn node_at(
        &mut self,
        kind: NodeKind,
        position: Position,
        children: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let children: Vec<NodeId> = children.into_iter().collect();
        let id = self.arena.alloc_with_id(|id| Node {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            position,
        });

        for &child in &children {
            self.arena[child].parent = Some(id);
        }
        self.arena[id].children = children;

        id
    }

    pub fn leaf(&mut self, kind: NodeKind) -> NodeId {
        self.node(kind, std::iter::empty())
    }

    pub fn name(&mut self, name: &str) -> NodeId {
        self.leaf(NodeKind::NameReference {
            name: name.to_string(),
        })
    }

    pub fn type_ref(&mut self, name: &str) -> NodeId {
        self.leaf(NodeKind::TypeReference {
            name: name.to_string(),
        })
    }

    pub fn integer(&mut self, value: u64) -> NodeId {
        self.leaf(NodeKind::IntegerLiteral { value })
    }

    pub fn text(&mut self, value: &str) -> NodeId {
        self.leaf(NodeKind::TextLiteral {
            value: value.to_string(),
        })
    }

    pub fn member(&mut self, receiver: NodeId, name: &str) -> NodeId {
        self.node(
            NodeKind::MemberAccess {
                name: name.to_string(),
            },
            [receiver],
        )
    }

    pub fn call(&mut self, callee: NodeId, arguments: impl IntoIterator<Item = NodeId>) -> NodeId {
        let children = std::iter::once(callee).chain(arguments);
        self.node(NodeKind::Invocation, children)
    }

    pub fn binary(&mut self, operator: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        self.node(NodeKind::BinaryExpression { operator }, [left, right])
    }

    pub fn unary(&mut self, operator: UnaryOperator, operand: NodeId) -> NodeId {
        self.node(NodeKind::UnaryExpression { operator }, [operand])
    }

    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            arena: self.arena,
            root: Some(root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_links_parent_and_children() {
        let mut builder = TreeBuilder::new();
        let left = builder.integer(1);
        let right = builder.integer(2);
        let sum = builder.binary(BinaryOperator::Add, left, right);
        let tree = builder.finish(sum);

        assert_eq!(tree.root().unwrap(), sum);
        assert_eq!(tree.children(sum), &[left, right]);
        assert_eq!(tree.parent(left), Some(sum));
        assert_eq!(tree.parent(sum), None);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn missing_required_child_is_reported() {
        let mut builder = TreeBuilder::new();
        let deref = builder.leaf(NodeKind::Dereference);
        let tree = builder.finish(deref);

        let err = tree.child(deref, 0).unwrap_err();

        assert!(matches!(
            err,
            SyntaxError::MissingChild {
                kind: "dereference",
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn ancestors_walk_to_root() {
        let mut builder = TreeBuilder::new();
        let name = builder.name("x");
        let paren = builder.node(NodeKind::Parenthesized, [name]);
        let stmt = builder.node(NodeKind::ExpressionStatement, [paren]);
        let tree = builder.finish(stmt);

        let ancestors: Vec<NodeId> = tree.ancestors(name).collect();

        assert_eq!(ancestors, vec![paren, stmt]);
    }

    #[test]
    fn expression_and_type_kinds_are_disjoint() {
        let kinds = [
            NodeKind::NilLiteral,
            NodeKind::SetType,
            NodeKind::TypeReference {
                name: "Integer".to_string(),
            },
            NodeKind::Invocation,
        ];

        for kind in kinds {
            assert!(!(kind.is_expression() && kind.is_type_node()), "{}", kind.name());
        }
    }
}

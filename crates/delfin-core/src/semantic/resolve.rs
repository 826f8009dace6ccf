//! Second pass: type every expression and bind every reference
//!
//! Types are computed on demand and memoized per node, so asking for the
//! type of an outer expression types its operands along the way and asking
//! again is free. Failures never abort the pass: the node gets the Unknown
//! type, an absent declaration and, unless an operand was already Unknown,
//! an issue.

use std::collections::HashSet;
use std::ops::ControlFlow;

use tracing::trace;

use super::annotations::Annotations;
use super::issue::{IssueKind, SemanticIssue};
use super::session::Session;
use crate::error::SyntaxError;
use crate::operator::{BinaryOperator, Invocable, Operator, OverloadResolver, Resolution, UnaryOperator};
use crate::symbol::{DeclId, DeclarationKind, NameOccurrence, ScopeId};
use crate::syntax::{NodeId, NodeKind, SyntaxTree, SyntaxVisitor, walk};
use crate::types::{IntegerType, Type};

pub(crate) struct Resolver<'a> {
    session: &'a Session,
    tree: &'a SyntaxTree,
    annotations: &'a mut Annotations,
    /// Names left unresolved because they may be the first segments of a
    /// dotted unit name.
    deferred: HashSet<NodeId>,
    violation: Option<SyntaxError>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        session: &'a Session,
        tree: &'a SyntaxTree,
        annotations: &'a mut Annotations,
    ) -> Self {
        Self {
            session,
            tree,
            annotations,
            deferred: HashSet::new(),
            violation: None,
        }
    }

    pub(crate) fn run(mut self, root: NodeId, scope: ScopeId) -> Result<(), SyntaxError> {
        walk(self.tree, root, &mut self, scope);
        self.finish()
    }

    /// First structural violation met while typing, if any.
    pub(crate) fn finish(self) -> Result<(), SyntaxError> {
        match self.violation {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub(crate) fn type_of(&mut self, node: NodeId, scope: ScopeId) -> Type {
        if let Some(ty) = self.annotations.cached_type(node) {
            return ty.clone();
        }
        let ty = self.compute(node, scope);
        self.annotations.set_type(node, ty.clone());
        ty
    }

    fn compute(&mut self, node: NodeId, scope: ScopeId) -> Type {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::IntegerLiteral { value } => Type::Integer(IntegerType::for_literal(*value)),
            NodeKind::RealLiteral { .. } => self.session.types.extended(),
            NodeKind::TextLiteral { value } => {
                if value.chars().count() == 1 {
                    Type::CHAR
                } else {
                    Type::STRING
                }
            }
            NodeKind::NilLiteral => Type::nil(),
            NodeKind::NameReference { name } => {
                let candidates = self.resolve_name(node, scope, name);
                self.reference_type(node, name, &candidates)
            }
            NodeKind::MemberAccess { name } => {
                let candidates = self.resolve_member(node, scope, name);
                self.reference_type(node, name, &candidates)
            }
            NodeKind::Invocation => self.invocation(node, scope),
            NodeKind::BinaryExpression { operator } => self.binary(node, scope, *operator),
            NodeKind::UnaryExpression { operator } => self.unary(node, scope, *operator),
            NodeKind::Parenthesized => match self.child(node, 0) {
                Some(inner) => self.type_of(inner, scope),
                None => Type::Unknown,
            },
            NodeKind::ArrayConstructor => {
                let mut elements = Vec::new();
                for &element in tree.children(node) {
                    elements.push(self.type_of(element, scope));
                }
                Type::ArrayConstructor(elements)
            }
            NodeKind::Dereference => self.dereference(node, scope),
            NodeKind::AddressOf => self.address_of(node, scope),
            _ => Type::Unknown,
        }
    }

    fn child(&mut self, node: NodeId, index: usize) -> Option<NodeId> {
        match self.tree.child(node, index) {
            Ok(child) => Some(child),
            Err(error) => {
                self.violation.get_or_insert(error);
                None
            }
        }
    }

    fn issue(&mut self, node: NodeId, kind: IssueKind) {
        trace!(issue = ?kind, "Degraded resolution");
        let position = self.tree.position(node);
        self.annotations
            .push_issue(SemanticIssue::new(node, position, kind));
    }

    fn record_occurrence(&mut self, node: NodeId, name: &str, declaration: Option<DeclId>) {
        self.annotations.set_occurrence(NameOccurrence {
            node,
            name: name.to_string(),
            declaration,
        });
    }

    fn parent_kind(&self, node: NodeId) -> Option<(NodeId, &'a NodeKind)> {
        let tree = self.tree;
        tree.parent(node).map(|parent| (parent, tree.kind(parent)))
    }

    /// Receiver of a member access, as opposed to its argument or operand.
    fn is_qualifier(&self, node: NodeId) -> bool {
        matches!(
            self.parent_kind(node),
            Some((parent, NodeKind::MemberAccess { .. })) if self.tree.children(parent).first() == Some(&node)
        )
    }

    fn is_callee(&self, node: NodeId) -> bool {
        matches!(
            self.parent_kind(node),
            Some((parent, NodeKind::Invocation)) if self.tree.children(parent).first() == Some(&node)
        )
    }

    fn is_address_operand(&self, node: NodeId) -> bool {
        matches!(self.parent_kind(node), Some((_, NodeKind::AddressOf)))
    }

    fn unresolved(&mut self, node: NodeId, name: &str) {
        if self.is_qualifier(node) {
            self.deferred.insert(node);
        } else {
            self.issue(
                node,
                IssueKind::UnresolvedReference {
                    name: name.to_string(),
                },
            );
        }
    }

    fn resolve_name(&mut self, node: NodeId, scope: ScopeId, name: &str) -> Vec<DeclId> {
        let found = self.session.lookup().find(scope, name);
        if found.is_empty() {
            self.unresolved(node, name);
        }
        found
    }

    fn resolve_member(&mut self, node: NodeId, scope: ScopeId, name: &str) -> Vec<DeclId> {
        let Some(receiver) = self.child(node, 0) else {
            return Vec::new();
        };
        let receiver_type = self.type_of(receiver, scope);
        let session = self.session;
        let lookup = session.lookup();

        let unit = self.unit_of(receiver);
        if let Some(unit) = unit {
            let found = lookup.find_in_unit(scope, unit, name);
            if !found.is_empty() {
                return found;
            }
        }
        if unit.is_some() || self.deferred.contains(&receiver) {
            if let Some(dotted) = self.dotted_name(node) {
                let units: Vec<DeclId> = lookup
                    .find(scope, &dotted)
                    .into_iter()
                    .filter(|&id| session.symbols.get(id).unit_scope.is_some())
                    .collect();
                if !units.is_empty() {
                    return units;
                }
                self.unresolved(node, &dotted);
            }
            return Vec::new();
        }

        if receiver_type.is_unknown() {
            return Vec::new();
        }
        let found = lookup.find_member(scope, &receiver_type, name);
        if found.is_empty() {
            self.issue(
                node,
                IssueKind::UnresolvedReference {
                    name: format!("{receiver_type}.{name}"),
                },
            );
        }
        found
    }

    /// File scope a reference resolved to when it names a unit.
    fn unit_of(&self, node: NodeId) -> Option<ScopeId> {
        let declaration = self.annotations.occurrence(node)?.declaration?;
        let declaration = self.session.symbols.get(declaration);
        match declaration.kind {
            DeclarationKind::Unit | DeclarationKind::UnitImport => declaration.unit_scope,
            _ => None,
        }
    }

    /// `A.B.C` for a chain of plain names, `None` for anything else.
    fn dotted_name(&self, node: NodeId) -> Option<String> {
        match self.tree.kind(node) {
            NodeKind::NameReference { name } => Some(name.clone()),
            NodeKind::MemberAccess { name } => {
                let receiver = *self.tree.children(node).first()?;
                Some(format!("{}.{name}", self.dotted_name(receiver)?))
            }
            _ => None,
        }
    }

    /// Value type of a reference to `candidates`. A routine mentioned without
    /// a call and not as the operand of `@` is invoked implicitly.
    fn reference_type(&mut self, node: NodeId, name: &str, candidates: &[DeclId]) -> Type {
        let Some(&first) = candidates.first() else {
            self.record_occurrence(node, name, None);
            return Type::Unknown;
        };
        let session = self.session;
        let symbols = &session.symbols;

        if symbols.get(first).is_routine() && !self.is_callee(node) && !self.is_address_operand(node) {
            let routines: Vec<Invocable> = candidates
                .iter()
                .filter_map(|&id| Invocable::from_declaration(symbols.get(id)))
                .collect();
            let resolver = OverloadResolver::new(&session.types);
            if let Some(chosen) = resolver.resolve(routines, &[]).chosen().cloned() {
                self.record_occurrence(node, name, chosen.declaration());
                let return_type = chosen.return_type.clone();
                self.annotations.set_invocation(node, chosen);
                return return_type;
            }
        }

        self.record_occurrence(node, name, Some(first));
        symbols.get(first).ty.clone()
    }

    /// Turns a ranking outcome into the chosen signature, recording an issue
    /// when there is no single best candidate.
    fn settle(
        &mut self,
        node: NodeId,
        name: &str,
        resolution: Resolution,
        arguments: &[Type],
    ) -> Option<Invocable> {
        match resolution {
            Resolution::Resolved(chosen) => Some(chosen),
            Resolution::Ambiguous { chosen, candidates } => {
                self.issue(
                    node,
                    IssueKind::AmbiguousOverload {
                        name: name.to_string(),
                        chosen: chosen.signature(),
                        candidates: candidates.iter().map(Invocable::signature).collect(),
                    },
                );
                Some(chosen)
            }
            Resolution::NoApplicable => {
                self.issue(
                    node,
                    IssueKind::NoApplicableOverload {
                        name: name.to_string(),
                        arguments: arguments.iter().map(ToString::to_string).collect(),
                    },
                );
                None
            }
        }
    }

    fn invocation(&mut self, node: NodeId, scope: ScopeId) -> Type {
        let tree = self.tree;
        let Some(callee) = self.child(node, 0) else {
            return Type::Unknown;
        };
        let mut arguments = Vec::new();
        for &argument in &tree.children(node)[1..] {
            arguments.push(self.type_of(argument, scope));
        }

        let (name, candidates) = match tree.kind(callee) {
            NodeKind::NameReference { name } => (name, self.resolve_name(callee, scope, name)),
            NodeKind::MemberAccess { name } => (name, self.resolve_member(callee, scope, name)),
            _ => {
                let callee_type = self.type_of(callee, scope);
                return callee_type
                    .as_procedural()
                    .map_or(Type::Unknown, |procedural| procedural.return_type.clone());
            }
        };

        let Some(&first) = candidates.first() else {
            self.record_occurrence(callee, name, None);
            self.annotations.set_type(callee, Type::Unknown);
            return Type::Unknown;
        };
        let session = self.session;
        let symbols = &session.symbols;
        let declaration = symbols.get(first);

        if declaration.is_type() || !declaration.is_routine() {
            // A typecast `T(x)` or a call through a procedural variable.
            let ty = declaration.ty.clone();
            self.record_occurrence(callee, name, Some(first));
            self.annotations.set_type(callee, ty.clone());
            if declaration.is_type() {
                return ty;
            }
            return ty
                .as_procedural()
                .map_or(Type::Unknown, |procedural| procedural.return_type.clone());
        }

        let routines: Vec<Invocable> = candidates
            .iter()
            .filter_map(|&id| Invocable::from_declaration(symbols.get(id)))
            .collect();
        let resolution = OverloadResolver::new(&session.types).resolve(routines, &arguments);
        match self.settle(node, name, resolution, &arguments) {
            Some(chosen) => {
                let declaration = chosen.declaration();
                self.record_occurrence(callee, name, declaration);
                if let Some(id) = declaration {
                    self.annotations.set_type(callee, symbols.get(id).ty.clone());
                }
                let return_type = chosen.return_type.clone();
                self.annotations.set_invocation(node, chosen);
                return_type
            }
            None => {
                self.record_occurrence(callee, name, None);
                self.annotations.set_type(callee, Type::Unknown);
                Type::Unknown
            }
        }
    }

    fn binary(&mut self, node: NodeId, scope: ScopeId, operator: BinaryOperator) -> Type {
        let (Some(left), Some(right)) = (self.child(node, 0), self.child(node, 1)) else {
            return Type::Unknown;
        };
        let left = self.type_of(left, scope);
        let right = self.type_of(right, scope);

        match operator {
            BinaryOperator::Is => return Type::BOOLEAN,
            BinaryOperator::As => {
                return match right {
                    Type::ClassReference(class) => *class,
                    other => other,
                };
            }
            _ => {}
        }

        self.operator(node, operator.into(), vec![left, right])
    }

    fn unary(&mut self, node: NodeId, scope: ScopeId, operator: UnaryOperator) -> Type {
        let Some(operand) = self.child(node, 0) else {
            return Type::Unknown;
        };
        let operand = self.type_of(operand, scope);
        self.operator(node, operator.into(), vec![operand])
    }

    fn operator(&mut self, node: NodeId, operator: Operator, operands: Vec<Type>) -> Type {
        if operands.iter().any(Type::is_unknown) {
            return Type::Unknown;
        }
        let session = self.session;
        let collector = session.collector();
        let resolution = OverloadResolver::new(&session.types).resolve_operator(
            &collector,
            operator,
            &operands,
        );
        let name = format!("operator {operator}");
        match self.settle(node, &name, resolution, &operands) {
            Some(chosen) => {
                let return_type = chosen.return_type.clone();
                self.annotations.set_invocation(node, chosen);
                return_type
            }
            None => Type::Unknown,
        }
    }

    fn dereference(&mut self, node: NodeId, scope: ScopeId) -> Type {
        let Some(pointer) = self.child(node, 0) else {
            return Type::Unknown;
        };
        let ty = self.type_of(pointer, scope);
        match ty.unaliased() {
            Type::Unknown => Type::Unknown,
            Type::Pointer(pointer) if !pointer.is_untyped() => pointer.dereferenced.clone(),
            _ => {
                self.issue(
                    node,
                    IssueKind::MalformedType {
                        message: format!("Cannot dereference a value of type {ty}"),
                    },
                );
                Type::Unknown
            }
        }
    }

    fn address_of(&mut self, node: NodeId, scope: ScopeId) -> Type {
        let Some(operand) = self.child(node, 0) else {
            return Type::Unknown;
        };
        let ty = self.type_of(operand, scope);
        let names_routine = self
            .annotations
            .occurrence(operand)
            .and_then(|occurrence| occurrence.declaration)
            .is_some_and(|id| self.session.symbols.get(id).is_routine());

        if ty.is_unknown() || names_routine {
            ty
        } else {
            Type::pointer_to(ty, false)
        }
    }

    fn expression(&mut self, node: NodeId, scope: ScopeId) -> ControlFlow<ScopeId, ScopeId> {
        self.type_of(node, scope);
        ControlFlow::Break(scope)
    }

    fn descend(&mut self, tree: &SyntaxTree, node: NodeId, scope: ScopeId) {
        for &child in tree.children(node) {
            walk(tree, child, self, scope);
        }
    }
}

impl SyntaxVisitor<ScopeId> for Resolver<'_> {
    fn visit_unit(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        let file = self.annotations.scope(node).unwrap_or(scope);
        self.descend(tree, node, file);
        ControlFlow::Break(scope)
    }

    fn visit_type_declaration(
        &mut self,
        _tree: &SyntaxTree,
        _node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        ControlFlow::Break(scope)
    }

    fn visit_routine(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        if let Some(body) = self.annotations.scope(node) {
            self.descend(tree, node, body);
        }
        ControlFlow::Break(scope)
    }

    fn visit_name_reference(
        &mut self,
        _tree: &SyntaxTree,
        node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        self.expression(node, scope)
    }

    fn visit_invocation(
        &mut self,
        _tree: &SyntaxTree,
        node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        self.expression(node, scope)
    }

    fn visit_binary_expression(
        &mut self,
        _tree: &SyntaxTree,
        node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        self.expression(node, scope)
    }

    fn visit_unary_expression(
        &mut self,
        _tree: &SyntaxTree,
        node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        self.expression(node, scope)
    }

    fn visit_asm_block(
        &mut self,
        _tree: &SyntaxTree,
        _node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        ControlFlow::Break(scope)
    }

    fn visit_node(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        scope: ScopeId,
    ) -> ControlFlow<ScopeId, ScopeId> {
        if tree.kind(node).is_expression() {
            return self.expression(node, scope);
        }
        match self.annotations.scope(node) {
            // Struct bodies carry their own scope.
            Some(inner) => {
                self.descend(tree, node, inner);
                ControlFlow::Break(scope)
            }
            None => ControlFlow::Continue(scope),
        }
    }
}

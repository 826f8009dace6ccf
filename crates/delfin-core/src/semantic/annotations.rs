//! Per-node side tables filled by the two analysis passes
//!
//! Indexed by [`NodeId`], never stored inside the tree. The type cache is a
//! dense `index -> Option<Type>` vector; the sparser tables are maps.

use std::collections::HashMap;

use super::issue::SemanticIssue;
use crate::operator::Invocable;
use crate::symbol::{DeclId, NameOccurrence, ScopeId};
use crate::syntax::{NodeId, SyntaxTree};
use crate::types::Type;

#[derive(Debug, Default)]
pub struct Annotations {
    types: Vec<Option<Type>>,
    scopes: HashMap<NodeId, ScopeId>,
    declarations: HashMap<NodeId, DeclId>,
    occurrences: HashMap<NodeId, NameOccurrence>,
    invocations: HashMap<NodeId, Invocable>,
    issues: Vec<SemanticIssue>,
    /// Issues up to this index were recorded by the declaration pass.
    declaration_issues: usize,
}

impl Annotations {
    pub fn new(node_count: usize) -> Self {
        Self {
            types: vec![None; node_count],
            ..Self::default()
        }
    }

    /// Cached type of `node`, `None` until it has been computed.
    pub fn cached_type(&self, node: NodeId) -> Option<&Type> {
        self.types.get(node.index()).and_then(Option::as_ref)
    }

    pub fn set_type(&mut self, node: NodeId, ty: Type) {
        let index = node.index();
        if index >= self.types.len() {
            self.types.resize(index + 1, None);
        }
        self.types[index] = Some(ty);
    }

    pub fn clear_types(&mut self) {
        self.types.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn scope(&self, node: NodeId) -> Option<ScopeId> {
        self.scopes.get(&node).copied()
    }

    pub fn set_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.scopes.insert(node, scope);
    }

    pub fn unregister_scopes(&mut self) {
        self.scopes.clear();
    }

    /// Declaration introduced by `node`. Nodes declaring several names map to
    /// the first of them.
    pub fn declaration(&self, node: NodeId) -> Option<DeclId> {
        self.declarations.get(&node).copied()
    }

    pub fn set_declaration(&mut self, node: NodeId, declaration: DeclId) {
        self.declarations.entry(node).or_insert(declaration);
    }

    pub fn unregister_declarations(&mut self) {
        self.declarations.clear();
    }

    pub fn occurrence(&self, node: NodeId) -> Option<&NameOccurrence> {
        self.occurrences.get(&node)
    }

    pub fn set_occurrence(&mut self, occurrence: NameOccurrence) {
        self.occurrences.insert(occurrence.node, occurrence);
    }

    pub fn occurrences(&self) -> impl Iterator<Item = &NameOccurrence> {
        self.occurrences.values()
    }

    pub fn unregister_occurrences(&mut self) {
        self.occurrences.clear();
    }

    /// Routine or operator signature chosen for a call or operator node.
    pub fn invocation(&self, node: NodeId) -> Option<&Invocable> {
        self.invocations.get(&node)
    }

    pub fn set_invocation(&mut self, node: NodeId, invocable: Invocable) {
        self.invocations.insert(node, invocable);
    }

    pub fn issues(&self) -> &[SemanticIssue] {
        &self.issues
    }

    pub fn push_issue(&mut self, issue: SemanticIssue) {
        self.issues.push(issue);
    }

    pub fn retain_issues(&mut self, keep: impl FnMut(&SemanticIssue) -> bool) {
        self.issues.retain(keep);
        self.declaration_issues = self.declaration_issues.min(self.issues.len());
    }

    /// Marks the issues recorded so far as belonging to the declaration pass.
    pub fn seal_declarations(&mut self) {
        self.declaration_issues = self.issues.len();
    }

    /// Drops everything the resolution pass computed, keeping what the
    /// declaration pass recorded.
    pub fn reset_resolution(&mut self, tree: &SyntaxTree) {
        for node in tree.nodes().filter(|node| node.kind.is_expression()) {
            if let Some(slot) = self.types.get_mut(node.id.index()) {
                *slot = None;
            }
        }
        self.unregister_occurrences();
        self.invocations.clear();
        self.issues.truncate(self.declaration_issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::IssueKind;
    use crate::syntax::{NodeKind, Position, TreeBuilder};

    #[test]
    fn type_cache_is_index_addressed() {
        let mut b = TreeBuilder::new();
        let one = b.integer(1);
        let two = b.integer(2);
        let tree = b.finish(two);
        let mut annotations = Annotations::new(tree.len());

        annotations.set_type(one, Type::BYTE);

        assert_eq!(annotations.cached_type(one), Some(&Type::BYTE));
        assert_eq!(annotations.cached_type(two), None);

        annotations.clear_types();
        assert_eq!(annotations.cached_type(one), None);
    }

    #[test]
    fn reset_keeps_declaration_tables() {
        let mut b = TreeBuilder::new();
        let x = b.name("x");
        let integer = b.type_ref("Integer");
        let root = b.node(NodeKind::VarDeclaration { names: vec!["y".into()] }, [integer]);
        let statement = b.node(NodeKind::ExpressionStatement, [x]);
        let unit = b.node(NodeKind::Unit { name: "U".into() }, [root, statement]);
        let tree = b.finish(unit);
        let mut annotations = Annotations::new(tree.len());
        annotations.set_type(integer, Type::INTEGER);
        annotations.push_issue(SemanticIssue::new(
            integer,
            Position::default(),
            IssueKind::UnresolvedReference { name: "Integer".into() },
        ));
        annotations.seal_declarations();
        annotations.set_type(x, Type::INTEGER);
        annotations.set_occurrence(NameOccurrence {
            node: x,
            name: "x".to_string(),
            declaration: None,
        });
        annotations.push_issue(SemanticIssue::new(
            x,
            Position::default(),
            IssueKind::UnresolvedReference { name: "x".into() },
        ));

        annotations.reset_resolution(&tree);

        assert_eq!(annotations.cached_type(x), None);
        assert_eq!(annotations.cached_type(integer), Some(&Type::INTEGER));
        assert!(annotations.occurrence(x).is_none());
        assert_eq!(annotations.issues().len(), 1);
        assert_eq!(annotations.issues()[0].node, integer);
    }
}

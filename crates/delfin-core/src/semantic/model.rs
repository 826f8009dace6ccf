//! An analyzed unit: its tree together with the computed annotations

use super::annotations::Annotations;
use super::issue::SemanticIssue;
use crate::operator::Invocable;
use crate::symbol::{DeclId, NameOccurrence, ScopeId};
use crate::syntax::{NodeId, SyntaxTree};
use crate::types::Type;

#[derive(Debug)]
pub struct SemanticModel {
    pub(crate) name: String,
    pub(crate) scope: ScopeId,
    pub(crate) tree: SyntaxTree,
    pub(crate) annotations: Annotations,
}

impl SemanticModel {
    pub(crate) fn new(name: &str, scope: ScopeId, tree: SyntaxTree) -> Self {
        let annotations = Annotations::new(tree.len());
        Self {
            name: name.to_string(),
            scope,
            tree,
            annotations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_scope(&self) -> ScopeId {
        self.scope
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn issues(&self) -> &[SemanticIssue] {
        self.annotations.issues()
    }

    /// Type computed for `node`, Unknown when nothing was recorded. Use
    /// [`Session::type_of`](super::Session::type_of) to compute on demand.
    pub fn type_of(&self, node: NodeId) -> Type {
        self.annotations
            .cached_type(node)
            .cloned()
            .unwrap_or(Type::Unknown)
    }

    pub fn declaration_of(&self, node: NodeId) -> Option<DeclId> {
        self.annotations.declaration(node)
    }

    pub fn occurrence_of(&self, node: NodeId) -> Option<&NameOccurrence> {
        self.annotations.occurrence(node)
    }

    pub fn invocation_of(&self, node: NodeId) -> Option<&Invocable> {
        self.annotations.invocation(node)
    }

    /// Innermost scope enclosing `node`.
    pub fn scope_of(&self, node: NodeId) -> ScopeId {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find_map(|id| self.annotations.scope(id))
            .unwrap_or(self.scope)
    }
}

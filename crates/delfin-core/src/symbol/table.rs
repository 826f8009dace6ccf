//! Declaration registry keyed by scope and canonical name
//!
//! Names accumulate: registering a second declaration under the same name
//! in the same scope forms an overload set instead of replacing the first.

use std::collections::HashMap;

use id_arena::Arena;
use tracing::trace;

use super::declaration::{DeclId, DeclarationSpec, NameDeclaration};
use super::name::{CanonicalName, canonicalize};
use super::scope::{ScopeId, ScopeKind, ScopeTree};
use crate::error::AnalysisError;

#[derive(Debug, Default)]
struct ScopeSymbols {
    by_name: HashMap<CanonicalName, Vec<DeclId>>,
    ordered: Vec<DeclId>,
}

pub struct SymbolTable {
    arena: Arena<NameDeclaration>,
    by_scope: HashMap<ScopeId, ScopeSymbols>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_scope: HashMap::new(),
        }
    }

    pub fn declare(
        &mut self,
        scopes: &ScopeTree,
        scope: ScopeId,
        spec: DeclarationSpec,
    ) -> Result<DeclId, AnalysisError> {
        if scopes.get(scope).frozen {
            return Err(AnalysisError::FrozenScope {
                scope: scopes.get(scope).name.clone(),
            });
        }

        let qualified_name = qualify(scopes, scope, &spec.name);
        let key = canonicalize(&spec.name);
        let id = self.arena.alloc_with_id(|id| NameDeclaration {
            id,
            name: spec.name,
            kind: spec.kind,
            ty: spec.ty,
            scope,
            qualified_name,
            section: spec.section,
            node: spec.node,
            routine: spec.routine,
            unit_scope: spec.unit_scope,
        });

        let symbols = self.by_scope.entry(scope).or_default();
        symbols.by_name.entry(key).or_default().push(id);
        symbols.ordered.push(id);

        trace!(
            name = %self.arena[id].qualified_name,
            kind = ?self.arena[id].kind,
            "Registered declaration"
        );

        Ok(id)
    }

    /// Declarations registered directly in `scope`, in registration order.
    pub fn shallow_find(&self, scope: ScopeId, name: &str) -> &[DeclId] {
        self.by_scope
            .get(&scope)
            .and_then(|symbols| symbols.by_name.get(&canonicalize(name)))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get(&self, id: DeclId) -> &NameDeclaration {
        &self.arena[id]
    }

    pub fn declarations_in(&self, scope: ScopeId) -> impl Iterator<Item = &NameDeclaration> {
        self.by_scope
            .get(&scope)
            .into_iter()
            .flat_map(|symbols| symbols.ordered.iter().map(|&id| &self.arena[id]))
    }

    pub fn all_declarations(&self) -> impl Iterator<Item = &NameDeclaration> {
        self.arena.iter().map(|(_, declaration)| declaration)
    }

    /// Forgets every declaration registered in `scope`. The entries stay
    /// allocated but no lookup reaches them anymore.
    pub fn unregister_scope(&mut self, scope: ScopeId) {
        self.by_scope.remove(&scope);
    }
}

fn qualify(scopes: &ScopeTree, scope: ScopeId, name: &str) -> String {
    let mut parts: Vec<&str> = scopes
        .ancestors(scope)
        .filter(|s| s.kind != ScopeKind::System)
        .map(|s| s.name.as_str())
        .collect();
    parts.reverse();
    parts.push(name);
    parts.join(".")
}

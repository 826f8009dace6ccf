//! Scope tree mirroring the lexical nesting of the analyzed units
//!
//! System scope at the root, one File scope per unit below it, then type,
//! enum and routine scopes.

use std::collections::HashMap;

use id_arena::{Arena, Id};

use crate::types::{StructType, Type};

pub type ScopeId = Id<Scope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    System,
    File,
    Type,
    Enum,
    Routine,
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// File scopes of the used units, in uses-clause order.
    pub imports: Vec<ScopeId>,
    /// The struct owning a Type scope, or the class of a method body.
    pub declaring_type: Option<StructType>,
    pub frozen: bool,
    helpers: HashMap<Type, StructType>,
}

#[derive(Default)]
pub struct ScopeTree {
    arena: Arena<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a scope below `parent`. Scopes nested in a frozen unit start
    /// frozen themselves; units below the System scope never inherit its
    /// state.
    pub fn create_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, name: &str) -> ScopeId {
        let frozen = parent
            .map(|parent| &self.arena[parent])
            .is_some_and(|parent| parent.frozen && parent.kind != ScopeKind::System);

        let id = self.arena.alloc_with_id(|id| Scope {
            id,
            kind,
            name: name.to_string(),
            parent,
            children: Vec::new(),
            imports: Vec::new(),
            declaring_type: None,
            frozen,
            helpers: HashMap::new(),
        });
        if let Some(parent) = parent {
            self.arena[parent].children.push(id);
        }
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.arena[id]
    }

    /// The scope itself, then every enclosing scope up to the System scope.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(Some(&self.arena[id]), |scope| {
            scope.parent.map(|parent| &self.arena[parent])
        })
    }

    /// Nearest enclosing File scope, the scope itself included.
    pub fn file_scope_of(&self, id: ScopeId) -> Option<ScopeId> {
        self.ancestors(id)
            .find(|scope| scope.kind == ScopeKind::File)
            .map(|scope| scope.id)
    }

    /// The scope and every scope nested in it, parents before children.
    pub fn subtree(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut result = vec![id];
        let mut index = 0;
        while index < result.len() {
            result.extend(self.arena[result[index]].children.iter().copied());
            index += 1;
        }
        result
    }

    pub fn add_import(&mut self, scope: ScopeId, import: ScopeId) {
        self.arena[scope].imports.push(import);
    }

    /// Makes `helper` the active helper for `target` in `scope`, replacing
    /// any helper registered for it before.
    pub fn register_helper(&mut self, scope: ScopeId, target: Type, helper: StructType) {
        self.arena[scope].helpers.insert(target, helper);
    }

    pub fn shallow_helper_for(&self, scope: ScopeId, target: &Type) -> Option<&StructType> {
        self.arena[scope].helpers.get(target)
    }

    pub fn freeze(&mut self, scope: ScopeId) {
        for id in self.subtree(scope) {
            self.arena[id].frozen = true;
        }
    }

    /// Unhooks a scope from its parent so no lookup can reach it anymore.
    pub fn detach(&mut self, scope: ScopeId) {
        if let Some(parent) = self.arena[scope].parent {
            self.arena[parent].children.retain(|&child| child != scope);
        }
        for other in self.arena.iter_mut().map(|(_, s)| s) {
            other.imports.retain(|&import| import != scope);
        }
    }
}

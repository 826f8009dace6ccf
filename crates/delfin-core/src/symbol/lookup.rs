//! Name resolution across lexical scopes, inheritance, imports and helpers

use tracing::trace;

use super::declaration::{DeclId, Section};
use super::scope::{ScopeId, ScopeKind, ScopeTree};
use super::table::SymbolTable;
use crate::types::{StructType, Type, TypeFactory};

/// Read-only view answering `find` queries over collected scopes.
#[derive(Clone, Copy)]
pub struct Lookup<'a> {
    pub scopes: &'a ScopeTree,
    pub symbols: &'a SymbolTable,
    pub types: &'a TypeFactory,
}

impl<'a> Lookup<'a> {
    pub fn new(scopes: &'a ScopeTree, symbols: &'a SymbolTable, types: &'a TypeFactory) -> Self {
        Self {
            scopes,
            symbols,
            types,
        }
    }

    /// Declarations registered directly in `scope`, nothing inherited or
    /// imported.
    pub fn shallow_find(&self, scope: ScopeId, name: &str) -> Vec<DeclId> {
        self.symbols.shallow_find(scope, name).to_vec()
    }

    /// Walks outwards from `scope` and returns every match of the first
    /// level that has any. At each level the scope itself comes first, then
    /// the members of its declaring type and that type's ancestors, then (for
    /// a unit) the interface of each imported unit in uses order. The System
    /// scope is the last level.
    pub fn find(&self, scope: ScopeId, name: &str) -> Vec<DeclId> {
        for level in self.scopes.ancestors(scope) {
            let own = self.symbols.shallow_find(level.id, name);
            if !own.is_empty() {
                return own.to_vec();
            }

            if let Some(declaring_type) = &level.declaring_type {
                let members = self.find_in_struct(declaring_type, name);
                if !members.is_empty() {
                    return members;
                }
            }

            if level.kind == ScopeKind::File {
                let imported = self.find_imported(level.id, name);
                if !imported.is_empty() {
                    return imported;
                }
            }
        }

        trace!(name, "Name not found in any visible scope");
        Vec::new()
    }

    fn find_imported(&self, file: ScopeId, name: &str) -> Vec<DeclId> {
        for &import in &self.scopes.get(file).imports {
            let exported = self.exported(import, name);
            if !exported.is_empty() {
                return exported;
            }
        }
        Vec::new()
    }

    fn exported(&self, unit_scope: ScopeId, name: &str) -> Vec<DeclId> {
        self.symbols
            .shallow_find(unit_scope, name)
            .iter()
            .copied()
            .filter(|&id| self.symbols.get(id).section == Section::Interface)
            .collect()
    }

    /// Members reachable through a unit-qualified reference. A unit sees its
    /// own implementation section, everyone else only the interface.
    pub fn find_in_unit(&self, context: ScopeId, unit_scope: ScopeId, name: &str) -> Vec<DeclId> {
        if self.scopes.file_scope_of(context) == Some(unit_scope) {
            self.shallow_find(unit_scope, name)
        } else {
            self.exported(unit_scope, name)
        }
    }

    /// Own members first, then the nearest inheritance level with a match.
    pub fn find_in_struct(&self, struct_type: &StructType, name: &str) -> Vec<DeclId> {
        let own = self
            .symbols
            .shallow_find(self.types.struct_scope(struct_type), name);
        if !own.is_empty() {
            return own.to_vec();
        }

        let ancestors = self.types.ancestors(struct_type);
        let mut matches = Vec::new();
        let mut matched_depth = None;
        for (ancestor, depth) in ancestors {
            if matched_depth.is_some_and(|matched| depth > matched) {
                break;
            }
            let found = self
                .symbols
                .shallow_find(self.types.struct_scope(&ancestor), name);
            if !found.is_empty() {
                matches.extend_from_slice(found);
                matched_depth = Some(depth);
            }
        }
        matches
    }

    /// Member lookup on a receiver type, falling back to the helper active
    /// for that type in `context`.
    pub fn find_member(&self, context: ScopeId, receiver: &Type, name: &str) -> Vec<DeclId> {
        let direct = match receiver.unaliased() {
            Type::Struct(struct_type) => self.find_in_struct(struct_type, name),
            Type::ClassReference(class) => match class.as_struct() {
                Some(struct_type) => self.find_in_struct(struct_type, name),
                None => Vec::new(),
            },
            Type::Pointer(pointer) => match pointer.dereferenced.as_struct() {
                Some(struct_type) => self.find_in_struct(struct_type, name),
                None => Vec::new(),
            },
            Type::Enum(enum_type) => {
                self.shallow_find(self.types.enum_data(enum_type).scope, name)
            }
            _ => Vec::new(),
        };
        if !direct.is_empty() {
            return direct;
        }

        match self.helper_for(context, receiver) {
            Some(helper) => self.find_in_struct(&helper, name),
            None => Vec::new(),
        }
    }

    /// Helper active for `ty` as seen from `context`. Helpers of a class's
    /// ancestors apply to the class too; among imported units the one used
    /// last wins.
    pub fn helper_for(&self, context: ScopeId, ty: &Type) -> Option<StructType> {
        let mut targets = vec![ty.clone()];
        if let Type::ClassReference(class) = ty.unaliased() {
            targets[0] = (**class).clone();
        }
        if let Some(struct_type) = targets[0].as_struct() {
            let ancestors = self.types.ancestors(struct_type);
            targets.extend(ancestors.into_iter().map(|(ancestor, _)| Type::Struct(ancestor)));
        }

        targets
            .iter()
            .find_map(|target| self.active_helper(context, target))
    }

    fn active_helper(&self, context: ScopeId, target: &Type) -> Option<StructType> {
        for level in self.scopes.ancestors(context) {
            if let Some(helper) = self.scopes.shallow_helper_for(level.id, target) {
                return Some(helper.clone());
            }
            if level.kind == ScopeKind::File {
                let imported = level
                    .imports
                    .iter()
                    .rev()
                    .find_map(|&import| self.scopes.shallow_helper_for(import, target));
                if let Some(helper) = imported {
                    return Some(helper.clone());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{DeclarationKind, DeclarationSpec};
    use crate::types::StructKind;

    struct Fixture {
        scopes: ScopeTree,
        symbols: SymbolTable,
        types: TypeFactory,
        system: ScopeId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scopes = ScopeTree::new();
            let system = scopes.create_scope(ScopeKind::System, None, "System");
            Self {
                scopes,
                symbols: SymbolTable::new(),
                types: TypeFactory::default(),
                system,
            }
        }

        fn declare(&mut self, scope: ScopeId, name: &str, section: Section) -> DeclId {
            let spec = DeclarationSpec::new(name, DeclarationKind::Variable, Type::INTEGER)
                .section(section);
            self.symbols.declare(&self.scopes, scope, spec).unwrap()
        }

        fn class(&mut self, parent: ScopeId, name: &str, ancestor: Option<&StructType>) -> StructType {
            let scope = self.scopes.create_scope(ScopeKind::Type, Some(parent), name);
            let class = self.types.declare_struct(name, StructKind::Class, scope);
            let parents = ancestor.map(|a| vec![Type::Struct(a.clone())]).unwrap_or_default();
            self.types.complete_struct(&class, parents, None);
            self.scopes.get_mut(scope).declaring_type = Some(class.clone());
            class
        }

        fn lookup(&self) -> Lookup<'_> {
            Lookup::new(&self.scopes, &self.symbols, &self.types)
        }
    }

    #[test]
    fn inner_declaration_shadows_outer() {
        let mut f = Fixture::new();
        let file = f.scopes.create_scope(ScopeKind::File, Some(f.system), "Unit1");
        let routine = f.scopes.create_scope(ScopeKind::Routine, Some(file), "Run");
        f.declare(f.system, "X", Section::Interface);
        let local = f.declare(routine, "X", Section::Implementation);

        assert_eq!(f.lookup().find(routine, "x"), vec![local]);
    }

    #[test]
    fn imports_are_searched_in_uses_order_before_system() {
        let mut f = Fixture::new();
        let first = f.scopes.create_scope(ScopeKind::File, Some(f.system), "First");
        let second = f.scopes.create_scope(ScopeKind::File, Some(f.system), "Second");
        let user = f.scopes.create_scope(ScopeKind::File, Some(f.system), "User");
        f.scopes.add_import(user, first);
        f.scopes.add_import(user, second);
        f.declare(f.system, "Shared", Section::Interface);
        let from_first = f.declare(first, "Shared", Section::Interface);
        f.declare(second, "Shared", Section::Interface);

        assert_eq!(f.lookup().find(user, "Shared"), vec![from_first]);
        assert!(f.lookup().shallow_find(user, "Shared").is_empty());
    }

    #[test]
    fn implementation_declarations_are_not_exported() {
        let mut f = Fixture::new();
        let used = f.scopes.create_scope(ScopeKind::File, Some(f.system), "Used");
        let user = f.scopes.create_scope(ScopeKind::File, Some(f.system), "User");
        f.scopes.add_import(user, used);
        let private = f.declare(used, "Hidden", Section::Implementation);

        assert!(f.lookup().find(user, "Hidden").is_empty());
        assert!(f.lookup().find_in_unit(user, used, "Hidden").is_empty());
        assert_eq!(f.lookup().find_in_unit(used, used, "Hidden"), vec![private]);
    }

    #[test]
    fn method_scope_sees_inherited_members() {
        let mut f = Fixture::new();
        let file = f.scopes.create_scope(ScopeKind::File, Some(f.system), "Unit1");
        let base = f.class(file, "TBase", None);
        let derived = f.class(file, "TDerived", Some(&base));
        let field = f.declare(f.types.struct_scope(&base), "FCount", Section::Interface);
        let method = f.scopes.create_scope(ScopeKind::Routine, Some(file), "Run");
        f.scopes.get_mut(method).declaring_type = Some(derived);

        assert_eq!(f.lookup().find(method, "FCount"), vec![field]);
    }

    #[test]
    fn member_lookup_falls_back_to_active_helper() {
        let mut f = Fixture::new();
        let file = f.scopes.create_scope(ScopeKind::File, Some(f.system), "Unit1");
        let helper = f.class(file, "TIntHelper", None);
        let to_string = f.declare(f.types.struct_scope(&helper), "ToString", Section::Interface);
        f.scopes.register_helper(file, Type::INTEGER, helper.clone());

        let lookup = f.lookup();
        assert_eq!(lookup.find_member(file, &Type::INTEGER, "ToString"), vec![to_string]);
        assert!(lookup.find_member(f.system, &Type::INTEGER, "ToString").is_empty());
        assert_eq!(lookup.helper_for(file, &Type::INTEGER), Some(helper));
    }

    #[test]
    fn helper_of_last_used_unit_wins() {
        let mut f = Fixture::new();
        let first = f.scopes.create_scope(ScopeKind::File, Some(f.system), "First");
        let second = f.scopes.create_scope(ScopeKind::File, Some(f.system), "Second");
        let user = f.scopes.create_scope(ScopeKind::File, Some(f.system), "User");
        let a = f.class(first, "TA", None);
        let b = f.class(second, "TB", None);
        f.scopes.register_helper(first, Type::STRING, a);
        f.scopes.register_helper(second, Type::STRING, b.clone());
        f.scopes.add_import(user, first);
        f.scopes.add_import(user, second);

        assert_eq!(f.lookup().helper_for(user, &Type::STRING), Some(b));
    }

    #[test]
    fn helper_for_ancestor_applies_to_descendant() {
        let mut f = Fixture::new();
        let file = f.scopes.create_scope(ScopeKind::File, Some(f.system), "Unit1");
        let base = f.class(file, "TBase", None);
        let derived = f.class(file, "TDerived", Some(&base));
        let helper = f.class(file, "TBaseHelper", None);
        f.scopes.register_helper(file, Type::Struct(base), helper.clone());

        assert_eq!(f.lookup().helper_for(file, &Type::Struct(derived)), Some(helper));
    }
}

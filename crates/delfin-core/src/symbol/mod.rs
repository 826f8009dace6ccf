//! Scope tree, declaration registry and name lookup

mod declaration;
mod lookup;
mod name;
mod scope;
mod table;

pub use declaration::{
    DeclId, DeclarationKind, DeclarationSpec, NameDeclaration, NameOccurrence, RoutineKind,
    RoutineSignature, Section,
};
pub use lookup::Lookup;
pub use name::{CanonicalName, canonicalize};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use table::SymbolTable;

//! Named entities and the sites referring to them

use id_arena::Id;
use serde::{Deserialize, Serialize};

use super::scope::ScopeId;
use crate::syntax::NodeId;
use crate::types::{StructType, Type};

pub type DeclId = Id<NameDeclaration>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Unit,
    UnitImport,
    Type,
    Variable,
    Constant,
    Field,
    Property,
    Parameter,
    Routine,
    EnumElement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Constructor,
    Destructor,
    Function,
    Procedure,
    Operator,
}

/// Which part of a unit a declaration sits in. Only interface declarations
/// are visible to units importing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Interface,
    Implementation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineSignature {
    pub kind: RoutineKind,
    pub parameters: Vec<Type>,
    /// Parameters without a default value.
    pub required: usize,
    pub return_type: Type,
    pub declaring_type: Option<StructType>,
}

#[derive(Debug)]
pub struct NameDeclaration {
    pub id: DeclId,
    pub name: String,
    pub kind: DeclarationKind,
    pub ty: Type,
    pub scope: ScopeId,
    pub qualified_name: String,
    pub section: Section,
    pub node: Option<NodeId>,
    pub routine: Option<RoutineSignature>,
    /// File scope a unit name stands for.
    pub unit_scope: Option<ScopeId>,
}

impl NameDeclaration {
    pub fn is_routine(&self) -> bool {
        self.kind == DeclarationKind::Routine
    }

    pub fn is_operator(&self) -> bool {
        self.routine
            .as_ref()
            .is_some_and(|routine| routine.kind == RoutineKind::Operator)
    }

    pub fn is_type(&self) -> bool {
        self.kind == DeclarationKind::Type
    }
}

/// Everything about a declaration except where it is stored. Handed to
/// [`SymbolTable::declare`](super::SymbolTable::declare).
#[derive(Debug, Clone)]
pub struct DeclarationSpec {
    pub name: String,
    pub kind: DeclarationKind,
    pub ty: Type,
    pub section: Section,
    pub node: Option<NodeId>,
    pub routine: Option<RoutineSignature>,
    pub unit_scope: Option<ScopeId>,
}

impl DeclarationSpec {
    pub fn new(name: &str, kind: DeclarationKind, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ty,
            section: Section::Interface,
            node: None,
            routine: None,
            unit_scope: None,
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    pub fn node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn routine(mut self, routine: RoutineSignature) -> Self {
        self.routine = Some(routine);
        self
    }

    pub fn unit_scope(mut self, scope: ScopeId) -> Self {
        self.unit_scope = Some(scope);
        self
    }
}

/// A reference site and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameOccurrence {
    pub node: NodeId,
    pub name: String,
    pub declaration: Option<DeclId>,
}

//! Callable signatures shared by intrinsics and declared routines

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::symbol::{DeclId, NameDeclaration};
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocableOrigin {
    /// Synthesized by the operator collector.
    Intrinsic,
    Declared(DeclId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Invocable {
    pub name: String,
    pub parameters: Vec<Type>,
    pub required_parameters: usize,
    pub return_type: Type,
    pub origin: InvocableOrigin,
}

impl Invocable {
    pub fn intrinsic(name: &str, parameters: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.to_string(),
            required_parameters: parameters.len(),
            parameters,
            return_type,
            origin: InvocableOrigin::Intrinsic,
        }
    }

    /// Signature of a declared routine; `None` for anything else.
    pub fn from_declaration(declaration: &NameDeclaration) -> Option<Self> {
        let routine = declaration.routine.as_ref()?;
        Some(Self {
            name: declaration.name.clone(),
            parameters: routine.parameters.clone(),
            required_parameters: routine.required,
            return_type: routine.return_type.clone(),
            origin: InvocableOrigin::Declared(declaration.id),
        })
    }

    pub fn accepts_arity(&self, count: usize) -> bool {
        (self.required_parameters..=self.parameters.len()).contains(&count)
    }

    pub fn declaration(&self) -> Option<DeclId> {
        match self.origin {
            InvocableOrigin::Declared(id) => Some(id),
            InvocableOrigin::Intrinsic => None,
        }
    }

    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Invocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")?;
        if !self.return_type.is_void() {
            write!(f, ": {}", self.return_type)?;
        }
        Ok(())
    }
}

impl Serialize for Invocable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Invocable", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("signature", &self.signature())?;
        state.serialize_field(
            "intrinsic",
            &matches!(self.origin, InvocableOrigin::Intrinsic),
        )?;
        state.end()
    }
}

//! Degradations recorded while analyzing a unit
//!
//! None of these stop the analysis. The affected node falls back to the
//! Unknown type or an absent declaration and resolution carries on.

use serde::Serialize;

use crate::syntax::{NodeId, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    UnresolvedReference {
        name: String,
    },
    AmbiguousOverload {
        name: String,
        chosen: String,
        candidates: Vec<String>,
    },
    NoApplicableOverload {
        name: String,
        arguments: Vec<String>,
    },
    MalformedType {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticIssue {
    #[serde(skip)]
    pub node: NodeId,
    pub line: u32,
    pub column: u32,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl SemanticIssue {
    pub fn new(node: NodeId, position: Position, kind: IssueKind) -> Self {
        Self {
            node,
            line: position.line,
            column: position.column,
            kind,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.kind, IssueKind::UnresolvedReference { .. })
    }

    pub fn message(&self) -> String {
        match &self.kind {
            IssueKind::UnresolvedReference { name } => format!("Unresolved reference '{name}'"),
            IssueKind::AmbiguousOverload {
                name,
                chosen,
                candidates,
            } => format!(
                "Ambiguous call to '{name}', {} candidates tie; using {chosen}",
                candidates.len()
            ),
            IssueKind::NoApplicableOverload { name, arguments } => format!(
                "No overload of '{name}' accepts ({})",
                arguments.join(", ")
            ),
            IssueKind::MalformedType { message } => message.clone(),
        }
    }
}

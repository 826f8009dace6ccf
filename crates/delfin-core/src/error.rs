//! Hard failures of the analysis pipeline
//!
//! Problems in the analyzed source never show up here; they degrade to
//! [`SemanticIssue`](crate::semantic::SemanticIssue)s. These errors signal a
//! broken contract between the parser and the core, or misuse of a session.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Syntax tree has no root node")]
    EmptyTree,
    #[error("Node '{kind}' at {line}:{column} is missing required child #{index}")]
    MissingChild {
        kind: &'static str,
        index: usize,
        line: u32,
        column: u32,
    },
    #[error("Expected {expected} at {line}:{column}, found '{found}'")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
        line: u32,
        column: u32,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("Unit '{name}' is already part of this session")]
    DuplicateUnit { name: String },
    #[error("Scope '{scope}' is frozen and cannot accept new declarations")]
    FrozenScope { scope: String },
}

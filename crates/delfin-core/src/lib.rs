//! Semantic core of the Delfin Object Pascal analyzer
//!
//! Takes the syntax tree produced by the parser and answers the questions
//! rules ask about it: what type an expression has, which declaration a name
//! refers to, and which routine or operator overload a call selects.

pub mod config;
pub mod error;
pub mod operator;
pub mod semantic;
pub mod symbol;
pub mod syntax;
pub mod types;

pub use config::{Config, ConfigError};
pub use error::{AnalysisError, SyntaxError};
pub use semantic::{SemanticIssue, SemanticModel, Session};
pub use syntax::{NodeId, NodeKind, SyntaxTree, TreeBuilder};
pub use types::Type;

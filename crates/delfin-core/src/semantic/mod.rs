//! Semantic analysis of whole units
//!
//! [`Session`] owns the System scope and every analyzed unit. Analyzing a
//! unit yields a [`SemanticModel`] whose [`Annotations`] map nodes to types,
//! scopes, declarations, name occurrences and chosen overloads.

mod annotations;
mod collect;
mod issue;
mod model;
mod resolve;
mod session;
mod system;

pub use annotations::Annotations;
pub use issue::{IssueKind, SemanticIssue};
pub use model::SemanticModel;
pub use session::Session;
pub use system::SYSTEM_UNIT;

//! Syntax tree model consumed from the parser.
//!
//! Provides the arena-indexed tree, its JSON interchange form, and visitor
//! dispatch.

mod node;
mod raw;
mod visit;

pub use node::{Node, NodeId, NodeKind, Position, SyntaxTree, TreeBuilder};
pub use raw::RawNode;
pub use visit::{SyntaxVisitor, walk};

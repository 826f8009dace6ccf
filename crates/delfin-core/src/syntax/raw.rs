//! Nested interchange form of the syntax tree
//!
//! Parsers that live outside the process hand the tree over as a JSON
//! document of [`RawNode`]s, which is flattened into a [`SyntaxTree`].

use serde::{Deserialize, Serialize};

use super::node::{NodeId, NodeKind, Position, SyntaxTree, TreeBuilder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub node: NodeKind,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

impl SyntaxTree {
    pub fn from_raw(raw: &RawNode) -> SyntaxTree {
        let mut builder = TreeBuilder::new();
        let root = lower(&mut builder, raw);
        builder.finish(root)
    }

    pub fn from_json(json: &str) -> Result<SyntaxTree, serde_json::Error> {
        let raw: RawNode = serde_json::from_str(json)?;
        Ok(SyntaxTree::from_raw(&raw))
    }
}

fn lower(builder: &mut TreeBuilder, raw: &RawNode) -> NodeId {
    let children: Vec<NodeId> = raw
        .children
        .iter()
        .map(|child| lower(builder, child))
        .collect();
    builder.node_at(
        raw.node.clone(),
        Position::new(raw.line, raw.column),
        children,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::BinaryOperator;

    #[test]
    fn json_document_becomes_tree() {
        let json = r#"{
            "node": { "kind": "binary_expression", "operator": "add" },
            "line": 3,
            "column": 5,
            "children": [
                { "node": { "kind": "integer_literal", "value": 1 } },
                { "node": { "kind": "name_reference", "name": "x" } }
            ]
        }"#;

        let tree = SyntaxTree::from_json(json).unwrap();
        let root = tree.root().unwrap();

        assert_eq!(
            tree.kind(root),
            &NodeKind::BinaryExpression {
                operator: BinaryOperator::Add
            }
        );
        assert_eq!(tree.position(root), Position::new(3, 5));
        assert_eq!(tree.children(root).len(), 2);
        let right = tree.children(root)[1];
        assert_eq!(
            tree.kind(right),
            &NodeKind::NameReference {
                name: "x".to_string()
            }
        );
        assert_eq!(tree.parent(right), Some(root));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{ "node": { "kind": "goto_statement" } }"#;

        assert!(SyntaxTree::from_json(json).is_err());
    }
}

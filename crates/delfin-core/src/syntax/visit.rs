//! Visitor dispatch over the closed node kinds.
//!
//! Each visit returns the context threaded onwards: `Continue(ctx)` descends
//! into the children with `ctx`, `Break(ctx)` skips the subtree. Whatever a
//! subtree finishes with is handed to the next sibling.

use std::ops::ControlFlow;

use super::node::{NodeId, NodeKind, SyntaxTree};

pub trait SyntaxVisitor<C> {
    fn visit_unit(&mut self, _tree: &SyntaxTree, _node: NodeId, ctx: C) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    fn visit_type_declaration(
        &mut self,
        _tree: &SyntaxTree,
        _node: NodeId,
        ctx: C,
    ) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    /// Routine declarations and implementations.
    fn visit_routine(&mut self, _tree: &SyntaxTree, _node: NodeId, ctx: C) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    /// Simple names and member accesses.
    fn visit_name_reference(
        &mut self,
        _tree: &SyntaxTree,
        _node: NodeId,
        ctx: C,
    ) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    fn visit_invocation(&mut self, _tree: &SyntaxTree, _node: NodeId, ctx: C) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    fn visit_binary_expression(
        &mut self,
        _tree: &SyntaxTree,
        _node: NodeId,
        ctx: C,
    ) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    fn visit_unary_expression(
        &mut self,
        _tree: &SyntaxTree,
        _node: NodeId,
        ctx: C,
    ) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    fn visit_asm_block(&mut self, _tree: &SyntaxTree, _node: NodeId, ctx: C) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }

    /// Every kind without a dedicated entry above.
    fn visit_node(&mut self, _tree: &SyntaxTree, _node: NodeId, ctx: C) -> ControlFlow<C, C> {
        ControlFlow::Continue(ctx)
    }
}

fn dispatch<C, V>(tree: &SyntaxTree, node: NodeId, visitor: &mut V, ctx: C) -> ControlFlow<C, C>
where
    V: SyntaxVisitor<C> + ?Sized,
{
    match tree.kind(node) {
        NodeKind::Unit { .. } => visitor.visit_unit(tree, node, ctx),
        NodeKind::TypeDeclaration { .. } => visitor.visit_type_declaration(tree, node, ctx),
        NodeKind::RoutineDeclaration { .. } | NodeKind::RoutineImplementation { .. } => {
            visitor.visit_routine(tree, node, ctx)
        }
        NodeKind::NameReference { .. } | NodeKind::MemberAccess { .. } => {
            visitor.visit_name_reference(tree, node, ctx)
        }
        NodeKind::Invocation => visitor.visit_invocation(tree, node, ctx),
        NodeKind::BinaryExpression { .. } => visitor.visit_binary_expression(tree, node, ctx),
        NodeKind::UnaryExpression { .. } => visitor.visit_unary_expression(tree, node, ctx),
        NodeKind::AsmBlock { .. } => visitor.visit_asm_block(tree, node, ctx),
        _ => visitor.visit_node(tree, node, ctx),
    }
}

/// Walks the subtree rooted at `node` depth-first, returning the context the
/// last visited node produced.
pub fn walk<C, V>(tree: &SyntaxTree, node: NodeId, visitor: &mut V, ctx: C) -> C
where
    V: SyntaxVisitor<C> + ?Sized,
{
    match dispatch(tree, node, visitor, ctx) {
        ControlFlow::Break(ctx) => ctx,
        ControlFlow::Continue(ctx) => tree
            .children(node)
            .iter()
            .fold(ctx, |ctx, &child| walk(tree, child, visitor, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::BinaryOperator;
    use crate::syntax::TreeBuilder;

    #[test]
    fn visitor_counts_name_references() {
        let mut b = TreeBuilder::new();
        let x = b.name("x");
        let y = b.name("y");
        let sum = b.binary(BinaryOperator::Add, x, y);
        let stmt = b.node(NodeKind::ExpressionStatement, [sum]);
        let tree = b.finish(stmt);

        struct NameCounter;

        impl SyntaxVisitor<usize> for NameCounter {
            fn visit_name_reference(
                &mut self,
                _tree: &SyntaxTree,
                _node: NodeId,
                count: usize,
            ) -> ControlFlow<usize, usize> {
                ControlFlow::Continue(count + 1)
            }
        }

        let count = walk(&tree, stmt, &mut NameCounter, 0);

        assert_eq!(count, 2);
    }

    #[test]
    fn break_skips_subtree_but_not_siblings() {
        let mut b = TreeBuilder::new();
        let hidden = b.name("hidden");
        let asm = b.node(
            NodeKind::AsmBlock {
                text: "mov eax, 1".to_string(),
            },
            [hidden],
        );
        let visible = b.name("visible");
        let stmt = b.node(NodeKind::ExpressionStatement, [visible]);
        let block = b.node(NodeKind::CompoundStatement, [asm, stmt]);
        let tree = b.finish(block);

        struct Collector {
            names: Vec<String>,
        }

        impl SyntaxVisitor<()> for Collector {
            fn visit_name_reference(
                &mut self,
                tree: &SyntaxTree,
                node: NodeId,
                ctx: (),
            ) -> ControlFlow<(), ()> {
                if let NodeKind::NameReference { name } = tree.kind(node) {
                    self.names.push(name.clone());
                }
                ControlFlow::Continue(ctx)
            }

            fn visit_asm_block(
                &mut self,
                _tree: &SyntaxTree,
                _node: NodeId,
                ctx: (),
            ) -> ControlFlow<(), ()> {
                ControlFlow::Break(ctx)
            }
        }

        let mut collector = Collector { names: Vec::new() };
        walk(&tree, block, &mut collector, ());

        assert_eq!(collector.names, vec!["visible"]);
    }

    #[test]
    fn context_threads_from_subtree_to_sibling() {
        let mut b = TreeBuilder::new();
        let a = b.integer(1);
        let inner = b.node(NodeKind::Parenthesized, [a]);
        let c = b.integer(2);
        let list = b.node(NodeKind::ArrayConstructor, [inner, c]);
        let tree = b.finish(list);

        struct Order {
            seen: Vec<(NodeId, usize)>,
        }

        impl SyntaxVisitor<usize> for Order {
            fn visit_node(
                &mut self,
                _tree: &SyntaxTree,
                node: NodeId,
                step: usize,
            ) -> ControlFlow<usize, usize> {
                self.seen.push((node, step));
                ControlFlow::Continue(step + 1)
            }
        }

        let mut order = Order { seen: Vec::new() };
        let last = walk(&tree, list, &mut order, 0);

        assert_eq!(order.seen, vec![(list, 0), (inner, 1), (a, 2), (c, 3)]);
        assert_eq!(last, 4);
    }
}

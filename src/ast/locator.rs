use crate::ast::visitor::{Visitor, walk_expr, walk_stmt};
use crate::ast::*;

/// Offset lookup over a parsed program.
///
/// Spans are inclusive at both ends, so an offset sitting right after a
/// node's last byte still selects it.
pub struct Locator<'ast> {
    offset: usize,
    path: Vec<AstNode<'ast>>,
}

impl<'ast> Locator<'ast> {
    /// Every node enclosing `offset`, outermost first. Empty when the offset
    /// falls between top-level statements.
    pub fn find(program: &'ast Program<'ast>, offset: usize) -> Vec<AstNode<'ast>> {
        let mut locator = Locator {
            offset,
            path: Vec::new(),
        };
        locator.visit_program(program);
        locator.path
    }

    /// The deepest node enclosing `offset`.
    pub fn innermost(program: &'ast Program<'ast>, offset: usize) -> Option<AstNode<'ast>> {
        Self::find(program, offset).pop()
    }

    fn enter(&mut self, node: AstNode<'ast>) -> bool {
        let hit = node.span().contains(self.offset);
        if hit {
            self.path.push(node);
        }
        hit
    }
}

impl<'ast> Visitor<'ast> for Locator<'ast> {
    fn visit_stmt(&mut self, stmt: StmtId<'ast>) {
        if self.enter(AstNode::Stmt(stmt)) {
            walk_stmt(self, stmt);
        }
    }

    fn visit_expr(&mut self, expr: ExprId<'ast>) {
        if self.enter(AstNode::Expr(expr)) {
            walk_expr(self, expr);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlatNode<'ast> {
    pub node: AstNode<'ast>,
    /// Index of the parent in the flattened list; `None` for top-level statements.
    pub parent: Option<usize>,
    pub depth: usize,
}

/// Pre-order listing of every node with parent links.
pub fn flatten<'ast>(program: &'ast Program<'ast>) -> Vec<FlatNode<'ast>> {
    let mut out = Vec::new();
    let mut stack: Vec<FlatNode<'ast>> = program
        .statements
        .iter()
        .rev()
        .map(|stmt| FlatNode {
            node: AstNode::Stmt(stmt),
            parent: None,
            depth: 0,
        })
        .collect();

    while let Some(entry) = stack.pop() {
        let index = out.len();
        out.push(entry);
        for child in entry.node.children().into_iter().rev() {
            stack.push(FlatNode {
                node: child,
                parent: Some(index),
                depth: entry.depth + 1,
            });
        }
    }
    out
}

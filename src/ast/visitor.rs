use super::{AstNode, ExprId, Program, StmtId};

/// Walks the tree. Override the node kinds you care about and call the
/// matching `walk_*` function to keep descending.
pub trait Visitor<'ast> {
    fn visit_program(&mut self, program: &'ast Program<'ast>) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: StmtId<'ast>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: ExprId<'ast>) {
        walk_expr(self, expr);
    }
}

pub fn walk_program<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, program: &'ast Program<'ast>) {
    for stmt in program.statements {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, stmt: StmtId<'ast>) {
    walk_children(visitor, stmt.children());
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, expr: ExprId<'ast>) {
    walk_children(visitor, expr.children());
}

fn walk_children<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, children: Vec<AstNode<'ast>>) {
    for child in children {
        match child {
            AstNode::Stmt(stmt) => visitor.visit_stmt(stmt),
            AstNode::Expr(expr) => visitor.visit_expr(expr),
        }
    }
}

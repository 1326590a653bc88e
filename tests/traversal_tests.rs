use bumpalo::Bump;
use php_front::ast::locator::{Locator, flatten};
use php_front::ast::visitor::{Visitor, walk_expr, walk_stmt};
use php_front::ast::{AstNode, Expr, ExprId, Stmt, StmtId};
use php_front::lexer::Lexer;
use php_front::parser::Parser;

#[test]
fn test_flatten_lists_nodes_in_pre_order() {
    let code = "<?php echo 1 + 2;";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();

    let nodes = flatten(&program);
    assert_eq!(nodes.len(), 4);
    assert!(matches!(nodes[0].node, AstNode::Stmt(Stmt::Echo { .. })));
    assert_eq!(nodes[0].parent, None);
    assert!(matches!(nodes[1].node, AstNode::Expr(Expr::Binary { .. })));
    assert_eq!(nodes[1].parent, Some(0));
    assert_eq!(
        nodes.iter().map(|n| n.depth).collect::<Vec<_>>(),
        vec![0, 1, 2, 2]
    );
    assert_eq!(nodes[2].parent, Some(1));
    assert_eq!(nodes[3].node.span().as_str(code), Some("2"));
}

#[test]
fn test_locator_finds_enclosing_chain() {
    let code = "<?php echo 1 + 2;";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();

    let path = Locator::find(&program, 15);
    assert_eq!(path.len(), 3);
    assert!(matches!(path[0], AstNode::Stmt(Stmt::Echo { .. })));
    assert!(matches!(path[1], AstNode::Expr(Expr::Binary { .. })));
    assert!(matches!(path[2], AstNode::Expr(Expr::Literal { value: "2", .. })));

    assert!(Locator::find(&program, 2).is_empty());
}

#[test]
fn test_innermost_node_at_offset() {
    let code = "<?php echo $total * 3;";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();

    let inside_variable = code.find("total").expect("present");
    let node = Locator::innermost(&program, inside_variable).expect("a node");
    assert_eq!(node.span().as_str(code), Some("$total"));

    let node = Locator::innermost(&program, code.find('*').expect("present")).expect("a node");
    assert!(matches!(node, AstNode::Expr(Expr::Binary { .. })));

    assert!(Locator::innermost(&program, 0).is_none());
}

#[test]
fn test_locator_descends_into_functions() {
    let code = "<?php function f($a) { return $a * 2; }";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();

    let offset = code.rfind("$a").expect("present");
    let path = Locator::find(&program, offset);
    let innermost = path.last().expect("non-empty path");
    assert!(matches!(innermost, AstNode::Expr(Expr::Variable { .. })));
    assert!(matches!(path[0], AstNode::Stmt(Stmt::Function { .. })));
}

#[derive(Default)]
struct VariableCollector {
    names: Vec<String>,
    statements: usize,
}

impl<'ast> Visitor<'ast> for VariableCollector {
    fn visit_stmt(&mut self, stmt: StmtId<'ast>) {
        self.statements += 1;
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: ExprId<'ast>) {
        if let Some(name) = expr.variable_name() {
            self.names.push(name.to_string());
        }
        walk_expr(self, expr);
    }
}

#[test]
fn test_visitor_walks_in_source_order() {
    let code = "<?php $a = $b + f($c); function g($d) { return $a; }";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();

    let mut collector = VariableCollector::default();
    collector.visit_program(&program);
    assert_eq!(collector.names, vec!["a", "b", "c", "d", "a"]);
    // assignment, function, body block, return
    assert_eq!(collector.statements, 4);
}

#[test]
fn test_children_of_class_members() {
    let code = "<?php class A { const X = 1; public $p = 2; function m($q = 3) {} }";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();

    let children = program.statements[0].children();
    let texts: Vec<&str> = children
        .iter()
        .filter_map(|child| child.span().as_str(code))
        .collect();
    assert_eq!(texts, vec!["1", "2", "$q", "3", "{}"]);
}

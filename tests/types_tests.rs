use bumpalo::Bump;
use php_front::ast::Stmt;
use php_front::ast::types::Type;
use php_front::lexer::Lexer;
use php_front::parser::Parser;

fn type_of(code: &str) -> Type {
    let source = format!("<?php {code};");
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(&source), &arena);
    let program = parser.parse_program();
    assert!(program.errors.is_empty(), "{:?}", program.errors);
    match program.statements[0] {
        Stmt::Expression { expr, .. } => expr.evaluates_to(),
        other => panic!("not an expression: {other:?}"),
    }
}

#[test]
fn test_type_lattice() {
    let union = Type::STRING | Type::INTEGER;
    assert!(union.contains(Type::STRING));
    assert!(!union.contains(Type::FLOAT));
    assert!(!union.is_singleton());
    assert!(Type::NULL.is_singleton());
    assert!(Type::UNKNOWN.is_unknown());
    assert!(Type::SCALAR.contains(Type::NUMERIC));
    assert_eq!(Type::SCALAR.basics().count(), 4);
    assert_eq!(Type::STRING.union(Type::STRING), Type::STRING);
}

#[test]
fn test_type_display() {
    assert_eq!((Type::STRING | Type::INTEGER).to_string(), "string|integer");
    assert_eq!(Type::UNKNOWN.to_string(), "unknown");
    assert_eq!(Type::NUMERIC.to_string(), "integer|float");
    assert_eq!(format!("{:?}", Type::ARRAY), "Type(array)");
}

#[test]
fn test_literal_types() {
    assert_eq!(type_of("'a'"), Type::STRING);
    assert_eq!(type_of("42"), Type::INTEGER);
    assert_eq!(type_of("0x1F"), Type::INTEGER);
    assert_eq!(type_of("1.5"), Type::FLOAT);
    assert_eq!(type_of("true"), Type::BOOLEAN);
    assert_eq!(type_of("null"), Type::NULL);
    assert_eq!(type_of("[1]"), Type::ARRAY);
    assert_eq!(type_of("`ls`"), Type::STRING | Type::NULL);
}

#[test]
fn test_operator_types() {
    assert_eq!(type_of("'a' . 1"), Type::STRING);
    assert_eq!(type_of("1 + 2"), Type::NUMERIC);
    assert_eq!(type_of("1 < 2"), Type::BOOLEAN);
    assert_eq!(type_of("!$a"), Type::BOOLEAN);
    assert_eq!(type_of("1 <=> 2"), Type::INTEGER);
    assert_eq!(type_of("(int) $x"), Type::INTEGER);
    assert_eq!(type_of("(string) 1"), Type::STRING);
    assert_eq!(type_of("$a = 'x'"), Type::STRING);
    assert_eq!(type_of("new Foo"), Type::OBJECT);
    assert_eq!(type_of("function () {}"), Type::OBJECT);
    assert_eq!(type_of("$a = print 'x'"), Type::INTEGER);
}

#[test]
fn test_ternary_types() {
    assert_eq!(type_of("true ? 1 : 'a'"), Type::INTEGER | Type::STRING);
    assert_eq!(type_of("$x ? 1 : 2"), Type::INTEGER);
    assert_eq!(type_of("$a ?: 1"), Type::UNKNOWN);
    assert_eq!(type_of("'a' ?: null"), Type::STRING | Type::NULL);
}

#[test]
fn test_runtime_values_are_unknown() {
    assert_eq!(type_of("$x"), Type::UNKNOWN);
    assert_eq!(type_of("f()"), Type::UNKNOWN);
    assert_eq!(type_of("$a ?? 1"), Type::UNKNOWN);
    assert_eq!(type_of("PHP_EOL"), Type::UNKNOWN);
}

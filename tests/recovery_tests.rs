use bumpalo::Bump;
use php_front::ast::sexpr::SExprFormatter;
use php_front::lexer::Lexer;
use php_front::parser::{Parser, ParserConfig};
use php_front::{ParseError, ParseErrorKind, ParseErrors};

fn errors(code: &str) -> Vec<ParseError> {
    errors_with(code, ParserConfig::default())
}

fn errors_with(code: &str, config: ParserConfig) -> Vec<ParseError> {
    let arena = Bump::new();
    let mut parser = Parser::with_config(Lexer::new(code), &arena, config);
    parser.parse_program().errors
}

fn kinds(code: &str) -> Vec<ParseErrorKind> {
    errors(code).into_iter().map(|e| e.kind).collect()
}

#[test]
fn test_missing_semicolon() {
    let code = "<?php echo 1 echo 2;";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();

    assert_eq!(program.errors.len(), 1);
    assert_eq!(
        program.errors[0].to_string(),
        "<input>:1:14: found `echo`, expected `;` or `?>`"
    );
    // Both statements survive.
    assert_eq!(
        SExprFormatter::format(&program),
        "(program\n  (echo 1)\n  (echo 2))"
    );
}

#[test]
fn test_error_names_the_file() {
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new("<?php\n\necho 1 2;"), &arena).named("page.php");
    let program = parser.parse_program();
    let first = &program.errors[0];
    assert_eq!(first.file, "page.php");
    assert_eq!(first.position.line, 3);
    assert_eq!(first.position.column, 8);
    assert!(first.to_string().starts_with("page.php:3:8: found number literal `2`"));
}

#[test]
fn test_unbalanced_parens() {
    assert_eq!(kinds("<?php echo (1 + 2;"), vec![ParseErrorKind::UnbalancedParens]);
}

#[test]
fn test_unassignable_target() {
    assert_eq!(
        kinds("<?php 1 = 2;"),
        vec![ParseErrorKind::Unassignable("a literal".to_string())]
    );
    assert_eq!(
        kinds("<?php f() = 2;"),
        vec![ParseErrorKind::Unassignable("a call".to_string())]
    );
    assert_eq!(
        errors("<?php 1 = 2;")[0].kind.to_string(),
        "cannot assign to a literal"
    );
}

#[test]
fn test_repeated_modifier() {
    assert_eq!(
        kinds("<?php class A { public public $x; }"),
        vec![ParseErrorKind::Modifier(
            "found multiple visibility declarations".to_string()
        )]
    );
    assert_eq!(
        kinds("<?php class A { static static function f() {} }"),
        vec![ParseErrorKind::Modifier(
            "found multiple static declarations".to_string()
        )]
    );
}

#[test]
fn test_inapplicable_modifier() {
    assert_eq!(
        kinds("<?php class A { abstract $x; }"),
        vec![ParseErrorKind::Modifier(
            "cannot use the abstract modifier on a property".to_string()
        )]
    );
    assert_eq!(
        kinds("<?php class A { final const X = 1; }"),
        vec![ParseErrorKind::Modifier(
            "cannot use the final modifier on a constant".to_string()
        )]
    );
}

#[test]
fn test_lex_error_stops_parsing() {
    assert_eq!(
        kinds("<?php echo 1; \u{1} echo 2;"),
        vec![ParseErrorKind::Lex("\u{1}".to_string())]
    );
    assert_eq!(
        errors("<?php \u{1}")[0].to_string(),
        "<input>:1:7: invalid token `\u{1}`"
    );
}

#[test]
fn test_missing_close_brace() {
    let errors = errors("<?php function f() { echo 1;");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind,
        ParseErrorKind::UnexpectedToken {
            found: "end of file".to_string(),
            expected: "`}`".to_string(),
        }
    );
}

#[test]
fn test_try_without_handlers() {
    assert_eq!(
        errors("<?php try {} echo 1;")[0].kind.to_string(),
        "found `echo`, expected `catch` or `finally`"
    );
}

#[test]
fn test_invalid_switch_statement() {
    let kinds = kinds("<?php switch ($x) { echo 1; }");
    assert!(!kinds.is_empty());
    assert!(
        kinds
            .iter()
            .all(|kind| *kind == ParseErrorKind::InvalidSwitchStatement)
    );
}

#[test]
fn test_interface_rejects_properties() {
    assert_eq!(
        errors("<?php interface I { public $x; }")[0].kind.to_string(),
        "found `$`, expected `function` or `const`"
    );
}

#[test]
fn test_error_cap_ends_with_fatal() {
    let code = format!("<?php {}", ")".repeat(30));
    let errors = errors(&code);
    assert_eq!(errors.len(), 10);
    assert!(errors.last().is_some_and(ParseError::is_fatal));
    assert!(errors[..9].iter().all(|e| !e.is_fatal()));
}

#[test]
fn test_custom_error_cap() {
    let code = format!("<?php {}", ")".repeat(30));
    let errors = errors_with(&code, ParserConfig::default().with_max_errors(3));
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[2].kind, ParseErrorKind::Fatal);

    let errors = errors_with(&code, ParserConfig::default().with_max_errors(0));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_fatal());
}

#[test]
fn test_statements_before_fatal_are_kept() {
    let code = format!("<?php echo 1; {}", ")".repeat(30));
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(&code), &arena);
    let program = parser.parse_program();
    assert!(!program.is_ok());
    assert!(SExprFormatter::format(&program).starts_with("(program\n  (echo 1)"));
}

#[test]
fn test_parse_errors_collection() {
    let errors = ParseErrors(errors("<?php 1 = 2;"));
    assert_eq!(errors.iter().count(), 1);
    assert_eq!(
        errors.to_string(),
        "1 parse error(s), first: <input>:1:9: cannot assign to a literal"
    );
}

#[test]
fn test_clean_input_has_no_errors() {
    assert!(errors("<?php $a = [1, 2]; foreach ($a as $v) { echo $v; } ?>done").is_empty());
}

use bumpalo::Bump;
use insta::assert_snapshot;
use php_front::ast::sexpr::SExprFormatter;
use php_front::ast::visitor::Visitor;
use php_front::ast::{Expr, LiteralKind, Stmt};
use php_front::lexer::Lexer;
use php_front::parser::Parser;

fn sexpr(code: &str) -> String {
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();
    assert!(program.errors.is_empty(), "{:?}", program.errors);

    let mut formatter = SExprFormatter::new();
    formatter.visit_program(&program);
    formatter.finish()
}

/// Renders a single expression statement.
fn expr(code: &str) -> String {
    let out = sexpr(&format!("<?php {code};"));
    out.strip_prefix("(program\n  ")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or_else(|| panic!("not a single statement: {out}"))
        .to_string()
}

#[test]
fn test_sexpr_basic() {
    assert_eq!(sexpr("<?php 1 + 2 > 3;"), "(program\n  (> (+ 1 2) 3))");
}

#[test]
fn test_empty_and_template_only() {
    assert_eq!(sexpr(""), "(program)");
    assert_eq!(sexpr("<h1>hi</h1>"), "(program\n  (echo \"<h1>hi</h1>\"))");
    assert_eq!(sexpr("<?php"), "(program)");
}

#[test]
fn test_template_text_becomes_echo() {
    assert_eq!(
        sexpr("a<?php echo 1; ?>b"),
        "(program\n  (echo \"a\")\n  (echo 1)\n  (echo \"b\"))"
    );
}

#[test]
fn test_echo_tag() {
    assert_eq!(
        sexpr("<p><?= $name ?></p>"),
        "(program\n  (echo \"<p>\")\n  (echo $name)\n  (echo \"</p>\"))"
    );
}

#[test]
fn test_echo_print_and_multiple_arguments() {
    assert_eq!(
        sexpr("<?php echo 'a', $b; print \"c\";"),
        "(program\n  (echo 'a' $b)\n  (echo \"c\"))"
    );
}

#[test]
fn test_statement_heads_decided_by_lookahead() {
    assert_eq!(
        sexpr("<?php static $n = 0; static::create(); function () {}; function f() {} $a = array(1);"),
        "(program\n  (static (= $n 0))\n  (:: static (call create))\n  (closure (params) (block))\n  (function f (params) (block))\n  (= $a (array 1)))"
    );
}

#[test]
fn test_print_in_expression_position() {
    assert_eq!(expr("$a = print \"x\""), "(= $a (print \"x\"))");
    assert_eq!(expr("$x and print \"y\""), "(and $x (print \"y\"))");
    assert_eq!(expr("$x or print 'a' . $b"), "(or $x (print (. 'a' $b)))");
}

#[test]
fn test_template_inside_block() {
    let code = "<?php if ($ok) { ?>yes<?php } else { ?>no<?php } ?>";
    assert_snapshot!(sexpr(code), @r#"
(program
  (if
    (branch $ok (block
      (echo "yes")))
    (else (block
      (echo "no")))))
"#);
}

#[test]
fn test_if_alternate_syntax() {
    let code = "<?php if ($a): echo 1; elseif ($b): echo 2; else: echo 3; endif;";
    assert_eq!(
        sexpr(code),
        "(program\n  (if\n    (branch $a (block\n      (echo 1)))\n    (branch $b (block\n      (echo 2)))\n    (else (block\n      (echo 3)))))"
    );
}

#[test]
fn test_else_if_is_flattened() {
    let code = "<?php if ($a) echo 1; else if ($b) echo 2;";
    assert_eq!(
        sexpr(code),
        "(program\n  (if\n    (branch $a (block\n      (echo 1)))\n    (branch $b (block\n      (echo 2)))))"
    );
}

#[test]
fn test_while_alternate_syntax() {
    assert_eq!(
        sexpr("<?php while ($i < 3): $i++; endwhile;"),
        "(program\n  (while (< $i 3) (block\n    (post++ $i))))"
    );
}

#[test]
fn test_do_while() {
    assert_eq!(
        sexpr("<?php do { $i--; } while ($i > 0);"),
        "(program\n  (do (block\n    (post-- $i)) (> $i 0)))"
    );
}

#[test]
fn test_for() {
    assert_eq!(
        sexpr("<?php for ($i = 0, $j = 1; $i < 10; $i++) {}"),
        "(program\n  (for (init (= $i 0) (= $j 1)) (cond (< $i 10)) (step (post++ $i)) (block)))"
    );
    assert_eq!(
        sexpr("<?php for (;;) {}"),
        "(program\n  (for (init) (cond) (step) (block)))"
    );
}

#[test]
fn test_foreach_with_key_and_reference() {
    assert_eq!(
        sexpr("<?php foreach ($items as $k => &$v) { echo $v; }"),
        "(program\n  (foreach $items (key $k) (value &$v) (block\n    (echo $v))))"
    );
}

#[test]
fn test_foreach_alternate_syntax() {
    assert_eq!(
        sexpr("<?php foreach ($items as $item): echo $item; endforeach;"),
        "(program\n  (foreach $items (value $item) (block\n    (echo $item))))"
    );
}

#[test]
fn test_switch() {
    let code = r#"<?php switch ($x) { case 1: echo "a"; break; default: echo "b"; }"#;
    assert_snapshot!(sexpr(code), @r#"
(program
  (switch $x
    (case 1 (block
      (echo "a")
      (break)))
    (default (block
      (echo "b")))))
"#);
}

#[test]
fn test_switch_alternate_syntax() {
    assert_eq!(
        sexpr("<?php switch ($x): case 1; endswitch;"),
        "(program\n  (switch $x\n    (case 1 (block))))"
    );
}

#[test]
fn test_try_catch_finally() {
    assert_eq!(
        sexpr("<?php try { f(); } catch (A | B $e) {} finally {}"),
        "(program\n  (try (block\n    (call f)) (catch (A B) $e (block)) (finally (block))))"
    );
}

#[test]
fn test_jumps() {
    assert_eq!(
        sexpr("<?php return; break 2; continue; throw $e;"),
        "(program\n  (return)\n  (break 2)\n  (continue)\n  (throw $e))"
    );
}

#[test]
fn test_function_declaration() {
    assert_eq!(
        sexpr("<?php function add(int $a, $b = 1, ...$rest): int { return $a + $b; }"),
        "(program\n  (function add (params (param int $a) (param $b 1) ...$rest) (returns int) (block\n    (return (+ $a $b)))))"
    );
}

#[test]
fn test_function_named_like_keyword() {
    assert_eq!(
        sexpr("<?php function list() {}"),
        "(program\n  (function list (params) (block)))"
    );
}

#[test]
fn test_class_declaration() {
    let code = "<?php abstract class Foo extends Bar implements A, B {
        const X = 1;
        public static $count = 0;
        protected ?int $id;
        abstract public function run(int $n = 2): ?string;
    }";
    assert_snapshot!(sexpr(code), @r"
(program
  (class Foo abstract (extends Bar) (implements A B)
    (const (X 1))
    (property public static $count 0)
    (property protected ?int $id)
    (method public abstract run (params (param int $n 2)) (returns ?string))))
");
}

#[test]
fn test_class_method_with_body() {
    let code = "<?php final class Point { private $x, $y = 0; public function getX() { return $this->x; } }";
    assert_eq!(
        sexpr(code),
        "(program\n  (class Point final\n    (property private $x)\n    (property private $y 0)\n    (method public getX (params) (block\n      (return (-> $this x))))))"
    );
}

#[test]
fn test_interface_declaration() {
    let code = "<?php interface Shape extends A, B { const SIDES = 0; public function area(): float; }";
    assert_eq!(
        sexpr(code),
        "(program\n  (interface Shape (extends A B)\n    (const (SIDES 0))\n    (method public area (params) (returns float))))"
    );
}

#[test]
fn test_closure() {
    assert_eq!(
        sexpr("<?php $f = function ($x) use (&$y): int { return $x + $y; };"),
        "(program\n  (= $f (closure (params $x) (use &$y) (returns int) (block\n    (return (+ $x $y))))))"
    );
    assert_eq!(
        sexpr("<?php $g = static function () {};"),
        "(program\n  (= $g (closure static (params) (block))))"
    );
}

#[test]
fn test_global_and_static() {
    assert_eq!(
        sexpr("<?php function counter() { global $g; static $n = 0, $m; }"),
        "(program\n  (function counter (params) (block\n    (global $g)\n    (static (= $n 0) $m))))"
    );
}

#[test]
fn test_declare() {
    assert_eq!(
        sexpr("<?php declare(strict_types=1);"),
        "(program\n  (declare (strict_types 1)))"
    );
}

#[test]
fn test_const_statement() {
    assert_eq!(
        sexpr("<?php const A = 1, B = 'x';"),
        "(program\n  (const (A 1) (B 'x')))"
    );
}

#[test]
fn test_namespace_and_use_are_dropped() {
    assert_eq!(
        sexpr("<?php namespace App; use Foo\\Bar; echo 1;"),
        "(program\n  (echo 1))"
    );
    assert_eq!(
        sexpr("<?php namespace App { echo 1; }"),
        "(program\n  (block\n    (echo 1)))"
    );
}

#[test]
fn test_empty_statement() {
    assert_eq!(sexpr("<?php ;"), "(program\n  (nop))");
}

#[test]
fn test_list_destructure() {
    assert_eq!(expr("list($a, , $b) = $arr"), "(= (list $a _ $b) $arr)");
}

#[test]
fn test_precedence() {
    let cases = [
        ("$a = $b ?? $c ?: $d", "(= $a (?: (?? $b $c) $d))"),
        ("!$a instanceof B", "(! (instanceof $a B))"),
        ("-2 ** 2", "(- (** 2 2))"),
        ("2 ** 3 ** 2", "(** 2 (** 3 2))"),
        ("$a and $b = c()", "(and $a (= $b (call c)))"),
        ("1 - 2 - 3", "(- (- 1 2) 3)"),
        ("$a ? $b : $c ? $d : $e", "(? $a $b (? $c $d $e))"),
        ("$a || $b && $c", "(|| $a (&& $b $c))"),
        ("$a . $b + $c", "(+ (. $a $b) $c)"),
        ("$a == $b <=> $c", "(<=> (== $a $b) $c)"),
        ("$a or $b xor $c", "(or $a (xor $b $c))"),
        ("$a | $b ^ $c & $d", "(| $a (^ $b (& $c $d)))"),
        ("1 << 2 + 3", "(<< 1 (+ 2 3))"),
        ("$a = $b = 3", "(= $a (= $b 3))"),
        ("$a ?? $b ?? $c", "(?? $a (?? $b $c))"),
        ("$i++ + ++$i", "(+ (post++ $i) (++ $i))"),
    ];
    for (code, expected) in cases {
        assert_eq!(expr(code), expected, "{code}");
    }
}

#[test]
fn test_casts() {
    assert_eq!(expr("(int)$x + 1"), "(+ (cast int $x) 1)");
    assert_eq!(expr("( string ) $x"), "(cast string $x)");
    assert_eq!(expr("(bool) !$x"), "(cast bool (! $x))");
}

#[test]
fn test_parenthesized_name_is_not_a_cast() {
    assert_eq!(expr("( int ) + 1"), "(+ int 1)");
    assert_eq!(expr("(FOO)"), "FOO");
}

#[test]
fn test_member_access_and_calls() {
    let cases = [
        ("$obj->items[0]->name", "(-> (index (-> $obj items) 0) name)"),
        ("$obj->run(1, 2)", "(method-call $obj run 1 2)"),
        ("$obj->$prop", "(-> $obj $prop)"),
        ("Foo::bar($x)", "(:: Foo (call bar $x))"),
        ("Foo::$inst", "(:: Foo $inst)"),
        ("self::X", "(:: self X)"),
        ("static::create()", "(:: static (call create))"),
        ("$f(1)", "(call $f 1)"),
        ("f(1, 2,)", "(call f 1 2)"),
        ("f(...$args)", "(call f (... $args))"),
        ("$a[] = 1", "(= (append $a) 1)"),
        ("$s{0}", "(index $s 0)"),
    ];
    for (code, expected) in cases {
        assert_eq!(expr(code), expected, "{code}");
    }
}

#[test]
fn test_new() {
    assert_eq!(expr("new Foo($a)"), "(new Foo $a)");
    assert_eq!(expr("new Foo"), "(new Foo)");
    assert_eq!(expr("new $cls"), "(new $cls)");
    assert_eq!(expr("new $this->cls($a)"), "(new (-> $this cls) $a)");
    assert_eq!(expr("(new Foo)->run()"), "(method-call (new Foo) run)");
}

#[test]
fn test_arrays() {
    assert_eq!(expr("[1, 'k' => &$v]"), "(array 1 (=> 'k' &$v))");
    assert_eq!(expr("array(1, 2,)"), "(array 1 2)");
    assert_eq!(expr("[]"), "(array)");
    assert_eq!(expr("$x ??= []"), "(??= $x (array))");
    assert_eq!(expr("[$a, $b] = $pair"), "(= (array $a $b) $pair)");
}

#[test]
fn test_misc_operands() {
    let cases = [
        ("include 'a.php'", "(include 'a.php')"),
        ("require_once $f . '.php'", "(require_once (. $f '.php'))"),
        ("exit(1)", "(exit 1)"),
        ("die", "(exit)"),
        ("exit()", "(exit)"),
        ("$$name", "${$name}"),
        ("${'a' . 'b'}", "${(. 'a' 'b')}"),
        ("@f()", "(@ (call f))"),
        ("clone $a", "(clone $a)"),
        ("`ls`", "`ls`"),
        ("$a = &$b", "(= $a (& $b))"),
        ("true && null", "(&& true null)"),
        ("PHP_EOL", "PHP_EOL"),
        ("$x ? : 1", "(?: $x 1)"),
    ];
    for (code, expected) in cases {
        assert_eq!(expr(code), expected, "{code}");
    }
}

#[test]
fn test_heredoc_literal() {
    assert_eq!(
        sexpr("<?php echo <<<EOT\nhi\nEOT;\n"),
        "(program\n  (echo <<<EOT\nhi\nEOT))"
    );
}

#[test]
fn test_literal_kinds() {
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new("<?php echo 1, 1.5, 0x1F, 'a', true, null, 1e3;"), &arena);
    let program = parser.parse_program();
    let Stmt::Echo { exprs, .. } = program.statements[0] else {
        panic!("expected echo");
    };
    let kinds: Vec<LiteralKind> = exprs
        .iter()
        .map(|e| match e {
            Expr::Literal { kind, .. } => *kind,
            other => panic!("not a literal: {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            LiteralKind::Integer,
            LiteralKind::Float,
            LiteralKind::Integer,
            LiteralKind::String,
            LiteralKind::Boolean,
            LiteralKind::Null,
            LiteralKind::Float,
        ]
    );
}

#[test]
fn test_spans_cover_statements() {
    let code = "<?php echo 1 + 2;";
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new(code), &arena);
    let program = parser.parse_program();
    assert_eq!(program.span.as_str(code), Some(code));
    assert_eq!(program.statements[0].span().as_str(code), Some("echo 1 + 2;"));
    let Stmt::Echo { exprs, .. } = program.statements[0] else {
        panic!("expected echo");
    };
    assert_eq!(exprs[0].span().as_str(code), Some("1 + 2"));
}

#[test]
fn test_script_mode_lexer() {
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new_script("echo 1;"), &arena);
    let program = parser.parse_program();
    assert!(program.is_ok());
    assert_eq!(SExprFormatter::format(&program), "(program\n  (echo 1))");
}

#[test]
fn test_json_output() {
    let arena = Bump::new();
    let mut parser = Parser::new(Lexer::new("<?php echo 1;"), &arena);
    let program = parser.parse_program();
    let json = serde_json::to_value(&program).expect("serializable");
    assert_eq!(
        json["statements"][0]["Echo"]["exprs"][0]["Literal"]["value"],
        "1"
    );
    assert_eq!(
        json["statements"][0]["Echo"]["exprs"][0]["Literal"]["kind"],
        "Integer"
    );
}

#[test]
fn test_cancelled_lexer_ends_the_parse() {
    let code = "<?php echo 1; echo 2;";
    let lexer = Lexer::new(code);
    let handle = lexer.cancel_handle();
    handle.cancel();

    let arena = Bump::new();
    let mut parser = Parser::new(lexer, &arena);
    let program = parser.parse_program();
    assert!(program.is_ok(), "{:?}", program.errors);
    assert!(program.statements.is_empty());
    assert_eq!(program.span.end, code.len());
}

#[test]
fn test_cancel_from_another_thread_keeps_built_statements() {
    const COUNT: usize = 200_000;
    let code = format!("<?php {}", "echo 1;".repeat(COUNT));
    let lexer = Lexer::new(&code);
    let handle = lexer.cancel_handle();

    let (statements, errors) = std::thread::scope(|scope| {
        let parse = scope.spawn(move || {
            let arena = Bump::new();
            let mut parser = Parser::new(lexer, &arena);
            let program = parser.parse_program();
            let echoes = program
                .statements
                .iter()
                .filter(|stmt| matches!(stmt, Stmt::Echo { exprs, .. } if exprs.len() == 1))
                .count();
            assert_eq!(echoes, program.statements.len());
            (program.statements.len(), program.errors)
        });
        handle.cancel();
        parse.join().expect("parser thread panicked")
    });

    assert!(statements <= COUNT);
    // A cancel that lands inside `echo 1;` leaves at most the operand and
    // the terminator missing.
    assert!(errors.len() <= 2, "{errors:?}");
    assert!(errors.iter().all(|e| !e.is_fatal()));
}

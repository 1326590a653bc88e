use php_front::lexer::Lexer;
use php_front::lexer::token::{Token, TokenKind, TypeClass, lookup};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source).significant().map(|t| t.kind).collect()
}

fn texts(source: &str) -> Vec<String> {
    Lexer::new(source)
        .significant()
        .map(|t| t.text.to_string())
        .collect()
}

#[test]
fn test_template_and_script_tokens_partition_input() {
    let source = "Hello <?php echo $x; ?> bye";
    let tokens: Vec<Token> = Lexer::new(source).collect();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::InlineHtml,
            TokenKind::OpenTag,
            TokenKind::Whitespace,
            TokenKind::Echo,
            TokenKind::Whitespace,
            TokenKind::Dollar,
            TokenKind::Identifier,
            TokenKind::SemiColon,
            TokenKind::Whitespace,
            TokenKind::CloseTag,
            TokenKind::InlineHtml,
            TokenKind::Eof,
        ]
    );
    let joined: String = tokens.iter().map(|t| t.text).collect();
    assert_eq!(joined, source);
}

#[test]
fn test_open_tag_variants() {
    assert_eq!(
        kinds("<?= $a ?>"),
        vec![
            TokenKind::OpenTagEcho,
            TokenKind::Dollar,
            TokenKind::Identifier,
            TokenKind::CloseTag,
            TokenKind::Eof,
        ]
    );
    assert_eq!(kinds("<? echo")[..2], [TokenKind::OpenTag, TokenKind::Echo]);
    assert_eq!(kinds("<?PHP echo")[..2], [TokenKind::OpenTag, TokenKind::Echo]);
}

#[test]
fn test_keywords_after_dollar_arrow_and_double_colon_are_identifiers() {
    assert_eq!(
        kinds("<?php $class->function::new"),
        vec![
            TokenKind::OpenTag,
            TokenKind::Dollar,
            TokenKind::Identifier,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::DoubleColon,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keywords_are_case_insensitive_and_not_glued() {
    assert_eq!(
        kinds("<?php ECHO eChO echoes"),
        vec![
            TokenKind::OpenTag,
            TokenKind::Echo,
            TokenKind::Echo,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_longest_operator_wins() {
    assert_eq!(
        kinds("<?php === !== <=> ??= ** ... <<= ->"),
        vec![
            TokenKind::OpenTag,
            TokenKind::Identical,
            TokenKind::NotIdentical,
            TokenKind::Spaceship,
            TokenKind::CoalesceEq,
            TokenKind::Pow,
            TokenKind::Ellipsis,
            TokenKind::SlEq,
            TokenKind::Arrow,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_casts() {
    assert_eq!(
        kinds("<?php (int)(string)(bool)"),
        vec![
            TokenKind::OpenTag,
            TokenKind::IntCast,
            TokenKind::StringCast,
            TokenKind::BoolCast,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_comments_keep_line_terminator_and_stop_at_close_tag() {
    let tokens: Vec<Token> = Lexer::new("<?php // hi\r\n# x ?>")
        .subset(TypeClass::COMMENT)
        .collect();
    let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
    assert_eq!(texts, vec!["// hi\r\n", "# x ", ""]);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
}

#[test]
fn test_block_comment() {
    let tokens: Vec<Token> = Lexer::new("<?php /* a\nb */ 1")
        .subset(TypeClass::COMMENT)
        .collect();
    assert_eq!(tokens[0].kind, TokenKind::BlockComment);
    assert_eq!(tokens[0].text, "/* a\nb */");
}

#[test]
fn test_heredoc_is_one_string_literal() {
    let texts = texts("<?php $s = <<<EOT\nline\nEOT;\n");
    assert_eq!(texts[4], "<<<EOT\nline\nEOT");
    assert_eq!(texts[5], ";");
}

#[test]
fn test_quoted_heredoc_label() {
    let texts = texts("<?php <<<'EOT'\n$raw\nEOT;");
    assert_eq!(texts[1], "<<<'EOT'\n$raw\nEOT");
}

#[test]
fn test_strings_with_escapes_and_unterminated() {
    assert_eq!(texts(r#"<?php "a\"b" 'c'"#)[1..3], [r#""a\"b""#, "'c'"]);
    let tokens: Vec<Token> = Lexer::new("<?php 'abc").significant().collect();
    assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[1].text, "'abc");
    assert_eq!(tokens[2].kind, TokenKind::Eof);
}

#[test]
fn test_shell_command() {
    let tokens: Vec<Token> = Lexer::new("<?php `ls -l`;").significant().collect();
    assert_eq!(tokens[1].kind, TokenKind::ShellCommand);
    assert_eq!(tokens[1].text, "`ls -l`");
}

#[test]
fn test_numbers() {
    assert_eq!(
        texts("<?php 0x1F 0b101 1.5e-3 .5 42")[1..6],
        ["0x1F", "0b101", "1.5e-3", ".5", "42"]
    );
}

#[test]
fn test_namespaced_identifier() {
    let tokens: Vec<Token> = Lexer::new("<?php \\Foo\\Bar").significant().collect();
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].text, "\\Foo\\Bar");
}

#[test]
fn test_invalid_byte_is_an_error_token() {
    let tokens: Vec<Token> = Lexer::new("<?php \u{1}").significant().collect();
    assert_eq!(tokens[1].kind, TokenKind::Error);
    assert_eq!(tokens[1].text, "\u{1}");
    assert_eq!(tokens[2].kind, TokenKind::Eof);
}

#[test]
fn test_positions_are_one_based() {
    let tokens: Vec<Token> = Lexer::new("<?php\n  $a").significant().collect();
    let dollar = tokens[1];
    assert_eq!(dollar.kind, TokenKind::Dollar);
    assert_eq!(dollar.begin.line, 2);
    assert_eq!(dollar.begin.column, 3);
    assert_eq!(dollar.begin.offset, 8);
    assert_eq!(dollar.begin.to_string(), "2:3");
}

#[test]
fn test_exactly_one_eof_then_none() {
    let mut lexer = Lexer::new("<?php 1");
    let mut eofs = 0;
    for token in lexer.by_ref() {
        if token.kind == TokenKind::Eof {
            eofs += 1;
        }
    }
    assert_eq!(eofs, 1);
    assert!(lexer.next().is_none());
}

#[test]
fn test_empty_input_is_just_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
}

#[test]
fn test_cancel_stops_with_eof() {
    let mut lexer = Lexer::new("<?php echo 1; echo 2;");
    let handle = lexer.cancel_handle();
    assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::OpenTag));
    handle.cancel();
    assert!(handle.is_cancelled());
    assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Eof));
    assert!(lexer.next().is_none());
}

#[test]
fn test_subset_passes_eof_and_errors() {
    let kinds: Vec<TokenKind> = Lexer::new("<?php $a \u{1}")
        .subset(TypeClass::WHITESPACE)
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Whitespace,
            TokenKind::Whitespace,
            TokenKind::Error,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_resubset_replaces_filter() {
    let subset = Lexer::new("<?php $a").subset(TypeClass::WHITESPACE);
    let kinds: Vec<TokenKind> = subset
        .subset(TypeClass::IDENTIFIER)
        .map(|t| t.kind)
        .collect();
    assert_eq!(kinds, vec![TokenKind::Identifier, TokenKind::Eof]);
}

#[test]
fn test_type_classes() {
    assert!(TokenKind::LogicalAnd.type_class().contains(TypeClass::KEYWORD));
    assert!(TokenKind::LogicalAnd.type_class().contains(TypeClass::OPERATOR));
    assert_eq!(TokenKind::Identifier.type_class(), TypeClass::IDENTIFIER);
    assert_eq!(TokenKind::OpenBrace.type_class(), TypeClass::MARKER);
    assert_eq!(TokenKind::InlineHtml.type_class(), TypeClass::LITERAL);
    assert!(!TokenKind::Whitespace.type_class().intersects(TypeClass::SIGNIFICANT));
}

#[test]
fn test_catalog_lookup() {
    assert_eq!(lookup(b"ECHO"), Some(TokenKind::Echo));
    assert_eq!(lookup(b"die"), Some(TokenKind::Exit));
    assert_eq!(lookup(b"<=>"), Some(TokenKind::Spaceship));
    assert_eq!(lookup(b"nope"), None);
}

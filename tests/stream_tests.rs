use php_front::lexer::Lexer;
use php_front::lexer::stream::TokenStream;
use php_front::lexer::token::{Token, TokenKind};
use php_front::span::Position;

fn synthetic(kind: TokenKind, text: &'static str) -> Token<'static> {
    Token {
        kind,
        text,
        begin: Position::START,
        end: Position::START,
    }
}

#[test]
fn test_peek_does_not_consume() {
    let mut stream = TokenStream::new(Lexer::new("<?php $a;").significant());
    assert!(stream.current().is_none());
    assert_eq!(stream.peek().kind, TokenKind::OpenTag);
    assert_eq!(stream.peek_nth(1).kind, TokenKind::Dollar);
    assert_eq!(stream.peek_nth(2).kind, TokenKind::Identifier);
    assert_eq!(stream.position(), 0);
    assert_eq!(stream.next_token().kind, TokenKind::OpenTag);
    assert_eq!(stream.current().map(|t| t.kind), Some(TokenKind::OpenTag));
}

#[test]
fn test_previous_replays_the_same_token() {
    let mut stream = TokenStream::new(Lexer::new("<?php $a;").significant());
    let first = stream.next_token();
    let second = stream.next_token();
    assert_eq!(stream.position(), 2);
    assert_eq!(stream.previous(), Some(second));
    assert_eq!(stream.position(), 1);
    assert_eq!(stream.next_token(), second);
    assert_eq!(stream.previous(), Some(second));
    assert_eq!(stream.previous(), Some(first));
    assert_eq!(stream.previous(), None);
}

#[test]
fn test_reading_past_the_end_keeps_returning_eof() {
    let mut stream = TokenStream::new(Lexer::new("<?php 1").significant());
    let kinds: Vec<TokenKind> = (0..5).map(|_| stream.next_token().kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::OpenTag,
            TokenKind::NumberLiteral,
            TokenKind::Eof,
            TokenKind::Eof,
            TokenKind::Eof,
        ]
    );
    assert_eq!(stream.peek().kind, TokenKind::Eof);
    assert_eq!(stream.peek_nth(10).kind, TokenKind::Eof);
}

#[test]
fn test_seek_rewinds_to_absolute_index() {
    let mut stream = TokenStream::new(Lexer::new("<?php echo 1;").significant());
    while stream.next_token().kind != TokenKind::Eof {}
    stream.seek(1);
    assert_eq!(stream.next_token().kind, TokenKind::Echo);
    stream.seek(0);
    assert_eq!(stream.next_token().kind, TokenKind::OpenTag);
}

#[test]
fn test_seek_ahead_pulls_from_source() {
    let mut stream = TokenStream::new(Lexer::new("<?php echo 1;").significant());
    stream.seek(2);
    assert_eq!(stream.next_token().text, "1");
}

#[test]
fn test_push_inserts_before_cursor() {
    let mut stream = TokenStream::new(Lexer::new("<?php $a").significant());
    stream.next_token();
    stream.push(synthetic(TokenKind::Echo, "echo"));
    assert_eq!(stream.next_token().kind, TokenKind::Echo);
    assert_eq!(stream.next_token().kind, TokenKind::Dollar);
}

#[test]
fn test_push_stream_keeps_order() {
    let mut stream = TokenStream::new(Lexer::new("<?php ;").significant());
    stream.next_token();
    stream.push_stream([
        synthetic(TokenKind::Echo, "echo"),
        synthetic(TokenKind::NumberLiteral, "1"),
    ]);
    let kinds: Vec<TokenKind> = (0..4).map(|_| stream.next_token().kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Echo,
            TokenKind::NumberLiteral,
            TokenKind::SemiColon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_empty_source_synthesizes_eof() {
    let mut stream = TokenStream::new(std::iter::empty::<Token<'static>>());
    let eof = stream.next_token();
    assert_eq!(eof.kind, TokenKind::Eof);
    assert_eq!(eof.begin, Position::START);
    assert_eq!(stream.next_token().kind, TokenKind::Eof);
}

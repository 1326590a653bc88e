pub mod stream;
pub mod token;

use crate::span::Position;
use memchr::memmem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use token::{Token, TokenKind, TypeClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    Template,
    Script,
    Finished,
}

/// Requests that a lexer stop between two emissions.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tokenizer for template text with embedded script regions.
///
/// Every byte of the input lands in exactly one token, so the emitted tokens
/// partition the source. The stream always ends with a single `Eof`.
pub struct Lexer<'src> {
    input: &'src str,
    cursor: usize,
    position: Position,
    state: LexerState,
    last_significant: Option<TokenKind>,
    cancel: CancelHandle,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            input,
            cursor: 0,
            position: Position::START,
            state: LexerState::Template,
            last_significant: None,
            cancel: CancelHandle::default(),
        }
    }

    /// Starts directly in script mode, as if the input were preceded by `<?php`.
    pub fn new_script(input: &'src str) -> Self {
        Self {
            state: LexerState::Script,
            ..Self::new(input)
        }
    }

    pub fn source(&self) -> &'src str {
        self.input
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Forwards only tokens in `classes`; `Eof` and error tokens always pass.
    pub fn subset(self, classes: TypeClass) -> Subset<Self> {
        Subset::new(self, classes)
    }

    pub fn significant(self) -> Subset<Self> {
        self.subset(TypeClass::SIGNIFICANT)
    }

    fn bytes(&self) -> &'src [u8] {
        self.input.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.cursor).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes().get(self.cursor + n).copied()
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.input.len());
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes()[self.cursor..].starts_with(prefix)
    }

    fn emit(&mut self, kind: TokenKind, start: usize) -> Token<'src> {
        let text = &self.input[start..self.cursor];
        let begin = self.position;
        let end = begin.advance(text);
        self.position = end;
        if kind.type_class().intersects(TypeClass::SIGNIFICANT) {
            self.last_significant = Some(kind);
        }
        Token {
            kind,
            text,
            begin,
            end,
        }
    }

    fn eof(&mut self) -> Token<'src> {
        self.state = LexerState::Finished;
        self.emit(TokenKind::Eof, self.cursor)
    }

    fn lex_template(&mut self) -> Token<'src> {
        let start = self.cursor;
        let rest = &self.bytes()[start..];
        match memmem::find(rest, b"<?") {
            Some(0) => {
                let kind = if rest.len() >= 5 && rest[2..5].eq_ignore_ascii_case(b"php") {
                    self.advance_n(5);
                    TokenKind::OpenTag
                } else if rest.get(2) == Some(&b'=') {
                    self.advance_n(3);
                    TokenKind::OpenTagEcho
                } else {
                    self.advance_n(2);
                    TokenKind::OpenTag
                };
                self.state = LexerState::Script;
                tracing::trace!(offset = start, "entering script mode");
                self.emit(kind, start)
            }
            Some(n) => {
                self.advance_n(n);
                self.emit(TokenKind::InlineHtml, start)
            }
            None => {
                self.cursor = self.input.len();
                self.emit(TokenKind::InlineHtml, start)
            }
        }
    }

    fn lex_script(&mut self) -> Token<'src> {
        let start = self.cursor;
        let Some(c) = self.peek() else {
            return self.eof();
        };

        match c {
            b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => {
                while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)) {
                    self.advance();
                }
                self.emit(TokenKind::Whitespace, start)
            }
            b'#' => {
                self.consume_line_comment();
                self.emit(TokenKind::LineComment, start)
            }
            b'/' if self.peek_at(1) == Some(b'/') => {
                self.consume_line_comment();
                self.emit(TokenKind::LineComment, start)
            }
            b'/' if self.peek_at(1) == Some(b'*') => {
                self.consume_block_comment();
                self.emit(TokenKind::BlockComment, start)
            }
            b'?' if self.peek_at(1) == Some(b'>') => {
                self.advance_n(2);
                self.state = LexerState::Template;
                tracing::trace!(offset = start, "leaving script mode");
                self.emit(TokenKind::CloseTag, start)
            }
            b'<' if self.starts_with(b"<<<") && self.read_heredoc() => {
                self.emit(TokenKind::StringLiteral, start)
            }
            b'\'' | b'"' => {
                self.read_quoted(c);
                self.emit(TokenKind::StringLiteral, start)
            }
            b'`' => {
                self.read_quoted(c);
                self.emit(TokenKind::ShellCommand, start)
            }
            b'0'..=b'9' => {
                self.read_number();
                self.emit(TokenKind::NumberLiteral, start)
            }
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number();
                self.emit(TokenKind::NumberLiteral, start)
            }
            _ => {
                let kind = self.read_catalog_or_identifier();
                self.emit(kind, start)
            }
        }
    }

    /// Runs to the end of the line, keeping the line terminator, or stops before `?>`.
    fn consume_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b'\n' => {
                    self.advance();
                    return;
                }
                b'\r' => {
                    self.advance();
                    if self.peek() == Some(b'\n') {
                        self.advance();
                    }
                    return;
                }
                b'?' if self.peek_at(1) == Some(b'>') => return,
                _ => self.advance(),
            }
        }
    }

    fn consume_block_comment(&mut self) {
        let body = self.cursor + 2;
        match memmem::find(&self.bytes()[body..], b"*/") {
            Some(n) => self.cursor = body + n + 2,
            None => self.cursor = self.input.len(),
        }
    }

    /// Unterminated literals run to the end of input.
    fn read_quoted(&mut self, quote: u8) {
        self.advance();
        while let Some(c) = self.peek() {
            if c == b'\\' {
                self.advance();
                if self.peek().is_some_and(|c| c.is_ascii()) {
                    self.advance();
                }
            } else if c == quote {
                self.advance();
                return;
            } else {
                self.advance();
            }
        }
    }

    fn read_number(&mut self) {
        if self.peek() == Some(b'0') {
            match self.peek_at(1) {
                Some(b'b' | b'B') if matches!(self.peek_at(2), Some(b'0' | b'1')) => {
                    self.advance_n(2);
                    while matches!(self.peek(), Some(b'0' | b'1')) {
                        self.advance();
                    }
                    return;
                }
                Some(b'x' | b'X') if self.peek_at(2).is_some_and(|c| c.is_ascii_hexdigit()) => {
                    self.advance_n(2);
                    while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                        self.advance();
                    }
                    return;
                }
                _ => {}
            }
        }

        self.skip_digits();
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let exponent = match self.peek_at(1) {
                Some(b'+' | b'-') => 2,
                _ => 1,
            };
            if self.peek_at(exponent).is_some_and(|c| c.is_ascii_digit()) {
                self.advance_n(exponent);
                self.skip_digits();
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// `<<<LABEL`, `<<<"LABEL"` or `<<<'LABEL'` up to a line that starts with
    /// the label. Leaves the cursor untouched and returns false when the opener
    /// is malformed.
    fn read_heredoc(&mut self) -> bool {
        let bytes = self.bytes();
        let mut i = self.cursor + 3;
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let quote = match bytes.get(i) {
            Some(&q @ (b'\'' | b'"')) => {
                i += 1;
                Some(q)
            }
            _ => None,
        };
        let label_start = i;
        if !bytes.get(i).is_some_and(|&c| is_identifier_start(c)) {
            return false;
        }
        while bytes.get(i).is_some_and(|&c| is_identifier_body(c)) {
            i += 1;
        }
        let label = &bytes[label_start..i];
        if let Some(q) = quote {
            if bytes.get(i) != Some(&q) {
                return false;
            }
            i += 1;
        }
        if !matches!(bytes.get(i), Some(b'\n' | b'\r')) {
            return false;
        }

        // Search from the newline that ends the opener so an empty body still
        // finds its terminator.
        let mut search = i;
        let end = loop {
            let Some(n) = memchr::memchr2(b'\n', b'\r', &bytes[search..]) else {
                break bytes.len();
            };
            let newline = search + n;
            let line_start = if bytes[newline] == b'\r' && bytes.get(newline + 1) == Some(&b'\n')
            {
                newline + 2
            } else {
                newline + 1
            };
            let after_label = line_start + label.len();
            if bytes[line_start..].starts_with(label)
                && !bytes.get(after_label).is_some_and(|&c| is_identifier_body(c))
            {
                break after_label;
            }
            search = newline + 1;
        };
        self.cursor = end;
        true
    }

    /// Longest match against the catalog, falling back to the identifier rules.
    fn read_catalog_or_identifier(&mut self) -> TokenKind {
        let rest = &self.bytes()[self.cursor..];
        let mut len = rest.len().min(*token::LONGEST_KEY);
        while len > 0 {
            if let Some(kind) = token::lookup(&rest[..len]) {
                if is_identifier_start(rest[0]) {
                    let suppressed = matches!(
                        self.last_significant,
                        Some(TokenKind::Dollar | TokenKind::Arrow | TokenKind::DoubleColon)
                    );
                    let glued = rest.get(len).is_some_and(|&c| is_identifier_body(c));
                    if suppressed || glued {
                        return self.read_identifier();
                    }
                }
                self.advance_n(len);
                return kind;
            }
            len -= 1;
        }
        self.read_identifier()
    }

    /// Identifier characters run until whitespace or an operator mark; any
    /// other character turns the whole run into an error token.
    fn read_identifier(&mut self) -> TokenKind {
        let start = self.cursor;
        let mut weird = false;
        while let Some(c) = self.peek() {
            if is_identifier_body(c) || c == b'\\' {
                self.advance();
            } else if c.is_ascii_whitespace() || is_operator_mark(c) {
                break;
            } else {
                weird = true;
                self.advance();
            }
        }
        if self.cursor == start {
            // A lone mark with no catalog entry.
            self.advance();
            return TokenKind::Error;
        }
        if weird {
            TokenKind::Error
        } else {
            TokenKind::Identifier
        }
    }
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_identifier_body(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}

fn is_operator_mark(c: u8) -> bool {
    matches!(
        c,
        b'{' | b'}'
            | b'('
            | b')'
            | b'['
            | b']'
            | b','
            | b';'
            | b'='
            | b'+'
            | b'-'
            | b'*'
            | b'/'
            | b'%'
            | b'.'
            | b'&'
            | b'|'
            | b'^'
            | b'~'
            | b'<'
            | b'>'
            | b'!'
            | b'?'
            | b':'
            | b'@'
            | b'$'
            | b'#'
            | b'`'
            | b'\''
            | b'"'
    )
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == LexerState::Finished {
            return None;
        }
        if self.cancel.is_cancelled() {
            tracing::debug!(offset = self.cursor, "lexer cancelled");
            return Some(self.eof());
        }
        if self.cursor >= self.input.len() {
            return Some(self.eof());
        }
        Some(match self.state {
            LexerState::Template => self.lex_template(),
            _ => self.lex_script(),
        })
    }
}

/// Filters a token stream down to a set of type classes.
pub struct Subset<I> {
    inner: I,
    classes: TypeClass,
}

impl<I> Subset<I> {
    pub fn new(inner: I, classes: TypeClass) -> Self {
        Self { inner, classes }
    }

    pub fn classes(&self) -> TypeClass {
        self.classes
    }

    /// Re-filters the underlying stream rather than nesting filters.
    pub fn subset(self, classes: TypeClass) -> Subset<I> {
        Subset::new(self.inner, classes)
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<'src, I: Iterator<Item = Token<'src>>> Iterator for Subset<I> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let classes = self.classes;
        self.inner.by_ref().find(|token| {
            let class = token.kind.type_class();
            class.intersects(classes) || class.contains(TypeClass::INVALID)
        })
    }
}

mod class;
mod expr;

use crate::ast::scope::{ConstantEntry, DEFAULT_NAMESPACE, File, FileId, FileSet, ScopeId};
use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::stream::TokenStream;
use crate::lexer::token::{Token, TokenKind, TypeClass};
use crate::lexer::{Lexer, Subset};
use crate::span::{Position, Span};
use bumpalo::Bump;

#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Parsing stops once this many errors have been recorded, the last one
    /// being [`ParseErrorKind::Fatal`].
    pub max_errors: usize,
    /// Token classes handed to the parser. Anything without a significant
    /// class is skipped.
    pub significant: TypeClass,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_errors: 10,
            significant: TypeClass::SIGNIFICANT,
        }
    }
}

impl ParserConfig {
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

/// Raised once the error cap is reached and unwound with `?` up to
/// [`Parser::parse_program`].
#[derive(Debug)]
pub(crate) struct Bail;

pub(crate) type PResult<T> = Result<T, Bail>;

pub struct Parser<'src, 'ast> {
    tokens: TokenStream<'src, Subset<Lexer<'src>>>,
    arena: &'ast Bump,
    config: ParserConfig,
    source_len: usize,
    current: Token<'src>,
    paren_level: usize,
    errors: Vec<ParseError>,
    file_set: FileSet<'ast>,
    file_name: String,
    namespace: String,
    scope: ScopeId,
    instantiation: bool,
}

impl<'src, 'ast> Parser<'src, 'ast> {
    pub fn new(lexer: Lexer<'src>, arena: &'ast Bump) -> Self {
        Self::with_file_set(lexer, arena, FileSet::new(), ParserConfig::default())
    }

    pub fn with_config(lexer: Lexer<'src>, arena: &'ast Bump, config: ParserConfig) -> Self {
        Self::with_file_set(lexer, arena, FileSet::new(), config)
    }

    /// Parses into an existing file set, so several files share namespaces
    /// and the root scope.
    pub fn with_file_set(
        lexer: Lexer<'src>,
        arena: &'ast Bump,
        file_set: FileSet<'ast>,
        config: ParserConfig,
    ) -> Self {
        let source_len = lexer.source().len();
        let scope = file_set.root_scope();
        Self {
            tokens: TokenStream::new(lexer.subset(config.significant)),
            arena,
            config,
            source_len,
            current: Token {
                kind: TokenKind::Eof,
                text: "",
                begin: Position::START,
                end: Position::START,
            },
            paren_level: 0,
            errors: Vec::new(),
            file_set,
            file_name: String::from("<input>"),
            namespace: DEFAULT_NAMESPACE.to_string(),
            scope,
            instantiation: false,
        }
    }

    /// Names the file in diagnostics and in the file set.
    pub fn named(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn file_set(&self) -> &FileSet<'ast> {
        &self.file_set
    }

    pub fn into_file_set(self) -> FileSet<'ast> {
        self.file_set
    }

    pub fn parse_program(&mut self) -> Program<'ast> {
        tracing::debug!(file = %self.file_name, "parsing");
        let mut statements = Vec::new();
        if let Err(Bail) = self.parse_top_level(&mut statements) {
            tracing::warn!(
                file = %self.file_name,
                errors = self.errors.len(),
                "stopped parsing after too many errors"
            );
        }

        let statements = self.arena.alloc_slice_copy(&statements);
        let file = self.file_set.add_file(File {
            name: self.file_name.clone(),
            namespace: self.namespace.clone(),
            statements,
        });
        let errors = std::mem::take(&mut self.errors);
        tracing::debug!(
            file = %self.file_name,
            statements = statements.len(),
            errors = errors.len(),
            "parsed"
        );
        Program {
            file,
            statements,
            errors,
            span: Span::new(0, self.source_len),
        }
    }

    fn parse_top_level(&mut self, out: &mut Vec<StmtId<'ast>>) -> PResult<()> {
        loop {
            self.next()?;
            match self.current.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::InlineHtml => out.push(self.template_echo()),
                TokenKind::OpenTag | TokenKind::CloseTag => {}
                _ => {
                    if let Some(stmt) = self.parse_stmt()? {
                        out.push(stmt);
                    }
                }
            }
        }
    }

    // Token plumbing

    fn next(&mut self) -> PResult<()> {
        self.current = self.tokens.next_token();
        if self.current.kind == TokenKind::Error {
            let token = self.current;
            self.error(ParseErrorKind::Lex(token.text.to_string()), token)?;
            return Err(Bail);
        }
        Ok(())
    }

    fn backup(&mut self) {
        self.tokens.previous();
        if let Some(token) = self.tokens.current() {
            self.current = token;
        }
    }

    fn peek(&mut self) -> Token<'src> {
        self.tokens.peek()
    }

    fn accept(&mut self, kind: TokenKind) -> PResult<bool> {
        if self.peek().kind == kind {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the next token and checks its kind.
    fn expect(&mut self, kind: TokenKind) -> PResult<bool> {
        self.next()?;
        if self.current.kind == kind {
            Ok(true)
        } else {
            self.expected(&[kind])?;
            Ok(false)
        }
    }

    fn expect_stmt_end(&mut self) -> PResult<()> {
        let next = self.peek();
        match next.kind {
            TokenKind::CloseTag => Ok(()),
            TokenKind::SemiColon => self.next(),
            _ => self.expected_token(next, &[TokenKind::SemiColon, TokenKind::CloseTag]),
        }
    }

    fn error(&mut self, kind: ParseErrorKind, token: Token<'src>) -> PResult<()> {
        let cap = self.config.max_errors.max(1);
        if self.errors.len() + 1 >= cap {
            self.errors.push(self.make_error(ParseErrorKind::Fatal, token));
            return Err(Bail);
        }
        let error = self.make_error(kind, token);
        tracing::trace!(%error, "recorded");
        self.errors.push(error);
        Ok(())
    }

    fn make_error(&self, kind: ParseErrorKind, token: Token<'src>) -> ParseError {
        ParseError {
            kind,
            span: token.span(),
            position: token.begin,
            file: self.file_name.clone(),
        }
    }

    fn expected(&mut self, kinds: &[TokenKind]) -> PResult<()> {
        self.expected_token(self.current, kinds)
    }

    fn expected_token(&mut self, found: Token<'src>, kinds: &[TokenKind]) -> PResult<()> {
        let expected = kinds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        self.error(
            ParseErrorKind::UnexpectedToken {
                found: found.to_string(),
                expected,
            },
            found,
        )
    }

    // Arena helpers

    fn alloc_stmt(&self, stmt: Stmt<'ast>) -> StmtId<'ast> {
        self.arena.alloc(stmt)
    }

    fn alloc_expr(&self, expr: Expr<'ast>) -> ExprId<'ast> {
        self.arena.alloc(expr)
    }

    fn alloc_str(&self, text: &str) -> &'ast str {
        self.arena.alloc_str(text)
    }

    fn alloc_slice<T>(&self, items: Vec<T>) -> &'ast [T] {
        self.arena.alloc_slice_fill_iter(items)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.current.end.offset.max(start))
    }

    fn enter_scope(&mut self) -> ScopeId {
        let outer = self.scope;
        self.scope = self.file_set.new_scope(outer);
        outer
    }

    fn leave_scope(&mut self, outer: ScopeId) {
        self.scope = outer;
    }

    // Statements

    /// Parses the statement starting at `current`. Returns `None` for
    /// constructs that produce no node.
    fn parse_stmt(&mut self) -> PResult<Option<StmtId<'ast>>> {
        let start = self.current.begin.offset;
        let kind = self.current.kind;
        let stmt = match kind {
            TokenKind::OpenBrace => self.parse_block_body()?,
            TokenKind::Global => self.parse_global()?,
            TokenKind::Namespace => return self.parse_namespace(),
            TokenKind::Use => {
                self.skip_to_stmt_end()?;
                return Ok(None);
            }
            TokenKind::Static
                if !matches!(
                    self.peek().kind,
                    TokenKind::DoubleColon | TokenKind::Function
                ) =>
            {
                self.parse_static()?
            }
            TokenKind::Echo | TokenKind::OpenTagEcho | TokenKind::Print => self.parse_echo()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Do => self.parse_do_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Foreach => self.parse_foreach()?,
            TokenKind::Switch => self.parse_switch()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Declare => self.parse_declare()?,
            TokenKind::Function if !self.is_closure_ahead() => self.parse_function()?,
            TokenKind::Abstract | TokenKind::Final | TokenKind::Class => self.parse_class()?,
            TokenKind::Interface => self.parse_interface()?,
            TokenKind::Const => self.parse_const()?,
            TokenKind::Return | TokenKind::Break | TokenKind::Continue | TokenKind::Throw => {
                self.parse_jump()?
            }
            TokenKind::SemiColon => self.alloc_stmt(Stmt::Nop {
                span: self.span_from(start),
            }),
            TokenKind::CloseTag => return self.parse_close_tag(),
            TokenKind::InlineHtml => self.template_echo(),
            TokenKind::OpenTag => return Ok(None),
            _ => {
                let expr = self.parse_expression()?;
                self.expect_stmt_end()?;
                self.alloc_stmt(Stmt::Expression {
                    expr,
                    span: self.span_from(start),
                })
            }
        };
        Ok(Some(stmt))
    }

    /// Consumes the next token and parses a statement from it; constructs
    /// without a node become an empty statement.
    fn parse_inner_stmt(&mut self) -> PResult<StmtId<'ast>> {
        self.next()?;
        let start = self.current.begin.offset;
        Ok(match self.parse_stmt()? {
            Some(stmt) => stmt,
            None => self.alloc_stmt(Stmt::Nop {
                span: self.span_from(start),
            }),
        })
    }

    fn is_closure_ahead(&mut self) -> bool {
        match self.tokens.peek_nth(0).kind {
            TokenKind::OpenParen => true,
            TokenKind::Ampersand => self.tokens.peek_nth(1).kind == TokenKind::OpenParen,
            _ => false,
        }
    }

    /// Template text is echoed verbatim.
    fn template_echo(&mut self) -> StmtId<'ast> {
        let span = self.current.span();
        let literal = self.alloc_expr(Expr::Literal {
            kind: LiteralKind::String,
            value: self.alloc_str(self.current.text),
            span,
        });
        self.alloc_stmt(Stmt::Echo {
            exprs: self.alloc_slice(vec![literal]),
            span,
        })
    }

    /// `?>` optionally followed by template text, then `<?php` or end of file.
    fn parse_close_tag(&mut self) -> PResult<Option<StmtId<'ast>>> {
        if self.peek().kind == TokenKind::Eof {
            return Ok(None);
        }
        let echo = if self.accept(TokenKind::InlineHtml)? {
            Some(self.template_echo())
        } else {
            None
        };
        self.next()?;
        match self.current.kind {
            TokenKind::OpenTag | TokenKind::Eof => {}
            TokenKind::OpenTagEcho => self.backup(),
            _ => self.expected(&[TokenKind::OpenTag, TokenKind::Eof])?,
        }
        Ok(echo)
    }

    fn parse_statements_until(&mut self, ends: &[TokenKind]) -> PResult<Vec<StmtId<'ast>>> {
        let mut statements = Vec::new();
        loop {
            self.next()?;
            if self.current.kind == TokenKind::Eof || ends.contains(&self.current.kind) {
                return Ok(statements);
            }
            if let Some(stmt) = self.parse_stmt()? {
                statements.push(stmt);
            }
        }
    }

    /// `{ ... }` with `current` on the opening brace.
    fn parse_block_body(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let statements = self.parse_statements_until(&[TokenKind::CloseBrace])?;
        if self.current.kind != TokenKind::CloseBrace {
            self.expected(&[TokenKind::CloseBrace])?;
        }
        Ok(self.alloc_stmt(Stmt::Block {
            statements: self.alloc_slice(statements),
            scope: self.scope,
            span: self.span_from(start),
        }))
    }

    /// A block that must start with the next token.
    fn parse_block(&mut self) -> PResult<StmtId<'ast>> {
        let next = self.peek();
        if next.kind != TokenKind::OpenBrace {
            self.expected_token(next, &[TokenKind::OpenBrace])?;
            return Ok(self.alloc_stmt(Stmt::Block {
                statements: &[],
                scope: self.scope,
                span: Span::new(next.begin.offset, next.begin.offset),
            }));
        }
        self.next()?;
        self.parse_block_body()
    }

    /// Statements up to one of `ends`, for the `:` ... `endX;` syntax. Leaves
    /// `current` on the terminator.
    fn parse_alt_block(&mut self, ends: &[TokenKind]) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let statements = self.parse_statements_until(ends)?;
        Ok(self.alloc_stmt(Stmt::Block {
            statements: self.alloc_slice(statements),
            scope: self.scope,
            span: Span::new(start, self.current.begin.offset),
        }))
    }

    /// Loop body: a statement, or `:` statements `end;`.
    fn parse_loop_body(&mut self, end: TokenKind) -> PResult<StmtId<'ast>> {
        if !self.accept(TokenKind::Colon)? {
            return self.parse_inner_stmt();
        }
        let body = self.parse_alt_block(&[end])?;
        if self.current.kind == end {
            self.expect_stmt_end()?;
        } else {
            self.expected(&[end])?;
        }
        Ok(body)
    }

    /// A branch body, wrapped in a block when it is a single statement.
    fn parse_branch_body(&mut self) -> PResult<StmtId<'ast>> {
        let stmt = self.parse_inner_stmt()?;
        if let Stmt::Block { .. } = stmt {
            return Ok(stmt);
        }
        Ok(self.alloc_stmt(Stmt::Block {
            statements: self.alloc_slice(vec![stmt]),
            scope: self.scope,
            span: stmt.span(),
        }))
    }

    /// `( expr )`
    fn parse_condition(&mut self) -> PResult<ExprId<'ast>> {
        self.expect(TokenKind::OpenParen)?;
        let condition = self.parse_next_expression()?;
        self.expect(TokenKind::CloseParen)?;
        Ok(condition)
    }

    fn skip_to_stmt_end(&mut self) -> PResult<()> {
        loop {
            match self.peek().kind {
                TokenKind::SemiColon => return self.next(),
                TokenKind::CloseTag | TokenKind::Eof => return Ok(()),
                _ => self.next()?,
            }
        }
    }

    fn parse_global(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let mut vars = Vec::new();
        loop {
            self.next()?;
            if self.current.kind != TokenKind::Dollar {
                self.expected(&[TokenKind::Dollar])?;
                break;
            }
            vars.push(self.parse_variable()?);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect_stmt_end()?;
        Ok(self.alloc_stmt(Stmt::Global {
            vars: self.alloc_slice(vars),
            span: self.span_from(start),
        }))
    }

    /// `namespace` directives are dropped; a braced body is kept as a block.
    fn parse_namespace(&mut self) -> PResult<Option<StmtId<'ast>>> {
        let name = if self.accept(TokenKind::Identifier)? {
            self.current.text
        } else {
            ""
        };
        tracing::debug!(namespace = name, "ignoring namespace directive");
        if self.accept(TokenKind::OpenBrace)? {
            return Ok(Some(self.parse_block_body()?));
        }
        self.expect_stmt_end()?;
        Ok(None)
    }

    fn parse_static(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let mut vars = Vec::new();
        loop {
            self.next()?;
            if self.current.kind != TokenKind::Dollar {
                self.expected(&[TokenKind::Dollar])?;
                break;
            }
            let var_start = self.current.begin.offset;
            let var = self.parse_variable()?;
            let default = if self.accept(TokenKind::Eq)? {
                Some(self.parse_next_expression()?)
            } else {
                None
            };
            vars.push(StaticVar {
                var,
                default,
                span: self.span_from(var_start),
            });
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect_stmt_end()?;
        Ok(self.alloc_stmt(Stmt::Static {
            vars: self.alloc_slice(vars),
            span: self.span_from(start),
        }))
    }

    /// `echo a, b;`, `print a;` and `<?= a ?>`.
    fn parse_echo(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let single = self.current.kind == TokenKind::Print;
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_next_expression()?);
            if single || !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect_stmt_end()?;
        Ok(self.alloc_stmt(Stmt::Echo {
            exprs: self.alloc_slice(exprs),
            span: self.span_from(start),
        }))
    }

    fn parse_jump(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let kind = self.current.kind;
        let expr = match self.peek().kind {
            TokenKind::SemiColon | TokenKind::CloseTag | TokenKind::Eof => None,
            _ => Some(self.parse_next_expression()?),
        };
        self.expect_stmt_end()?;
        let span = self.span_from(start);
        Ok(self.alloc_stmt(match kind {
            TokenKind::Return => Stmt::Return { expr, span },
            TokenKind::Break => Stmt::Break { expr, span },
            TokenKind::Continue => Stmt::Continue { expr, span },
            _ => Stmt::Throw { expr, span },
        }))
    }

    fn parse_if(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let mut branches = Vec::new();
        let mut else_block = None;

        let condition = self.parse_condition()?;
        let branch_start = start;
        if self.accept(TokenKind::Colon)? {
            let body = self.parse_alt_block(&[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf])?;
            branches.push(IfBranch {
                condition,
                body,
                span: Span::new(branch_start, body.span().end),
            });
            loop {
                match self.current.kind {
                    TokenKind::ElseIf => {
                        let branch_start = self.current.begin.offset;
                        let condition = self.parse_condition()?;
                        self.expect(TokenKind::Colon)?;
                        let body = self.parse_alt_block(&[
                            TokenKind::ElseIf,
                            TokenKind::Else,
                            TokenKind::EndIf,
                        ])?;
                        branches.push(IfBranch {
                            condition,
                            body,
                            span: Span::new(branch_start, body.span().end),
                        });
                    }
                    TokenKind::Else => {
                        self.expect(TokenKind::Colon)?;
                        else_block = Some(self.parse_alt_block(&[TokenKind::EndIf])?);
                    }
                    TokenKind::EndIf => {
                        self.expect_stmt_end()?;
                        break;
                    }
                    _ => {
                        self.expected(&[TokenKind::EndIf])?;
                        break;
                    }
                }
            }
        } else {
            let body = self.parse_branch_body()?;
            branches.push(IfBranch {
                condition,
                body,
                span: Span::new(branch_start, body.span().end),
            });
            loop {
                match self.peek().kind {
                    TokenKind::ElseIf => {
                        self.next()?;
                        self.push_branch(&mut branches)?;
                    }
                    TokenKind::Else => {
                        self.next()?;
                        if self.accept(TokenKind::If)? {
                            self.push_branch(&mut branches)?;
                        } else {
                            else_block = Some(self.parse_branch_body()?);
                            break;
                        }
                    }
                    _ => break,
                }
            }
        }

        Ok(self.alloc_stmt(Stmt::If {
            branches: self.alloc_slice(branches),
            else_block,
            span: self.span_from(start),
        }))
    }

    fn push_branch(&mut self, branches: &mut Vec<IfBranch<'ast>>) -> PResult<()> {
        let start = self.current.begin.offset;
        let condition = self.parse_condition()?;
        let body = self.parse_branch_body()?;
        branches.push(IfBranch {
            condition,
            body,
            span: Span::new(start, body.span().end),
        });
        Ok(())
    }

    fn parse_while(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let condition = self.parse_condition()?;
        let body = self.parse_loop_body(TokenKind::EndWhile)?;
        Ok(self.alloc_stmt(Stmt::While {
            condition,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_do_while(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let body = self.parse_inner_stmt()?;
        self.expect(TokenKind::While)?;
        let condition = self.parse_condition()?;
        self.expect_stmt_end()?;
        Ok(self.alloc_stmt(Stmt::DoWhile {
            body,
            condition,
            span: self.span_from(start),
        }))
    }

    fn parse_for(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        self.expect(TokenKind::OpenParen)?;
        let init = self.parse_expression_list(TokenKind::SemiColon)?;
        let condition = self.parse_expression_list(TokenKind::SemiColon)?;
        let step = self.parse_expression_list(TokenKind::CloseParen)?;
        let body = self.parse_loop_body(TokenKind::EndFor)?;
        Ok(self.alloc_stmt(Stmt::For {
            init,
            condition,
            step,
            body,
            span: self.span_from(start),
        }))
    }

    /// Comma separated expressions, consuming the terminator.
    fn parse_expression_list(&mut self, end: TokenKind) -> PResult<&'ast [ExprId<'ast>]> {
        let mut exprs = Vec::new();
        if self.accept(end)? {
            return Ok(&[]);
        }
        loop {
            exprs.push(self.parse_next_expression()?);
            self.next()?;
            match self.current.kind {
                TokenKind::Comma => {}
                kind if kind == end => break,
                _ => {
                    self.expected(&[TokenKind::Comma, end])?;
                    break;
                }
            }
        }
        Ok(self.alloc_slice(exprs))
    }

    fn parse_foreach(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        self.expect(TokenKind::OpenParen)?;
        let source = self.parse_next_expression()?;
        self.expect(TokenKind::As)?;

        self.next()?;
        let (mut by_ref, mut value) = self.parse_foreach_target()?;
        let mut key = None;
        if self.accept(TokenKind::DoubleArrow)? {
            key = Some(value);
            self.next()?;
            (by_ref, value) = self.parse_foreach_target()?;
        }
        self.expect(TokenKind::CloseParen)?;
        let body = self.parse_loop_body(TokenKind::EndForeach)?;
        Ok(self.alloc_stmt(Stmt::Foreach {
            source,
            key,
            value,
            by_ref,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_foreach_target(&mut self) -> PResult<(bool, ExprId<'ast>)> {
        let by_ref = self.current.kind == TokenKind::Ampersand;
        if by_ref {
            self.next()?;
        }
        Ok((by_ref, self.parse_operand()?))
    }

    fn parse_switch(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let subject = self.parse_condition()?;

        self.next()?;
        let end = match self.current.kind {
            TokenKind::OpenBrace => TokenKind::CloseBrace,
            TokenKind::Colon => TokenKind::EndSwitch,
            _ => {
                self.expected(&[TokenKind::OpenBrace])?;
                TokenKind::CloseBrace
            }
        };

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            self.next()?;
            match self.current.kind {
                TokenKind::Case => {
                    let case_start = self.current.begin.offset;
                    let expr = self.parse_next_expression()?;
                    self.expect_case_separator()?;
                    let body = self.parse_case_body()?;
                    cases.push(Case {
                        expr,
                        body,
                        span: self.span_from(case_start),
                    });
                }
                TokenKind::Default => {
                    self.expect_case_separator()?;
                    default = Some(self.parse_case_body()?);
                }
                kind if kind == end => break,
                TokenKind::Eof => {
                    self.expected(&[end])?;
                    break;
                }
                _ => self.error(ParseErrorKind::InvalidSwitchStatement, self.current)?,
            }
        }
        if end == TokenKind::EndSwitch {
            self.expect_stmt_end()?;
        }

        Ok(self.alloc_stmt(Stmt::Switch {
            subject,
            cases: self.alloc_slice(cases),
            default,
            span: self.span_from(start),
        }))
    }

    fn expect_case_separator(&mut self) -> PResult<()> {
        self.next()?;
        if !matches!(self.current.kind, TokenKind::Colon | TokenKind::SemiColon) {
            self.expected(&[TokenKind::Colon])?;
        }
        Ok(())
    }

    /// Statements after a case label, up to the next label or the end of the switch.
    fn parse_case_body(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.end.offset;
        let mut statements = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Case
                | TokenKind::Default
                | TokenKind::CloseBrace
                | TokenKind::EndSwitch
                | TokenKind::Eof => break,
                _ => {}
            }
            self.next()?;
            let kind = self.current.kind;
            match self.parse_stmt()? {
                Some(stmt) => statements.push(stmt),
                None if matches!(kind, TokenKind::CloseTag | TokenKind::OpenTag) => {}
                None => self.error(ParseErrorKind::InvalidSwitchStatement, self.current)?,
            }
        }
        Ok(self.alloc_stmt(Stmt::Block {
            statements: self.alloc_slice(statements),
            scope: self.scope,
            span: Span::new(start, self.current.end.offset.max(start)),
        }))
    }

    fn parse_try(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.accept(TokenKind::Catch)? {
            let catch_start = self.current.begin.offset;
            self.expect(TokenKind::OpenParen)?;
            let mut types = Vec::new();
            loop {
                self.next()?;
                if self.current.kind == TokenKind::Identifier {
                    types.push(self.alloc_str(self.current.text));
                } else {
                    self.expected(&[TokenKind::Identifier])?;
                }
                if !self.accept(TokenKind::Pipe)? {
                    break;
                }
            }
            self.next()?;
            let var = if self.current.kind == TokenKind::Dollar {
                self.parse_variable()?
            } else {
                self.expected(&[TokenKind::Dollar])?;
                self.alloc_expr(Expr::Error {
                    span: self.current.span(),
                })
            };
            self.expect(TokenKind::CloseParen)?;
            let body = self.parse_block()?;
            catches.push(Catch {
                types: self.alloc_slice(types),
                var,
                body,
                span: self.span_from(catch_start),
            });
        }

        let finally = if self.accept(TokenKind::Finally)? {
            Some(self.parse_block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            let next = self.peek();
            self.expected_token(next, &[TokenKind::Catch, TokenKind::Finally])?;
        }

        Ok(self.alloc_stmt(Stmt::Try {
            body,
            catches: self.alloc_slice(catches),
            finally,
            span: self.span_from(start),
        }))
    }

    fn parse_declare(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        self.expect(TokenKind::OpenParen)?;
        let mut directives = Vec::new();
        loop {
            self.next()?;
            let directive_start = self.current.begin.offset;
            if self.current.kind != TokenKind::Identifier {
                self.expected(&[TokenKind::Identifier])?;
                break;
            }
            let name = self.alloc_str(self.current.text);
            self.expect(TokenKind::Eq)?;
            let value = self.parse_next_expression()?;
            directives.push(Directive {
                name,
                value,
                span: self.span_from(directive_start),
            });
            self.next()?;
            match self.current.kind {
                TokenKind::Comma => {}
                TokenKind::CloseParen => break,
                _ => {
                    self.expected(&[TokenKind::Comma, TokenKind::CloseParen])?;
                    break;
                }
            }
        }

        let body = match self.peek().kind {
            TokenKind::SemiColon => {
                self.next()?;
                None
            }
            TokenKind::CloseTag | TokenKind::Eof => None,
            _ => Some(self.parse_inner_stmt()?),
        };
        Ok(self.alloc_stmt(Stmt::Declare {
            directives: self.alloc_slice(directives),
            body,
            span: self.span_from(start),
        }))
    }

    /// Top-level `const A = 1, B = 2;`
    fn parse_const(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let constants = self.parse_constant_list()?;
        let constants: &'ast [Constant<'ast>] = self.alloc_slice(constants);
        let namespace = self.file_set.namespace_mut(&self.namespace);
        for constant in constants {
            namespace.add_constant(constant.name, ConstantEntry::Definition(constant));
        }
        Ok(self.alloc_stmt(Stmt::Const {
            constants,
            span: self.span_from(start),
        }))
    }

    /// `NAME [= expr], ...;` after a `const` keyword.
    fn parse_constant_list(&mut self) -> PResult<Vec<Constant<'ast>>> {
        let mut constants = Vec::new();
        loop {
            self.next()?;
            let start = self.current.begin.offset;
            if !self.current.is_name() {
                self.expected(&[TokenKind::Identifier])?;
                break;
            }
            let name = self.alloc_str(self.current.text);
            let value = if self.accept(TokenKind::Eq)? {
                Some(self.parse_next_expression()?)
            } else {
                None
            };
            constants.push(Constant {
                name,
                value,
                span: self.span_from(start),
            });
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect_stmt_end()?;
        Ok(constants)
    }
}

/// Parses any number of files into one [`FileSet`].
pub struct Driver<'ast> {
    arena: &'ast Bump,
    config: ParserConfig,
    file_set: FileSet<'ast>,
}

impl<'ast> Driver<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self::with_config(arena, ParserConfig::default())
    }

    pub fn with_config(arena: &'ast Bump, config: ParserConfig) -> Self {
        Self {
            arena,
            config,
            file_set: FileSet::new(),
        }
    }

    /// Parses `source` as the file `name`. The file and whatever statements
    /// were recovered are added to the file set even when errors are returned.
    pub fn parse(&mut self, name: &str, source: &str) -> (FileId, Vec<ParseError>) {
        let file_set = std::mem::take(&mut self.file_set);
        let mut parser =
            Parser::with_file_set(Lexer::new(source), self.arena, file_set, self.config.clone())
                .named(name);
        let program = parser.parse_program();
        self.file_set = parser.into_file_set();
        (program.file, program.errors)
    }

    pub fn file_set(&self) -> &FileSet<'ast> {
        &self.file_set
    }

    pub fn into_file_set(self) -> FileSet<'ast> {
        self.file_set
    }
}

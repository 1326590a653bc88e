use super::{PResult, Parser};
use crate::ast::scope::ClassLike;
use crate::ast::*;
use crate::error::ParseErrorKind;
use crate::lexer::token::TokenKind;
use crate::span::Span;

/// Where a member list appears; decides which modifiers are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberContext {
    Class,
    Interface,
}

impl<'src, 'ast> Parser<'src, 'ast> {
    /// `function name(params) [: type] { body }`, registered in the namespace.
    pub(super) fn parse_function(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        self.accept(TokenKind::Ampersand)?;
        self.next()?;
        let name = self.take_name()?;

        let outer = self.enter_scope();
        let scope = self.scope;
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        self.leave_scope(outer);

        let span = self.span_from(start);
        let decl = self.arena.alloc(FunctionDecl {
            name,
            params,
            return_type,
            body,
            scope,
            span,
        });
        if !self.file_set.namespace_mut(&self.namespace).add_function(decl) {
            tracing::debug!(function = name, "function redeclared");
        }
        Ok(self.alloc_stmt(Stmt::Function { decl, span }))
    }

    /// `[static] function [&](params) [use (...)] [: type] { body }`.
    pub(super) fn parse_closure(&mut self, is_static: bool, start: usize) -> PResult<ExprId<'ast>> {
        self.accept(TokenKind::Ampersand)?;

        let outer = self.enter_scope();
        let scope = self.scope;
        let params = self.parse_params()?;
        let uses = if self.accept(TokenKind::Use)? {
            self.parse_closure_uses()?
        } else {
            &[]
        };
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        self.leave_scope(outer);

        let decl = self.arena.alloc(ClosureDecl {
            params,
            uses,
            return_type,
            body,
            is_static,
            scope,
        });
        Ok(self.alloc_expr(Expr::Closure {
            decl,
            span: self.span_from(start),
        }))
    }

    fn parse_closure_uses(&mut self) -> PResult<&'ast [ClosureUse<'ast>]> {
        self.expect(TokenKind::OpenParen)?;
        let mut uses = Vec::new();
        if self.accept(TokenKind::CloseParen)? {
            return Ok(&[]);
        }
        loop {
            self.next()?;
            let start = self.current.begin.offset;
            let by_ref = self.current.kind == TokenKind::Ampersand;
            if by_ref {
                self.next()?;
            }
            if self.current.kind != TokenKind::Dollar {
                self.expected(&[TokenKind::Dollar])?;
                break;
            }
            let var = self.parse_variable()?;
            uses.push(ClosureUse {
                var,
                by_ref,
                span: self.span_from(start),
            });
            self.next()?;
            match self.current.kind {
                TokenKind::Comma => {
                    if self.accept(TokenKind::CloseParen)? {
                        break;
                    }
                }
                TokenKind::CloseParen => break,
                _ => {
                    self.expected(&[TokenKind::Comma, TokenKind::CloseParen])?;
                    break;
                }
            }
        }
        Ok(self.alloc_slice(uses))
    }

    /// `(params)` starting at the next token.
    fn parse_params(&mut self) -> PResult<&'ast [Param<'ast>]> {
        if !self.expect(TokenKind::OpenParen)? {
            return Ok(&[]);
        }
        if self.accept(TokenKind::CloseParen)? {
            return Ok(&[]);
        }
        let mut params = Vec::new();
        loop {
            self.next()?;
            params.push(self.parse_param()?);
            self.next()?;
            match self.current.kind {
                TokenKind::Comma => {
                    if self.accept(TokenKind::CloseParen)? {
                        break;
                    }
                }
                TokenKind::CloseParen => break,
                _ => {
                    self.expected(&[TokenKind::Comma, TokenKind::CloseParen])?;
                    break;
                }
            }
        }
        Ok(self.alloc_slice(params))
    }

    /// `[type] [&] [...] $name [= default]`
    fn parse_param(&mut self) -> PResult<Param<'ast>> {
        let start = self.current.begin.offset;
        let type_hint = self.parse_type_name()?;
        if type_hint.is_some() {
            self.next()?;
        }
        if self.current.kind == TokenKind::Ampersand {
            self.next()?;
        }
        let variadic = self.current.kind == TokenKind::Ellipsis;
        if variadic {
            self.next()?;
        }
        let var = if self.current.kind == TokenKind::Dollar {
            self.parse_variable()?
        } else {
            self.expected(&[TokenKind::Dollar])?;
            self.alloc_expr(Expr::Error {
                span: self.current.span(),
            })
        };
        let default = if self.accept(TokenKind::Eq)? {
            Some(self.parse_next_expression()?)
        } else {
            None
        };
        Ok(Param {
            type_hint,
            var,
            default,
            variadic,
            span: self.span_from(start),
        })
    }

    /// A type written at `current`: `?int`, `array`, `Foo|null`. Leaves
    /// `current` on its last token, or returns `None` without moving.
    fn parse_type_name(&mut self) -> PResult<Option<&'ast str>> {
        fn is_type(kind: TokenKind) -> bool {
            matches!(
                kind,
                TokenKind::Identifier
                    | TokenKind::Array
                    | TokenKind::SelfRef
                    | TokenKind::Static
                    | TokenKind::Parent
                    | TokenKind::Null
                    | TokenKind::False
                    | TokenKind::True
            )
        }

        let mut text = String::new();
        if self.current.kind == TokenKind::Question {
            if !is_type(self.peek().kind) {
                return Ok(None);
            }
            text.push('?');
            self.next()?;
        }
        if !is_type(self.current.kind) {
            return Ok(None);
        }
        text.push_str(self.current.text);
        while self.peek().kind == TokenKind::Pipe && is_type(self.tokens.peek_nth(1).kind) {
            self.next()?;
            self.next()?;
            text.push('|');
            text.push_str(self.current.text);
        }
        Ok(Some(self.alloc_str(&text)))
    }

    fn parse_return_type(&mut self) -> PResult<Option<&'ast str>> {
        if !self.accept(TokenKind::Colon)? {
            return Ok(None);
        }
        self.next()?;
        let hint = self.parse_type_name()?;
        if hint.is_none() {
            self.expected(&[TokenKind::Identifier])?;
        }
        Ok(hint)
    }

    /// A declared name at `current`; reserved words are accepted.
    fn take_name(&mut self) -> PResult<&'ast str> {
        if self.current.is_name() {
            Ok(self.alloc_str(self.current.text))
        } else {
            self.expected(&[TokenKind::Identifier])?;
            Ok("")
        }
    }

    fn take_class_name(&mut self) -> PResult<&'ast str> {
        if self.current.kind == TokenKind::Identifier {
            Ok(self.alloc_str(self.current.text))
        } else {
            self.expected(&[TokenKind::Identifier])?;
            Ok("")
        }
    }

    /// `Name, Name, ...` starting at the next token.
    fn parse_name_list(&mut self) -> PResult<&'ast [&'ast str]> {
        let mut names = Vec::new();
        loop {
            self.next()?;
            names.push(self.take_class_name()?);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        Ok(self.alloc_slice(names))
    }

    pub(super) fn parse_class(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        let modifier = match self.current.kind {
            TokenKind::Abstract => Some(ClassModifier::Abstract),
            TokenKind::Final => Some(ClassModifier::Final),
            _ => None,
        };
        if modifier.is_some() {
            self.expect(TokenKind::Class)?;
        }
        self.next()?;
        let name = self.take_class_name()?;
        let extends = if self.accept(TokenKind::Extends)? {
            self.next()?;
            Some(self.take_class_name()?)
        } else {
            None
        };
        let implements = if self.accept(TokenKind::Implements)? {
            self.parse_name_list()?
        } else {
            &[]
        };

        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let mut constants = Vec::new();
        if self.expect(TokenKind::OpenBrace)? {
            self.parse_members(
                MemberContext::Class,
                &mut methods,
                &mut properties,
                &mut constants,
            )?;
        }

        let span = self.span_from(start);
        let decl = self.arena.alloc(ClassDecl {
            name,
            modifier,
            extends,
            implements,
            methods: self.alloc_slice(methods),
            properties: self.alloc_slice(properties),
            constants: self.alloc_slice(constants),
            span,
        });
        if !self
            .file_set
            .namespace_mut(&self.namespace)
            .add_class(ClassLike::Class(decl))
        {
            tracing::debug!(class = name, "class redeclared");
        }
        Ok(self.alloc_stmt(Stmt::Class { decl, span }))
    }

    pub(super) fn parse_interface(&mut self) -> PResult<StmtId<'ast>> {
        let start = self.current.begin.offset;
        self.next()?;
        let name = self.take_class_name()?;
        let extends = if self.accept(TokenKind::Extends)? {
            self.parse_name_list()?
        } else {
            &[]
        };

        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let mut constants = Vec::new();
        if self.expect(TokenKind::OpenBrace)? {
            self.parse_members(
                MemberContext::Interface,
                &mut methods,
                &mut properties,
                &mut constants,
            )?;
        }

        let span = self.span_from(start);
        let decl = self.arena.alloc(InterfaceDecl {
            name,
            extends,
            methods: self.alloc_slice(methods),
            constants: self.alloc_slice(constants),
            span,
        });
        if !self
            .file_set
            .namespace_mut(&self.namespace)
            .add_class(ClassLike::Interface(decl))
        {
            tracing::debug!(interface = name, "interface redeclared");
        }
        Ok(self.alloc_stmt(Stmt::Interface { decl, span }))
    }

    /// Members up to and including the closing brace.
    fn parse_members(
        &mut self,
        context: MemberContext,
        methods: &mut Vec<Method<'ast>>,
        properties: &mut Vec<Property<'ast>>,
        constants: &mut Vec<Constant<'ast>>,
    ) -> PResult<()> {
        loop {
            match self.peek().kind {
                TokenKind::CloseBrace => {
                    self.next()?;
                    return Ok(());
                }
                TokenKind::Eof => {
                    self.next()?;
                    return self.expected(&[TokenKind::CloseBrace]);
                }
                _ => {}
            }

            let start = self.peek().begin.offset;
            let modifiers = self.parse_modifiers()?;
            self.next()?;
            match self.current.kind {
                TokenKind::Function => {
                    if context == MemberContext::Interface
                        && (modifiers.is_abstract || modifiers.is_final)
                    {
                        self.inapplicable_modifier(&modifiers, "interface method")?;
                    }
                    methods.push(self.parse_method(modifiers, context, start)?);
                }
                TokenKind::Const => {
                    if modifiers.is_static || modifiers.is_abstract || modifiers.is_final {
                        self.inapplicable_modifier(&modifiers, "constant")?;
                    }
                    constants.extend(self.parse_constant_list()?);
                }
                TokenKind::Use if context == MemberContext::Class => {
                    self.skip_to_stmt_end()?;
                }
                TokenKind::Var | TokenKind::Dollar if context == MemberContext::Class => {
                    if modifiers.is_abstract || modifiers.is_final {
                        self.inapplicable_modifier(&modifiers, "property")?;
                    }
                    self.parse_properties(modifiers, None, start, properties)?;
                }
                _ if context == MemberContext::Class => match self.parse_type_name()? {
                    Some(hint) => {
                        self.next()?;
                        self.parse_properties(modifiers, Some(hint), start, properties)?;
                    }
                    None => self.expected(&[
                        TokenKind::Function,
                        TokenKind::Var,
                        TokenKind::Dollar,
                        TokenKind::Const,
                    ])?,
                },
                _ => self.expected(&[TokenKind::Function, TokenKind::Const])?,
            }
        }
    }

    /// Leading `public static final ...`; repeats are reported.
    fn parse_modifiers(&mut self) -> PResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        let mut has_visibility = false;
        loop {
            let token = self.peek();
            let repeated = match token.kind {
                TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
                    modifiers.visibility = match token.kind {
                        TokenKind::Public => Visibility::Public,
                        TokenKind::Protected => Visibility::Protected,
                        _ => Visibility::Private,
                    };
                    std::mem::replace(&mut has_visibility, true).then_some("visibility")
                }
                TokenKind::Static => {
                    std::mem::replace(&mut modifiers.is_static, true).then_some("static")
                }
                TokenKind::Final => {
                    std::mem::replace(&mut modifiers.is_final, true).then_some("final")
                }
                TokenKind::Abstract => {
                    std::mem::replace(&mut modifiers.is_abstract, true).then_some("abstract")
                }
                _ => return Ok(modifiers),
            };
            self.next()?;
            if let Some(what) = repeated {
                self.error(
                    ParseErrorKind::Modifier(format!("found multiple {what} declarations")),
                    token,
                )?;
            }
        }
    }

    fn inapplicable_modifier(&mut self, modifiers: &Modifiers, member: &str) -> PResult<()> {
        let name = if modifiers.is_abstract {
            "abstract"
        } else if modifiers.is_final {
            "final"
        } else {
            "static"
        };
        self.error(
            ParseErrorKind::Modifier(format!("cannot use the {name} modifier on a {member}")),
            self.current,
        )
    }

    fn parse_method(
        &mut self,
        modifiers: Modifiers,
        context: MemberContext,
        start: usize,
    ) -> PResult<Method<'ast>> {
        self.accept(TokenKind::Ampersand)?;
        self.next()?;
        let name = self.take_name()?;

        let outer = self.enter_scope();
        let scope = self.scope;
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        let bodiless = modifiers.is_abstract || context == MemberContext::Interface;
        let body = if self.peek().kind == TokenKind::OpenBrace || !bodiless {
            if self.accept(TokenKind::SemiColon)? {
                None
            } else {
                Some(self.parse_block()?)
            }
        } else {
            self.expect(TokenKind::SemiColon)?;
            None
        };
        self.leave_scope(outer);

        Ok(Method {
            name,
            modifiers,
            params,
            return_type,
            body,
            scope,
            span: self.span_from(start),
        })
    }

    /// `$a = 1, $b;` with `current` on `var` or the first `$`.
    fn parse_properties(
        &mut self,
        modifiers: Modifiers,
        type_hint: Option<&'ast str>,
        start: usize,
        properties: &mut Vec<Property<'ast>>,
    ) -> PResult<()> {
        if self.current.kind == TokenKind::Var {
            self.next()?;
        }
        let mut property_start = start;
        loop {
            if self.current.kind != TokenKind::Dollar {
                self.expected(&[TokenKind::Dollar])?;
                break;
            }
            self.next()?;
            let name = self.take_name()?;
            let default = if self.accept(TokenKind::Eq)? {
                Some(self.parse_next_expression()?)
            } else {
                None
            };
            properties.push(Property {
                name,
                visibility: modifiers.visibility,
                is_static: modifiers.is_static,
                type_hint,
                default,
                span: Span::new(property_start, self.current.end.offset),
            });
            if !self.accept(TokenKind::Comma)? {
                break;
            }
            self.next()?;
            property_start = self.current.begin.offset;
        }
        self.expect_stmt_end()
    }
}

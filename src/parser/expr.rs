use super::{PResult, Parser};
use crate::ast::scope::ConstantEntry;
use crate::ast::*;
use crate::error::ParseErrorKind;
use crate::lexer::token::TokenKind;
use crate::span::Span;

/// Binding powers, loosest first.
mod prec {
    pub const LOGICAL_OR: u8 = 1;
    pub const LOGICAL_XOR: u8 = 2;
    pub const LOGICAL_AND: u8 = 3;
    pub const TERNARY: u8 = 4;
    pub const COALESCE: u8 = 5;
    pub const BOOLEAN_OR: u8 = 6;
    pub const BOOLEAN_AND: u8 = 7;
    pub const BIT_OR: u8 = 8;
    pub const BIT_XOR: u8 = 9;
    pub const BIT_AND: u8 = 10;
    pub const EQUALITY: u8 = 11;
    pub const COMPARISON: u8 = 12;
    pub const SHIFT: u8 = 13;
    pub const ADDITIVE: u8 = 14;
    pub const MULTIPLICATIVE: u8 = 15;
    pub const NOT: u8 = 16;
    pub const INSTANCE_OF: u8 = 17;
    pub const ASSIGNMENT: u8 = 17;
    pub const UNARY: u8 = 18;
    pub const POW: u8 = 19;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8, Assoc)> {
    use Assoc::*;
    use TokenKind::*;
    Some(match kind {
        LogicalOr => (BinaryOp::LogicalOr, prec::LOGICAL_OR, Left),
        LogicalXor => (BinaryOp::LogicalXor, prec::LOGICAL_XOR, Left),
        LogicalAnd => (BinaryOp::LogicalAnd, prec::LOGICAL_AND, Left),
        Coalesce => (BinaryOp::Coalesce, prec::COALESCE, Right),
        BooleanOr => (BinaryOp::BooleanOr, prec::BOOLEAN_OR, Left),
        BooleanAnd => (BinaryOp::BooleanAnd, prec::BOOLEAN_AND, Left),
        Pipe => (BinaryOp::BitOr, prec::BIT_OR, Left),
        Caret => (BinaryOp::BitXor, prec::BIT_XOR, Left),
        Ampersand => (BinaryOp::BitAnd, prec::BIT_AND, Left),
        EqEq => (BinaryOp::Equal, prec::EQUALITY, Left),
        NotEq => (BinaryOp::NotEqual, prec::EQUALITY, Left),
        Identical => (BinaryOp::Identical, prec::EQUALITY, Left),
        NotIdentical => (BinaryOp::NotIdentical, prec::EQUALITY, Left),
        Spaceship => (BinaryOp::Spaceship, prec::EQUALITY, Left),
        Lt => (BinaryOp::Less, prec::COMPARISON, Left),
        LtEq => (BinaryOp::LessOrEqual, prec::COMPARISON, Left),
        Gt => (BinaryOp::Greater, prec::COMPARISON, Left),
        GtEq => (BinaryOp::GreaterOrEqual, prec::COMPARISON, Left),
        Sl => (BinaryOp::ShiftLeft, prec::SHIFT, Left),
        Sr => (BinaryOp::ShiftRight, prec::SHIFT, Left),
        Plus => (BinaryOp::Add, prec::ADDITIVE, Left),
        Minus => (BinaryOp::Sub, prec::ADDITIVE, Left),
        Dot => (BinaryOp::Concat, prec::ADDITIVE, Left),
        Asterisk => (BinaryOp::Mul, prec::MULTIPLICATIVE, Left),
        Slash => (BinaryOp::Div, prec::MULTIPLICATIVE, Left),
        Percent => (BinaryOp::Mod, prec::MULTIPLICATIVE, Left),
        InstanceOf => (BinaryOp::InstanceOf, prec::INSTANCE_OF, Left),
        Pow => (BinaryOp::Pow, prec::POW, Right),
        _ => return None,
    })
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    use TokenKind::*;
    Some(match kind {
        Eq => AssignOp::Assign,
        PlusEq => AssignOp::Add,
        MinusEq => AssignOp::Sub,
        MulEq => AssignOp::Mul,
        DivEq => AssignOp::Div,
        ConcatEq => AssignOp::Concat,
        ModEq => AssignOp::Mod,
        AndEq => AssignOp::BitAnd,
        OrEq => AssignOp::BitOr,
        XorEq => AssignOp::BitXor,
        SlEq => AssignOp::ShiftLeft,
        SrEq => AssignOp::ShiftRight,
        PowEq => AssignOp::Pow,
        CoalesceEq => AssignOp::Coalesce,
        _ => return None,
    })
}

fn cast_token(kind: TokenKind) -> Option<CastKind> {
    use TokenKind::*;
    Some(match kind {
        IntCast => CastKind::Int,
        FloatCast => CastKind::Float,
        StringCast => CastKind::String,
        BoolCast => CastKind::Bool,
        ArrayCast => CastKind::Array,
        ObjectCast => CastKind::Object,
        UnsetCast => CastKind::Unset,
        _ => return None,
    })
}

/// Tokens that may follow a spelled-out cast such as `( int )`.
fn begins_operand(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Dollar
            | Identifier
            | StringLiteral
            | NumberLiteral
            | True
            | False
            | Null
            | ShellCommand
            | OpenParen
            | OpenBracket
            | Array
            | List
            | New
            | Clone
            | Function
            | Static
            | SelfRef
            | Parent
            | Exit
            | Print
            | Bang
            | BitNot
            | Inc
            | Dec
            | At
    ) || kind.is_cast()
}

fn is_callable(expr: &Expr<'_>) -> bool {
    matches!(
        expr,
        Expr::Variable { .. }
            | Expr::ArrayLookup { .. }
            | Expr::PropertyFetch { .. }
            | Expr::ClassLookup { .. }
            | Expr::Call { .. }
            | Expr::MethodCall { .. }
            | Expr::Closure { .. }
            | Expr::Identifier { .. }
    )
}

/// Short noun for an expression, used in diagnostics.
fn describe(expr: &Expr<'_>) -> &'static str {
    match expr {
        Expr::Literal { .. } => "a literal",
        Expr::Identifier { .. } | Expr::ConstantRef { .. } => "a constant",
        Expr::Binary { .. } => "a binary expression",
        Expr::Unary { .. } => "a unary expression",
        Expr::Ternary { .. } => "a ternary expression",
        Expr::Assign { .. } => "an assignment",
        Expr::Call { .. } | Expr::MethodCall { .. } => "a call",
        Expr::New { .. } => "a `new` expression",
        Expr::Closure { .. } => "a closure",
        Expr::Include { .. } => "an include",
        Expr::Print { .. } => "`print`",
        Expr::ShellCommand { .. } => "a shell command",
        Expr::Exit { .. } => "`exit`",
        _ => "this expression",
    }
}

fn is_float(text: &str) -> bool {
    let hex_or_binary = text.len() > 1 && matches!(&text.as_bytes()[..2], b"0x" | b"0X" | b"0b" | b"0B");
    !hex_or_binary && text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
}

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parses a full expression starting at `current`, leaving `current` on
    /// its last token.
    pub(super) fn parse_expression(&mut self) -> PResult<ExprId<'ast>> {
        let paren_level = self.paren_level;
        let expr = self.parse_expr_bp(0)?;
        if self.paren_level != paren_level {
            self.error(ParseErrorKind::UnbalancedParens, self.current)?;
            self.paren_level = paren_level;
        }
        Ok(expr)
    }

    pub(super) fn parse_next_expression(&mut self) -> PResult<ExprId<'ast>> {
        self.next()?;
        self.parse_expression()
    }

    /// An expression nested inside brackets, where `new` no longer owns a
    /// following argument list.
    fn parse_nested_expression(&mut self) -> PResult<ExprId<'ast>> {
        let instantiation = std::mem::replace(&mut self.instantiation, false);
        let expr = self.parse_next_expression();
        self.instantiation = instantiation;
        expr
    }

    fn parse_expr_bp(&mut self, min: u8) -> PResult<ExprId<'ast>> {
        let start = self.current.begin.offset;
        let mut left = self.parse_unary()?;

        loop {
            let next = self.peek();

            if let Some(op) = assign_op(next.kind) {
                // A valid target binds the assignment whatever the surrounding
                // precedence, so `!$a = f()` negates the assignment.
                if !left.is_assignable() {
                    if prec::ASSIGNMENT < min {
                        break;
                    }
                    self.error(
                        ParseErrorKind::Unassignable(describe(left).to_string()),
                        next,
                    )?;
                }
                self.next()?;
                self.next()?;
                let value = self.parse_expr_bp(prec::TERNARY)?;
                left = self.alloc_expr(Expr::Assign {
                    target: left,
                    op,
                    value,
                    span: Span::new(start, value.span().end),
                });
                continue;
            }

            if next.kind == TokenKind::Question {
                if prec::TERNARY < min {
                    break;
                }
                self.next()?;
                let if_true = if self.peek().kind == TokenKind::Colon {
                    None
                } else {
                    Some(self.parse_nested_expression()?)
                };
                self.expect(TokenKind::Colon)?;
                self.next()?;
                let if_false = self.parse_expr_bp(prec::TERNARY)?;
                left = self.alloc_expr(Expr::Ternary {
                    condition: left,
                    if_true,
                    if_false,
                    span: Span::new(start, if_false.span().end),
                });
                continue;
            }

            let Some((op, precedence, assoc)) = binary_op(next.kind) else {
                break;
            };
            if precedence < min {
                break;
            }
            self.next()?;
            let right = if op == BinaryOp::InstanceOf {
                self.parse_class_reference()?
            } else {
                self.next()?;
                let min = match assoc {
                    Assoc::Left => precedence + 1,
                    Assoc::Right => precedence,
                };
                self.parse_expr_bp(min)?
            };
            left = self.alloc_expr(Expr::Binary {
                left,
                op,
                right,
                span: Span::new(start, right.span().end),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<ExprId<'ast>> {
        use TokenKind::*;
        let start = self.current.begin.offset;
        let (op, precedence) = match self.current.kind {
            Bang => (UnaryOp::Not, prec::NOT),
            BitNot => (UnaryOp::BitNot, prec::UNARY),
            Minus => (UnaryOp::Minus, prec::UNARY),
            Plus => (UnaryOp::Plus, prec::UNARY),
            Inc => (UnaryOp::Inc, prec::UNARY),
            Dec => (UnaryOp::Dec, prec::UNARY),
            At => (UnaryOp::ErrorSuppress, prec::UNARY),
            Ampersand => (UnaryOp::Reference, prec::UNARY),
            Clone => (UnaryOp::Clone, prec::UNARY),
            Ellipsis => (UnaryOp::Spread, prec::UNARY),
            kind if kind.is_cast() => match cast_token(kind) {
                Some(cast) => (UnaryOp::Cast(cast), prec::UNARY),
                None => return self.parse_operand(),
            },
            OpenParen => match self.spelled_cast()? {
                Some(cast) => (UnaryOp::Cast(cast), prec::UNARY),
                None => return self.parse_operand(),
            },
            _ => return self.parse_operand(),
        };
        self.next()?;
        let operand = self.parse_expr_bp(precedence)?;
        Ok(self.alloc_expr(Expr::Unary {
            op,
            operand,
            postfix: false,
            span: Span::new(start, operand.span().end),
        }))
    }

    /// `( int )` written with spaces lexes as three tokens. Consumes them and
    /// returns the cast when the parenthesis is followed by a cast name, `)`
    /// and the start of an operand.
    fn spelled_cast(&mut self) -> PResult<Option<CastKind>> {
        let name = self.tokens.peek_nth(0);
        if !name.is_name() || self.tokens.peek_nth(1).kind != TokenKind::CloseParen {
            return Ok(None);
        }
        let Some(cast) = CastKind::from_name(name.text) else {
            return Ok(None);
        };
        if !begins_operand(self.tokens.peek_nth(2).kind) {
            return Ok(None);
        }
        self.next()?;
        self.next()?;
        Ok(Some(cast))
    }

    /// A primary expression followed by any postfix components.
    pub(super) fn parse_operand(&mut self) -> PResult<ExprId<'ast>> {
        use TokenKind::*;
        let start = self.current.begin.offset;
        let span = self.current.span();
        let kind = self.current.kind;
        let expr = match kind {
            StringLiteral => self.literal(LiteralKind::String),
            NumberLiteral if is_float(self.current.text) => self.literal(LiteralKind::Float),
            NumberLiteral => self.literal(LiteralKind::Integer),
            True | False => self.literal(LiteralKind::Boolean),
            Null => self.literal(LiteralKind::Null),
            ShellCommand => self.alloc_expr(Expr::ShellCommand {
                command: self.alloc_str(self.current.text),
                span,
            }),
            Dollar => self.parse_variable()?,
            Identifier => self.parse_name_operand()?,
            SelfRef | Parent | Static if self.peek().kind == DoubleColon => {
                let class = self.identifier();
                self.next()?;
                self.parse_scope_member(class, start)?
            }
            Static if self.peek().kind == Function => {
                self.next()?;
                self.parse_closure(true, start)?
            }
            Function => self.parse_closure(false, start)?,
            New => self.parse_new()?,
            Array if self.peek().kind == OpenParen => {
                self.next()?;
                self.parse_array_items(CloseParen, start)?
            }
            OpenBracket => self.parse_array_items(CloseBracket, start)?,
            List => self.parse_list()?,
            OpenParen => self.parse_parenthesized()?,
            Include | IncludeOnce | Require | RequireOnce => {
                let kind = match self.current.kind {
                    Include => IncludeKind::Include,
                    IncludeOnce => IncludeKind::IncludeOnce,
                    Require => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };
                self.next()?;
                let expr = self.parse_expr_bp(prec::TERNARY)?;
                self.alloc_expr(Expr::Include {
                    kind,
                    expr,
                    span: Span::new(start, expr.span().end),
                })
            }
            Print => {
                self.next()?;
                let expr = self.parse_expr_bp(prec::TERNARY)?;
                self.alloc_expr(Expr::Print {
                    expr,
                    span: Span::new(start, expr.span().end),
                })
            }
            Exit => self.parse_exit()?,
            _ => {
                self.expected(&[Identifier, Dollar, StringLiteral, NumberLiteral])?;
                if matches!(self.current.kind, CloseTag | Eof) {
                    self.backup();
                }
                return Ok(self.alloc_expr(Expr::Error { span }));
            }
        };
        self.parse_components(expr, start)
    }

    fn literal(&self, kind: LiteralKind) -> ExprId<'ast> {
        self.alloc_expr(Expr::Literal {
            kind,
            value: self.alloc_str(self.current.text),
            span: self.current.span(),
        })
    }

    fn identifier(&self) -> ExprId<'ast> {
        self.alloc_expr(Expr::Identifier {
            name: self.alloc_str(self.current.text),
            span: self.current.span(),
        })
    }

    /// `$name`, `${expr}` or `$$name`, registered in the current scope.
    pub(super) fn parse_variable(&mut self) -> PResult<ExprId<'ast>> {
        let start = self.current.begin.offset;
        self.next()?;
        let name = match self.current.kind {
            TokenKind::OpenBrace => {
                let inner = self.parse_nested_expression()?;
                self.expect(TokenKind::CloseBrace)?;
                VarName::Dynamic(inner)
            }
            TokenKind::Dollar => VarName::Dynamic(self.parse_variable()?),
            _ if self.current.is_name() => VarName::Static(self.alloc_str(self.current.text)),
            _ => {
                self.expected(&[TokenKind::Identifier])?;
                return Ok(self.alloc_expr(Expr::Error {
                    span: self.span_from(start),
                }));
            }
        };
        let var = self.alloc_expr(Expr::Variable {
            name,
            span: self.span_from(start),
        });
        self.file_set.register_variable(self.scope, var);
        Ok(var)
    }

    /// A bare name: a function call, a class member or a constant reference.
    fn parse_name_operand(&mut self) -> PResult<ExprId<'ast>> {
        let start = self.current.begin.offset;
        match self.peek().kind {
            TokenKind::OpenParen if !self.instantiation => {
                let callee = self.identifier();
                self.next()?;
                let args = self.parse_call_args()?;
                Ok(self.alloc_expr(Expr::Call {
                    callee,
                    args,
                    span: self.span_from(start),
                }))
            }
            TokenKind::DoubleColon => {
                let class = self.identifier();
                self.next()?;
                self.parse_scope_member(class, start)
            }
            _ if self.instantiation => Ok(self.identifier()),
            _ => {
                let name = self.alloc_str(self.current.text);
                let constant = self.alloc_expr(Expr::ConstantRef {
                    name,
                    span: self.current.span(),
                });
                self.file_set
                    .namespace_mut(&self.namespace)
                    .add_constant(name, ConstantEntry::Reference(constant));
                Ok(constant)
            }
        }
    }

    /// The member after `::`, with `current` on the `::`.
    fn parse_scope_member(&mut self, class: ExprId<'ast>, start: usize) -> PResult<ExprId<'ast>> {
        self.next()?;
        let member = match self.current.kind {
            TokenKind::Dollar => self.parse_variable()?,
            _ if self.current.is_name() => {
                let name = self.identifier();
                if !self.instantiation && self.peek().kind == TokenKind::OpenParen {
                    let call_start = self.current.begin.offset;
                    self.next()?;
                    let args = self.parse_call_args()?;
                    self.alloc_expr(Expr::Call {
                        callee: name,
                        args,
                        span: self.span_from(call_start),
                    })
                } else {
                    name
                }
            }
            _ => {
                self.expected(&[TokenKind::Identifier])?;
                self.alloc_expr(Expr::Error {
                    span: self.current.span(),
                })
            }
        };
        Ok(self.alloc_expr(Expr::ClassLookup {
            class,
            member,
            span: self.span_from(start),
        }))
    }

    /// Postfix operators, member access, indexing and calls.
    fn parse_components(&mut self, mut expr: ExprId<'ast>, start: usize) -> PResult<ExprId<'ast>> {
        loop {
            let next = self.peek();
            expr = match next.kind {
                TokenKind::Inc | TokenKind::Dec if expr.is_assignable() => {
                    self.next()?;
                    let op = if next.kind == TokenKind::Inc {
                        UnaryOp::Inc
                    } else {
                        UnaryOp::Dec
                    };
                    self.alloc_expr(Expr::Unary {
                        op,
                        operand: expr,
                        postfix: true,
                        span: self.span_from(start),
                    })
                }
                TokenKind::Arrow => {
                    self.next()?;
                    self.parse_member_access(expr, start)?
                }
                TokenKind::DoubleColon
                    if matches!(
                        expr,
                        Expr::Variable { .. } | Expr::ArrayLookup { .. } | Expr::PropertyFetch { .. }
                    ) =>
                {
                    self.next()?;
                    self.parse_scope_member(expr, start)?
                }
                TokenKind::OpenBracket => {
                    self.next()?;
                    if self.accept(TokenKind::CloseBracket)? {
                        self.alloc_expr(Expr::ArrayAppend {
                            array: expr,
                            span: self.span_from(start),
                        })
                    } else {
                        let index = self.parse_nested_expression()?;
                        self.expect(TokenKind::CloseBracket)?;
                        self.alloc_expr(Expr::ArrayLookup {
                            array: expr,
                            index,
                            span: self.span_from(start),
                        })
                    }
                }
                // `$s{0}` is only an index when the brace touches the operand.
                TokenKind::OpenBrace
                    if next.begin.offset == self.current.end.offset
                        && matches!(
                            expr,
                            Expr::Variable { .. }
                                | Expr::ArrayLookup { .. }
                                | Expr::PropertyFetch { .. }
                        ) =>
                {
                    self.next()?;
                    let index = self.parse_nested_expression()?;
                    self.expect(TokenKind::CloseBrace)?;
                    self.alloc_expr(Expr::ArrayLookup {
                        array: expr,
                        index,
                        span: self.span_from(start),
                    })
                }
                TokenKind::OpenParen if !self.instantiation && is_callable(expr) => {
                    self.next()?;
                    let args = self.parse_call_args()?;
                    self.alloc_expr(Expr::Call {
                        callee: expr,
                        args,
                        span: self.span_from(start),
                    })
                }
                _ => return Ok(expr),
            };
        }
    }

    /// The member after `->`, with `current` on the arrow.
    fn parse_member_access(&mut self, receiver: ExprId<'ast>, start: usize) -> PResult<ExprId<'ast>> {
        self.next()?;
        let member = match self.current.kind {
            TokenKind::OpenBrace => {
                let inner = self.parse_nested_expression()?;
                self.expect(TokenKind::CloseBrace)?;
                inner
            }
            TokenKind::Dollar => self.parse_variable()?,
            _ if self.current.is_name() => self.identifier(),
            _ => {
                self.expected(&[TokenKind::Identifier])?;
                self.alloc_expr(Expr::Error {
                    span: self.current.span(),
                })
            }
        };
        if !self.instantiation && self.peek().kind == TokenKind::OpenParen {
            self.next()?;
            let args = self.parse_call_args()?;
            return Ok(self.alloc_expr(Expr::MethodCall {
                receiver,
                method: member,
                args,
                span: self.span_from(start),
            }));
        }
        Ok(self.alloc_expr(Expr::PropertyFetch {
            receiver,
            property: member,
            span: self.span_from(start),
        }))
    }

    /// Arguments with `current` on the opening parenthesis. A trailing comma
    /// is allowed.
    pub(super) fn parse_call_args(&mut self) -> PResult<&'ast [ExprId<'ast>]> {
        let mut args = Vec::new();
        if self.accept(TokenKind::CloseParen)? {
            return Ok(&[]);
        }
        loop {
            args.push(self.parse_nested_expression()?);
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
        Ok(self.alloc_slice(args))
    }

    /// The right operand of `instanceof`.
    fn parse_class_reference(&mut self) -> PResult<ExprId<'ast>> {
        self.next()?;
        match self.current.kind {
            TokenKind::Identifier | TokenKind::SelfRef | TokenKind::Static | TokenKind::Parent => {
                Ok(self.identifier())
            }
            _ => self.parse_expr_bp(prec::UNARY),
        }
    }

    fn parse_new(&mut self) -> PResult<ExprId<'ast>> {
        let start = self.current.begin.offset;
        let instantiation = std::mem::replace(&mut self.instantiation, true);
        self.next()?;
        let class = match self.current.kind {
            TokenKind::Identifier | TokenKind::SelfRef | TokenKind::Static | TokenKind::Parent => {
                Ok(self.identifier())
            }
            TokenKind::Dollar => {
                let class_start = self.current.begin.offset;
                self.parse_variable()
                    .and_then(|var| self.parse_components(var, class_start))
            }
            TokenKind::OpenParen => self.parse_parenthesized(),
            _ => self.expected(&[TokenKind::Identifier]).map(|()| {
                self.alloc_expr(Expr::Error {
                    span: self.current.span(),
                })
            }),
        };
        self.instantiation = instantiation;
        let class = class?;

        let args = if self.accept(TokenKind::OpenParen)? {
            self.parse_call_args()?
        } else {
            &[]
        };
        Ok(self.alloc_expr(Expr::New {
            class,
            args,
            span: self.span_from(start),
        }))
    }

    fn parse_parenthesized(&mut self) -> PResult<ExprId<'ast>> {
        self.paren_level += 1;
        let inner = self.parse_nested_expression()?;
        // A missing `)` leaves the level raised so the enclosing expression
        // reports the imbalance.
        if self.accept(TokenKind::CloseParen)? {
            self.paren_level -= 1;
        }
        Ok(inner)
    }

    /// `array(...)` or `[...]` with `current` on the opening token.
    fn parse_array_items(&mut self, close: TokenKind, start: usize) -> PResult<ExprId<'ast>> {
        let mut items = Vec::new();
        loop {
            if self.accept(close)? {
                break;
            }
            if self.peek().kind == TokenKind::Eof {
                self.next()?;
                self.expected(&[close])?;
                break;
            }
            self.next()?;
            let item_start = self.current.begin.offset;
            let (by_ref, value) = self.parse_array_value()?;
            let item = if self.accept(TokenKind::DoubleArrow)? {
                self.next()?;
                let (by_ref, target) = self.parse_array_value()?;
                ArrayItem {
                    key: Some(value),
                    value: target,
                    by_ref,
                    span: self.span_from(item_start),
                }
            } else {
                ArrayItem {
                    key: None,
                    value,
                    by_ref,
                    span: self.span_from(item_start),
                }
            };
            items.push(item);
            if !self.accept(TokenKind::Comma)? {
                if !self.accept(close)? {
                    self.next()?;
                    self.expected(&[TokenKind::Comma, close])?;
                }
                break;
            }
        }
        Ok(self.alloc_expr(Expr::Array {
            items: self.alloc_slice(items),
            span: self.span_from(start),
        }))
    }

    fn parse_array_value(&mut self) -> PResult<(bool, ExprId<'ast>)> {
        let by_ref = self.current.kind == TokenKind::Ampersand;
        if by_ref {
            self.next()?;
        }
        let instantiation = std::mem::replace(&mut self.instantiation, false);
        let value = self.parse_expression();
        self.instantiation = instantiation;
        Ok((by_ref, value?))
    }

    /// `list($a, , $b)`; skipped slots are `None`.
    fn parse_list(&mut self) -> PResult<ExprId<'ast>> {
        let start = self.current.begin.offset;
        self.expect(TokenKind::OpenParen)?;
        let mut items = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::CloseParen => {
                    self.next()?;
                    break;
                }
                TokenKind::Comma => {
                    self.next()?;
                    items.push(None);
                    continue;
                }
                TokenKind::Eof => {
                    self.next()?;
                    self.expected(&[TokenKind::CloseParen])?;
                    break;
                }
                _ => {}
            }
            items.push(Some(self.parse_nested_expression()?));
            match self.peek().kind {
                TokenKind::Comma => self.next()?,
                TokenKind::CloseParen => {
                    self.next()?;
                    break;
                }
                _ => {
                    self.next()?;
                    self.expected(&[TokenKind::Comma, TokenKind::CloseParen])?;
                    break;
                }
            }
        }
        Ok(self.alloc_expr(Expr::List {
            items: self.alloc_slice(items),
            span: self.span_from(start),
        }))
    }

    /// `exit`, `exit()` or `exit(expr)`; `die` lexes the same way.
    fn parse_exit(&mut self) -> PResult<ExprId<'ast>> {
        let start = self.current.begin.offset;
        let mut expr = None;
        if self.accept(TokenKind::OpenParen)? && !self.accept(TokenKind::CloseParen)? {
            expr = Some(self.parse_nested_expression()?);
            self.expect(TokenKind::CloseParen)?;
        }
        Ok(self.alloc_expr(Expr::Exit {
            expr,
            span: self.span_from(start),
        }))
    }
}

pub mod locator;
pub mod scope;
pub mod sexpr;
pub mod types;
pub mod visitor;

use crate::error::ParseError;
use crate::span::Span;
use scope::{FileId, ScopeId};
use serde::Serialize;

pub type ExprId<'ast> = &'ast Expr<'ast>;
pub type StmtId<'ast> = &'ast Stmt<'ast>;

#[derive(Debug, Serialize)]
pub struct Program<'ast> {
    pub file: FileId,
    pub statements: &'ast [StmtId<'ast>],
    pub errors: Vec<ParseError>,
    pub span: Span,
}

impl Program<'_> {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A borrowed handle to either kind of node.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum AstNode<'ast> {
    Stmt(StmtId<'ast>),
    Expr(ExprId<'ast>),
}

impl<'ast> AstNode<'ast> {
    pub fn span(&self) -> Span {
        match self {
            AstNode::Stmt(s) => s.span(),
            AstNode::Expr(e) => e.span(),
        }
    }

    pub fn children(&self) -> Vec<AstNode<'ast>> {
        match self {
            AstNode::Stmt(s) => s.children(),
            AstNode::Expr(e) => e.children(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Visibility {
    Private,
    Protected,
    #[default]
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassModifier {
    Abstract,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

#[derive(Debug, Serialize)]
pub enum Stmt<'ast> {
    Expression {
        expr: ExprId<'ast>,
        span: Span,
    },
    Block {
        statements: &'ast [StmtId<'ast>],
        scope: ScopeId,
        span: Span,
    },
    /// `echo`, `print`, `<?=` and template text.
    Echo {
        exprs: &'ast [ExprId<'ast>],
        span: Span,
    },
    Return {
        expr: Option<ExprId<'ast>>,
        span: Span,
    },
    Break {
        expr: Option<ExprId<'ast>>,
        span: Span,
    },
    Continue {
        expr: Option<ExprId<'ast>>,
        span: Span,
    },
    Throw {
        expr: Option<ExprId<'ast>>,
        span: Span,
    },
    If {
        branches: &'ast [IfBranch<'ast>],
        else_block: Option<StmtId<'ast>>,
        span: Span,
    },
    While {
        condition: ExprId<'ast>,
        body: StmtId<'ast>,
        span: Span,
    },
    DoWhile {
        body: StmtId<'ast>,
        condition: ExprId<'ast>,
        span: Span,
    },
    For {
        init: &'ast [ExprId<'ast>],
        condition: &'ast [ExprId<'ast>],
        step: &'ast [ExprId<'ast>],
        body: StmtId<'ast>,
        span: Span,
    },
    Foreach {
        source: ExprId<'ast>,
        key: Option<ExprId<'ast>>,
        value: ExprId<'ast>,
        by_ref: bool,
        body: StmtId<'ast>,
        span: Span,
    },
    Switch {
        subject: ExprId<'ast>,
        cases: &'ast [Case<'ast>],
        default: Option<StmtId<'ast>>,
        span: Span,
    },
    Try {
        body: StmtId<'ast>,
        catches: &'ast [Catch<'ast>],
        finally: Option<StmtId<'ast>>,
        span: Span,
    },
    Function {
        decl: &'ast FunctionDecl<'ast>,
        span: Span,
    },
    Class {
        decl: &'ast ClassDecl<'ast>,
        span: Span,
    },
    Interface {
        decl: &'ast InterfaceDecl<'ast>,
        span: Span,
    },
    Const {
        constants: &'ast [Constant<'ast>],
        span: Span,
    },
    Global {
        vars: &'ast [ExprId<'ast>],
        span: Span,
    },
    Static {
        vars: &'ast [StaticVar<'ast>],
        span: Span,
    },
    Declare {
        directives: &'ast [Directive<'ast>],
        body: Option<StmtId<'ast>>,
        span: Span,
    },
    Nop {
        span: Span,
    },
}

#[derive(Debug, Serialize)]
pub struct IfBranch<'ast> {
    pub condition: ExprId<'ast>,
    pub body: StmtId<'ast>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct Case<'ast> {
    pub expr: ExprId<'ast>,
    pub body: StmtId<'ast>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct Catch<'ast> {
    pub types: &'ast [&'ast str],
    pub var: ExprId<'ast>,
    pub body: StmtId<'ast>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct Param<'ast> {
    pub type_hint: Option<&'ast str>,
    pub var: ExprId<'ast>,
    pub default: Option<ExprId<'ast>>,
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct ClosureUse<'ast> {
    pub var: ExprId<'ast>,
    pub by_ref: bool,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct FunctionDecl<'ast> {
    pub name: &'ast str,
    pub params: &'ast [Param<'ast>],
    pub return_type: Option<&'ast str>,
    pub body: StmtId<'ast>,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct ClosureDecl<'ast> {
    pub params: &'ast [Param<'ast>],
    pub uses: &'ast [ClosureUse<'ast>],
    pub return_type: Option<&'ast str>,
    pub body: StmtId<'ast>,
    pub is_static: bool,
    pub scope: ScopeId,
}

#[derive(Debug, Serialize)]
pub struct Method<'ast> {
    pub name: &'ast str,
    pub modifiers: Modifiers,
    pub params: &'ast [Param<'ast>],
    pub return_type: Option<&'ast str>,
    /// `None` for abstract and interface methods.
    pub body: Option<StmtId<'ast>>,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct Property<'ast> {
    /// Without the leading `$`.
    pub name: &'ast str,
    pub visibility: Visibility,
    pub is_static: bool,
    pub type_hint: Option<&'ast str>,
    pub default: Option<ExprId<'ast>>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct Constant<'ast> {
    pub name: &'ast str,
    pub value: Option<ExprId<'ast>>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct ClassDecl<'ast> {
    pub name: &'ast str,
    pub modifier: Option<ClassModifier>,
    pub extends: Option<&'ast str>,
    pub implements: &'ast [&'ast str],
    pub methods: &'ast [Method<'ast>],
    pub properties: &'ast [Property<'ast>],
    pub constants: &'ast [Constant<'ast>],
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct InterfaceDecl<'ast> {
    pub name: &'ast str,
    pub extends: &'ast [&'ast str],
    pub methods: &'ast [Method<'ast>],
    pub constants: &'ast [Constant<'ast>],
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct StaticVar<'ast> {
    pub var: ExprId<'ast>,
    pub default: Option<ExprId<'ast>>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct Directive<'ast> {
    pub name: &'ast str,
    pub value: ExprId<'ast>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub enum Expr<'ast> {
    Literal {
        kind: LiteralKind,
        /// Source text, quotes included for string literals.
        value: &'ast str,
        span: Span,
    },
    Identifier {
        name: &'ast str,
        span: Span,
    },
    Variable {
        name: VarName<'ast>,
        span: Span,
    },
    Binary {
        left: ExprId<'ast>,
        op: BinaryOp,
        right: ExprId<'ast>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId<'ast>,
        postfix: bool,
        span: Span,
    },
    Ternary {
        condition: ExprId<'ast>,
        /// `None` for the short form `a ?: b`.
        if_true: Option<ExprId<'ast>>,
        if_false: ExprId<'ast>,
        span: Span,
    },
    Assign {
        target: ExprId<'ast>,
        op: AssignOp,
        value: ExprId<'ast>,
        span: Span,
    },
    Call {
        callee: ExprId<'ast>,
        args: &'ast [ExprId<'ast>],
        span: Span,
    },
    MethodCall {
        receiver: ExprId<'ast>,
        method: ExprId<'ast>,
        args: &'ast [ExprId<'ast>],
        span: Span,
    },
    PropertyFetch {
        receiver: ExprId<'ast>,
        property: ExprId<'ast>,
        span: Span,
    },
    /// `Class::member`, where the member is a call, variable or name.
    ClassLookup {
        class: ExprId<'ast>,
        member: ExprId<'ast>,
        span: Span,
    },
    New {
        class: ExprId<'ast>,
        args: &'ast [ExprId<'ast>],
        span: Span,
    },
    Array {
        items: &'ast [ArrayItem<'ast>],
        span: Span,
    },
    ArrayLookup {
        array: ExprId<'ast>,
        index: ExprId<'ast>,
        span: Span,
    },
    ArrayAppend {
        array: ExprId<'ast>,
        span: Span,
    },
    ShellCommand {
        command: &'ast str,
        span: Span,
    },
    Include {
        kind: IncludeKind,
        expr: ExprId<'ast>,
        span: Span,
    },
    /// `print` in expression position; always evaluates to 1.
    Print {
        expr: ExprId<'ast>,
        span: Span,
    },
    Closure {
        decl: &'ast ClosureDecl<'ast>,
        span: Span,
    },
    ConstantRef {
        name: &'ast str,
        span: Span,
    },
    List {
        items: &'ast [Option<ExprId<'ast>>],
        span: Span,
    },
    Exit {
        expr: Option<ExprId<'ast>>,
        span: Span,
    },
    Error {
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum VarName<'ast> {
    Static(&'ast str),
    Dynamic(ExprId<'ast>),
}

#[derive(Debug, Serialize)]
pub struct ArrayItem<'ast> {
    pub key: Option<ExprId<'ast>>,
    pub value: ExprId<'ast>,
    pub by_ref: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiteralKind {
    String,
    Integer,
    Float,
    Boolean,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

impl IncludeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IncludeKind::Include => "include",
            IncludeKind::IncludeOnce => "include_once",
            IncludeKind::Require => "require",
            IncludeKind::RequireOnce => "require_once",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    BooleanAnd,
    BooleanOr,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Spaceship,
    Coalesce,
    InstanceOf,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Concat => ".",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BooleanAnd => "&&",
            BinaryOp::BooleanOr => "||",
            BinaryOp::LogicalAnd => "and",
            BinaryOp::LogicalOr => "or",
            BinaryOp::LogicalXor => "xor",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Spaceship => "<=>",
            BinaryOp::Coalesce => "??",
            BinaryOp::InstanceOf => "instanceof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastKind {
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
    Unset,
    Null,
}

impl CastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CastKind::Int => "int",
            CastKind::Float => "float",
            CastKind::String => "string",
            CastKind::Bool => "bool",
            CastKind::Array => "array",
            CastKind::Object => "object",
            CastKind::Unset => "unset",
            CastKind::Null => "null",
        }
    }

    /// Spelled-out cast names accepted between parentheses.
    pub fn from_name(name: &str) -> Option<CastKind> {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Some(CastKind::Int),
            "float" | "double" | "real" => Some(CastKind::Float),
            "string" => Some(CastKind::String),
            "bool" | "boolean" => Some(CastKind::Bool),
            "array" => Some(CastKind::Array),
            "object" => Some(CastKind::Object),
            "unset" => Some(CastKind::Unset),
            "null" => Some(CastKind::Null),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    Inc,
    Dec,
    ErrorSuppress,
    Reference,
    Clone,
    Spread,
    Cast(CastKind),
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
            UnaryOp::ErrorSuppress => "@",
            UnaryOp::Reference => "&",
            UnaryOp::Clone => "clone",
            UnaryOp::Spread => "...",
            UnaryOp::Cast(kind) => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    Pow,
    Coalesce,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Concat => ".=",
            AssignOp::Mod => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::ShiftLeft => "<<=",
            AssignOp::ShiftRight => ">>=",
            AssignOp::Pow => "**=",
            AssignOp::Coalesce => "??=",
        }
    }
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expression { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::Echo { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span, .. }
            | Stmt::Continue { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Foreach { span, .. }
            | Stmt::Switch { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Function { span, .. }
            | Stmt::Class { span, .. }
            | Stmt::Interface { span, .. }
            | Stmt::Const { span, .. }
            | Stmt::Global { span, .. }
            | Stmt::Static { span, .. }
            | Stmt::Declare { span, .. }
            | Stmt::Nop { span } => *span,
        }
    }

    /// Directly owned nodes, in source order.
    pub fn children(&'ast self) -> Vec<AstNode<'ast>> {
        let mut out = Vec::new();
        match self {
            Stmt::Expression { expr, .. } => out.push(AstNode::Expr(expr)),
            Stmt::Block { statements, .. } => {
                out.extend(statements.iter().map(|s| AstNode::Stmt(s)));
            }
            Stmt::Echo { exprs, .. } | Stmt::Global { vars: exprs, .. } => {
                out.extend(exprs.iter().map(|e| AstNode::Expr(e)));
            }
            Stmt::Return { expr, .. }
            | Stmt::Break { expr, .. }
            | Stmt::Continue { expr, .. }
            | Stmt::Throw { expr, .. } => out.extend(expr.map(AstNode::Expr)),
            Stmt::If {
                branches,
                else_block,
                ..
            } => {
                for branch in *branches {
                    out.push(AstNode::Expr(branch.condition));
                    out.push(AstNode::Stmt(branch.body));
                }
                out.extend(else_block.map(AstNode::Stmt));
            }
            Stmt::While {
                condition, body, ..
            } => {
                out.push(AstNode::Expr(condition));
                out.push(AstNode::Stmt(body));
            }
            Stmt::DoWhile {
                body, condition, ..
            } => {
                out.push(AstNode::Stmt(body));
                out.push(AstNode::Expr(condition));
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
                ..
            } => {
                for expr in init.iter().chain(condition.iter()).chain(step.iter()) {
                    out.push(AstNode::Expr(expr));
                }
                out.push(AstNode::Stmt(body));
            }
            Stmt::Foreach {
                source,
                key,
                value,
                body,
                ..
            } => {
                out.push(AstNode::Expr(source));
                out.extend(key.map(AstNode::Expr));
                out.push(AstNode::Expr(value));
                out.push(AstNode::Stmt(body));
            }
            Stmt::Switch {
                subject,
                cases,
                default,
                ..
            } => {
                out.push(AstNode::Expr(subject));
                for case in *cases {
                    out.push(AstNode::Expr(case.expr));
                    out.push(AstNode::Stmt(case.body));
                }
                out.extend(default.map(AstNode::Stmt));
            }
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                out.push(AstNode::Stmt(body));
                for catch in *catches {
                    out.push(AstNode::Expr(catch.var));
                    out.push(AstNode::Stmt(catch.body));
                }
                out.extend(finally.map(AstNode::Stmt));
            }
            Stmt::Function { decl, .. } => {
                push_params(&mut out, decl.params);
                out.push(AstNode::Stmt(decl.body));
            }
            Stmt::Class { decl, .. } => {
                push_constants(&mut out, decl.constants);
                for property in decl.properties {
                    out.extend(property.default.map(AstNode::Expr));
                }
                push_methods(&mut out, decl.methods);
            }
            Stmt::Interface { decl, .. } => {
                push_constants(&mut out, decl.constants);
                push_methods(&mut out, decl.methods);
            }
            Stmt::Const { constants, .. } => push_constants(&mut out, constants),
            Stmt::Static { vars, .. } => {
                for var in *vars {
                    out.push(AstNode::Expr(var.var));
                    out.extend(var.default.map(AstNode::Expr));
                }
            }
            Stmt::Declare {
                directives, body, ..
            } => {
                out.extend(directives.iter().map(|d| AstNode::Expr(d.value)));
                out.extend(body.map(AstNode::Stmt));
            }
            Stmt::Nop { .. } => {}
        }
        out
    }
}

fn push_params<'ast>(out: &mut Vec<AstNode<'ast>>, params: &'ast [Param<'ast>]) {
    for param in params {
        out.push(AstNode::Expr(param.var));
        out.extend(param.default.map(AstNode::Expr));
    }
}

fn push_constants<'ast>(out: &mut Vec<AstNode<'ast>>, constants: &'ast [Constant<'ast>]) {
    out.extend(constants.iter().filter_map(|c| c.value.map(AstNode::Expr)));
}

fn push_methods<'ast>(out: &mut Vec<AstNode<'ast>>, methods: &'ast [Method<'ast>]) {
    for method in methods {
        push_params(out, method.params);
        out.extend(method.body.map(AstNode::Stmt));
    }
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Call { span, .. }
            | Expr::MethodCall { span, .. }
            | Expr::PropertyFetch { span, .. }
            | Expr::ClassLookup { span, .. }
            | Expr::New { span, .. }
            | Expr::Array { span, .. }
            | Expr::ArrayLookup { span, .. }
            | Expr::ArrayAppend { span, .. }
            | Expr::ShellCommand { span, .. }
            | Expr::Include { span, .. }
            | Expr::Print { span, .. }
            | Expr::Closure { span, .. }
            | Expr::ConstantRef { span, .. }
            | Expr::List { span, .. }
            | Expr::Exit { span, .. }
            | Expr::Error { span } => *span,
        }
    }

    /// Valid left-hand sides of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Variable { .. }
                | Expr::ArrayLookup { .. }
                | Expr::ArrayAppend { .. }
                | Expr::PropertyFetch { .. }
                | Expr::ClassLookup { .. }
                | Expr::List { .. }
                | Expr::Array { .. }
                | Expr::Error { .. }
        )
    }

    /// The static name of a plain variable, if it has one.
    pub fn variable_name(&self) -> Option<&'ast str> {
        match self {
            Expr::Variable {
                name: VarName::Static(name),
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// Directly owned nodes, in source order.
    pub fn children(&'ast self) -> Vec<AstNode<'ast>> {
        let mut out = Vec::new();
        match self {
            Expr::Literal { .. }
            | Expr::Identifier { .. }
            | Expr::ShellCommand { .. }
            | Expr::ConstantRef { .. }
            | Expr::Error { .. } => {}
            Expr::Variable { name, .. } => {
                if let VarName::Dynamic(inner) = name {
                    out.push(AstNode::Expr(inner));
                }
            }
            Expr::Binary { left, right, .. } => {
                out.push(AstNode::Expr(left));
                out.push(AstNode::Expr(right));
            }
            Expr::Unary { operand, .. } => out.push(AstNode::Expr(operand)),
            Expr::Ternary {
                condition,
                if_true,
                if_false,
                ..
            } => {
                out.push(AstNode::Expr(condition));
                out.extend(if_true.map(AstNode::Expr));
                out.push(AstNode::Expr(if_false));
            }
            Expr::Assign { target, value, .. } => {
                out.push(AstNode::Expr(target));
                out.push(AstNode::Expr(value));
            }
            Expr::Call { callee, args, .. } => {
                out.push(AstNode::Expr(callee));
                out.extend(args.iter().map(|a| AstNode::Expr(a)));
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
                ..
            } => {
                out.push(AstNode::Expr(receiver));
                out.push(AstNode::Expr(method));
                out.extend(args.iter().map(|a| AstNode::Expr(a)));
            }
            Expr::PropertyFetch {
                receiver, property, ..
            } => {
                out.push(AstNode::Expr(receiver));
                out.push(AstNode::Expr(property));
            }
            Expr::ClassLookup { class, member, .. } => {
                out.push(AstNode::Expr(class));
                out.push(AstNode::Expr(member));
            }
            Expr::New { class, args, .. } => {
                out.push(AstNode::Expr(class));
                out.extend(args.iter().map(|a| AstNode::Expr(a)));
            }
            Expr::Array { items, .. } => {
                for item in *items {
                    out.extend(item.key.map(AstNode::Expr));
                    out.push(AstNode::Expr(item.value));
                }
            }
            Expr::ArrayLookup { array, index, .. } => {
                out.push(AstNode::Expr(array));
                out.push(AstNode::Expr(index));
            }
            Expr::ArrayAppend { array, .. } => out.push(AstNode::Expr(array)),
            Expr::Include { expr, .. } | Expr::Print { expr, .. } => out.push(AstNode::Expr(expr)),
            Expr::Closure { decl, .. } => {
                push_params(&mut out, decl.params);
                out.extend(decl.uses.iter().map(|u| AstNode::Expr(u.var)));
                out.push(AstNode::Stmt(decl.body));
            }
            Expr::List { items, .. } => {
                out.extend(items.iter().flatten().map(|e| AstNode::Expr(e)));
            }
            Expr::Exit { expr, .. } => out.extend(expr.map(AstNode::Expr)),
        }
        out
    }
}

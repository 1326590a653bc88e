use crate::span::{Position, Span};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub begin: Position,
    pub end: Position,
}

impl<'src> Token<'src> {
    pub fn span(&self) -> Span {
        Span::new(self.begin.offset, self.end.offset)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_significant(&self) -> bool {
        self.kind.type_class().intersects(TypeClass::SIGNIFICANT)
    }

    /// Identifiers and reserved words, which may name functions, methods and constants.
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Identifier || self.kind.is_reserved_word()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Identifier
            | TokenKind::StringLiteral
            | TokenKind::NumberLiteral
            | TokenKind::Error => write!(f, "{} `{}`", self.kind, self.text),
            _ => write!(f, "`{}`", self.text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Framing
    InlineHtml,
    OpenTag,
    OpenTagEcho,
    CloseTag,
    Eof,
    Error,
    Whitespace,
    LineComment,
    BlockComment,

    // Keywords
    Function,
    Static,
    SelfRef,
    Parent,
    Final,
    Var,
    Global,
    Return,
    Namespace,
    Use,
    Echo,
    Print,
    If,
    Else,
    ElseIf,
    While,
    Do,
    For,
    Foreach,
    Switch,
    Case,
    Default,
    EndIf,
    EndFor,
    EndForeach,
    EndWhile,
    EndSwitch,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Throw,
    Class,
    Const,
    Abstract,
    Private,
    Protected,
    Public,
    Interface,
    Implements,
    Extends,
    New,
    List,
    Array,
    Exit,
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
    Declare,
    Clone,
    As,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    InstanceOf,

    // Markers
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Comma,
    SemiColon,
    OpenBracket,
    CloseBracket,

    // Operators
    Eq,
    PlusEq,
    MinusEq,
    MulEq,
    DivEq,
    ConcatEq,
    ModEq,
    AndEq,
    OrEq,
    XorEq,
    SlEq,
    SrEq,
    PowEq,
    CoalesceEq,
    EqEq,
    Identical,
    NotEq,
    NotIdentical,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,
    Bang,
    Inc,
    Dec,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Pow,
    Dot,
    BooleanAnd,
    BooleanOr,
    Ampersand,
    Pipe,
    Caret,
    BitNot,
    Sl,
    Sr,
    Question,
    Coalesce,
    Colon,
    DoubleArrow,
    Arrow,
    DoubleColon,
    Dollar,
    At,
    Ellipsis,

    // Casts
    IntCast,
    FloatCast,
    StringCast,
    BoolCast,
    ArrayCast,
    ObjectCast,
    UnsetCast,

    // Literals
    StringLiteral,
    NumberLiteral,
    True,
    False,
    Null,
    ShellCommand,
    Identifier,
}

/// Bitmask over the broad categories a token kind belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TypeClass(u8);

impl TypeClass {
    pub const NONE: TypeClass = TypeClass(0);
    pub const INVALID: TypeClass = TypeClass(1 << 0);
    pub const KEYWORD: TypeClass = TypeClass(1 << 1);
    pub const LITERAL: TypeClass = TypeClass(1 << 2);
    pub const MARKER: TypeClass = TypeClass(1 << 3);
    pub const OPERATOR: TypeClass = TypeClass(1 << 4);
    pub const IDENTIFIER: TypeClass = TypeClass(1 << 5);
    pub const COMMENT: TypeClass = TypeClass(1 << 6);
    pub const WHITESPACE: TypeClass = TypeClass(1 << 7);
    pub const SIGNIFICANT: TypeClass = TypeClass(
        Self::KEYWORD.0 | Self::LITERAL.0 | Self::MARKER.0 | Self::OPERATOR.0 | Self::IDENTIFIER.0,
    );
    pub const ALL: TypeClass = TypeClass(u8::MAX);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: TypeClass) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: TypeClass) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for TypeClass {
    type Output = TypeClass;

    fn bitor(self, rhs: TypeClass) -> TypeClass {
        TypeClass(self.0 | rhs.0)
    }
}

impl fmt::Debug for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(TypeClass, &str); 8] = [
            (TypeClass::INVALID, "INVALID"),
            (TypeClass::KEYWORD, "KEYWORD"),
            (TypeClass::LITERAL, "LITERAL"),
            (TypeClass::MARKER, "MARKER"),
            (TypeClass::OPERATOR, "OPERATOR"),
            (TypeClass::IDENTIFIER, "IDENTIFIER"),
            (TypeClass::COMMENT, "COMMENT"),
            (TypeClass::WHITESPACE, "WHITESPACE"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(class, _)| self.contains(*class))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

/// Surface forms recognized by longest match. Keys are lowercase; the source is
/// matched case-insensitively.
const CATALOG_ENTRIES: &[(&str, TokenKind)] = &[
    ("function", TokenKind::Function),
    ("static", TokenKind::Static),
    ("self", TokenKind::SelfRef),
    ("parent", TokenKind::Parent),
    ("final", TokenKind::Final),
    ("var", TokenKind::Var),
    ("global", TokenKind::Global),
    ("return", TokenKind::Return),
    ("namespace", TokenKind::Namespace),
    ("use", TokenKind::Use),
    ("echo", TokenKind::Echo),
    ("print", TokenKind::Print),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("elseif", TokenKind::ElseIf),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("for", TokenKind::For),
    ("foreach", TokenKind::Foreach),
    ("switch", TokenKind::Switch),
    ("case", TokenKind::Case),
    ("default", TokenKind::Default),
    ("endif", TokenKind::EndIf),
    ("endfor", TokenKind::EndFor),
    ("endforeach", TokenKind::EndForeach),
    ("endwhile", TokenKind::EndWhile),
    ("endswitch", TokenKind::EndSwitch),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("try", TokenKind::Try),
    ("catch", TokenKind::Catch),
    ("finally", TokenKind::Finally),
    ("throw", TokenKind::Throw),
    ("class", TokenKind::Class),
    ("const", TokenKind::Const),
    ("abstract", TokenKind::Abstract),
    ("private", TokenKind::Private),
    ("protected", TokenKind::Protected),
    ("public", TokenKind::Public),
    ("interface", TokenKind::Interface),
    ("implements", TokenKind::Implements),
    ("extends", TokenKind::Extends),
    ("new", TokenKind::New),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
    ("list", TokenKind::List),
    ("array", TokenKind::Array),
    ("exit", TokenKind::Exit),
    ("die", TokenKind::Exit),
    ("include", TokenKind::Include),
    ("include_once", TokenKind::IncludeOnce),
    ("require", TokenKind::Require),
    ("require_once", TokenKind::RequireOnce),
    ("declare", TokenKind::Declare),
    ("clone", TokenKind::Clone),
    ("as", TokenKind::As),
    ("and", TokenKind::LogicalAnd),
    ("or", TokenKind::LogicalOr),
    ("xor", TokenKind::LogicalXor),
    ("instanceof", TokenKind::InstanceOf),
    ("{", TokenKind::OpenBrace),
    ("}", TokenKind::CloseBrace),
    ("(", TokenKind::OpenParen),
    (")", TokenKind::CloseParen),
    (",", TokenKind::Comma),
    (";", TokenKind::SemiColon),
    ("[", TokenKind::OpenBracket),
    ("]", TokenKind::CloseBracket),
    ("=", TokenKind::Eq),
    ("+=", TokenKind::PlusEq),
    ("-=", TokenKind::MinusEq),
    ("*=", TokenKind::MulEq),
    ("/=", TokenKind::DivEq),
    (".=", TokenKind::ConcatEq),
    ("%=", TokenKind::ModEq),
    ("&=", TokenKind::AndEq),
    ("|=", TokenKind::OrEq),
    ("^=", TokenKind::XorEq),
    ("<<=", TokenKind::SlEq),
    (">>=", TokenKind::SrEq),
    ("**=", TokenKind::PowEq),
    ("??=", TokenKind::CoalesceEq),
    ("==", TokenKind::EqEq),
    ("===", TokenKind::Identical),
    ("!=", TokenKind::NotEq),
    ("<>", TokenKind::NotEq),
    ("!==", TokenKind::NotIdentical),
    ("<", TokenKind::Lt),
    ("<=", TokenKind::LtEq),
    (">", TokenKind::Gt),
    (">=", TokenKind::GtEq),
    ("<=>", TokenKind::Spaceship),
    ("!", TokenKind::Bang),
    ("++", TokenKind::Inc),
    ("--", TokenKind::Dec),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Asterisk),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("**", TokenKind::Pow),
    (".", TokenKind::Dot),
    ("&&", TokenKind::BooleanAnd),
    ("||", TokenKind::BooleanOr),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::BitNot),
    ("<<", TokenKind::Sl),
    (">>", TokenKind::Sr),
    ("?", TokenKind::Question),
    ("??", TokenKind::Coalesce),
    (":", TokenKind::Colon),
    ("=>", TokenKind::DoubleArrow),
    ("->", TokenKind::Arrow),
    ("::", TokenKind::DoubleColon),
    ("$", TokenKind::Dollar),
    ("@", TokenKind::At),
    ("...", TokenKind::Ellipsis),
    ("(int)", TokenKind::IntCast),
    ("(integer)", TokenKind::IntCast),
    ("(bool)", TokenKind::BoolCast),
    ("(boolean)", TokenKind::BoolCast),
    ("(float)", TokenKind::FloatCast),
    ("(double)", TokenKind::FloatCast),
    ("(real)", TokenKind::FloatCast),
    ("(string)", TokenKind::StringCast),
    ("(array)", TokenKind::ArrayCast),
    ("(object)", TokenKind::ObjectCast),
    ("(unset)", TokenKind::UnsetCast),
];

static CATALOG: LazyLock<HashMap<&'static [u8], TokenKind>> = LazyLock::new(|| {
    CATALOG_ENTRIES
        .iter()
        .map(|(key, kind)| (key.as_bytes(), *kind))
        .collect()
});

/// Length in bytes of the longest catalog key.
pub static LONGEST_KEY: LazyLock<usize> = LazyLock::new(|| {
    CATALOG_ENTRIES
        .iter()
        .map(|(key, _)| key.len())
        .max()
        .unwrap_or(0)
});

/// Every `(surface form, kind)` pair the lexer recognizes by longest match.
pub fn catalog() -> impl Iterator<Item = (&'static str, TokenKind)> {
    CATALOG_ENTRIES.iter().copied()
}

/// Case-insensitive catalog lookup.
pub fn lookup(text: &[u8]) -> Option<TokenKind> {
    let mut buf = [0u8; 16];
    if text.len() > buf.len() {
        return None;
    }
    let lowered = &mut buf[..text.len()];
    lowered.copy_from_slice(text);
    lowered.make_ascii_lowercase();
    CATALOG.get(&*lowered).copied()
}

impl TokenKind {
    pub fn type_class(self) -> TypeClass {
        use TokenKind::*;
        match self {
            Eof | Error => TypeClass::INVALID,
            Whitespace => TypeClass::WHITESPACE,
            LineComment | BlockComment => TypeClass::COMMENT,
            InlineHtml | StringLiteral | NumberLiteral | True | False | Null | ShellCommand => {
                TypeClass::LITERAL
            }
            Identifier => TypeClass::IDENTIFIER,
            OpenBrace | CloseBrace | OpenParen | CloseParen | Comma | SemiColon | OpenBracket
            | CloseBracket => TypeClass::MARKER,
            LogicalAnd | LogicalOr | LogicalXor | InstanceOf | Clone | New => {
                TypeClass::KEYWORD | TypeClass::OPERATOR
            }
            OpenTag | OpenTagEcho | CloseTag | Function | Static | SelfRef | Parent | Final
            | Var | Global | Return | Namespace | Use | Echo | Print | If | Else | ElseIf
            | While | Do | For | Foreach | Switch | Case | Default | EndIf | EndFor
            | EndForeach | EndWhile | EndSwitch | Break | Continue | Try | Catch | Finally
            | Throw | Class | Const | Abstract | Private | Protected | Public | Interface
            | Implements | Extends | List | Array | Exit | Include | IncludeOnce | Require
            | RequireOnce | Declare | As => TypeClass::KEYWORD,
            _ => TypeClass::OPERATOR,
        }
    }

    /// Alphabetic catalog entries, which turn into identifiers after `$`, `->` and `::`.
    pub fn is_reserved_word(self) -> bool {
        use TokenKind::*;
        match self {
            OpenTag | OpenTagEcho | CloseTag => false,
            True | False | Null => true,
            _ => self.type_class().contains(TypeClass::KEYWORD),
        }
    }

    pub fn is_cast(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntCast | FloatCast | StringCast | BoolCast | ArrayCast | ObjectCast | UnsetCast
        )
    }

    pub fn is_assignment(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Eq | PlusEq
                | MinusEq
                | MulEq
                | DivEq
                | ConcatEq
                | ModEq
                | AndEq
                | OrEq
                | XorEq
                | SlEq
                | SrEq
                | PowEq
                | CoalesceEq
        )
    }

    /// Human readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            InlineHtml => "template text",
            OpenTag => "<?php",
            OpenTagEcho => "<?=",
            CloseTag => "?>",
            Eof => "end of file",
            Error => "invalid token",
            Whitespace => "whitespace",
            LineComment | BlockComment => "comment",
            StringLiteral => "string literal",
            NumberLiteral => "number literal",
            ShellCommand => "shell command",
            Identifier => "identifier",
            _ => CATALOG_ENTRIES
                .iter()
                .find(|(_, kind)| *kind == self)
                .map(|(key, _)| *key)
                .unwrap_or("token"),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        match self {
            InlineHtml | Eof | Error | Whitespace | LineComment | BlockComment | StringLiteral
            | NumberLiteral | ShellCommand | Identifier => f.write_str(self.describe()),
            _ => write!(f, "`{}`", self.describe()),
        }
    }
}

use super::{BinaryOp, Expr, LiteralKind, UnaryOp};
use serde::Serialize;
use std::fmt;
use std::ops::BitOr;

/// Abstract value types, as a set of basic types.
///
/// A single bit is a basic type; several bits form a union. The empty set is
/// `UNKNOWN`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Type(u16);

static BASIC: [(Type, &str); 10] = [
    (Type::STRING, "string"),
    (Type::INTEGER, "integer"),
    (Type::FLOAT, "float"),
    (Type::BOOLEAN, "boolean"),
    (Type::NULL, "null"),
    (Type::RESOURCE, "resource"),
    (Type::ARRAY, "array"),
    (Type::OBJECT, "object"),
    (Type::FUNCTION, "function"),
    (Type::INVALID, "invalid"),
];

impl Type {
    pub const UNKNOWN: Type = Type(0);
    pub const STRING: Type = Type(1 << 0);
    pub const INTEGER: Type = Type(1 << 1);
    pub const FLOAT: Type = Type(1 << 2);
    pub const BOOLEAN: Type = Type(1 << 3);
    pub const NULL: Type = Type(1 << 4);
    pub const RESOURCE: Type = Type(1 << 5);
    pub const ARRAY: Type = Type(1 << 6);
    pub const OBJECT: Type = Type(1 << 7);
    pub const FUNCTION: Type = Type(1 << 8);
    pub const INVALID: Type = Type(1 << 9);
    pub const NUMERIC: Type = Type(Self::INTEGER.0 | Self::FLOAT.0);
    pub const SCALAR: Type = Type(Self::STRING.0 | Self::NUMERIC.0 | Self::BOOLEAN.0);

    pub const fn union(self, other: Type) -> Type {
        Type(self.0 | other.0)
    }

    /// True when every basic type in `other` is also in `self`.
    pub const fn contains(self, other: Type) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_singleton(self) -> bool {
        self.0.count_ones() == 1
    }

    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }

    /// The basic types making up this one.
    pub fn basics(self) -> impl Iterator<Item = Type> {
        BASIC
            .iter()
            .map(|(basic, _)| *basic)
            .filter(move |basic| self.contains(*basic))
    }

    pub fn from_literal(kind: LiteralKind) -> Type {
        match kind {
            LiteralKind::String => Type::STRING,
            LiteralKind::Integer => Type::INTEGER,
            LiteralKind::Float => Type::FLOAT,
            LiteralKind::Boolean => Type::BOOLEAN,
            LiteralKind::Null => Type::NULL,
        }
    }
}

impl BitOr for Type {
    type Output = Type;

    fn bitor(self, rhs: Type) -> Type {
        self.union(rhs)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("unknown");
        }
        let names: Vec<&str> = BASIC
            .iter()
            .filter(|(basic, _)| self.contains(*basic))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

impl Expr<'_> {
    /// Statically known result type. Anything that depends on runtime values
    /// is `UNKNOWN`.
    pub fn evaluates_to(&self) -> Type {
        match self {
            Expr::Literal { kind, .. } => Type::from_literal(*kind),
            Expr::Array { .. } => Type::ARRAY,
            Expr::ShellCommand { .. } => Type::STRING | Type::NULL,
            Expr::New { .. } => Type::OBJECT,
            Expr::Closure { .. } => Type::OBJECT,
            Expr::Print { .. } => Type::INTEGER,
            Expr::Assign { value, .. } => value.evaluates_to(),
            Expr::Ternary {
                condition,
                if_true,
                if_false,
                ..
            } => {
                let truthy = match if_true {
                    Some(expr) => expr.evaluates_to(),
                    None => condition.evaluates_to(),
                };
                let falsy = if_false.evaluates_to();
                if truthy.is_unknown() || falsy.is_unknown() {
                    Type::UNKNOWN
                } else {
                    truthy | falsy
                }
            }
            Expr::Binary { op, .. } => match op {
                BinaryOp::Concat => Type::STRING,
                BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Mod
                | BinaryOp::Pow => Type::NUMERIC,
                BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::Spaceship => Type::INTEGER,
                BinaryOp::BooleanAnd
                | BinaryOp::BooleanOr
                | BinaryOp::LogicalAnd
                | BinaryOp::LogicalOr
                | BinaryOp::LogicalXor
                | BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Identical
                | BinaryOp::NotIdentical
                | BinaryOp::Less
                | BinaryOp::LessOrEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterOrEqual
                | BinaryOp::InstanceOf => Type::BOOLEAN,
                BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Coalesce => {
                    Type::UNKNOWN
                }
            },
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => Type::BOOLEAN,
                UnaryOp::Plus | UnaryOp::Minus => Type::NUMERIC,
                UnaryOp::ErrorSuppress | UnaryOp::Reference => operand.evaluates_to(),
                UnaryOp::Cast(kind) => match kind {
                    super::CastKind::Int => Type::INTEGER,
                    super::CastKind::Float => Type::FLOAT,
                    super::CastKind::String => Type::STRING,
                    super::CastKind::Bool => Type::BOOLEAN,
                    super::CastKind::Array => Type::ARRAY,
                    super::CastKind::Object => Type::OBJECT,
                    super::CastKind::Unset | super::CastKind::Null => Type::NULL,
                },
                _ => Type::UNKNOWN,
            },
            _ => Type::UNKNOWN,
        }
    }
}

use crate::span::{Position, Span};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ParseErrorKind {
    #[error("invalid token `{0}`")]
    Lex(String),
    #[error("found {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("{0}")]
    Modifier(String),
    #[error("cannot assign to {0}")]
    Unassignable(String),
    #[error("invalid statement in switch block")]
    InvalidSwitchStatement,
    #[error("too many errors")]
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{file}:{position}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub position: Position,
    pub file: String,
}

impl ParseError {
    pub fn is_fatal(&self) -> bool {
        self.kind == ParseErrorKind::Fatal
    }
}

/// All errors from one parse, usable as a single error value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} parse error(s), first: {}", .0.len(), first(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

fn first(errors: &[ParseError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }
}

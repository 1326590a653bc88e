pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use error::{ParseError, ParseErrorKind, ParseErrors};
pub use lexer::Lexer;
pub use parser::{Driver, Parser, ParserConfig};
pub use span::{Position, Span};

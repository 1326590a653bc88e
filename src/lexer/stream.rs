use super::token::{Token, TokenKind};
use crate::span::Position;

/// Buffered cursor over a token source with rewind, lookahead and replay.
///
/// Pulled tokens stay in the buffer for the lifetime of the stream, so moving
/// the cursor back and forth always yields the same tokens. Reading past the
/// end keeps returning the final `Eof`.
pub struct TokenStream<'src, I> {
    source: I,
    buffer: Vec<Token<'src>>,
    position: usize,
}

impl<'src, I> TokenStream<'src, I>
where
    I: Iterator<Item = Token<'src>>,
{
    pub fn new(source: I) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            position: 0,
        }
    }

    /// Makes sure `buffer[index]` exists if the source can supply it.
    fn fill(&mut self, index: usize) -> bool {
        while self.buffer.len() <= index {
            match self.source.next() {
                Some(token) => self.buffer.push(token),
                None => return false,
            }
        }
        true
    }

    fn eof_token(&mut self) -> Token<'src> {
        if let Some(last) = self.buffer.last()
            && last.kind == TokenKind::Eof
        {
            return *last;
        }
        let at = self.buffer.last().map_or(Position::START, |t| t.end);
        let eof = Token {
            kind: TokenKind::Eof,
            text: "",
            begin: at,
            end: at,
        };
        self.buffer.push(eof);
        eof
    }

    pub fn next_token(&mut self) -> Token<'src> {
        if self.fill(self.position) {
            let token = self.buffer[self.position];
            self.position += 1;
            token
        } else {
            let eof = self.eof_token();
            self.position = self.buffer.len();
            eof
        }
    }

    /// Steps the cursor back so the next `next_token` replays the last one.
    pub fn previous(&mut self) -> Option<Token<'src>> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(self.buffer[self.position])
    }

    pub fn peek(&mut self) -> Token<'src> {
        if self.fill(self.position) {
            self.buffer[self.position]
        } else {
            self.eof_token()
        }
    }

    /// Looks `n` tokens past the cursor; `peek_nth(0)` is `peek()`.
    pub fn peek_nth(&mut self, n: usize) -> Token<'src> {
        if self.fill(self.position + n) {
            self.buffer[self.position + n]
        } else {
            self.eof_token()
        }
    }

    /// The most recently consumed token.
    pub fn current(&self) -> Option<Token<'src>> {
        self.position.checked_sub(1).map(|i| self.buffer[i])
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor to an absolute index, pulling from the source as needed.
    pub fn seek(&mut self, index: usize) {
        self.fill(index);
        self.position = index.min(self.buffer.len());
    }

    /// Inserts a token so that it is the next one returned.
    pub fn push(&mut self, token: Token<'src>) {
        self.buffer.insert(self.position, token);
    }

    /// Inserts a whole stream in front of the cursor, preserving its order.
    pub fn push_stream(&mut self, tokens: impl IntoIterator<Item = Token<'src>>) {
        let at = self.position;
        self.buffer.splice(at..at, tokens);
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Restartable JSON lexer.
//!
//! The lexer is fed arbitrary chunks of input and hands back one token per
//! call. Strings and numbers may be cut at any byte; the lexer then returns the
//! fragment it has so far with [`Status::More`] and resumes with the next chunk.
//! Strings that contain escapes are decoded in place in the caller's chunk, so
//! no token ever needs more memory than the chunk it arrived in plus the
//! [`RESTART_SIZE`] byte restart buffer.

mod number;
mod restart;
mod string;

pub use restart::RESTART_SIZE;
pub(crate) use restart::RestartBuffer;

use crate::error::{ErrKind, Error, Position};
use crate::shared::{Source, Span, Status};
use crate::utf8::Utf8Decoder;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// No token: input ran out between tokens, or inside a keyword.
    None,
    Null,
    True,
    False,
    String,
    Number,
    ObjectOpen,
    ObjectClose,
    ArrayOpen,
    ArrayClose,
    Comma,
    Colon,
    /// End of stream was declared and everything before it was consumed.
    EndOfStream,
}

impl TokenKind {
    /// Stable name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::None => "NONE",
            TokenKind::Null => "NULL",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::String => "STR",
            TokenKind::Number => "NUM",
            TokenKind::ObjectOpen => "{",
            TokenKind::ObjectClose => "}",
            TokenKind::ArrayOpen => "[",
            TokenKind::ArrayClose => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::EndOfStream => "EOS",
        }
    }

    /// Null, booleans, strings and numbers.
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::String
                | TokenKind::Number
        )
    }
}

/// Progress inside a string token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Str {
    Normal,
    /// After a backslash.
    Escaping,
    /// After `\u`, waiting for hex digit 1..4.
    Unicode0,
    Unicode1,
    Unicode2,
    Unicode3,
    /// A high surrogate was decoded, expecting `\u` and four more digits.
    PairBackslash,
    PairU,
    Pair0,
    Pair1,
    Pair2,
    Pair3,
}

/// Progress inside a number token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Num {
    Sign,
    LeadingZero,
    BeforeDecimalPoint,
    Decimal,
    AfterDecimalPoint,
    Exponent,
    ExponentSign,
    AfterExponent,
}

impl Num {
    /// States in which the digits read so far form a complete number.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Num::LeadingZero | Num::BeforeDecimalPoint | Num::AfterDecimalPoint | Num::AfterExponent
        )
    }
}

/// Where the lexer stopped, i.e. what the next byte continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    /// Between tokens.
    Value,
    /// Inside `true`, `false` or `null`; the bytes so far are in the restart
    /// buffer.
    Keyword,
    String(Str),
    Number(Num),
}

impl LexState {
    /// Stable name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            LexState::Value => "VALUE",
            LexState::Keyword => "KEYWORD",
            LexState::String(s) => match s {
                Str::Normal => "STR",
                Str::Escaping => "ESC1",
                Str::Unicode0 => "ESC2",
                Str::Unicode1 => "ESC3",
                Str::Unicode2 => "ESC4",
                Str::Unicode3 => "ESC5",
                Str::PairBackslash => "PAIR0",
                Str::PairU => "PAIR1",
                Str::Pair0 => "PAIR2",
                Str::Pair1 => "PAIR3",
                Str::Pair2 => "PAIR4",
                Str::Pair3 => "PAIR5",
            },
            LexState::Number(n) => match n {
                Num::Sign => "NUM_NEG",
                Num::LeadingZero => "NUM_DIG0",
                Num::BeforeDecimalPoint => "NUM_DIG",
                Num::Decimal => "NUM_DOT",
                Num::AfterDecimalPoint => "NUM_DIGF",
                Num::Exponent => "NUM_EXP",
                Num::ExponentSign => "NUM_ESGN",
                Num::AfterExponent => "NUM_EDIG",
            },
        }
    }
}

impl core::fmt::Display for LexState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token or token fragment handed to the caller.
///
/// `text` borrows from the chunk being lexed or from the lexer's restart
/// buffer and is valid until the next call. For strings it is the decoded
/// content without quotes; fragments of one string concatenate to the full
/// value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub status: Status,
    pub text: &'a [u8],
    /// Value of a complete number token, when it converts to a finite `f64`
    /// and its text fit the restart buffer.
    pub number: Option<f64>,
}

impl<'a> Token<'a> {
    /// The text as UTF-8, if a fragment boundary did not split a code point.
    pub fn text_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.text).ok()
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.kind == TokenKind::EndOfStream
    }
}

/// Token with its text still expressed as a [`Span`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Lexeme {
    pub kind: TokenKind,
    pub status: Status,
    pub span: Span,
    pub number: Option<f64>,
}

impl Lexeme {
    const fn complete(kind: TokenKind, span: Span) -> Self {
        Lexeme {
            kind,
            status: Status::Complete,
            span,
            number: None,
        }
    }

    const fn more(kind: TokenKind, span: Span) -> Self {
        Lexeme {
            kind,
            status: Status::More,
            span,
            number: None,
        }
    }
}

/// Incremental JSON lexer.
///
/// A lexer owns no input. Each chunk is lent to it through [`Lexer::feed`],
/// which returns a [`Tokens`] cursor; tokens are pulled from the cursor until
/// one comes back with [`Status::More`], then the next chunk is fed.
#[derive(Debug, Clone)]
pub struct Lexer {
    state: LexState,
    /// Read offset into the current chunk.
    off: usize,
    /// No chunk will follow the current one.
    eos: bool,
    pos: Position,
    /// Position before the last byte read, restored by `ungetc`.
    prev: Position,
    token_start: Position,
    restart: RestartBuffer,
    utf8: Utf8Decoder,
    /// A partial token was returned while chunk bytes were still unread.
    undrained: bool,
    /// New input was installed while `undrained` was set.
    misfed: bool,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub const fn new() -> Self {
        Lexer {
            state: LexState::Value,
            off: 0,
            eos: false,
            pos: Position::start(),
            prev: Position::start(),
            token_start: Position::start(),
            restart: RestartBuffer::new(),
            utf8: Utf8Decoder::new(),
            undrained: false,
            misfed: false,
        }
    }

    /// Returns the lexer to its freshly constructed state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Lends the next chunk of input to the lexer.
    ///
    /// The chunk is modified in place when strings contain escapes. Tokens
    /// returned through the cursor borrow from it.
    pub fn feed<'a>(&'a mut self, data: &'a mut [u8]) -> Tokens<'a> {
        self.install(false);
        Tokens { lexer: self, data }
    }

    /// Declares that no more input follows.
    ///
    /// The cursor finishes a trailing number, reports an unterminated token
    /// as [`ErrKind::UnfinishedInput`], or returns an `EndOfStream` token.
    pub fn end_of_stream(&mut self) -> Tokens<'_> {
        self.install(true);
        Tokens {
            lexer: self,
            data: &mut [],
        }
    }

    /// Checks that the input stopped at a token boundary.
    ///
    /// Succeeds between tokens and after digits that form a complete number;
    /// anywhere else the input ended mid-token. The state is back to
    /// [`LexState::Value`] afterwards either way.
    pub fn close(&mut self) -> Result<(), Error> {
        let state = core::mem::replace(&mut self.state, LexState::Value);
        self.undrained = false;
        match state {
            LexState::Value => Ok(()),
            LexState::Number(num) if num.is_terminal() => Ok(()),
            LexState::Keyword | LexState::Number(_) => {
                log::debug!("close in {state}");
                Error::new(
                    ErrKind::UnfinishedInput,
                    self.token_start,
                    self.restart.as_bytes(),
                )
            }
            LexState::String(_) => {
                log::debug!("close in {state}");
                Error::new(ErrKind::UnfinishedInput, self.token_start, &[])
            }
        }
    }

    pub fn state(&self) -> LexState {
        self.state
    }

    /// Position of the next unread byte.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Position of the first byte of the current or last token.
    pub fn token_position(&self) -> Position {
        self.token_start
    }

    pub(crate) fn install(&mut self, eos: bool) {
        if self.undrained {
            log::warn!("new input installed before a partial token was drained");
            self.misfed = true;
        }
        self.off = 0;
        self.eos = eos;
    }

    /// Produces the next token from `data`, the chunk last installed.
    pub(crate) fn lex(&mut self, data: &mut [u8]) -> Result<Lexeme, Error> {
        if self.misfed {
            self.misfed = false;
            self.undrained = false;
            return Error::new(ErrKind::InvalidParams, self.pos, &[]);
        }
        self.undrained = false;
        let entry = self.state;
        let lexeme = match entry {
            LexState::Value => self.lex_value(data),
            LexState::Keyword => self.lex_keyword(data),
            LexState::String(_) => self.lex_string(data),
            LexState::Number(_) => self.lex_number(data),
        }?;
        if lexeme.status == Status::Partial {
            self.undrained = true;
        }
        log::trace!(
            "{} {} ({} -> {})",
            lexeme.status,
            lexeme.kind.as_str(),
            entry,
            self.state
        );
        Ok(lexeme)
    }

    /// Looks up the text of a span produced by [`Lexer::lex`].
    pub(crate) fn resolve<'a>(&'a self, data: &'a [u8], span: Span) -> Result<&'a [u8], Error> {
        let text = match span.source {
            Source::Input => span.slice(data),
            Source::Restart => self.restart.get(span.start, span.len),
            Source::Assembly => None,
        };
        match text {
            Some(text) => Ok(text),
            None => Error::new(ErrKind::InternalError, self.pos, &[]),
        }
    }

    fn getc(&mut self, data: &[u8]) -> Option<u8> {
        let ch = *data.get(self.off)?;
        self.off += 1;
        self.prev = self.pos;
        self.pos.advance(ch);
        Some(ch)
    }

    /// Steps back over the byte returned by the last `getc`.
    fn ungetc(&mut self) {
        if self.off > 0 {
            self.off -= 1;
            self.pos = self.prev;
        }
    }

    fn internal_error<T>(&mut self) -> Result<T, Error> {
        log::error!("lexer reached an impossible state: {}", self.state);
        self.state = LexState::Value;
        Error::new(ErrKind::InternalError, self.pos, &[])
    }

    fn lex_value(&mut self, data: &mut [u8]) -> Result<Lexeme, Error> {
        let ch = loop {
            match self.getc(data) {
                None if self.eos => {
                    return Ok(Lexeme::complete(TokenKind::EndOfStream, Span::empty()))
                }
                None => return Ok(Lexeme::more(TokenKind::None, Span::empty())),
                Some(b' ' | b'\t' | b'\n' | b'\r') => {}
                Some(ch) => break ch,
            }
        };
        self.token_start = self.prev;
        let start = self.off - 1;
        let kind = match ch {
            b'{' => TokenKind::ObjectOpen,
            b'}' => TokenKind::ObjectClose,
            b'[' => TokenKind::ArrayOpen,
            b']' => TokenKind::ArrayClose,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'"' => {
                self.state = LexState::String(Str::Normal);
                self.utf8.reset();
                return self.lex_string(data);
            }
            b'-' | b'0'..=b'9' => {
                self.ungetc();
                return self.lex_number(data);
            }
            _ => {
                self.ungetc();
                return self.lex_keyword(data);
            }
        };
        Ok(Lexeme::complete(kind, Span::input(start, 1)))
    }

    fn lex_keyword(&mut self, data: &[u8]) -> Result<Lexeme, Error> {
        let start = self.off;
        let resumed = self.state == LexState::Keyword;
        let first = if resumed {
            self.restart.first()
        } else {
            self.getc(data)
        };
        let (kind, word): (TokenKind, &[u8]) = match first {
            Some(b't') => (TokenKind::True, b"true"),
            Some(b'f') => (TokenKind::False, b"false"),
            Some(b'n') => (TokenKind::Null, b"null"),
            _ if resumed => return self.internal_error(),
            _ => {
                self.ungetc();
                self.state = LexState::Value;
                return Error::new(
                    ErrKind::InvalidInput,
                    self.token_start,
                    data.get(start..).unwrap_or(&[]),
                );
            }
        };
        if !resumed {
            self.restart.clear();
            self.restart.extend(word.get(..1).unwrap_or(&[]));
        }

        let carried = if resumed { self.restart.len() } else { 0 };
        let mut matched = self.restart.len();
        while let Some(&expected) = word.get(matched) {
            let Some(ch) = self.getc(data) else {
                break;
            };
            if ch != expected {
                self.state = LexState::Value;
                let head = word.get(..carried).unwrap_or(&[]);
                return Error::joined(
                    ErrKind::InvalidInput,
                    self.token_start,
                    head,
                    data.get(start..).unwrap_or(&[]),
                );
            }
            self.restart.push(ch);
            matched += 1;
        }

        if matched < word.len() {
            self.state = LexState::Keyword;
            if self.eos {
                return Error::new(
                    ErrKind::UnfinishedInput,
                    self.token_start,
                    self.restart.as_bytes(),
                );
            }
            return Ok(Lexeme::more(TokenKind::None, Span::restart(0, matched)));
        }

        self.state = LexState::Value;
        let span = if resumed {
            Span::restart(0, matched)
        } else {
            Span::input(start, self.off - start)
        };
        Ok(Lexeme::complete(kind, span))
    }
}

/// Cursor over the tokens of one chunk.
///
/// Borrows both the lexer and the chunk; drop it (or let it go out of scope)
/// before feeding the next chunk.
pub struct Tokens<'a> {
    lexer: &'a mut Lexer,
    data: &'a mut [u8],
}

impl Tokens<'_> {
    /// Returns the next token, fragment, or error.
    ///
    /// [`Status::More`] means this chunk is used up. [`Status::Partial`]
    /// means a fragment is ready but unread input remains, so call again.
    pub fn next_token(&mut self) -> Result<Token<'_>, Error> {
        let lexeme = self.lexer.lex(&mut *self.data)?;
        let text = self.lexer.resolve(&*self.data, lexeme.span)?;
        Ok(Token {
            kind: lexeme.kind,
            status: lexeme.status,
            text,
            number: lexeme.number,
        })
    }

    pub fn lexer(&self) -> &Lexer {
        self.lexer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    type Collected = Vec<(Status, TokenKind, Vec<u8>)>;

    /// Feeds every chunk, draining each until `More`, then ends the stream.
    fn lex_chunks(chunks: &[&str]) -> Result<Collected, Error> {
        let mut lexer = Lexer::new();
        let mut out = Vec::new();
        for chunk in chunks {
            let mut data = chunk.as_bytes().to_vec();
            let mut tokens = lexer.feed(&mut data);
            loop {
                let tok = tokens.next_token()?;
                out.push((tok.status, tok.kind, tok.text.to_vec()));
                if tok.status == Status::More {
                    break;
                }
            }
        }
        let mut tokens = lexer.end_of_stream();
        loop {
            let tok = tokens.next_token()?;
            out.push((tok.status, tok.kind, tok.text.to_vec()));
            if tok.is_end_of_stream() {
                break;
            }
        }
        lexer.close()?;
        Ok(out)
    }

    fn ok(kind: TokenKind, text: &str) -> (Status, TokenKind, Vec<u8>) {
        (Status::Complete, kind, text.as_bytes().to_vec())
    }

    fn more(kind: TokenKind, text: &str) -> (Status, TokenKind, Vec<u8>) {
        (Status::More, kind, text.as_bytes().to_vec())
    }

    #[test]
    fn test_simple_array() {
        let got = lex_chunks(&["[ true, false, null, \"foo\" ]"]).unwrap();
        assert_eq!(
            got,
            vec![
                ok(TokenKind::ArrayOpen, "["),
                ok(TokenKind::True, "true"),
                ok(TokenKind::Comma, ","),
                ok(TokenKind::False, "false"),
                ok(TokenKind::Comma, ","),
                ok(TokenKind::Null, "null"),
                ok(TokenKind::Comma, ","),
                ok(TokenKind::String, "foo"),
                ok(TokenKind::ArrayClose, "]"),
                more(TokenKind::None, ""),
                ok(TokenKind::EndOfStream, ""),
            ]
        );
    }

    #[test]
    fn test_keyword_across_chunks() {
        let got = lex_chunks(&["[fals", "e]"]).unwrap();
        assert_eq!(
            got,
            vec![
                ok(TokenKind::ArrayOpen, "["),
                more(TokenKind::None, "fals"),
                ok(TokenKind::False, "false"),
                ok(TokenKind::ArrayClose, "]"),
                more(TokenKind::None, ""),
                ok(TokenKind::EndOfStream, ""),
            ]
        );
    }

    #[test]
    fn test_invalid_keywords() {
        let err = lex_chunks(&["trup"]).unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidInput);
        assert_eq!(err.text(), b"trup");

        let err = lex_chunks(&["raisin"]).unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidInput);
        assert_eq!(err.text(), b"raisin");

        let err = lex_chunks(&["fa", "ls3"]).unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidInput);
        assert_eq!(err.text(), b"fals3");
    }

    #[test]
    fn test_unfinished_keyword_at_end_of_stream() {
        let mut lexer = Lexer::new();
        let mut data = b"nu".to_vec();
        let mut tokens = lexer.feed(&mut data);
        let tok = tokens.next_token().unwrap();
        assert_eq!(
            (tok.status, tok.kind, tok.text),
            (Status::More, TokenKind::None, &b"nu"[..])
        );
        let err = lexer.end_of_stream().next_token().unwrap_err();
        assert_eq!(err.kind(), ErrKind::UnfinishedInput);
        assert_eq!(lexer.close().unwrap_err().kind(), ErrKind::UnfinishedInput);
        // close always leaves the lexer between tokens
        assert_eq!(lexer.state(), LexState::Value);
        assert!(lexer.close().is_ok());
    }

    #[test]
    fn test_close_states() {
        let mut lexer = Lexer::new();
        assert!(lexer.close().is_ok());

        let cases = [
            ("12", true),
            ("12.", false),
            ("-", false),
            ("0", true),
            ("\"ab", false),
        ];
        for (input, closes) in cases {
            let mut lexer = Lexer::new();
            let mut data = input.as_bytes().to_vec();
            let mut tokens = lexer.feed(&mut data);
            assert_eq!(tokens.next_token().unwrap().status, Status::More, "{input}");
            assert_eq!(lexer.close().is_ok(), closes, "{input}");
        }
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new();
        let mut data = b"[\n  nulx".to_vec();
        let mut tokens = lexer.feed(&mut data);
        assert_eq!(tokens.next_token().unwrap().kind, TokenKind::ArrayOpen);
        let err = tokens.next_token().unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidInput);
        assert_eq!(err.position().line, 2);
        assert_eq!(err.position().column, 3);
        assert_eq!(err.position().offset, 4);
    }

    #[test]
    fn test_feed_after_partial_is_rejected() {
        let mut lexer = Lexer::new();
        let mut first = br#""\u00"#.to_vec();
        let mut tokens = lexer.feed(&mut first);
        assert_eq!(tokens.next_token().unwrap().status, Status::More);

        // enough input follows the escape to hold its UTF-8 form in place
        let mut second = br#"fc rest""#.to_vec();
        let mut tokens = lexer.feed(&mut second);
        let tok = tokens.next_token().unwrap();
        assert_eq!(tok.status, Status::Complete);
        assert_eq!(tok.text, "ü rest".as_bytes());

        let mut lexer = Lexer::new();
        let mut first = br#""\u00f"#.to_vec();
        let mut tokens = lexer.feed(&mut first);
        assert_eq!(tokens.next_token().unwrap().status, Status::More);

        // the last hex digit decodes to two bytes but only one input byte is
        // available to hold them
        let mut second = b"c and more".to_vec();
        let mut tokens = lexer.feed(&mut second);
        let tok = tokens.next_token().unwrap();
        assert_eq!(tok.status, Status::Partial);
        assert_eq!(tok.text, "ü".as_bytes());

        let mut third = b"\"".to_vec();
        let err = lexer.feed(&mut third).next_token().unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidParams);
    }

    #[test]
    fn test_names() {
        assert_eq!(TokenKind::String.as_str(), "STR");
        assert_eq!(TokenKind::EndOfStream.as_str(), "EOS");
        assert_eq!(LexState::String(Str::Pair3).as_str(), "PAIR5");
        assert_eq!(LexState::Number(Num::AfterExponent).as_str(), "NUM_EDIG");
        assert!(TokenKind::Number.is_scalar());
        assert!(!TokenKind::Colon.is_scalar());
    }
}

// SPDX-License-Identifier: Apache-2.0

use crate::RESTART_SIZE;

/// Failure kinds reported by the lexer and the parser.
///
/// Every kind is terminal for the value being processed; the caller is
/// expected to `reset` before feeding further input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrKind {
    /// A condition the state machines consider unreachable.
    InternalError,
    /// Opening a container or a partial value needed a frame the stack
    /// does not have.
    ///
    /// A string or number split across chunks holds one frame until it
    /// completes, so a value at the deepest level fits only when it arrives
    /// whole.
    TooMuchNesting,
    /// An object key was not a string.
    InvalidKey,
    /// Input ended inside an array.
    UnclosedArray,
    /// Input ended inside an object.
    UnclosedObject,
    /// Caller-supplied storage is too small, or the API was used out of order.
    InvalidParams,
    /// A token appeared where the grammar does not allow it, or a keyword or
    /// number was malformed.
    InvalidInput,
    /// A byte inside a string was a control character or broke UTF-8.
    InvalidChar,
    /// Unknown escape letter or a bad hex digit in `\uXXXX`.
    InvalidEscape,
    /// A surrogate half without its partner.
    InvalidU16Pair,
    /// End of stream was declared in the middle of a token.
    UnfinishedInput,
}

impl ErrKind {
    /// Stable name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrKind::InternalError => "INTERNAL_ERROR",
            ErrKind::TooMuchNesting => "TOO_MUCH_NESTING",
            ErrKind::InvalidKey => "INVALID_KEY",
            ErrKind::UnclosedArray => "UNCLOSED_ARRAY",
            ErrKind::UnclosedObject => "UNCLOSED_OBJECT",
            ErrKind::InvalidParams => "INVALID_PARAMS",
            ErrKind::InvalidInput => "INVALID_INPUT",
            ErrKind::InvalidChar => "INVALID_CHAR",
            ErrKind::InvalidEscape => "INVALID_ESCAPE",
            ErrKind::InvalidU16Pair => "INVALID_U16PAIR",
            ErrKind::UnfinishedInput => "UNFINISHED_INPUT",
        }
    }

    /// True when the error points at a bug rather than at bad input.
    pub const fn is_internal(self) -> bool {
        matches!(self, ErrKind::InternalError)
    }
}

impl core::fmt::Display for ErrKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a byte in the overall stream, counted across chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Zero-based byte offset from the start of the stream.
    pub offset: usize,
    /// One-based line number.
    pub line: usize,
    /// One-based byte column within the line.
    pub column: usize,
}

impl Position {
    pub const fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Moves past `byte`.
    pub(crate) fn advance(&mut self, byte: u8) {
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Owned copy of the text that triggered an error, capped at
/// [`RESTART_SIZE`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Excerpt {
    bytes: [u8; RESTART_SIZE],
    len: usize,
    truncated: bool,
}

impl Excerpt {
    pub const fn empty() -> Self {
        Excerpt {
            bytes: [0; RESTART_SIZE],
            len: 0,
            truncated: false,
        }
    }

    /// Appends as much of `text` as fits.
    pub(crate) fn push(&mut self, text: &[u8]) {
        let room = RESTART_SIZE - self.len;
        let take = text.len().min(room);
        let dst = self.bytes.get_mut(self.len..self.len + take);
        if let (Some(dst), Some(src)) = (dst, text.get(..take)) {
            dst.copy_from_slice(src);
            self.len += take;
        }
        if take < text.len() {
            self.truncated = true;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or(&[])
    }

    /// True when the offending text was longer than the excerpt holds.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl core::fmt::Debug for Excerpt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "\"{}\"", self.as_bytes().escape_ascii())?;
        if self.truncated {
            f.write_str("...")?;
        }
        Ok(())
    }
}

/// Error returned by [`crate::Lexer`] and [`crate::Parser`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Error {
    kind: ErrKind,
    position: Position,
    excerpt: Excerpt,
}

impl Error {
    /// Builds the error and wraps it in `Err`, so call sites can
    /// `return Error::new(..)` from any fallible function.
    pub(crate) fn new<T>(kind: ErrKind, position: Position, text: &[u8]) -> Result<T, Self> {
        let mut excerpt = Excerpt::empty();
        excerpt.push(text);
        Err(Self {
            kind,
            position,
            excerpt,
        })
    }

    /// Same as [`Error::new`] with the excerpt assembled from two pieces,
    /// e.g. the restart buffer followed by the current chunk.
    pub(crate) fn joined<T>(
        kind: ErrKind,
        position: Position,
        head: &[u8],
        tail: &[u8],
    ) -> Result<T, Self> {
        let mut excerpt = Excerpt::empty();
        excerpt.push(head);
        excerpt.push(tail);
        Err(Self {
            kind,
            position,
            excerpt,
        })
    }

    pub fn kind(&self) -> ErrKind {
        self.kind
    }

    /// Where the offending token or byte starts.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The offending text, when there is any.
    pub fn text(&self) -> &[u8] {
        self.excerpt.as_bytes()
    }

    pub fn excerpt(&self) -> &Excerpt {
        &self.excerpt
    }
}

impl From<ErrKind> for Error {
    fn from(kind: ErrKind) -> Self {
        Self {
            kind,
            position: Position::start(),
            excerpt: Excerpt::empty(),
        }
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:?}({:?}) at {}",
            self.kind, self.excerpt, self.position.offset
        )
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)?;
        if !self.excerpt.as_bytes().is_empty() {
            write!(f, " near \"{}\"", self.excerpt.as_bytes().escape_ascii())?;
        }
        Ok(())
    }
}

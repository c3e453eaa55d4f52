// SPDX-License-Identifier: Apache-2.0

/// Non-error outcome of a lexer or parser call.
///
/// Errors are reported through [`crate::Error`]; these three values describe
/// how much of the current value has been delivered and whether the caller
/// needs to supply more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The token or event is complete.
    ///
    /// A complete token of kind `EndOfStream` (or a complete event of kind
    /// `None`) marks the end of the stream.
    Complete,
    /// The input chunk is exhausted. Any text returned is a fragment of a
    /// string or number that continues in the next chunk.
    More,
    /// A fragment is ready but the input chunk is *not* exhausted. The caller
    /// must call again before feeding new data.
    ///
    /// A `\u` escape completed by the first bytes of a chunk may have no
    /// room for its UTF-8 form in that chunk, so it is returned from the
    /// restart buffer as `Partial` even when its last hex digit ends the
    /// chunk. The following call then reports the exhausted chunk with an
    /// empty `More` fragment.
    Partial,
}

impl Status {
    /// Stable name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Complete => "OK",
            Status::More => "MORE",
            Status::Partial => "PARTIAL",
        }
    }

    pub const fn is_complete(self) -> bool {
        matches!(self, Status::Complete)
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage a [`Span`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    /// The chunk currently installed by the caller.
    Input,
    /// The lexer's restart buffer.
    Restart,
    /// The parser's re-assembly buffer.
    Assembly,
}

/// Offset and length of token text, resolved against its [`Source`] only when
/// handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub source: Source,
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub const fn input(start: usize, len: usize) -> Self {
        Span {
            source: Source::Input,
            start,
            len,
        }
    }

    pub const fn restart(start: usize, len: usize) -> Self {
        Span {
            source: Source::Restart,
            start,
            len,
        }
    }

    pub const fn assembly(len: usize) -> Self {
        Span {
            source: Source::Assembly,
            start: 0,
            len,
        }
    }

    pub const fn empty() -> Self {
        Span::input(0, 0)
    }

    /// Drops the first `n` bytes of the span.
    pub const fn skip(self, n: usize) -> Self {
        let n = if n > self.len { self.len } else { n };
        Span {
            source: self.source,
            start: self.start + n,
            len: self.len - n,
        }
    }

    /// Resolves the span against a backing slice.
    pub fn slice<'a>(&self, backing: &'a [u8]) -> Option<&'a [u8]> {
        let end = self.start.checked_add(self.len)?;
        backing.get(self.start..end)
    }
}

// SPDX-License-Identifier: Apache-2.0

/// Capacity of the lexer's restart buffer.
///
/// Holds the longest keyword, the hex digits of a surrogate pair, a re-encoded
/// code point, and a prefix of a number that spans chunks. Numbers longer than
/// this still lex correctly but are not converted to `f64`.
pub const RESTART_SIZE: usize = 32;

/// Small fixed buffer that carries token bytes across chunk boundaries.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct RestartBuffer {
    bytes: [u8; RESTART_SIZE],
    len: usize,
    overflowed: bool,
}

impl RestartBuffer {
    pub const fn new() -> Self {
        RestartBuffer {
            bytes: [0; RESTART_SIZE],
            len: 0,
            overflowed: false,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// True when bytes were dropped because the buffer was full.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or(&[])
    }

    pub fn first(&self) -> Option<u8> {
        self.as_bytes().first().copied()
    }

    /// Raw view of `len` bytes from `start`, ignoring the fill level.
    pub fn get(&self, start: usize, len: usize) -> Option<&[u8]> {
        self.bytes.get(start..start.checked_add(len)?)
    }

    pub fn push(&mut self, byte: u8) {
        self.extend(&[byte]);
    }

    /// Appends what fits; the rest is dropped and remembered as overflow.
    pub fn extend(&mut self, text: &[u8]) {
        let take = text.len().min(RESTART_SIZE - self.len);
        if let (Some(dst), Some(src)) = (
            self.bytes.get_mut(self.len..self.len + take),
            text.get(..take),
        ) {
            dst.copy_from_slice(src);
            self.len += take;
        }
        if take < text.len() {
            self.overflowed = true;
        }
    }

    /// Stores `byte` at a fixed slot, used for collecting hex digits.
    pub fn set(&mut self, index: usize, byte: u8) -> bool {
        match self.bytes.get_mut(index) {
            Some(slot) => {
                *slot = byte;
                true
            }
            None => false,
        }
    }

    /// Replaces the content with `text`, which must fit.
    pub fn load(&mut self, text: &[u8]) {
        self.clear();
        self.extend(text);
    }
}

impl core::fmt::Debug for RestartBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "RestartBuffer(\"{}\"", self.as_bytes().escape_ascii())?;
        if self.overflowed {
            f.write_str("...")?;
        }
        f.write_str(")")
    }
}

// SPDX-License-Identifier: Apache-2.0

use super::{LexState, Lexeme, Lexer, Str, TokenKind};
use crate::error::{ErrKind, Error};
use crate::escape::{self, Utf16Unit};
use crate::shared::{Span, Status};
use crate::utf8::Utf8Step;

impl Lexer {
    /// Scans string content, starting just after the opening quote or where
    /// the previous chunk left off.
    ///
    /// Until the first backslash the text is returned in place. After it,
    /// decoded bytes are written back into `data` at `out`, which never
    /// overtakes the read offset because every escape is at least as long as
    /// its UTF-8 form. The one exception is a `\uXXXX` escape whose digits
    /// started in an earlier chunk; its bytes go out through the restart
    /// buffer as a [`Status::Partial`] fragment.
    pub(super) fn lex_string(&mut self, data: &mut [u8]) -> Result<Lexeme, Error> {
        let LexState::String(mut sub) = self.state else {
            return self.internal_error();
        };
        let start = self.off;
        let mut out = start;

        if sub == Str::Normal {
            loop {
                let Some(ch) = self.getc(data) else {
                    return self.string_exhausted(sub, start, self.off - start);
                };
                self.check_string_byte(ch)?;
                match ch {
                    b'"' => {
                        self.state = LexState::Value;
                        let len = self.off - 1 - start;
                        return Ok(Lexeme::complete(TokenKind::String, Span::input(start, len)));
                    }
                    b'\\' => {
                        out = self.off - 1;
                        sub = Str::Escaping;
                        break;
                    }
                    _ => {}
                }
            }
        }

        loop {
            let Some(ch) = self.getc(data) else {
                return self.string_exhausted(sub, start, out - start);
            };
            sub = match sub {
                Str::Normal => {
                    self.check_string_byte(ch)?;
                    match ch {
                        b'"' => {
                            self.state = LexState::Value;
                            return Ok(Lexeme::complete(
                                TokenKind::String,
                                Span::input(start, out - start),
                            ));
                        }
                        b'\\' => Str::Escaping,
                        _ => {
                            put(data, &mut out, ch)?;
                            Str::Normal
                        }
                    }
                }
                Str::Escaping if ch == b'u' => Str::Unicode0,
                Str::Escaping => match escape::unescape(ch) {
                    Ok(byte) => {
                        put(data, &mut out, byte)?;
                        Str::Normal
                    }
                    Err(kind) => return self.string_error(kind, ch),
                },
                Str::Unicode0 => self.hex_digit(0, ch, Str::Unicode1)?,
                Str::Unicode1 => self.hex_digit(1, ch, Str::Unicode2)?,
                Str::Unicode2 => self.hex_digit(2, ch, Str::Unicode3)?,
                Str::Unicode3 => {
                    self.hex_digit(3, ch, Str::Normal)?;
                    match Utf16Unit::classify(self.hex_unit(0)?) {
                        Utf16Unit::High => Str::PairBackslash,
                        Utf16Unit::Low => {
                            return self.string_error(ErrKind::InvalidU16Pair, ch)
                        }
                        Utf16Unit::Scalar(unit) => {
                            match self.emit(data, unit, start, &mut out, ch)? {
                                Some(partial) => return Ok(partial),
                                None => Str::Normal,
                            }
                        }
                    }
                }
                Str::PairBackslash if ch == b'\\' => Str::PairU,
                Str::PairU if ch == b'u' => Str::Pair0,
                Str::PairBackslash | Str::PairU => {
                    return self.string_error(ErrKind::InvalidU16Pair, ch)
                }
                Str::Pair0 => self.hex_digit(4, ch, Str::Pair1)?,
                Str::Pair1 => self.hex_digit(5, ch, Str::Pair2)?,
                Str::Pair2 => self.hex_digit(6, ch, Str::Pair3)?,
                Str::Pair3 => {
                    self.hex_digit(7, ch, Str::Normal)?;
                    let high = self.hex_unit(0)?;
                    let low = self.hex_unit(4)?;
                    let codepoint = match escape::join_surrogates(high, low) {
                        Ok(cp) => cp,
                        Err(kind) => return self.string_error(kind, ch),
                    };
                    match self.emit(data, codepoint, start, &mut out, ch)? {
                        Some(partial) => return Ok(partial),
                        None => Str::Normal,
                    }
                }
            };
        }
    }

    /// Rejects control characters and bytes that break UTF-8.
    fn check_string_byte(&mut self, ch: u8) -> Result<(), Error> {
        if self.utf8.decode(ch) == Utf8Step::Reject || ch < 0x20 {
            return self.string_error(ErrKind::InvalidChar, ch);
        }
        Ok(())
    }

    /// Saves a hex digit of a `\u` escape in the restart buffer.
    fn hex_digit(&mut self, slot: usize, ch: u8, next: Str) -> Result<Str, Error> {
        if let Err(kind) = escape::hex_value(ch) {
            return self.string_error(kind, ch);
        }
        if !self.restart.set(slot, ch) {
            return self.internal_error();
        }
        Ok(next)
    }

    fn hex_unit(&mut self, slot: usize) -> Result<u32, Error> {
        let digits = self.restart.get(slot, 4).map(escape::hex_unit);
        match digits {
            Some(Ok(unit)) => Ok(unit),
            _ => self.internal_error(),
        }
    }

    /// Writes the UTF-8 form of a decoded escape, or returns it as a partial
    /// fragment when the chunk has no room for it.
    fn emit(
        &mut self,
        data: &mut [u8],
        codepoint: u32,
        start: usize,
        out: &mut usize,
        ch: u8,
    ) -> Result<Option<Lexeme>, Error> {
        let mut utf8 = [0u8; 4];
        let len = match escape::encode_utf8(codepoint, &mut utf8) {
            Ok(len) => len,
            Err(kind) => return self.string_error(kind, ch),
        };
        let encoded = utf8.get(..len).unwrap_or(&[]);
        if len > self.off - *out {
            if *out != start {
                return self.internal_error();
            }
            self.restart.load(encoded);
            self.state = LexState::String(Str::Normal);
            return Ok(Some(Lexeme {
                kind: TokenKind::String,
                status: Status::Partial,
                span: Span::restart(0, len),
                number: None,
            }));
        }
        for &byte in encoded {
            put(data, out, byte)?;
        }
        Ok(None)
    }

    fn string_exhausted(&mut self, sub: Str, start: usize, len: usize) -> Result<Lexeme, Error> {
        self.state = LexState::String(sub);
        if self.eos {
            return Error::new(ErrKind::UnfinishedInput, self.token_start, &[]);
        }
        Ok(Lexeme::more(TokenKind::String, Span::input(start, len)))
    }

    fn string_error<T>(&mut self, kind: ErrKind, ch: u8) -> Result<T, Error> {
        self.state = LexState::Value;
        Error::new(kind, self.prev, &[ch])
    }
}

fn put(data: &mut [u8], out: &mut usize, byte: u8) -> Result<(), Error> {
    let slot = data.get_mut(*out).ok_or(ErrKind::InternalError)?;
    *slot = byte;
    *out += 1;
    Ok(())
}

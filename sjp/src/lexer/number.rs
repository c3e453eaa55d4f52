// SPDX-License-Identifier: Apache-2.0

use super::{LexState, Lexeme, Lexer, Num, TokenKind};
use crate::error::{ErrKind, Error};
use crate::number::parse_f64;
use crate::shared::{Span, Status};

impl Lexer {
    /// Scans a number, starting at its first byte or where the previous chunk
    /// left off.
    ///
    /// A number ends at the first byte that cannot continue it; that byte is
    /// left for the next token. Digits of a number that spans chunks are
    /// collected in the restart buffer so the value can be converted once the
    /// number completes.
    pub(super) fn lex_number(&mut self, data: &[u8]) -> Result<Lexeme, Error> {
        let start = self.off;
        let (mut num, resumed) = match self.state {
            LexState::Number(num) => (num, true),
            LexState::Value => {
                self.restart.clear();
                let num = match self.getc(data) {
                    Some(b'-') => Num::Sign,
                    Some(b'0') => Num::LeadingZero,
                    Some(b'1'..=b'9') => Num::BeforeDecimalPoint,
                    _ => return self.internal_error(),
                };
                (num, false)
            }
            _ => return self.internal_error(),
        };

        loop {
            let Some(ch) = self.getc(data) else {
                return self.number_exhausted(num, start, resumed, data);
            };
            num = match (num, ch) {
                (Num::Sign, b'0') => Num::LeadingZero,
                (Num::Sign, b'1'..=b'9') => Num::BeforeDecimalPoint,
                (Num::LeadingZero, b'0'..=b'9') => {
                    return self.invalid_number(start, resumed, data)
                }
                (Num::BeforeDecimalPoint, b'0'..=b'9') => Num::BeforeDecimalPoint,
                (Num::LeadingZero | Num::BeforeDecimalPoint, b'.') => Num::Decimal,
                (
                    Num::LeadingZero | Num::BeforeDecimalPoint | Num::AfterDecimalPoint,
                    b'e' | b'E',
                ) => Num::Exponent,
                (Num::Decimal | Num::AfterDecimalPoint, b'0'..=b'9') => Num::AfterDecimalPoint,
                (Num::Exponent, b'+' | b'-') => Num::ExponentSign,
                (Num::Exponent | Num::ExponentSign | Num::AfterExponent, b'0'..=b'9') => {
                    Num::AfterExponent
                }
                (num, _) if num.is_terminal() => {
                    self.ungetc();
                    return self.finish_number(start, resumed, data);
                }
                _ => return self.invalid_number(start, resumed, data),
            };
        }
    }

    fn number_exhausted(
        &mut self,
        num: Num,
        start: usize,
        resumed: bool,
        data: &[u8],
    ) -> Result<Lexeme, Error> {
        self.state = LexState::Number(num);
        if self.eos {
            if num.is_terminal() {
                return self.finish_number(start, resumed, data);
            }
            return Error::new(
                ErrKind::UnfinishedInput,
                self.token_start,
                self.restart.as_bytes(),
            );
        }
        self.restart.extend(data.get(start..self.off).unwrap_or(&[]));
        Ok(Lexeme::more(
            TokenKind::Number,
            Span::input(start, self.off - start),
        ))
    }

    fn finish_number(&mut self, start: usize, resumed: bool, data: &[u8]) -> Result<Lexeme, Error> {
        self.state = LexState::Value;
        let text = data.get(start..self.off).unwrap_or(&[]);
        let number = if resumed {
            self.restart.extend(text);
            if self.restart.overflowed() {
                log::debug!("number longer than restart buffer, not converted");
                None
            } else {
                parse_f64(self.restart.as_bytes())
            }
        } else {
            parse_f64(text)
        };
        Ok(Lexeme {
            kind: TokenKind::Number,
            status: Status::Complete,
            span: Span::input(start, self.off - start),
            number,
        })
    }

    /// The offending text runs from the start of the number through the byte
    /// that broke it.
    fn invalid_number<T>(&mut self, start: usize, resumed: bool, data: &[u8]) -> Result<T, Error> {
        self.state = LexState::Value;
        let head = if resumed { self.restart.as_bytes() } else { &[] };
        Error::joined(
            ErrKind::InvalidInput,
            self.token_start,
            head,
            data.get(start..self.off).unwrap_or(&[]),
        )
    }
}

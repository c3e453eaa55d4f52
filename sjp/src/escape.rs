// SPDX-License-Identifier: Apache-2.0

//! Stateless pieces of string escape decoding. The lexer keeps the hex
//! digits of a `\u` escape in its restart buffer and calls into these once
//! enough of them have arrived.

use crate::error::ErrKind;

/// What a four digit `\u` escape denotes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf16Unit {
    /// A code point outside the surrogate range.
    Scalar(u32),
    /// First half of a pair; a low surrogate escape must follow.
    High,
    /// Second half of a pair, invalid without a preceding high half.
    Low,
}

impl Utf16Unit {
    pub fn classify(unit: u32) -> Self {
        match unit {
            0xD800..=0xDBFF => Utf16Unit::High,
            0xDC00..=0xDFFF => Utf16Unit::Low,
            _ => Utf16Unit::Scalar(unit),
        }
    }
}

/// Byte written for the single character escape `\ch`.
pub fn unescape(ch: u8) -> Result<u8, ErrKind> {
    let byte = match ch {
        b'"' | b'\\' | b'/' => ch,
        b'b' => 0x08,
        b'f' => 0x0C,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        _ => return Err(ErrKind::InvalidEscape),
    };
    Ok(byte)
}

pub fn hex_value(byte: u8) -> Result<u32, ErrKind> {
    let nibble = match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => return Err(ErrKind::InvalidEscape),
    };
    Ok(u32::from(nibble))
}

/// Value of the four hex digits of a `\u` escape.
pub fn hex_unit(digits: &[u8]) -> Result<u32, ErrKind> {
    let [a, b, c, d] = digits else {
        return Err(ErrKind::InternalError);
    };
    [a, b, c, d]
        .into_iter()
        .try_fold(0u32, |acc, &digit| Ok((acc << 4) | hex_value(digit)?))
}

/// Code point of a high/low surrogate pair.
pub fn join_surrogates(high: u32, low: u32) -> Result<u32, ErrKind> {
    match (Utf16Unit::classify(high), Utf16Unit::classify(low)) {
        (Utf16Unit::High, Utf16Unit::Low) => {
            Ok(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
        }
        _ => Err(ErrKind::InvalidU16Pair),
    }
}

/// Writes the UTF-8 form of `codepoint` into `out`, returning its length.
pub fn encode_utf8(codepoint: u32, out: &mut [u8; 4]) -> Result<usize, ErrKind> {
    let ch = char::from_u32(codepoint).ok_or(ErrKind::InvalidU16Pair)?;
    Ok(ch.encode_utf8(out).len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_unescape() {
        let table = b"\"\"\\\\//b\x08f\x0cn\nr\rt\t";
        for pair in table.chunks(2) {
            assert_eq!(unescape(pair[0]), Ok(pair[1]));
        }
        assert_eq!(unescape(b'x'), Err(ErrKind::InvalidEscape));
        // hex escapes are handled by the lexer
        assert_eq!(unescape(b'u'), Err(ErrKind::InvalidEscape));
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex_value(b'7'), Ok(7));
        assert_eq!(hex_value(b'a'), Ok(10));
        assert_eq!(hex_value(b'F'), Ok(15));
        assert_eq!(hex_value(b'g'), Err(ErrKind::InvalidEscape));
        assert_eq!(hex_unit(b"00fc"), Ok(0xFC));
        assert_eq!(hex_unit(b"D840"), Ok(0xD840));
        assert_eq!(hex_unit(b"0x12"), Err(ErrKind::InvalidEscape));
        assert_eq!(hex_unit(b"123"), Err(ErrKind::InternalError));
    }

    #[test]
    fn test_surrogates() {
        assert_eq!(Utf16Unit::classify(0xD7FF), Utf16Unit::Scalar(0xD7FF));
        assert_eq!(Utf16Unit::classify(0xDBFF), Utf16Unit::High);
        assert_eq!(Utf16Unit::classify(0xDC00), Utf16Unit::Low);
        assert_eq!(Utf16Unit::classify(0xE000), Utf16Unit::Scalar(0xE000));

        assert_eq!(join_surrogates(0xD840, 0xDE13), Ok(0x20213));
        assert_eq!(join_surrogates(0xD83D, 0xDE00), Ok(0x1F600));
        assert_eq!(join_surrogates(0xDBFF, 0xDFFF), Ok(0x10FFFF));
        assert_eq!(join_surrogates(0xD840, 0x0041), Err(ErrKind::InvalidU16Pair));
        assert_eq!(join_surrogates(0xDC00, 0xDC00), Err(ErrKind::InvalidU16Pair));
    }

    #[test]
    fn test_encode_utf8() {
        let mut buf = [0u8; 4];
        assert_eq!(encode_utf8(0xFC, &mut buf), Ok(2));
        assert_eq!(&buf[..2], "ü".as_bytes());
        assert_eq!(encode_utf8(0x20213, &mut buf), Ok(4));
        assert_eq!(&buf, b"\xf0\xa0\x88\x93");
        assert_eq!(encode_utf8(0xDC00, &mut buf), Err(ErrKind::InvalidU16Pair));
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Byte-at-a-time UTF-8 validation.
//!
//! The decoder keeps its progress between calls, so a code point may be split
//! across any number of input chunks. Overlong forms, surrogate code points and
//! values above U+10FFFF are rejected as soon as the offending byte is seen.

/// Result of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Step {
    /// The byte completed a code point.
    Accept(u32),
    /// More continuation bytes are needed.
    Incomplete,
    /// The byte cannot appear here. The decoder is back at a code point
    /// boundary.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// At a code point boundary.
    Lead,
    /// `n` plain continuation bytes (80..=BF) remain.
    Tail(u8),
    /// After E0: A0..=BF, then one more.
    AfterE0,
    /// After ED: 80..=9F, then one more.
    AfterED,
    /// After F0: 90..=BF, then two more.
    AfterF0,
    /// After F4: 80..=8F, then two more.
    AfterF4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Decoder {
    expect: Expect,
    codepoint: u32,
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8Decoder {
    pub const fn new() -> Self {
        Utf8Decoder {
            expect: Expect::Lead,
            codepoint: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// True between code points.
    pub fn is_idle(&self) -> bool {
        self.expect == Expect::Lead
    }

    pub fn decode(&mut self, byte: u8) -> Utf8Step {
        let payload = u32::from(byte & 0x3F);
        let next = match (self.expect, byte) {
            (Expect::Lead, 0x00..=0x7F) => return Utf8Step::Accept(u32::from(byte)),
            (Expect::Lead, 0xC2..=0xDF) => {
                self.codepoint = u32::from(byte & 0x1F);
                Expect::Tail(1)
            }
            (Expect::Lead, 0xE0) => {
                self.codepoint = 0;
                Expect::AfterE0
            }
            (Expect::Lead, 0xE1..=0xEC | 0xEE..=0xEF) => {
                self.codepoint = u32::from(byte & 0x0F);
                Expect::Tail(2)
            }
            (Expect::Lead, 0xED) => {
                self.codepoint = 0x0D;
                Expect::AfterED
            }
            (Expect::Lead, 0xF0) => {
                self.codepoint = 0;
                Expect::AfterF0
            }
            (Expect::Lead, 0xF1..=0xF3) => {
                self.codepoint = u32::from(byte & 0x07);
                Expect::Tail(3)
            }
            (Expect::Lead, 0xF4) => {
                self.codepoint = 0x04;
                Expect::AfterF4
            }
            (Expect::AfterE0, 0xA0..=0xBF) | (Expect::AfterED, 0x80..=0x9F) => {
                self.codepoint = (self.codepoint << 6) | payload;
                Expect::Tail(1)
            }
            (Expect::AfterF0, 0x90..=0xBF) | (Expect::AfterF4, 0x80..=0x8F) => {
                self.codepoint = (self.codepoint << 6) | payload;
                Expect::Tail(2)
            }
            (Expect::Tail(1), 0x80..=0xBF) => {
                let cp = (self.codepoint << 6) | payload;
                self.reset();
                return Utf8Step::Accept(cp);
            }
            (Expect::Tail(n), 0x80..=0xBF) => {
                self.codepoint = (self.codepoint << 6) | payload;
                Expect::Tail(n - 1)
            }
            _ => {
                self.reset();
                return Utf8Step::Reject;
            }
        };
        self.expect = next;
        Utf8Step::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn run(bytes: &[u8]) -> Vec<Utf8Step> {
        let mut dec = Utf8Decoder::new();
        bytes.iter().map(|&b| dec.decode(b)).collect()
    }

    fn decode_all(bytes: &[u8]) -> Option<Vec<u32>> {
        let mut dec = Utf8Decoder::new();
        let mut out = Vec::new();
        for &b in bytes {
            match dec.decode(b) {
                Utf8Step::Accept(cp) => out.push(cp),
                Utf8Step::Incomplete => {}
                Utf8Step::Reject => return None,
            }
        }
        dec.is_idle().then_some(out)
    }

    #[test]
    fn test_ascii_and_multibyte() {
        assert_eq!(run(b"a"), vec![Utf8Step::Accept(0x61)]);
        assert_eq!(decode_all("ü".as_bytes()), Some(vec![0xFC]));
        assert_eq!(decode_all("€".as_bytes()), Some(vec![0x20AC]));
        assert_eq!(decode_all("𠈓".as_bytes()), Some(vec![0x20213]));
        assert_eq!(decode_all("\u{10FFFF}".as_bytes()), Some(vec![0x10FFFF]));
    }

    #[test]
    fn test_matches_std_for_all_two_byte_prefixes() {
        for a in 0u8..=255 {
            for b in 0u8..=255 {
                let pair = [a, b];
                let ours = decode_all(&pair).is_some();
                let std_ok = core::str::from_utf8(&pair).is_ok();
                // a valid 3/4-byte prefix is incomplete, not invalid
                if ours || std_ok {
                    assert_eq!(ours, std_ok, "bytes {a:02x} {b:02x}");
                }
            }
        }
    }

    #[test]
    fn test_rejects() {
        // bare continuation, overlong leads, out-of-range leads
        for lead in [0x80u8, 0xBF, 0xC0, 0xC1, 0xF5, 0xFF] {
            assert_eq!(run(&[lead]), vec![Utf8Step::Reject], "lead {lead:02x}");
        }
        // overlong three-byte form
        assert_eq!(decode_all(&[0xE0, 0x80, 0x80]), None);
        // surrogate
        assert_eq!(decode_all(&[0xED, 0xA0, 0x80]), None);
        // overlong four-byte form
        assert_eq!(decode_all(&[0xF0, 0x80, 0x80, 0x80]), None);
        // above U+10FFFF
        assert_eq!(decode_all(&[0xF4, 0x90, 0x80, 0x80]), None);
        // lead interrupted by ASCII
        assert_eq!(run(&[0xC3, b'"']), vec![Utf8Step::Incomplete, Utf8Step::Reject]);
    }

    #[test]
    fn test_recovers_after_reject() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(0xFF), Utf8Step::Reject);
        assert!(dec.is_idle());
        assert_eq!(dec.decode(b'x'), Utf8Step::Accept(0x78));
    }
}

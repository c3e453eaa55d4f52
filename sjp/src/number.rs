// SPDX-License-Identifier: Apache-2.0

//! Conversion of completed number tokens.

/// Converts the text of a complete JSON number to `f64`.
///
/// Returns `None` when the value does not fit a finite `f64`; the raw text is
/// still available to the caller in that case.
#[cfg(feature = "float")]
pub fn parse_f64(bytes: &[u8]) -> Option<f64> {
    use core::str::FromStr;

    // JSON numbers are pure ASCII once the lexer has accepted them
    let s = core::str::from_utf8(bytes).ok()?;
    match f64::from_str(s) {
        Ok(val) if val.is_finite() => Some(val),
        _ => None,
    }
}

/// Without the `float` feature numbers are reported as text only.
#[cfg(not(feature = "float"))]
pub fn parse_f64(_bytes: &[u8]) -> Option<f64> {
    None
}

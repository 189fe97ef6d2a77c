//! RFC 2254 value escaping: text `\HH` escapes to raw octets and back
//!
//! All UTF-8 handling for filter values is centralised here; neither the
//! [`crate::tokenizer`] nor the [`crate::filter_parser`] decode multi-byte
//! sequences themselves.

use crate::error::{FilterSyntaxError, FilterSyntaxReason};

#[derive(Clone, Copy)]
enum EscapeState {
    None,
    AwaitingFirstHex,
    AwaitingSecondHex(u8),
}

/// Unescape RFC 2254 `\HH` value text into raw octets
///
/// The input is assumed to already have any V2 escapes (`\*`, `\(`, `\)`,
/// `\\`) upgraded to V3 `\HH` form by the Parser's preprocessor; only V3
/// escapes are recognised here. The output buffer never grows past 3x the
/// input length in bytes, since one `char` can become at most 3 UTF-8
/// octets via re-encoding.
pub fn unescape(text: &str) -> Result<Vec<u8>, FilterSyntaxError> {
    let mut out = Vec::with_capacity(text.len().saturating_mul(3));
    let mut state = EscapeState::None;
    for ch in text.chars() {
        state = match state {
            EscapeState::None => {
                if ch == '\\' {
                    EscapeState::AwaitingFirstHex
                } else {
                    push_char(&mut out, ch)?;
                    EscapeState::None
                }
            }
            EscapeState::AwaitingFirstHex => EscapeState::AwaitingSecondHex(hex_digit(ch)?),
            EscapeState::AwaitingSecondHex(hi) => {
                out.push((hi << 4) | hex_digit(ch)?);
                EscapeState::None
            }
        };
    }
    match state {
        EscapeState::None => Ok(out),
        _ => Err(FilterSyntaxError::new(FilterSyntaxReason::ShortEscape)),
    }
}

fn hex_digit(ch: char) -> Result<u8, FilterSyntaxError> {
    ch.to_digit(16)
        .map(|d| d as u8)
        .ok_or_else(|| FilterSyntaxError::new(FilterSyntaxReason::InvalidEscape))
}

/// Push one unescaped `char` onto the octet buffer, validating it against
/// the RFC 2254 `char` production (everything except NUL, `(`, `)`, `*` and
/// `\`; code points above 0x7F are re-encoded as UTF-8).
fn push_char(out: &mut Vec<u8>, ch: char) -> Result<(), FilterSyntaxError> {
    let cp = ch as u32;
    let allowed = matches!(cp, 0x01..=0x27 | 0x2B..=0x5B) || cp >= 0x5D;
    if !allowed {
        return Err(FilterSyntaxError::new(FilterSyntaxReason::InvalidCharacter(
            ch,
        )));
    }
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    Ok(())
}

/// Render raw octets back to RFC 2254 text
///
/// If the octets are valid UTF-8 and contain no character that would need
/// escaping, they are emitted verbatim. Otherwise every octet is rendered as
/// two-hex-digit lowercase `\HH`, regardless of whether that particular
/// octet individually needed escaping — this is simpler and is always a
/// valid (if more heavily escaped than strictly necessary) RFC 2254 value.
pub fn render(octets: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(octets) {
        if !s.chars().any(needs_escape) {
            return s.to_string();
        }
    }
    let mut out = String::with_capacity(octets.len() * 3);
    for b in octets {
        out.push_str(&format!("\\{:02x}", b));
    }
    out
}

fn needs_escape(ch: char) -> bool {
    matches!(ch, '\0' | '(' | ')' | '*' | '\\')
}

//! Text normalization for extracted passages
//!
//! PDF producers frequently emit styled look-alike glyphs (bold, italic,
//! double-struck letters from the Mathematical Alphanumeric Symbols block)
//! that break keyword search and number matching. Every extracted page goes
//! through [`normalize`] before chunking.
//!
//! Steps, in order:
//!
//! 1. Map mathematical alphanumerics and letterlike symbols to ASCII
//! 2. Rewrite the fullwidth dollar sign `＄` to `S$`
//! 3. Drop control characters that are not whitespace, and invisible
//!    format characters (zero-width space, byte order mark, bidi marks)
//!    other than the zero-width joiners
//! 4. Apply canonical decomposition (NFD)
//!
//! Control and format characters are removed before decomposition so that the
//! decomposed output is already in canonical order; this keeps the whole
//! function idempotent.

use unicode_normalization::UnicodeNormalization;

/// Prefix written in place of the fullwidth dollar sign
pub const CURRENCY_PREFIX: &str = "S$";

const FULLWIDTH_DOLLAR: char = '\u{FF04}';

const MATH_LETTERS: std::ops::RangeInclusive<u32> = 0x1D400..=0x1D6A3;
const MATH_DIGITS: std::ops::RangeInclusive<u32> = 0x1D7CE..=0x1D7FF;

/// Normalize extracted text
///
/// # Examples
///
/// ```
/// use leasewise_ingest::normalize;
///
/// assert_eq!(normalize("\u{1D411}\u{1D41E}\u{1D427}\u{1D42D}"), "Rent");
/// assert_eq!(normalize("\u{FF04}7,500"), "S$7,500");
/// assert_eq!(normalize("a\u{0007}b"), "ab");
/// ```
pub fn normalize(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == FULLWIDTH_DOLLAR {
            mapped.push_str(CURRENCY_PREFIX);
        } else if let Some(ascii) = ascii_equivalent(c) {
            mapped.push(ascii);
        } else if (c.is_control() && !c.is_whitespace()) || is_invisible_format(c) {
            continue;
        } else {
            mapped.push(c);
        }
    }
    mapped.nfd().collect()
}

/// Format (Cf) characters that carry no text, excluding ZWJ and ZWNJ
fn is_invisible_format(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'
            | '\u{200E}'
            | '\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}

/// ASCII letter or digit a styled glyph stands for, if any
fn ascii_equivalent(c: char) -> Option<char> {
    let cp = c as u32;
    if MATH_LETTERS.contains(&cp) {
        // 13 styles of 52 letters each, uppercase first
        let idx = ((cp - MATH_LETTERS.start()) % 52) as u8;
        return Some(if idx < 26 {
            (b'A' + idx) as char
        } else {
            (b'a' + idx - 26) as char
        });
    }
    if MATH_DIGITS.contains(&cp) {
        // 5 styles of 10 digits each
        let idx = ((cp - MATH_DIGITS.start()) % 10) as u8;
        return Some((b'0' + idx) as char);
    }
    letterlike(c)
}

fn letterlike(c: char) -> Option<char> {
    let ascii = match c {
        '\u{1D6A4}' => 'i',
        '\u{1D6A5}' => 'j',
        'ℂ' | 'ℭ' => 'C',
        'ℊ' => 'g',
        'ℋ' | 'ℌ' | 'ℍ' => 'H',
        'ℎ' => 'h',
        'ℐ' | 'ℑ' => 'I',
        'ℒ' => 'L',
        'ℓ' => 'l',
        'ℕ' => 'N',
        'ℙ' => 'P',
        'ℚ' => 'Q',
        'ℛ' | 'ℜ' | 'ℝ' => 'R',
        'ℤ' | 'ℨ' => 'Z',
        'ℬ' => 'B',
        'ℯ' => 'e',
        'ℰ' => 'E',
        'ℱ' => 'F',
        'ℳ' => 'M',
        'ℴ' => 'o',
        'ℹ' => 'i',
        _ => return None,
    };
    Some(ascii)
}

use crate::error::{Bm25Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref CONTROL: Regex =
        Regex::new(r"[\p{Cc}\x{200B}-\x{200D}\x{2060}\x{FEFF}]").expect("valid regex");
    static ref COMBINING: Regex = Regex::new(r"\p{M}").expect("valid regex");
    // Emoji, pictographs, (TM) (R) (C) and other symbol-like characters.
    static ref SYMBOLS: Regex =
        Regex::new(r"[\p{Extended_Pictographic}\p{So}]").expect("valid regex");
    static ref PUNCTUATION: Regex = Regex::new(r"\p{P}").expect("valid regex");
    // ASCII alphanumerics, Hiragana, Katakana, CJK ideographs, Hangul jamo and syllables.
    static ref DISALLOWED: Regex = Regex::new(
        concat!(
            r"[^a-z0-9\s",
            r"\x{3040}-\x{309F}\x{30A0}-\x{30FF}",
            r"\x{3400}-\x{4DBF}\x{4E00}-\x{9FFF}",
            r"\x{1100}-\x{11FF}\x{AC00}-\x{D7AF}]",
        )
    ).expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Canonicalize raw text into lowercase, space-separated words.
///
/// Word order is preserved and nothing is deduplicated. Text that is already
/// normalized comes back unchanged, except for the empty string: input made only
/// of symbols or punctuation (`"™"`) normalizes to `""`, and `normalize("")` is
/// `Err(InvalidInput)`.
pub fn normalize(text: &str) -> Result<String> {
    if text.is_empty() {
        return Err(Bm25Error::InvalidInput);
    }
    let lowered = text.to_lowercase();
    let decomposed = lowered.nfd().collect::<String>();
    let s = CONTROL.replace_all(&decomposed, "");
    let s = COMBINING.replace_all(&s, "");
    let s = SYMBOLS.replace_all(&s, "");
    let s = PUNCTUATION.replace_all(&s, " ");
    let s = DISALLOWED.replace_all(&s, " ");
    let s = WHITESPACE.replace_all(&s, " ");
    Ok(s.trim().to_string())
}

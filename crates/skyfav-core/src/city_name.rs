//! City name canonicalization.
//!
//! Names are compatibility-decomposed (NFKD) and the combining diacritical
//! marks block is dropped, so "Café" and "Cafe" compare equal. Marks from
//! other scripts (Arabic harakat, for instance) are left alone.

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Canonicalize a city name for storage, comparison and display.
///
/// Total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw.nfkd().filter(|c| !COMBINING_MARKS.contains(c)).collect();
    // Dropping U+034F can leave marks out of canonical order; decompose again.
    stripped.nfkd().collect()
}

/// True if two raw names refer to the same city after normalization.
pub fn same_city(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

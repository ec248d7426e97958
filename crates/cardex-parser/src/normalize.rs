//! Name normalization used before any name comparison.
//!
//! Names arrive from markup, filenames and search results with different
//! Unicode forms and stray bidirectional marks. Every lookup goes through
//! [`normalize_name`] on both sides.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Disambiguators appended to page names that never appear in set lists.
const DISAMBIGUATORS: [&str; 2] = [" (card)", " (Arkana)"];

/// Whether a character is an invisible or bidirectional control.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200b}'..='\u{200f}' | '\u{202a}'..='\u{202e}' | '\u{2060}'..='\u{206f}' | '\u{feff}'
    )
}

/// Strip invisible controls, apply NFKC, collapse whitespace runs, and trim.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !is_invisible(*c)).collect();
    let composed: String = cleaned.nfkc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used to find a card by its english name.
///
/// Normalizes and removes a trailing page disambiguator such as `" (card)"`.
#[must_use]
pub fn lookup_key(name: &str) -> String {
    let mut normalized = normalize_name(name);
    for suffix in DISAMBIGUATORS {
        if let Some(stripped) = normalized.strip_suffix(suffix) {
            normalized = stripped.to_string();
        }
    }
    normalized
}

fn artwork_in_name() -> &'static Regex {
    static ARTWORK_NAME: OnceLock<Regex> = OnceLock::new();
    ARTWORK_NAME.get_or_init(|| {
        Regex::new(r"(?i)\s*\(\s*[\w'\-]+(?:\s+[\w'\-]+)?\s+artwork\s*\)").expect("valid regex")
    })
}

fn artwork_phrase() -> &'static Regex {
    static ARTWORK_PHRASE: OnceLock<Regex> = OnceLock::new();
    ARTWORK_PHRASE.get_or_init(|| Regex::new(r"(?i)\b[\w'\-]+\s+artwork\b").expect("valid regex"))
}

/// Remove artwork-variant markers such as `(alternate artwork)` from a name.
///
/// Returns the normalized display name and whether a marker was present.
#[must_use]
pub fn strip_artwork_marker(name: &str) -> (String, bool) {
    let normalized = normalize_name(name);
    let regex = artwork_in_name();
    if regex.is_match(&normalized) {
        let stripped = regex.replace_all(&normalized, "");
        (normalize_name(&stripped), true)
    } else {
        (normalized, false)
    }
}

/// Whether free-form option text names an artwork variant, e.g. `new artwork`.
#[must_use]
pub fn mentions_artwork_variant(text: &str) -> bool {
    artwork_phrase().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_controls() {
        assert_eq!(normalize_name("\u{200e}Dark Magician\u{202c}"), "Dark Magician");
        assert_eq!(normalize_name("  Dark\u{2060}   Magician "), "Dark Magician");
    }

    #[test]
    fn test_normalize_nfkc() {
        // Full-width letters and the ideographic space fold to ASCII
        assert_eq!(normalize_name("Ｄａｒｋ\u{3000}Ｍａｇｉｃｉａｎ"), "Dark Magician");
    }

    #[test]
    fn test_lookup_key_strips_disambiguator() {
        assert_eq!(lookup_key("Polymerization (card)"), "Polymerization");
        assert_eq!(lookup_key("The Fool (Arkana)"), "The Fool");
        assert_eq!(lookup_key("Dark Magician"), "Dark Magician");
    }

    #[test]
    fn test_strip_artwork_marker() {
        assert_eq!(
            strip_artwork_marker("Dark Magician (alternate artwork)"),
            ("Dark Magician".to_string(), true)
        );
        assert_eq!(
            strip_artwork_marker("Blue-Eyes White Dragon (9th artwork)"),
            ("Blue-Eyes White Dragon".to_string(), true)
        );
        assert_eq!(
            strip_artwork_marker("Dark Magician Girl"),
            ("Dark Magician Girl".to_string(), false)
        );
    }

    #[test]
    fn test_mentions_artwork_variant() {
        assert!(mentions_artwork_variant("description::New artwork"));
        assert!(mentions_artwork_variant("international artwork"));
        assert!(!mentions_artwork_variant("description::reprint"));
    }
}

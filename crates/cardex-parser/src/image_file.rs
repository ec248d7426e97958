//! Gallery image filename decoding.
//!
//! Printing scans are named
//! `File:{card_image_name}-{set_code}-{language}-{rarity_code}[-{variant}].{ext}`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fields decoded from a printing scan filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedImage {
    /// Card segment, matched against `Card::card_image_name`
    pub card_image_name: String,
    /// Set code, e.g. `AGOV`
    pub set_code: String,
    /// Language code, e.g. `JP`
    pub language: String,
    /// Rarity abbreviation, e.g. `UR`
    pub rarity_code: String,
    /// Optional variant marker, e.g. `AA`
    pub variant_code: Option<String>,
    /// File extension as written
    pub extension: String,
}

impl DecodedImage {
    /// Alternate-art scan (`AA` or `Alt` variant).
    #[must_use]
    pub fn is_alternate_art(&self) -> bool {
        matches!(self.variant_code.as_deref(), Some("AA" | "Alt"))
    }

    /// Official proxy scan; never a candidate printing.
    #[must_use]
    pub fn is_official_proxy(&self) -> bool {
        self.rarity_code == "OP"
    }
}

fn filename_pattern() -> &'static Regex {
    static FILENAME: OnceLock<Regex> = OnceLock::new();
    FILENAME.get_or_init(|| {
        Regex::new(
            r"^File:([^-]+)-([^-]+)-([^-]+)-([^-.]+)(?:-([^-.]+))?\.((?i:png|jpe?g|gif|webp))$",
        )
        .expect("valid regex")
    })
}

/// Decode a `File:` title. Returns `None` when the title does not match.
#[must_use]
pub fn decode_image_file(title: &str) -> Option<DecodedImage> {
    let captures = filename_pattern().captures(title.trim())?;
    let field = |i: usize| captures.get(i).map(|m| m.as_str().to_string());

    Some(DecodedImage {
        card_image_name: field(1)?,
        set_code: field(2)?,
        language: field(3)?,
        rarity_code: field(4)?,
        variant_code: field(5),
        extension: field(6)?,
    })
}

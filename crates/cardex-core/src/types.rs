//! Identity keys and small shared enums.
//!
//! A printing has no reliable identifier of its own across sources, so its
//! identity is the four-part [`PrintingKey`]. Sets are identified by
//! [`SetKey`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Card-game family a set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardGame {
    /// Official Card Game (Asian markets)
    #[serde(rename = "OCG")]
    Ocg,
    /// Trading Card Game (Western markets)
    #[serde(rename = "TCG")]
    Tcg,
}

impl CardGame {
    /// Derive the family from a language code.
    ///
    /// `EN` maps to TCG; every other code (`JP`, `JA`, `AE`, `KR`, ...) maps to OCG.
    #[must_use]
    pub fn from_language(language: &str) -> Self {
        if language.eq_ignore_ascii_case("EN") {
            Self::Tcg
        } else {
            Self::Ocg
        }
    }

    /// Short code used in page titles.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ocg => "OCG",
            Self::Tcg => "TCG",
        }
    }
}

impl fmt::Display for CardGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a set: `(name, region)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SetKey {
    /// Set name
    pub name: String,
    /// Region the set was released in
    pub region: String,
}

impl fmt::Display for SetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.region)
    }
}

/// Composite natural key of a printing.
///
/// Two printings with equal keys describe the same physical product, even
/// when they disagree on optional fields such as code or image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrintingKey {
    /// Region of the set
    pub region: String,
    /// Set name
    pub set_name: String,
    /// English name of the card
    pub card_english_name: String,
    /// Canonical rarity name
    pub rarity_name: String,
}

impl fmt::Display for PrintingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.region, self.set_name, self.card_english_name, self.rarity_name
        )
    }
}

//! Reference entities and the printing that combines them.
//!
//! `CardSet`, `Card` and `Rarity` are read-only reference rows loaded once
//! per run. A [`Printing`] points at one of each through an `Arc`, so the
//! thousands of printings produced by the collectors share the same rows.

use crate::types::{CardGame, PrintingKey, SetKey};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// A released product (booster, structure deck, promo pack) in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSet {
    /// Set name, without region qualifiers
    pub name: String,
    /// Region label, e.g. `Japanese` or `Asian-English`
    pub region: String,
    /// Language code used in printing codes and filenames, e.g. `JP`
    pub language: String,
    /// Card-game family derived from the language
    pub card_game: CardGame,
    /// Region-qualified prefix, e.g. `AGOV-JP`
    #[serde(default)]
    pub prefix: Option<String>,
    /// Prefix without the region segment, e.g. `AGOV`
    #[serde(default)]
    pub set_code: Option<String>,
    /// Regional release date
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Product category, e.g. `Booster pack`
    #[serde(default)]
    pub set_type: Option<String>,
    /// Series the set belongs to
    #[serde(default)]
    pub series: Option<String>,
    /// Image name of the set artwork
    #[serde(default)]
    pub set_image: Option<String>,
    /// `File:` title of the set artwork
    #[serde(default)]
    pub image_file: Option<String>,
    /// Resolved URL of the set artwork
    #[serde(default)]
    pub image_url: Option<String>,
    /// Set list page title when it differs from the derived one
    #[serde(default)]
    pub set_list_title: Option<String>,
    /// Gallery page title when it differs from the derived one
    #[serde(default)]
    pub gallery_title: Option<String>,
}

impl CardSet {
    /// Create a set with only its identity fields populated.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let language = language.into();
        Self {
            name: name.into(),
            region: region.into(),
            card_game: CardGame::from_language(&language),
            language,
            prefix: None,
            set_code: None,
            release_date: None,
            set_type: None,
            series: None,
            set_image: None,
            image_file: None,
            image_url: None,
            set_list_title: None,
            gallery_title: None,
        }
    }

    /// Set the region-qualified prefix and derive the set code from it.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.set_code = Some(set_code_from_prefix(&prefix));
        self.prefix = Some(prefix);
        self
    }

    /// Override the card-game family.
    #[must_use]
    pub fn with_card_game(mut self, card_game: CardGame) -> Self {
        self.card_game = card_game;
        self
    }

    /// Identity of this set.
    #[must_use]
    pub fn key(&self) -> SetKey {
        SetKey {
            name: self.name.clone(),
            region: self.region.clone(),
        }
    }

    /// Title of the page holding this set's card list markup.
    #[must_use]
    pub fn set_list_page(&self) -> String {
        self.set_list_title
            .clone()
            .unwrap_or_else(|| format!("Set Card Lists:{}", self.page_suffix()))
    }

    /// Title of the page holding this set's image gallery.
    #[must_use]
    pub fn gallery_page(&self) -> String {
        self.gallery_title
            .clone()
            .unwrap_or_else(|| format!("Set Card Galleries:{}", self.page_suffix()))
    }

    fn page_suffix(&self) -> String {
        let name = self.name.trim_end_matches(" (set)");
        format!("{name} ({}-{})", self.card_game, self.language)
    }
}

/// Strip the trailing region segment from a set prefix (`AGOV-JP` becomes `AGOV`).
#[must_use]
pub fn set_code_from_prefix(prefix: &str) -> String {
    static REGION_SUFFIX: OnceLock<Regex> = OnceLock::new();
    let regex = REGION_SUFFIX.get_or_init(|| Regex::new(r"-[A-Za-z]+$").expect("valid regex"));
    regex.replace(prefix, "").into_owned()
}

/// A card design, independent of where and how it was printed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    /// Canonical page name
    pub name: String,
    /// English name, used as the printing identity component
    pub english_name: String,
    /// Eight-digit card password
    pub password: Option<u64>,
    /// `Monster Card`, `Spell Card` or `Trap Card`
    pub card_type: Option<String>,
    /// Primary type, e.g. `Effect Monster`
    pub race: Option<String>,
    /// Monster type, e.g. `Spellcaster`
    pub monster_type: Option<String>,
    /// Attribute, e.g. `DARK`
    pub attribute: Option<String>,
    /// Spell/Trap property, e.g. `Quick-Play`
    pub property: Option<String>,
    /// Level for main-deck monsters
    pub level: Option<u32>,
    /// Rank for Xyz monsters
    pub rank: Option<u32>,
    /// Link rating for Link monsters
    pub link_rating: Option<u32>,
    /// Pendulum scale
    pub pendulum_scale: Option<u32>,
    /// Numeric ATK, absent for `?`
    pub atk: Option<i32>,
    /// Numeric DEF, absent for `?` and Link monsters
    pub def: Option<i32>,
    /// ATK as printed
    pub atk_string: Option<String>,
    /// DEF as printed
    pub def_string: Option<String>,
    /// Archetypes the card belongs to
    pub archetypes: Vec<String>,
    /// Archetypes the card supports
    pub archetype_support: Vec<String>,
    /// Link arrow directions
    pub link_arrows: Vec<String>,
    /// Summoning materials text
    pub materials: Option<String>,
    /// Pendulum effect text
    pub pendulum_effect: Option<String>,
    /// Card text
    pub lore: Option<String>,
    /// Current OCG status, e.g. `Unlimited`
    pub ocg_status: Option<String>,
    /// Name segment used in image filenames
    pub card_image_name: Option<String>,
    /// Release medium
    pub release: Option<String>,
}

impl Card {
    /// Create a card whose english name equals its page name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            english_name: name.clone(),
            name,
            ..Self::default()
        }
    }

    /// Set the card image name.
    #[must_use]
    pub fn with_image_name(mut self, image_name: impl Into<String>) -> Self {
        self.card_image_name = Some(image_name.into());
        self
    }
}

/// A rarity treatment, e.g. `Ultra Rare` abbreviated `UR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rarity {
    /// Canonical rarity name
    pub name: String,
    /// Abbreviation used in set lists and image filenames
    pub prefix: String,
    /// Source page id
    #[serde(default)]
    pub page_id: u64,
}

impl Rarity {
    /// Create a rarity.
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, page_id: u64) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            page_id,
        }
    }
}

/// One card printed in one set at one rarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Printing {
    /// Set the card was printed in
    pub set: Arc<CardSet>,
    /// Card design
    pub card: Arc<Card>,
    /// Rarity treatment
    pub rarity: Arc<Rarity>,
    /// Printing code, e.g. `AGOV-JP001`
    pub code: Option<String>,
    /// `File:` title of the printing scan
    pub image_file: Option<String>,
    /// Resolved URL of the printing scan
    pub image_url: Option<String>,
    /// Alternate or re-drawn artwork
    pub is_alternate_artwork: bool,
}

impl Printing {
    /// Create a printing with no optional fields.
    #[must_use]
    pub fn new(set: Arc<CardSet>, card: Arc<Card>, rarity: Arc<Rarity>) -> Self {
        Self {
            set,
            card,
            rarity,
            code: None,
            image_file: None,
            image_url: None,
            is_alternate_artwork: false,
        }
    }

    /// Set the printing code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the image file title.
    #[must_use]
    pub fn with_image_file(mut self, image_file: impl Into<String>) -> Self {
        self.image_file = Some(image_file.into());
        self
    }

    /// Set the alternate-artwork flag.
    #[must_use]
    pub fn with_alternate_artwork(mut self, is_alternate_artwork: bool) -> Self {
        self.is_alternate_artwork = is_alternate_artwork;
        self
    }

    /// Composite natural key of this printing.
    #[must_use]
    pub fn key(&self) -> PrintingKey {
        PrintingKey {
            region: self.set.region.clone(),
            set_name: self.set.name.clone(),
            card_english_name: self.card.english_name.clone(),
            rarity_name: self.rarity.name.clone(),
        }
    }

    /// Whether a non-empty printing code is known.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.code.as_deref().is_some_and(|code| !code.trim().is_empty())
    }

    /// Fill this record's absent optional fields from another record of the same key.
    ///
    /// Present fields are never overwritten.
    pub fn absorb(&mut self, other: &Printing) {
        if !self.has_code() && other.has_code() {
            self.code.clone_from(&other.code);
        }
        if self.image_file.is_none() {
            self.image_file.clone_from(&other.image_file);
        }
        if self.image_url.is_none() {
            self.image_url.clone_from(&other.image_url);
        }
    }
}

/// A gallery image whose card or rarity could not be linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkedImage {
    /// Set whose gallery listed the image
    pub set_name: String,
    /// Region of that set
    pub region: String,
    /// `File:` title of the image
    pub image_file: String,
    /// Card image name decoded from the filename
    pub card_image_name: String,
    /// Rarity code decoded from the filename
    pub rarity_code: String,
    /// No card carries the decoded image name
    pub missing_card: bool,
    /// No rarity carries the decoded code as prefix
    pub missing_rarity: bool,
    /// Resolved URL of the image
    #[serde(default)]
    pub image_url: Option<String>,
}

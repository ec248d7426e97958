//! Typed mapping of semantic search printouts.
//!
//! Search results arrive as `{label: [values]}` dictionaries. Each known
//! label maps to one typed field through [`CARD_FIELDS`]; values are either
//! scalars (`"46986414"`, `2500`) or page references (`{"fulltext": "..."}`).
//! Unknown labels are ignored.

use crate::normalize::normalize_name;
use cardex_core::Card;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::trace;

/// Typed card field a printout label feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    /// `Card::password`
    Password,
    /// `Card::card_type`
    CardType,
    /// `Card::race`
    PrimaryType,
    /// `Card::monster_type`
    MonsterType,
    /// `Card::attribute`
    Attribute,
    /// `Card::property`
    Property,
    /// `Card::level`
    Level,
    /// `Card::rank`
    Rank,
    /// `Card::link_rating`
    LinkRating,
    /// `Card::pendulum_scale`
    PendulumScale,
    /// `Card::atk`
    Atk,
    /// `Card::def`
    Def,
    /// `Card::atk_string`
    AtkString,
    /// `Card::def_string`
    DefString,
    /// `Card::archetypes`
    Archetypes,
    /// `Card::archetype_support`
    ArchetypeSupport,
    /// `Card::link_arrows`
    LinkArrows,
    /// `Card::materials`
    Materials,
    /// `Card::pendulum_effect`
    PendulumEffect,
    /// `Card::lore`
    Lore,
    /// `Card::english_name`
    EnglishName,
    /// `Card::ocg_status`
    OcgStatus,
    /// `Card::card_image_name`
    CardImageName,
    /// `Card::release`
    Release,
}

/// How a value list becomes a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// First value as text
    FirstScalar,
    /// `fulltext` of the first page reference
    FirstFulltext,
    /// `fulltext` of every page reference
    FulltextList,
    /// Every value as text
    ScalarList,
    /// First value with wiki markup flattened
    LoreMarkup,
}

/// Printout label to field mapping for card searches.
pub const CARD_FIELDS: &[(&str, CardField, Extraction)] = &[
    ("Password", CardField::Password, Extraction::FirstScalar),
    ("Card type", CardField::CardType, Extraction::FirstFulltext),
    ("Primary type", CardField::PrimaryType, Extraction::FirstFulltext),
    ("Type", CardField::MonsterType, Extraction::FirstFulltext),
    ("Attribute", CardField::Attribute, Extraction::FirstFulltext),
    ("Property", CardField::Property, Extraction::FirstFulltext),
    ("Level", CardField::Level, Extraction::FirstScalar),
    ("Rank", CardField::Rank, Extraction::FirstScalar),
    ("Link Rating", CardField::LinkRating, Extraction::FirstScalar),
    ("Pendulum Scale", CardField::PendulumScale, Extraction::FirstScalar),
    ("ATK", CardField::Atk, Extraction::FirstScalar),
    ("DEF", CardField::Def, Extraction::FirstScalar),
    ("ATK string", CardField::AtkString, Extraction::FirstScalar),
    ("DEF string", CardField::DefString, Extraction::FirstScalar),
    ("Archseries", CardField::Archetypes, Extraction::FulltextList),
    ("Archetype support", CardField::ArchetypeSupport, Extraction::FulltextList),
    ("Link Arrows", CardField::LinkArrows, Extraction::ScalarList),
    ("Materials", CardField::Materials, Extraction::LoreMarkup),
    ("Pendulum Effect", CardField::PendulumEffect, Extraction::LoreMarkup),
    ("Lore", CardField::Lore, Extraction::LoreMarkup),
    ("English name", CardField::EnglishName, Extraction::FirstScalar),
    ("OCG status", CardField::OcgStatus, Extraction::FirstFulltext),
    ("Card image name", CardField::CardImageName, Extraction::FirstScalar),
    ("Release", CardField::Release, Extraction::FirstFulltext),
];

/// Printout labels requested by the card search, in request order.
#[must_use]
pub fn card_printout_labels() -> Vec<&'static str> {
    CARD_FIELDS.iter().map(|(label, _, _)| *label).collect()
}

fn card_field_index() -> &'static HashMap<&'static str, (CardField, Extraction)> {
    static INDEX: OnceLock<HashMap<&'static str, (CardField, Extraction)>> = OnceLock::new();
    INDEX.get_or_init(|| {
        CARD_FIELDS
            .iter()
            .map(|(label, field, extraction)| (*label, (*field, *extraction)))
            .collect()
    })
}

/// Text of a scalar or page-reference value.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map.get("fulltext")?.as_str()?.trim().to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Flatten `<br />` to newlines and `[[target|label]]` links to their target.
#[must_use]
pub fn format_lore(markup: &str) -> String {
    static LINK: OnceLock<Regex> = OnceLock::new();
    let link = LINK.get_or_init(|| Regex::new(r"\[\[([^\]|]*)(?:\|[^\]]*)?\]\]").expect("valid regex"));
    let text = markup.replace("<br />", "\n").replace("<br/>", "\n");
    link.replace_all(&text, "$1").into_owned()
}

/// Values extracted by one rule.
#[derive(Debug)]
enum Extracted {
    Text(String),
    List(Vec<String>),
}

fn extract(values: &[Value], extraction: Extraction) -> Option<Extracted> {
    match extraction {
        Extraction::FirstScalar | Extraction::FirstFulltext => {
            values.first().and_then(value_text).map(Extracted::Text)
        }
        Extraction::LoreMarkup => values
            .first()
            .and_then(value_text)
            .map(|text| Extracted::Text(format_lore(&text))),
        Extraction::FulltextList | Extraction::ScalarList => {
            let list: Vec<String> = values.iter().filter_map(value_text).collect();
            (!list.is_empty()).then_some(Extracted::List(list))
        }
    }
}

fn assign(card: &mut Card, field: CardField, extracted: Extracted) {
    let (text, list) = match extracted {
        Extracted::Text(text) => (Some(text), Vec::new()),
        Extracted::List(list) => (None, list),
    };
    let number = text.as_deref().and_then(|t| t.parse::<u32>().ok());
    let signed = text.as_deref().and_then(|t| t.parse::<i32>().ok());

    match field {
        CardField::Password => card.password = text.as_deref().and_then(|t| t.parse().ok()),
        CardField::CardType => card.card_type = text,
        CardField::PrimaryType => card.race = text,
        CardField::MonsterType => card.monster_type = text,
        CardField::Attribute => card.attribute = text,
        CardField::Property => card.property = text,
        CardField::Level => card.level = number,
        CardField::Rank => card.rank = number,
        CardField::LinkRating => card.link_rating = number,
        CardField::PendulumScale => card.pendulum_scale = number,
        CardField::Atk => card.atk = signed,
        CardField::Def => card.def = signed,
        CardField::AtkString => card.atk_string = text,
        CardField::DefString => card.def_string = text,
        CardField::Archetypes => card.archetypes = list,
        CardField::ArchetypeSupport => card.archetype_support = list,
        CardField::LinkArrows => card.link_arrows = list,
        CardField::Materials => card.materials = text,
        CardField::PendulumEffect => card.pendulum_effect = text,
        CardField::Lore => card.lore = text,
        CardField::EnglishName => {
            if let Some(name) = text {
                card.english_name = normalize_name(&name);
            }
        }
        CardField::OcgStatus => card.ocg_status = text,
        CardField::CardImageName => card.card_image_name = text,
        CardField::Release => card.release = text,
    }
}

/// Build a card from one search result.
///
/// `name` is the result key; `printouts` the `{label: [values]}` object.
#[must_use]
pub fn card_from_printouts(name: &str, printouts: &Value) -> Card {
    let mut card = Card::new(normalize_name(name));
    let Some(labels) = printouts.as_object() else {
        return card;
    };

    for (label, values) in labels {
        let Some(&(field, extraction)) = card_field_index().get(label.as_str()) else {
            trace!(label = %label, "Ignoring unmapped printout label");
            continue;
        };
        let values = values.as_array().map(Vec::as_slice).unwrap_or_default();
        if let Some(extracted) = extract(values, extraction) {
            assign(&mut card, field, extracted);
        }
    }

    card
}

/// Regions whose prefix and release date the set search requests.
pub const SET_REGIONS: [&str; 3] = ["Japanese", "Asian-English", "Japanese-Asian"];

/// Printout labels requested by the set search.
#[must_use]
pub fn set_printout_labels() -> Vec<String> {
    let mut labels = vec![
        "Page name".to_string(),
        "Set image".to_string(),
        "Series".to_string(),
        "Set type".to_string(),
    ];
    for region in SET_REGIONS {
        labels.push(format!("{region} set and region prefix"));
    }
    for region in SET_REGIONS {
        labels.push(format!("{region} release date"));
    }
    labels
}

/// Prefix and release date of a set in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRelease {
    /// Region label
    pub region: String,
    /// Region-qualified prefix, e.g. `AGOV-JP`
    pub prefix: Option<String>,
    /// Release date in that region
    pub release_date: Option<NaiveDate>,
}

/// Set attributes returned by the set search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEnrichment {
    /// Set name
    pub name: String,
    /// Set artwork image name
    pub set_image: Option<String>,
    /// Set artwork `File:` title
    pub image_file: Option<String>,
    /// Series
    pub series: Option<String>,
    /// Product category
    pub set_type: Option<String>,
    /// Per-region prefix and date, only for regions with either present
    pub regions: Vec<RegionRelease>,
}

impl SetEnrichment {
    /// Release details for one region.
    #[must_use]
    pub fn region(&self, region: &str) -> Option<&RegionRelease> {
        self.regions.iter().find(|r| r.region == region)
    }
}

/// Convert a `{"timestamp": "..."}` value (unix seconds) to a date.
fn timestamp_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.get("timestamp")?;
    let seconds = match raw {
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.date_naive())
}

/// Build set enrichment from one search result.
#[must_use]
pub fn set_enrichment_from_printouts(name: &str, printouts: &Value) -> SetEnrichment {
    let first = |label: &str| {
        printouts
            .get(label)
            .and_then(Value::as_array)
            .and_then(|values| values.first())
    };
    let text = |label: &str| first(label).and_then(value_text);

    let name = text("Page name").map_or_else(|| normalize_name(name), |n| normalize_name(&n));
    let set_image = text("Set image");
    let image_file = set_image.as_ref().map(|image| {
        if image.starts_with("File:") {
            image.clone()
        } else {
            format!("File:{image}")
        }
    });

    let regions = SET_REGIONS
        .iter()
        .filter_map(|region| {
            let prefix = text(&format!("{region} set and region prefix"));
            let release_date = first(&format!("{region} release date")).and_then(timestamp_date);
            (prefix.is_some() || release_date.is_some()).then(|| RegionRelease {
                region: (*region).to_string(),
                prefix,
                release_date,
            })
        })
        .collect();

    SetEnrichment {
        name,
        set_image,
        image_file,
        series: text("Series"),
        set_type: text("Set type"),
        regions,
    }
}

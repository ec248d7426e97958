//! In-memory reference tables with natural-key indexes.
//!
//! Every lookup the collectors perform goes through a `HashMap` built once
//! when the tables are loaded. When two rows share an index key the row
//! inserted first wins and the later one is only reachable by iteration.

use cardex_core::{Card, CardSet, Rarity, SetKey};
use cardex_parser::lookup_key;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};

/// Sets, cards and rarities of one run, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    sets: Vec<Arc<CardSet>>,
    cards: Vec<Arc<Card>>,
    rarities: Vec<Arc<Rarity>>,

    sets_by_key: HashMap<SetKey, Arc<CardSet>>,
    sets_by_page: HashMap<String, Arc<CardSet>>,
    cards_by_name: HashMap<String, Arc<Card>>,
    cards_by_image: HashMap<String, Arc<Card>>,
    rarities_by_prefix: HashMap<String, Arc<Rarity>>,
    rarities_by_name: HashMap<String, Arc<Rarity>>,
}

/// Insert unless the key is taken. Returns whether the value was stored.
fn insert_first<K, V>(index: &mut HashMap<K, V>, key: K, value: V, table: &str) -> bool
where
    K: Eq + Hash + fmt::Display,
{
    match index.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            true
        }
        Entry::Occupied(slot) => {
            debug!(table, key = %slot.key(), "duplicate reference key, keeping first row");
            false
        }
    }
}

impl ReferenceTables {
    /// Build tables from loaded rows.
    #[must_use]
    pub fn new(sets: Vec<CardSet>, cards: Vec<Card>, rarities: Vec<Rarity>) -> Self {
        let mut tables = Self::default();
        for set in sets {
            tables.insert_set(set);
        }
        for card in cards {
            tables.insert_card(card);
        }
        for rarity in rarities {
            tables.insert_rarity(rarity);
        }

        info!(
            sets = tables.sets.len(),
            cards = tables.cards.len(),
            rarities = tables.rarities.len(),
            "built reference tables"
        );
        tables
    }

    /// Add a set and index it by key and by both page titles.
    pub fn insert_set(&mut self, set: CardSet) -> Arc<CardSet> {
        let set = Arc::new(set);
        insert_first(&mut self.sets_by_key, set.key(), Arc::clone(&set), "sets");
        insert_first(&mut self.sets_by_page, set.set_list_page(), Arc::clone(&set), "sets");
        insert_first(&mut self.sets_by_page, set.gallery_page(), Arc::clone(&set), "sets");
        self.sets.push(Arc::clone(&set));
        set
    }

    /// Add a card and index it by page name, english name and image name.
    pub fn insert_card(&mut self, card: Card) -> Arc<Card> {
        let card = Arc::new(card);
        let name_key = lookup_key(&card.name);
        let english_key = lookup_key(&card.english_name);

        if !name_key.is_empty() {
            insert_first(&mut self.cards_by_name, name_key.clone(), Arc::clone(&card), "cards");
        }
        if !english_key.is_empty() && english_key != name_key {
            insert_first(&mut self.cards_by_name, english_key, Arc::clone(&card), "cards");
        }
        if let Some(image_name) = card.card_image_name.as_deref().filter(|n| !n.is_empty()) {
            insert_first(
                &mut self.cards_by_image,
                image_name.to_string(),
                Arc::clone(&card),
                "cards",
            );
        }
        self.cards.push(Arc::clone(&card));
        card
    }

    /// Add a rarity and index it by prefix and by name.
    pub fn insert_rarity(&mut self, rarity: Rarity) -> Arc<Rarity> {
        let rarity = Arc::new(rarity);
        if !rarity.prefix.is_empty() {
            insert_first(
                &mut self.rarities_by_prefix,
                rarity.prefix.clone(),
                Arc::clone(&rarity),
                "rarities",
            );
        }
        insert_first(
            &mut self.rarities_by_name,
            rarity.name.to_lowercase(),
            Arc::clone(&rarity),
            "rarities",
        );
        self.rarities.push(Arc::clone(&rarity));
        rarity
    }

    /// Find a card by page or english name, ignoring Unicode form and disambiguators.
    #[must_use]
    pub fn card_by_name(&self, name: &str) -> Option<&Arc<Card>> {
        self.cards_by_name.get(&lookup_key(name))
    }

    /// Find a card by the name segment used in image filenames.
    #[must_use]
    pub fn card_by_image_name(&self, image_name: &str) -> Option<&Arc<Card>> {
        self.cards_by_image.get(image_name)
    }

    /// Find a rarity by its abbreviation, e.g. `UR`.
    #[must_use]
    pub fn rarity_by_prefix(&self, prefix: &str) -> Option<&Arc<Rarity>> {
        self.rarities_by_prefix.get(prefix.trim())
    }

    /// Find a rarity by abbreviation, falling back to its case-insensitive name.
    #[must_use]
    pub fn rarity_by_code_or_name(&self, code: &str) -> Option<&Arc<Rarity>> {
        self.rarity_by_prefix(code)
            .or_else(|| self.rarities_by_name.get(&code.trim().to_lowercase()))
    }

    /// Find a set by name and region.
    #[must_use]
    pub fn set(&self, key: &SetKey) -> Option<&Arc<CardSet>> {
        self.sets_by_key.get(key)
    }

    /// Find the set whose list or gallery page has the given title.
    #[must_use]
    pub fn set_by_page(&self, title: &str) -> Option<&Arc<CardSet>> {
        self.sets_by_page.get(title)
    }

    /// All sets in insertion order.
    #[must_use]
    pub fn sets(&self) -> &[Arc<CardSet>] {
        &self.sets
    }

    /// All cards in insertion order.
    #[must_use]
    pub fn cards(&self) -> &[Arc<Card>] {
        &self.cards
    }

    /// All rarities in insertion order.
    #[must_use]
    pub fn rarities(&self) -> &[Arc<Rarity>] {
        &self.rarities
    }

    /// Whether every table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.cards.is_empty() && self.rarities.is_empty()
    }
}

//! Reference table loading from JSON files.
//!
//! A reference directory holds three flat tables exported from the
//! catalog store: `sets.json`, `rarities.json` and `cards.json`, each a
//! JSON array of rows.

use crate::{
    error::{ReferenceError, Result},
    tables::ReferenceTables,
};
use cardex_core::{AppConfig, Card, CardGame, CardSet, Rarity};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the sets table.
pub const SETS_FILE: &str = "sets.json";
/// File name of the rarities table.
pub const RARITIES_FILE: &str = "rarities.json";
/// File name of the cards table.
pub const CARDS_FILE: &str = "cards.json";

/// Loader for the reference tables of one run.
pub struct ReferenceLoader {
    /// Directory containing the table files
    reference_dir: PathBuf,
}

impl ReferenceLoader {
    /// Create a loader for the given directory.
    ///
    /// # Errors
    /// Returns error if the path is not an existing directory.
    pub fn new(reference_dir: impl Into<PathBuf>) -> Result<Self> {
        let reference_dir = reference_dir.into();

        if !reference_dir.is_dir() {
            return Err(ReferenceError::DirectoryNotFound {
                path: reference_dir.display().to_string(),
            });
        }

        Ok(Self { reference_dir })
    }

    /// Create a loader for `reference/` under the platform data directory.
    pub fn with_default_dir() -> Result<Self> {
        Self::new(AppConfig::data_dir()?.join("reference"))
    }

    /// Directory this loader reads from.
    #[must_use]
    pub fn reference_dir(&self) -> &Path {
        &self.reference_dir
    }

    /// Load all three tables and build their indexes.
    ///
    /// A missing table file loads as empty. Rows that do not match the
    /// entity shape are logged and skipped. A set row without `card_game`
    /// takes the family implied by its language.
    pub fn load(&self) -> Result<ReferenceTables> {
        let sets: Vec<CardSet> = self.load_table(SETS_FILE, fill_card_game)?;
        let rarities: Vec<Rarity> = self.load_table(RARITIES_FILE, |_| {})?;
        let cards: Vec<Card> = self.load_table(CARDS_FILE, |_| {})?;

        info!(
            dir = %self.reference_dir.display(),
            sets = sets.len(),
            rarities = rarities.len(),
            cards = cards.len(),
            "loaded reference tables"
        );

        Ok(ReferenceTables::new(sets, cards, rarities))
    }

    fn load_table<T: DeserializeOwned>(
        &self,
        file_name: &str,
        prepare: fn(&mut Value),
    ) -> Result<Vec<T>> {
        let path = self.reference_dir.join(file_name);
        if !path.exists() {
            warn!(path = %path.display(), "reference table missing, loading as empty");
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&path)?;
        let rows: Vec<Value> =
            serde_json::from_str(&contents).map_err(|source| ReferenceError::ParseError {
                path: path.display().to_string(),
                source,
            })?;

        let total = rows.len();
        let parsed: Vec<T> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, mut row)| {
                prepare(&mut row);
                match serde_json::from_value(row) {
                    Ok(entity) => Some(entity),
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            row = index,
                            error = %e,
                            "skipping invalid reference row"
                        );
                        None
                    }
                }
            })
            .collect();

        debug!(
            path = %path.display(),
            total,
            loaded = parsed.len(),
            "loaded reference table"
        );

        Ok(parsed)
    }
}

fn fill_card_game(row: &mut Value) {
    let Some(fields) = row.as_object_mut() else {
        return;
    };
    if fields.get("card_game").is_some_and(|game| !game.is_null()) {
        return;
    }
    let Some(language) = fields.get("language").and_then(Value::as_str) else {
        return;
    };
    let game = CardGame::from_language(language).as_str();
    fields.insert("card_game".to_string(), Value::from(game));
}

//! Printing candidates from set list markup.

use crate::error::{CollectError, Result};
use crate::pool::run_bounded;
use cardex_core::{CardSet, CollectorConfig, Printing};
use cardex_fetch::{chunk_titles, params, response, FetchOrchestrator};
use cardex_parser::{parse_set_lists, DraftPrinting};
use cardex_reference::ReferenceTables;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Code-derived printings and the drafts whose card name did not resolve.
#[derive(Debug, Clone, Default)]
pub struct SetListSignal {
    /// Printings with code and artwork flag set, image fields unset
    pub printings: Vec<Printing>,
    /// Drafts to retry after redirect resolution
    pub unresolved: Vec<(Arc<CardSet>, DraftPrinting)>,
    /// Entry lines the parser skipped
    pub skipped_lines: usize,
    /// Drafts dropped for an unknown rarity
    pub unknown_rarities: usize,
    /// Workers that failed
    pub failed_workers: usize,
}

impl SetListSignal {
    fn extend(&mut self, other: SetListSignal) {
        self.printings.extend(other.printings);
        self.unresolved.extend(other.unresolved);
        self.skipped_lines += other.skipped_lines;
        self.unknown_rarities += other.unknown_rarities;
        self.failed_workers += other.failed_workers;
    }
}

/// Outcome of resolving one draft.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftResolution {
    /// Card and rarity resolved
    Resolved(Printing),
    /// Card name not in the reference tables
    UnknownCard,
    /// Rarity code not in the reference tables
    UnknownRarity,
}

/// Resolve a draft, looking the card up under `card_name`.
///
/// `card_name` is the draft's own name, or its canonical name after a redirect.
#[must_use]
pub fn resolve_draft_as(
    set: &Arc<CardSet>,
    draft: &DraftPrinting,
    card_name: &str,
    tables: &ReferenceTables,
) -> DraftResolution {
    let Some(rarity) = tables.rarity_by_code_or_name(&draft.rarity_code) else {
        return DraftResolution::UnknownRarity;
    };
    let Some(card) = tables.card_by_name(card_name) else {
        return DraftResolution::UnknownCard;
    };

    let mut printing = Printing::new(Arc::clone(set), Arc::clone(card), Arc::clone(rarity))
        .with_alternate_artwork(draft.is_alternate_artwork);
    printing.code.clone_from(&draft.printing_code);
    DraftResolution::Resolved(printing)
}

/// Resolve a draft under its own card name.
#[must_use]
pub fn resolve_draft(
    set: &Arc<CardSet>,
    draft: &DraftPrinting,
    tables: &ReferenceTables,
) -> DraftResolution {
    resolve_draft_as(set, draft, &draft.card_name, tables)
}

/// Collects code-derived printings from each set's list page.
pub struct SetListCollector {
    fetch: FetchOrchestrator,
    tables: Arc<ReferenceTables>,
    config: CollectorConfig,
}

impl SetListCollector {
    /// Create a collector.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, tables: Arc<ReferenceTables>, config: CollectorConfig) -> Self {
        Self {
            fetch,
            tables,
            config,
        }
    }

    /// Collect every set's list page, `sets_per_batch` sets per worker.
    pub async fn collect(&self, sets: &[Arc<CardSet>]) -> SetListSignal {
        let batches: Vec<Vec<Arc<CardSet>>> = sets
            .chunks(self.config.sets_per_batch.max(1))
            .map(<[Arc<CardSet>]>::to_vec)
            .collect();

        let outcome = run_bounded(
            "set_list",
            batches,
            self.config.max_concurrent_workers,
            |batch| {
                let fetch = self.fetch.clone();
                let tables = Arc::clone(&self.tables);
                async move { collect_batch(&fetch, &tables, batch).await }
            },
        )
        .await;

        let mut signal = SetListSignal {
            failed_workers: outcome.failed,
            ..SetListSignal::default()
        };
        for batch in outcome.results {
            signal.extend(batch);
        }

        info!(
            sets = sets.len(),
            printings = signal.printings.len(),
            unresolved = signal.unresolved.len(),
            skipped = signal.skipped_lines,
            failed = signal.failed_workers,
            "Set list pass complete"
        );
        signal
    }
}

async fn collect_batch(
    fetch: &FetchOrchestrator,
    tables: &ReferenceTables,
    sets: Vec<Arc<CardSet>>,
) -> Result<SetListSignal> {
    let by_page: HashMap<String, Arc<CardSet>> =
        sets.iter().map(|set| (set.set_list_page(), Arc::clone(set))).collect();
    let titles: Vec<String> = sets.iter().map(|set| set.set_list_page()).collect();

    let mut texts = BTreeMap::new();
    let mut fetched_pages = 0usize;
    for chunk in chunk_titles(&titles, fetch.batch_size()) {
        let pages = fetch
            .fetch_continued(fetch.api_url(), params::revisions(&chunk))
            .await;
        if pages.interrupted {
            warn!(titles = %chunk, "Set list revisions incomplete");
        }
        fetched_pages += pages.pages.len();
        for page in &pages.pages {
            texts.extend(response::revision_texts(page));
        }
    }

    if fetched_pages == 0 && !titles.is_empty() {
        return Err(CollectError::EmptyBatch {
            pass: "set_list",
            titles: titles.len(),
        });
    }

    let parsed = parse_set_lists(&texts);
    let mut signal = SetListSignal {
        skipped_lines: parsed.skipped,
        ..SetListSignal::default()
    };

    for draft in parsed.drafts {
        let Some(set) = by_page.get(&draft.source_page) else {
            debug!(page = %draft.source_page, "Set list page does not belong to batch");
            continue;
        };
        match resolve_draft(set, &draft, tables) {
            DraftResolution::Resolved(printing) => signal.printings.push(printing),
            DraftResolution::UnknownCard => {
                debug!(set = %set.name, card = %draft.card_name, "Card not found, deferring to redirects");
                signal.unresolved.push((Arc::clone(set), draft));
            }
            DraftResolution::UnknownRarity => {
                debug!(set = %set.name, rarity = %draft.rarity_code, "Rarity not found, dropping draft");
                signal.unknown_rarities += 1;
            }
        }
    }

    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardex_core::{Card, Rarity};

    fn tables() -> ReferenceTables {
        ReferenceTables::new(
            vec![],
            vec![Card::new("Dark Magician")],
            vec![
                Rarity::new("Ultra Rare", "UR", 1),
                Rarity::new("Rare", "R", 2),
            ],
        )
    }

    fn set() -> Arc<CardSet> {
        Arc::new(CardSet::new("Age of Overlord", "Japanese", "JP"))
    }

    fn draft(card_name: &str, rarity_code: &str) -> DraftPrinting {
        DraftPrinting {
            printing_code: Some("AGOV-JP001".to_string()),
            card_name: card_name.to_string(),
            rarity_code: rarity_code.to_string(),
            region: Some("JP".to_string()),
            print_code: None,
            source_page: "Set Card Lists:Age of Overlord (OCG-JP)".to_string(),
            is_alternate_artwork: true,
            quantity: None,
            description: None,
        }
    }

    #[test]
    fn test_resolve_draft() {
        let DraftResolution::Resolved(printing) =
            resolve_draft(&set(), &draft("Dark Magician", "UR"), &tables())
        else {
            panic!("expected resolved draft");
        };
        assert_eq!(printing.code.as_deref(), Some("AGOV-JP001"));
        assert_eq!(printing.rarity.name, "Ultra Rare");
        assert!(printing.is_alternate_artwork);
        assert!(printing.image_file.is_none());
    }

    #[test]
    fn test_resolve_rarity_by_name() {
        let resolution = resolve_draft(&set(), &draft("Dark Magician", "Rare"), &tables());
        assert!(matches!(resolution, DraftResolution::Resolved(_)));
    }

    #[test]
    fn test_resolve_misses() {
        assert_eq!(
            resolve_draft(&set(), &draft("Dark Magican", "UR"), &tables()),
            DraftResolution::UnknownCard
        );
        assert_eq!(
            resolve_draft(&set(), &draft("Dark Magician", "QCSE"), &tables()),
            DraftResolution::UnknownRarity
        );
    }

    #[test]
    fn test_resolve_under_canonical_name() {
        let resolution =
            resolve_draft_as(&set(), &draft("Dark Magican", "UR"), "Dark Magician", &tables());
        let DraftResolution::Resolved(printing) = resolution else {
            panic!("expected resolved draft");
        };
        assert_eq!(printing.card.name, "Dark Magician");
    }
}

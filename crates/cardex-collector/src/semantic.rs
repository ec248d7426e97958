//! Card and set discovery through the semantic search endpoint.

use crate::error::{CollectError, Result};
use crate::pool::run_bounded;
use cardex_core::entity::set_code_from_prefix;
use cardex_core::{Card, CardSet, CollectorConfig};
use cardex_fetch::{params, response, FetchOrchestrator};
use cardex_parser::printouts::{card_printout_labels, set_printout_labels};
use cardex_parser::{card_from_printouts, set_enrichment_from_printouts, SetEnrichment};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Cards discovered by search plus the number of failed initials.
#[derive(Debug, Clone, Default)]
pub struct CardSearch {
    /// Distinct cards sorted by name
    pub cards: Vec<Card>,
    /// Initials whose search failed outright
    pub failed_workers: usize,
}

/// Paginates the semantic search endpoint by offset.
pub struct SemanticSearchCollector {
    fetch: FetchOrchestrator,
    config: CollectorConfig,
}

impl SemanticSearchCollector {
    /// Create a collector.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, config: CollectorConfig) -> Self {
        Self { fetch, config }
    }

    /// Search card pages, one worker per configured page-name initial.
    ///
    /// Search patterns can overlap, so cards are deduplicated by name.
    pub async fn collect_cards(&self) -> CardSearch {
        let page_size = self.config.search_page_size;
        let outcome = run_bounded(
            "card_search",
            self.config.search_initials.clone(),
            self.config.max_concurrent_workers,
            |initial| {
                let fetch = self.fetch.clone();
                async move { search_cards(&fetch, &initial, page_size).await }
            },
        )
        .await;

        let mut by_name: BTreeMap<String, Card> = BTreeMap::new();
        for cards in outcome.results {
            for card in cards {
                by_name.entry(card.name.clone()).or_insert(card);
            }
        }

        let search = CardSearch {
            cards: by_name.into_values().collect(),
            failed_workers: outcome.failed,
        };
        info!(
            initials = self.config.search_initials.len(),
            cards = search.cards.len(),
            failed = search.failed_workers,
            "Card search complete"
        );
        search
    }

    /// Search set pages for per-region prefixes, dates and artwork.
    pub async fn collect_set_enrichment(&self) -> Result<Vec<SetEnrichment>> {
        let query = params::set_query();
        let labels = set_printout_labels();
        let pages = self
            .fetch
            .paginate_offset(
                self.fetch.semantic_url(),
                &params::ask(&query, &labels),
                self.config.search_page_size,
                response::ask_result_count,
            )
            .await;
        if pages.interrupted && pages.pages.is_empty() {
            return Err(CollectError::EmptyBatch {
                pass: "set_search",
                titles: 0,
            });
        }

        let rows: Vec<SetEnrichment> = pages
            .pages
            .iter()
            .flat_map(response::ask_results)
            .map(|(name, printouts)| set_enrichment_from_printouts(&name, &printouts))
            .collect();
        info!(sets = rows.len(), complete = pages.is_complete(), "Set search complete");
        Ok(rows)
    }

    /// Names of the Rush Duel sets, which share titles with OCG products.
    pub async fn collect_rush_duel_set_names(&self) -> Result<BTreeSet<String>> {
        let query = params::rush_duel_set_query();
        let pages = self
            .fetch
            .paginate_offset(
                self.fetch.semantic_url(),
                &params::ask(&query, &set_printout_labels()),
                self.config.search_page_size,
                response::ask_result_count,
            )
            .await;
        if pages.interrupted && pages.pages.is_empty() {
            return Err(CollectError::EmptyBatch {
                pass: "rush_duel_search",
                titles: 0,
            });
        }

        let names: BTreeSet<String> = pages
            .pages
            .iter()
            .flat_map(response::ask_results)
            .map(|(name, printouts)| set_enrichment_from_printouts(&name, &printouts).name)
            .collect();
        info!(sets = names.len(), complete = pages.is_complete(), "Rush Duel set search complete");
        Ok(names)
    }
}

/// Drop every set whose name is in `names`. Returns the number removed.
pub fn exclude_sets(sets: &mut Vec<CardSet>, names: &BTreeSet<String>) -> usize {
    let before = sets.len();
    sets.retain(|set| !names.contains(&set.name));
    let removed = before - sets.len();
    if removed > 0 {
        debug!(removed, "Excluded Rush Duel sets");
    }
    removed
}

async fn search_cards(fetch: &FetchOrchestrator, initial: &str, page_size: usize) -> Result<Vec<Card>> {
    let query = params::card_query(initial);
    let pages = fetch
        .paginate_offset(
            fetch.semantic_url(),
            &params::ask(&query, &card_printout_labels()),
            page_size,
            response::ask_result_count,
        )
        .await;
    if pages.interrupted {
        if pages.pages.is_empty() {
            return Err(CollectError::EmptyBatch {
                pass: "card_search",
                titles: 1,
            });
        }
        warn!(initial, pages = pages.pages.len(), "Card search incomplete, keeping fetched pages");
    }

    let cards: Vec<Card> = pages
        .pages
        .iter()
        .flat_map(response::ask_results)
        .map(|(name, printouts)| card_from_printouts(&name, &printouts))
        .collect();
    debug!(initial, cards = cards.len(), "Card search initial complete");
    Ok(cards)
}

/// Apply set search rows to every region of the matching sets.
///
/// Region-specific fields (prefix, set code, release date) come from the
/// row's entry for the set's region; the rest apply to all regions.
/// Returns the number of sets updated.
pub fn apply_enrichment(sets: &mut [CardSet], rows: &[SetEnrichment]) -> usize {
    let by_name: BTreeMap<&str, &SetEnrichment> =
        rows.iter().map(|row| (row.name.as_str(), row)).collect();

    let mut updated = 0;
    for set in sets.iter_mut() {
        let Some(row) = by_name.get(set.name.as_str()) else {
            continue;
        };

        if let Some(release) = row.region(&set.region) {
            if let Some(prefix) = release.prefix.as_deref().filter(|p| !p.is_empty()) {
                set.set_code = Some(set_code_from_prefix(prefix));
                set.prefix = Some(prefix.to_string());
            }
            if release.release_date.is_some() {
                set.release_date = release.release_date;
            }
        }
        fill(&mut set.set_type, row.set_type.as_deref());
        fill(&mut set.series, row.series.as_deref());
        fill(&mut set.set_image, row.set_image.as_deref());
        fill(&mut set.image_file, row.image_file.as_deref());
        updated += 1;
    }
    updated
}

fn fill(field: &mut Option<String>, value: Option<&str>) {
    if let Some(value) = value {
        *field = Some(value.to_string());
    }
}

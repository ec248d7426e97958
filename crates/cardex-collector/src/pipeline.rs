//! End-to-end catalog run.
//!
//! The pipeline owns no state beyond its fetch handle and configuration.
//! One [`CatalogPipeline::run`] call:
//!
//! 1. collects gallery and set list signals for every set concurrently,
//! 2. resolves the card names the set lists could not match through redirects,
//! 3. resolves image URLs for every gallery printing and unlinked image,
//! 4. consolidates both signals into one printing per key.
//!
//! [`CatalogPipeline::refresh_reference`] runs before that, when asked, to
//! extend the loaded reference tables with what the upstream wiki knows.
//!
//! Nothing here is fatal: failed workers are counted in [`CollectionStats`]
//! and the catalog is built from whatever the surviving workers returned.

use crate::consolidate::consolidate;
use crate::discovery::{merge_discovered, SetDiscoveryCollector};
use crate::error::Result;
use crate::gallery::GalleryImageCollector;
use crate::image_url::{apply_image_urls, ImageUrlResolver};
use crate::rarity::{merge_rarities, RarityCollector};
use crate::redirect::RedirectResolver;
use crate::semantic::{apply_enrichment, exclude_sets, SemanticSearchCollector};
use crate::set_list::{resolve_draft_as, DraftResolution, SetListCollector};
use cardex_core::{AppConfig, Card, CardSet, CollectorConfig, Printing, Rarity, UnlinkedImage};
use cardex_fetch::FetchOrchestrator;
use cardex_parser::DraftPrinting;
use cardex_reference::ReferenceTables;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts gathered during one run, for the caller to log or persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Sets the run covered
    pub sets: usize,
    /// Printings linked from gallery images
    pub gallery_printings: usize,
    /// Printings resolved from set lists, including redirect recoveries
    pub set_list_printings: usize,
    /// Set list entry lines the parser skipped
    pub skipped_lines: usize,
    /// Set list drafts dropped for an unknown rarity
    pub unknown_rarities: usize,
    /// Drafts recovered through a redirect
    pub redirects_applied: usize,
    /// Drafts whose card stayed unknown after redirects
    pub unresolved_cards: usize,
    /// Gallery printings given an image URL
    pub image_urls_resolved: usize,
    /// Workers that failed across all passes
    pub failed_workers: usize,
    /// Printings in the consolidated catalog
    pub printings: usize,
    /// Cards returned by the card search
    #[serde(default)]
    pub cards_searched: usize,
    /// Sets added to the reference tables by category discovery
    #[serde(default)]
    pub sets_discovered: usize,
    /// Rush Duel sets removed from the reference tables
    #[serde(default)]
    pub sets_excluded: usize,
    /// Rarities added to the reference tables by the rarity scrape
    #[serde(default)]
    pub rarities_scraped: usize,
}

impl CollectionStats {
    /// Add every counter of `other` to this one.
    pub fn merge(&mut self, other: &CollectionStats) {
        self.sets += other.sets;
        self.gallery_printings += other.gallery_printings;
        self.set_list_printings += other.set_list_printings;
        self.skipped_lines += other.skipped_lines;
        self.unknown_rarities += other.unknown_rarities;
        self.redirects_applied += other.redirects_applied;
        self.unresolved_cards += other.unresolved_cards;
        self.image_urls_resolved += other.image_urls_resolved;
        self.failed_workers += other.failed_workers;
        self.printings += other.printings;
        self.cards_searched += other.cards_searched;
        self.sets_discovered += other.sets_discovered;
        self.sets_excluded += other.sets_excluded;
        self.rarities_scraped += other.rarities_scraped;
    }
}

/// Reference tables rebuilt by [`CatalogPipeline::refresh_reference`].
#[derive(Debug)]
pub struct ReferenceRefresh {
    /// Loaded rows extended with upstream rows
    pub tables: ReferenceTables,
    /// Refresh counters; the per-run catalog fields stay zero
    pub stats: CollectionStats,
}

/// Result of one catalog run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogOutput {
    /// One printing per composite key
    pub printings: Vec<Printing>,
    /// Gallery images that could not be linked to a card or rarity
    pub unlinked_images: Vec<UnlinkedImage>,
    /// Run counters
    pub stats: CollectionStats,
}

struct Recovery {
    printings: Vec<Printing>,
    applied: usize,
    unresolved: usize,
    failed_workers: usize,
}

/// Drives the collectors, redirect resolution, image-URL pass and consolidation.
pub struct CatalogPipeline {
    fetch: FetchOrchestrator,
    config: CollectorConfig,
}

impl CatalogPipeline {
    /// Create a pipeline over an existing fetch handle.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, config: &AppConfig) -> Self {
        Self {
            fetch,
            config: config.collector.clone(),
        }
    }

    /// Create a pipeline with the production HTTP transport.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetch = FetchOrchestrator::from_config(config)?;
        Ok(Self::new(fetch, config))
    }

    /// Build the canonical catalog for `sets`.
    pub async fn run(&self, sets: &[Arc<CardSet>], tables: &Arc<ReferenceTables>) -> CatalogOutput {
        info!(sets = sets.len(), "Starting catalog run");

        let gallery_collector =
            GalleryImageCollector::new(self.fetch.clone(), Arc::clone(tables), self.config.clone());
        let set_list_collector =
            SetListCollector::new(self.fetch.clone(), Arc::clone(tables), self.config.clone());

        let (gallery, set_lists) = tokio::join!(
            gallery_collector.collect(sets),
            set_list_collector.collect(sets)
        );

        let recovery = self.recover_unresolved(set_lists.unresolved, tables).await;

        let mut with_images = gallery.printings;
        let mut unlinked = gallery.unlinked;
        let image_files: Vec<String> = with_images
            .iter()
            .filter_map(|printing| printing.image_file.clone())
            .chain(unlinked.iter().map(|image| image.image_file.clone()))
            .collect();
        let image_urls = ImageUrlResolver::new(self.fetch.clone(), self.config.clone())
            .resolve(image_files)
            .await;
        let image_urls_resolved = apply_image_urls(&mut with_images, &image_urls.urls);
        for image in &mut unlinked {
            image.image_url = image_urls.urls.get(&image.image_file).cloned();
        }

        let mut with_codes = set_lists.printings;
        with_codes.extend(recovery.printings);

        let mut stats = CollectionStats {
            sets: sets.len(),
            gallery_printings: with_images.len(),
            set_list_printings: with_codes.len(),
            skipped_lines: set_lists.skipped_lines,
            unknown_rarities: set_lists.unknown_rarities,
            redirects_applied: recovery.applied,
            unresolved_cards: recovery.unresolved,
            image_urls_resolved,
            failed_workers: gallery.failed_workers
                + set_lists.failed_workers
                + recovery.failed_workers
                + image_urls.failed_workers,
            ..CollectionStats::default()
        };

        let printings = consolidate(with_images, with_codes);
        stats.printings = printings.len();

        info!(
            printings = stats.printings,
            unlinked = unlinked.len(),
            redirects = stats.redirects_applied,
            failed = stats.failed_workers,
            "Catalog run complete"
        );

        CatalogOutput {
            printings,
            unlinked_images: unlinked,
            stats,
        }
    }

    /// Retry drafts whose card name missed, under their redirect target.
    async fn recover_unresolved(
        &self,
        unresolved: Vec<(Arc<CardSet>, DraftPrinting)>,
        tables: &ReferenceTables,
    ) -> Recovery {
        let mut recovery = Recovery {
            printings: Vec::new(),
            applied: 0,
            unresolved: 0,
            failed_workers: 0,
        };
        if unresolved.is_empty() {
            return recovery;
        }

        let redirects = RedirectResolver::new(self.fetch.clone(), self.config.clone())
            .resolve(unresolved.iter().map(|(_, draft)| draft.card_name.clone()))
            .await;
        recovery.failed_workers = redirects.failed_workers;

        for (set, draft) in unresolved {
            let Some(target) = redirects.target(&draft.card_name) else {
                debug!(set = %set.name, card = %draft.card_name, "No redirect for unknown card");
                recovery.unresolved += 1;
                continue;
            };

            match resolve_draft_as(&set, &draft, target, tables) {
                DraftResolution::Resolved(printing) => {
                    recovery.printings.push(printing);
                    recovery.applied += 1;
                }
                DraftResolution::UnknownCard | DraftResolution::UnknownRarity => {
                    debug!(set = %set.name, card = %draft.card_name, canonical = target, "Redirect target not in reference tables");
                    recovery.unresolved += 1;
                }
            }
        }

        if recovery.unresolved > 0 {
            warn!(count = recovery.unresolved, "Set list entries left without a known card");
        }
        recovery
    }

    /// Rebuild the reference tables from the loaded rows plus upstream searches.
    ///
    /// Sets found through the region categories are appended, Rush Duel sets
    /// are dropped, and every set is enriched from the set search. Loaded
    /// cards and rarities are inserted before upstream ones, so a row present
    /// in both keeps the loaded version. A failed search leaves its part of
    /// the tables as loaded and is counted in the stats.
    pub async fn refresh_reference(&self, tables: &ReferenceTables) -> ReferenceRefresh {
        let search = SemanticSearchCollector::new(self.fetch.clone(), self.config.clone());
        let discovery = SetDiscoveryCollector::new(self.fetch.clone(), self.config.clone());
        let rarity_collector = RarityCollector::new(self.fetch.clone(), self.config.clone());
        let (card_search, enrichment, rush_duel, discovered, scraped) = tokio::join!(
            search.collect_cards(),
            search.collect_set_enrichment(),
            search.collect_rush_duel_set_names(),
            discovery.discover(),
            rarity_collector.collect()
        );

        let mut stats = CollectionStats {
            failed_workers: card_search.failed_workers
                + discovered.failed_workers
                + scraped.failed_workers,
            ..CollectionStats::default()
        };

        let mut sets: Vec<CardSet> = tables.sets().iter().map(|set| (**set).clone()).collect();
        stats.sets_discovered = merge_discovered(&mut sets, discovered.sets);
        match rush_duel {
            Ok(names) => stats.sets_excluded = exclude_sets(&mut sets, &names),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Rush Duel search failed, keeping every set");
                stats.failed_workers += 1;
            }
        }
        match enrichment {
            Ok(rows) => {
                let updated = apply_enrichment(&mut sets, &rows);
                info!(rows = rows.len(), updated, "Applied set enrichment");
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Set search failed, keeping loaded sets");
                stats.failed_workers += 1;
            }
        }

        let set_images: Vec<String> = sets.iter().filter_map(|set| set.image_file.clone()).collect();
        if !set_images.is_empty() {
            let resolved = ImageUrlResolver::new(self.fetch.clone(), self.config.clone())
                .resolve(set_images)
                .await;
            stats.failed_workers += resolved.failed_workers;
            for set in &mut sets {
                if let Some(url) = set.image_file.as_ref().and_then(|file| resolved.urls.get(file)) {
                    set.image_url = Some(url.clone());
                }
            }
        }

        let mut cards: Vec<Card> = tables.cards().iter().map(|card| (**card).clone()).collect();
        stats.cards_searched = card_search.cards.len();
        cards.extend(card_search.cards);

        let mut rarities: Vec<Rarity> = tables
            .rarities()
            .iter()
            .map(|rarity| (**rarity).clone())
            .collect();
        stats.rarities_scraped = merge_rarities(&mut rarities, scraped.rarities);

        info!(
            sets = sets.len(),
            discovered = stats.sets_discovered,
            excluded = stats.sets_excluded,
            cards = stats.cards_searched,
            rarities = stats.rarities_scraped,
            failed = stats.failed_workers,
            "Reference refresh complete"
        );

        ReferenceRefresh {
            tables: ReferenceTables::new(sets, cards, rarities),
            stats,
        }
    }
}

//! Printing candidates from set image galleries.

use crate::error::{CollectError, Result};
use crate::pool::run_bounded;
use cardex_core::{CardSet, CollectorConfig, Printing, UnlinkedImage};
use cardex_fetch::{chunk_titles, params, response, FetchOrchestrator};
use cardex_parser::decode_image_file;
use cardex_reference::ReferenceTables;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Printings with image fields set, plus images that could not be linked.
#[derive(Debug, Clone, Default)]
pub struct GallerySignal {
    /// Image-derived printings, code unset
    pub printings: Vec<Printing>,
    /// Decoded images whose card or rarity is unknown
    pub unlinked: Vec<UnlinkedImage>,
    /// Workers that failed
    pub failed_workers: usize,
}

impl GallerySignal {
    fn extend(&mut self, other: GallerySignal) {
        self.printings.extend(other.printings);
        self.unlinked.extend(other.unlinked);
        self.failed_workers += other.failed_workers;
    }
}

/// Outcome of linking one gallery file.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryLink {
    /// Card and rarity resolved
    Linked(Printing),
    /// Filename decoded but card or rarity unknown
    Unlinked(UnlinkedImage),
    /// Not a printing scan, or an official proxy
    Skipped,
}

/// Link one gallery file of `set` against the reference tables.
#[must_use]
pub fn link_gallery_image(set: &Arc<CardSet>, file: &str, tables: &ReferenceTables) -> GalleryLink {
    let Some(decoded) = decode_image_file(file) else {
        debug!(set = %set.name, file, "Skipping file outside the scan naming scheme");
        return GalleryLink::Skipped;
    };
    if decoded.is_official_proxy() {
        debug!(set = %set.name, file, "Skipping official proxy");
        return GalleryLink::Skipped;
    }

    let card = tables.card_by_image_name(&decoded.card_image_name);
    let rarity = tables.rarity_by_prefix(&decoded.rarity_code);

    match (card, rarity) {
        (Some(card), Some(rarity)) => GalleryLink::Linked(
            Printing::new(Arc::clone(set), Arc::clone(card), Arc::clone(rarity))
                .with_image_file(file)
                .with_alternate_artwork(decoded.is_alternate_art()),
        ),
        (card, rarity) => GalleryLink::Unlinked(UnlinkedImage {
            set_name: set.name.clone(),
            region: set.region.clone(),
            image_file: file.to_string(),
            card_image_name: decoded.card_image_name,
            rarity_code: decoded.rarity_code,
            missing_card: card.is_none(),
            missing_rarity: rarity.is_none(),
            image_url: None,
        }),
    }
}

/// Collects image-derived printings for each set's gallery page.
pub struct GalleryImageCollector {
    fetch: FetchOrchestrator,
    tables: Arc<ReferenceTables>,
    config: CollectorConfig,
}

impl GalleryImageCollector {
    /// Create a collector.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, tables: Arc<ReferenceTables>, config: CollectorConfig) -> Self {
        Self {
            fetch,
            tables,
            config,
        }
    }

    /// Collect every set's gallery, `sets_per_batch` sets per worker.
    pub async fn collect(&self, sets: &[Arc<CardSet>]) -> GallerySignal {
        let batches: Vec<Vec<Arc<CardSet>>> = sets
            .chunks(self.config.sets_per_batch.max(1))
            .map(<[Arc<CardSet>]>::to_vec)
            .collect();

        let outcome = run_bounded(
            "gallery",
            batches,
            self.config.max_concurrent_workers,
            |batch| {
                let fetch = self.fetch.clone();
                let tables = Arc::clone(&self.tables);
                async move { collect_batch(&fetch, &tables, batch).await }
            },
        )
        .await;

        let mut signal = GallerySignal {
            failed_workers: outcome.failed,
            ..GallerySignal::default()
        };
        for batch in outcome.results {
            signal.extend(batch);
        }

        info!(
            sets = sets.len(),
            printings = signal.printings.len(),
            unlinked = signal.unlinked.len(),
            failed = signal.failed_workers,
            "Gallery pass complete"
        );
        signal
    }
}

async fn collect_batch(
    fetch: &FetchOrchestrator,
    tables: &ReferenceTables,
    sets: Vec<Arc<CardSet>>,
) -> Result<GallerySignal> {
    let by_page: HashMap<String, Arc<CardSet>> =
        sets.iter().map(|set| (set.gallery_page(), Arc::clone(set))).collect();
    let titles: Vec<String> = sets.iter().map(|set| set.gallery_page()).collect();

    let mut signal = GallerySignal::default();
    let mut fetched_pages = 0usize;

    for chunk in chunk_titles(&titles, fetch.batch_size()) {
        let pages = fetch
            .fetch_continued(fetch.api_url(), params::gallery_images(&chunk))
            .await;
        if pages.interrupted {
            warn!(titles = %chunk, "Gallery listing incomplete");
        }
        fetched_pages += pages.pages.len();

        for page in &pages.pages {
            for (title, files) in response::gallery_images(page) {
                let Some(set) = by_page.get(&title) else {
                    debug!(title = %title, "Gallery page does not belong to batch");
                    continue;
                };
                for file in files {
                    match link_gallery_image(set, &file, tables) {
                        GalleryLink::Linked(printing) => signal.printings.push(printing),
                        GalleryLink::Unlinked(image) => signal.unlinked.push(image),
                        GalleryLink::Skipped => {}
                    }
                }
            }
        }
    }

    if fetched_pages == 0 && !titles.is_empty() {
        return Err(CollectError::EmptyBatch {
            pass: "gallery",
            titles: titles.len(),
        });
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
            vec![Card::new("Dark Magician").with_image_name("DarkMagician")],
            vec![Rarity::new("Ultra Rare", "UR", 1)],
        )
    }

    fn set() -> Arc<CardSet> {
        Arc::new(CardSet::new("Age of Overlord", "Japanese", "JP").with_prefix("AGOV-JP"))
    }

    #[test]
    fn test_link_resolved_image() {
        let link = link_gallery_image(&set(), "File:DarkMagician-AGOV-JP-UR-AA.png", &tables());
        let GalleryLink::Linked(printing) = link else {
            panic!("expected linked printing");
        };
        assert_eq!(printing.card.name, "Dark Magician");
        assert_eq!(printing.rarity.name, "Ultra Rare");
        assert_eq!(
            printing.image_file.as_deref(),
            Some("File:DarkMagician-AGOV-JP-UR-AA.png")
        );
        assert!(printing.is_alternate_artwork);
        assert!(printing.code.is_none());
    }

    #[test]
    fn test_link_unknown_card_and_rarity() {
        let link = link_gallery_image(&set(), "File:Kuriboh-AGOV-JP-QCSE.png", &tables());
        let GalleryLink::Unlinked(image) = link else {
            panic!("expected unlinked image");
        };
        assert!(image.missing_card);
        assert!(image.missing_rarity);
        assert_eq!(image.card_image_name, "Kuriboh");
        assert_eq!(image.rarity_code, "QCSE");
        assert_eq!(image.region, "Japanese");
    }

    #[test]
    fn test_link_unknown_rarity_only() {
        let link = link_gallery_image(&set(), "File:DarkMagician-AGOV-JP-QCSE.png", &tables());
        let GalleryLink::Unlinked(image) = link else {
            panic!("expected unlinked image");
        };
        assert!(!image.missing_card);
        assert!(image.missing_rarity);
    }

    #[test]
    fn test_skip_proxy_and_non_matching() {
        assert_eq!(
            link_gallery_image(&set(), "File:DarkMagician-AGOV-JP-OP.png", &tables()),
            GalleryLink::Skipped
        );
        assert_eq!(
            link_gallery_image(&set(), "File:AGOV-BoosterJP.png", &tables()),
            GalleryLink::Skipped
        );
    }
}

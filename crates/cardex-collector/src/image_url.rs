//! Second pass resolving original image URLs for discovered files.

use crate::error::{CollectError, Result};
use crate::pool::run_bounded;
use cardex_core::{CollectorConfig, Printing};
use cardex_fetch::{chunk_titles, params, response, FetchOrchestrator};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Resolved URLs plus the number of failed batches.
#[derive(Debug, Clone, Default)]
pub struct ImageUrls {
    /// `File:` title to original URL
    pub urls: HashMap<String, String>,
    /// Batches whose workers failed
    pub failed_workers: usize,
}

/// Resolves `File:` titles to their original upload URL.
pub struct ImageUrlResolver {
    fetch: FetchOrchestrator,
    config: CollectorConfig,
}

impl ImageUrlResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, config: CollectorConfig) -> Self {
        Self { fetch, config }
    }

    /// Resolve every distinct file, `image_batch_size` files per request.
    ///
    /// Files without an upload are absent from the result.
    pub async fn resolve<I, S>(&self, files: I) -> ImageUrls
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = files.into_iter().map(Into::into).collect();
        let unique: Vec<String> = unique.into_iter().collect();
        let batches = chunk_titles(&unique, self.config.image_batch_size);

        let outcome = run_bounded(
            "image_urls",
            batches,
            self.config.max_concurrent_workers,
            |batch| {
                let fetch = self.fetch.clone();
                async move { resolve_batch(&fetch, &batch).await }
            },
        )
        .await;

        let mut resolved = ImageUrls {
            failed_workers: outcome.failed,
            ..ImageUrls::default()
        };
        for partial in outcome.results {
            resolved.urls.extend(partial);
        }

        info!(
            files = unique.len(),
            resolved = resolved.urls.len(),
            failed = resolved.failed_workers,
            "Image URL pass complete"
        );
        resolved
    }
}

async fn resolve_batch(fetch: &FetchOrchestrator, files: &str) -> Result<HashMap<String, String>> {
    let pages = fetch
        .fetch_continued(fetch.api_url(), params::original_images(files))
        .await;
    if pages.pages.is_empty() {
        return Err(CollectError::EmptyBatch {
            pass: "image_urls",
            titles: files.split('|').count(),
        });
    }

    let urls: HashMap<String, String> = pages
        .pages
        .iter()
        .flat_map(response::original_image_urls)
        .collect();
    debug!(resolved = urls.len(), "Image URL batch resolved");
    Ok(urls)
}

/// Set `image_url` on every printing whose image file was resolved.
///
/// Returns the number of printings updated.
pub fn apply_image_urls(printings: &mut [Printing], urls: &HashMap<String, String>) -> usize {
    let mut updated = 0;
    for printing in printings.iter_mut() {
        let Some(url) = printing.image_file.as_ref().and_then(|file| urls.get(file)) else {
            continue;
        };
        printing.image_url = Some(url.clone());
        updated += 1;
    }
    updated
}

//! Alias to canonical name resolution.

use crate::error::{CollectError, Result};
use crate::pool::run_bounded;
use cardex_core::CollectorConfig;
use cardex_fetch::{chunk_titles, params, response, FetchOrchestrator};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Resolved aliases plus the number of failed batches.
#[derive(Debug, Clone, Default)]
pub struct RedirectMap {
    /// Old name to canonical name
    pub targets: HashMap<String, String>,
    /// Batches whose workers failed
    pub failed_workers: usize,
}

impl RedirectMap {
    /// Canonical name of `name`, if it is an alias.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&str> {
        self.targets.get(name).map(String::as_str)
    }
}

/// Combine title normalization and redirects into one alias map.
///
/// A normalized title that is itself a redirect maps straight to the
/// redirect target. Identity entries are dropped.
#[must_use]
pub fn chain_mappings(
    normalized: &[(String, String)],
    redirects: &[(String, String)],
) -> HashMap<String, String> {
    let redirect_targets: HashMap<&str, &str> = redirects
        .iter()
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect();

    let mut targets = HashMap::new();
    for (from, to) in redirects {
        if from != to {
            targets.insert(from.clone(), to.clone());
        }
    }
    for (from, to) in normalized {
        let target = redirect_targets.get(to.as_str()).copied().unwrap_or(to.as_str());
        if from != target {
            targets.insert(from.clone(), target.to_string());
        }
    }
    targets
}

/// Batches names through the redirect endpoint.
pub struct RedirectResolver {
    fetch: FetchOrchestrator,
    config: CollectorConfig,
}

impl RedirectResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, config: CollectorConfig) -> Self {
        Self { fetch, config }
    }

    /// Resolve every alias among `names`.
    ///
    /// Names that are already canonical are absent from the result.
    pub async fn resolve<I, S>(&self, names: I) -> RedirectMap
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.trim().is_empty())
            .collect();
        let unique: Vec<String> = unique.into_iter().collect();
        let batches = chunk_titles(&unique, self.fetch.batch_size());

        let outcome = run_bounded(
            "redirects",
            batches,
            self.config.max_concurrent_workers,
            |batch| {
                let fetch = self.fetch.clone();
                async move { resolve_batch(&fetch, &batch).await }
            },
        )
        .await;

        let mut map = RedirectMap {
            failed_workers: outcome.failed,
            ..RedirectMap::default()
        };
        for partial in outcome.results {
            for (from, to) in partial {
                if let Some(previous) = map.targets.insert(from.clone(), to.clone()) {
                    if previous != to {
                        warn!(name = %from, previous = %previous, canonical = %to, "Conflicting redirect, keeping last");
                    }
                }
            }
        }

        info!(
            names = unique.len(),
            redirects = map.targets.len(),
            failed = map.failed_workers,
            "Redirect pass complete"
        );
        map
    }
}

async fn resolve_batch(fetch: &FetchOrchestrator, titles: &str) -> Result<HashMap<String, String>> {
    let pages = fetch
        .fetch_continued(fetch.api_url(), params::redirects(titles))
        .await;
    if pages.pages.is_empty() {
        return Err(CollectError::EmptyBatch {
            pass: "redirects",
            titles: titles.split('|').count(),
        });
    }

    let mut normalized = Vec::new();
    let mut redirects = Vec::new();
    for page in &pages.pages {
        normalized.extend(response::title_mappings(page, "normalized"));
        redirects.extend(response::title_mappings(page, "redirects"));
    }

    let targets = chain_mappings(&normalized, &redirects);
    debug!(resolved = targets.len(), "Redirect batch resolved");
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    #[test]
    fn test_chain_normalized_through_redirect() {
        let targets = chain_mappings(
            &pairs(&[("dark magician", "Dark magician")]),
            &pairs(&[("Dark magician", "Dark Magician")]),
        );
        assert_eq!(targets.get("dark magician").map(String::as_str), Some("Dark Magician"));
        assert_eq!(targets.get("Dark magician").map(String::as_str), Some("Dark Magician"));
    }

    #[test]
    fn test_normalized_only() {
        let targets = chain_mappings(&pairs(&[("kuriboh", "Kuriboh")]), &[]);
        assert_eq!(targets.get("kuriboh").map(String::as_str), Some("Kuriboh"));
    }

    #[test]
    fn test_identity_dropped() {
        let targets = chain_mappings(&[], &pairs(&[("Kuriboh", "Kuriboh")]));
        assert!(targets.is_empty());
    }

    #[test]
    fn test_redirect_map_target() {
        let mut map = RedirectMap::default();
        map.targets
            .insert("Dark Magican".to_string(), "Dark Magician".to_string());
        assert_eq!(map.target("Dark Magican"), Some("Dark Magician"));
        assert_eq!(map.target("Kuriboh"), None);
    }
}

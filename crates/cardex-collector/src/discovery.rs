//! Set discovery from the per-region set list and gallery categories.

use crate::error::{CollectError, Result};
use crate::pool::run_bounded;
use cardex_core::{CardSet, CollectorConfig, SetKey};
use cardex_fetch::{params, response, FetchOrchestrator};
use cardex_parser::{parse_set_page, SetPage, SetPageKind, DISCOVERY_REGIONS};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Sets found in the categories plus the number of failed category crawls.
#[derive(Debug, Clone, Default)]
pub struct SetDiscovery {
    /// One set per `(name, region)`, each carrying its discovered page titles
    pub sets: Vec<CardSet>,
    /// Category crawls that failed outright
    pub failed_workers: usize,
}

/// Crawls the set categories of every discovery region.
pub struct SetDiscoveryCollector {
    fetch: FetchOrchestrator,
    config: CollectorConfig,
}

impl SetDiscoveryCollector {
    /// Create a collector.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, config: CollectorConfig) -> Self {
        Self { fetch, config }
    }

    /// List and gallery categories of every region, one worker per category.
    pub async fn discover(&self) -> SetDiscovery {
        let categories: Vec<(&'static str, SetPageKind)> = DISCOVERY_REGIONS
            .iter()
            .flat_map(|region| [(*region, SetPageKind::List), (*region, SetPageKind::Gallery)])
            .collect();

        let outcome = run_bounded(
            "set_discovery",
            categories,
            self.config.max_concurrent_workers,
            |(region, kind)| {
                let fetch = self.fetch.clone();
                async move { crawl_category(&fetch, region, kind).await }
            },
        )
        .await;

        let sets = merge_set_pages(outcome.results.into_iter().flatten());
        info!(sets = sets.len(), failed = outcome.failed, "Set discovery complete");
        SetDiscovery {
            sets,
            failed_workers: outcome.failed,
        }
    }
}

async fn crawl_category(
    fetch: &FetchOrchestrator,
    region: &str,
    kind: SetPageKind,
) -> Result<Vec<SetPage>> {
    let category = kind.category(region);
    let pages = fetch
        .fetch_continued(fetch.api_url(), params::category_pages(&category))
        .await;
    if pages.pages.is_empty() {
        return Err(CollectError::EmptyBatch {
            pass: "set_discovery",
            titles: 1,
        });
    }
    if pages.interrupted {
        warn!(category, pages = pages.pages.len(), "Category crawl incomplete, keeping fetched pages");
    }

    let titles: Vec<String> = pages.pages.iter().flat_map(response::page_titles).collect();
    let found: Vec<SetPage> = titles
        .iter()
        .filter_map(|title| parse_set_page(title, region, kind))
        .collect();
    debug!(category, titles = titles.len(), sets = found.len(), "Crawled set category");
    Ok(found)
}

/// Fold discovered pages into one set per `(name, region)`.
///
/// List pages are applied before gallery pages, so a gallery attaches to
/// the set its list page created and only adds a set of its own when no
/// list page names it.
#[must_use]
pub fn merge_set_pages<I>(pages: I) -> Vec<CardSet>
where
    I: IntoIterator<Item = SetPage>,
{
    let mut pages: Vec<SetPage> = pages.into_iter().collect();
    pages.sort_by(|a, b| (a.kind, &a.region, &a.title).cmp(&(b.kind, &b.region, &b.title)));

    let mut sets: Vec<CardSet> = Vec::new();
    let mut index: HashMap<SetKey, usize> = HashMap::new();
    for page in pages {
        let key = SetKey {
            name: page.name.clone(),
            region: page.region.clone(),
        };
        let slot = *index.entry(key).or_insert_with(|| {
            sets.push(CardSet::new(&page.name, &page.region, &page.language));
            sets.len() - 1
        });

        let title = match page.kind {
            SetPageKind::List => &mut sets[slot].set_list_title,
            SetPageKind::Gallery => &mut sets[slot].gallery_title,
        };
        if title.is_none() {
            *title = Some(page.title);
        }
    }
    sets
}

/// Copy discovered page titles onto known sets and append the unknown ones.
///
/// Known sets keep every field they already have. Returns the number of
/// sets appended.
pub fn merge_discovered(sets: &mut Vec<CardSet>, discovered: Vec<CardSet>) -> usize {
    let index: HashMap<SetKey, usize> = sets
        .iter()
        .enumerate()
        .map(|(i, set)| (set.key(), i))
        .collect();

    let mut added = 0;
    for found in discovered {
        match index.get(&found.key()) {
            Some(&i) => {
                let known = &mut sets[i];
                if known.set_list_title.is_none() {
                    known.set_list_title = found.set_list_title;
                }
                if known.gallery_title.is_none() {
                    known.gallery_title = found.gallery_title;
                }
            }
            None => {
                sets.push(found);
                added += 1;
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, region: &str, kind: SetPageKind) -> SetPage {
        parse_set_page(title, region, kind).expect("valid set page")
    }

    #[test]
    fn test_gallery_attaches_to_listed_set() {
        let sets = merge_set_pages(vec![
            page("Set Card Galleries:Age of Overlord (OCG-JP)", "Japanese", SetPageKind::Gallery),
            page("Set Card Lists:Age of Overlord (OCG-JP)", "Japanese", SetPageKind::List),
            page("Set Card Galleries:Vol.1 (DM-JP)", "Japanese", SetPageKind::Gallery),
        ]);

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "Age of Overlord");
        assert_eq!(
            sets[0].set_list_title.as_deref(),
            Some("Set Card Lists:Age of Overlord (OCG-JP)")
        );
        assert_eq!(
            sets[0].gallery_title.as_deref(),
            Some("Set Card Galleries:Age of Overlord (OCG-JP)")
        );
        assert_eq!(sets[1].name, "Vol.1");
        assert_eq!(sets[1].set_list_title, None);
        assert_eq!(sets[1].gallery_page(), "Set Card Galleries:Vol.1 (DM-JP)");
    }

    #[test]
    fn test_same_name_in_two_regions_stays_apart() {
        let sets = merge_set_pages(vec![
            page("Set Card Lists:Age of Overlord (OCG-JP)", "Japanese", SetPageKind::List),
            page("Set Card Lists:Age of Overlord (OCG-AE)", "Asian-English", SetPageKind::List),
        ]);
        assert_eq!(sets.len(), 2);
        assert!(sets.iter().any(|set| set.language == "AE"));
    }

    #[test]
    fn test_merge_discovered_keeps_known_sets() {
        let mut known = CardSet::new("Age of Overlord", "Asian-English", "AE").with_prefix("AGOV-AE");
        known.gallery_title = Some("Set Card Galleries:Age of Overlord (OCG-AE)".to_string());
        let mut sets = vec![known];

        let discovered = merge_set_pages(vec![
            page("Set Card Lists:Age of Overlord (OCG-AE-UE)", "Asian-English", SetPageKind::List),
            page("Set Card Galleries:Age of Overlord (OCG-AE-UE)", "Asian-English", SetPageKind::Gallery),
            page("Set Card Lists:Duelist Nexus (OCG-AE)", "Asian-English", SetPageKind::List),
        ]);

        assert_eq!(merge_discovered(&mut sets, discovered), 1);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].prefix.as_deref(), Some("AGOV-AE"));
        assert_eq!(
            sets[0].set_list_page(),
            "Set Card Lists:Age of Overlord (OCG-AE-UE)"
        );
        assert_eq!(
            sets[0].gallery_page(),
            "Set Card Galleries:Age of Overlord (OCG-AE)"
        );
        assert_eq!(sets[1].name, "Duelist Nexus");
    }
}

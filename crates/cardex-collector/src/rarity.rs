//! Rarity table scrape.
//!
//! Every rarity has a page in `Category:Rarities`, and each abbreviation
//! used in printing codes and filenames (`UR`, `ScR`, ...) is a redirect to
//! that page. One rarity row is produced per redirect.

use crate::error::{CollectError, Result};
use crate::pool::run_bounded;
use cardex_core::{CollectorConfig, Rarity};
use cardex_fetch::{chunk_titles, params, response, FetchOrchestrator};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Category listing every rarity page.
pub const RARITY_CATEGORY: &str = "Category:Rarities";

/// Scraped rarities plus the number of failed requests.
#[derive(Debug, Clone, Default)]
pub struct RarityScrape {
    /// One row per redirect, plus a name-only row for rarities without one
    pub rarities: Vec<Rarity>,
    /// Category or redirect requests that failed outright
    pub failed_workers: usize,
}

/// Reads the rarity category and the redirects pointing at each member.
pub struct RarityCollector {
    fetch: FetchOrchestrator,
    config: CollectorConfig,
}

impl RarityCollector {
    /// Create a collector.
    #[must_use]
    pub fn new(fetch: FetchOrchestrator, config: CollectorConfig) -> Self {
        Self { fetch, config }
    }

    /// Scrape the rarity table.
    pub async fn collect(&self) -> RarityScrape {
        let pages = self
            .fetch
            .fetch_continued(self.fetch.api_url(), params::category_members(RARITY_CATEGORY))
            .await;
        if pages.pages.is_empty() {
            warn!(category = RARITY_CATEGORY, "Rarity category unavailable");
            return RarityScrape {
                rarities: Vec::new(),
                failed_workers: 1,
            };
        }

        let members: BTreeMap<String, u64> = pages
            .pages
            .iter()
            .flat_map(response::category_members)
            .map(|(title, id)| (title, id.unwrap_or_default()))
            .collect();
        let names: Vec<&String> = members.keys().collect();
        let batches = chunk_titles(&names, self.fetch.batch_size());

        let outcome = run_bounded(
            "rarity_redirects",
            batches,
            self.config.max_concurrent_workers,
            |batch| {
                let fetch = self.fetch.clone();
                async move { fetch_redirects(&fetch, &batch).await }
            },
        )
        .await;

        let redirects = outcome.results.into_iter().flatten();
        let rarities = rarity_rows(&members, redirects);
        info!(
            members = members.len(),
            rarities = rarities.len(),
            failed = outcome.failed,
            "Rarity scrape complete"
        );
        RarityScrape {
            rarities,
            failed_workers: outcome.failed,
        }
    }
}

async fn fetch_redirects(
    fetch: &FetchOrchestrator,
    titles: &str,
) -> Result<Vec<(String, String, Option<u64>)>> {
    let pages = fetch
        .fetch_continued(fetch.api_url(), params::incoming_redirects(titles))
        .await;
    if pages.pages.is_empty() {
        return Err(CollectError::EmptyBatch {
            pass: "rarity_redirects",
            titles: titles.split('|').count(),
        });
    }

    let redirects: Vec<_> = pages
        .pages
        .iter()
        .flat_map(response::incoming_redirects)
        .collect();
    debug!(redirects = redirects.len(), "Fetched rarity redirect batch");
    Ok(redirects)
}

/// Build rarity rows from category members and their incoming redirects.
///
/// Each redirect becomes a row whose prefix is the redirect title. A member
/// with no redirect keeps a row with an empty prefix so it still resolves
/// by name. Redirects to pages outside the category are ignored.
#[must_use]
pub fn rarity_rows<I>(members: &BTreeMap<String, u64>, redirects: I) -> Vec<Rarity>
where
    I: IntoIterator<Item = (String, String, Option<u64>)>,
{
    let mut by_member: BTreeMap<&str, Vec<(String, u64)>> = BTreeMap::new();
    for (target, prefix, id) in redirects {
        let Some((name, member_id)) = members.get_key_value(&target) else {
            continue;
        };
        by_member
            .entry(name.as_str())
            .or_default()
            .push((prefix, id.unwrap_or(*member_id)));
    }

    let mut rows = Vec::new();
    for (name, page_id) in members {
        match by_member.get_mut(name.as_str()) {
            Some(prefixes) => {
                prefixes.sort();
                rows.extend(
                    prefixes
                        .drain(..)
                        .map(|(prefix, id)| Rarity::new(name.as_str(), prefix, id)),
                );
            }
            None => rows.push(Rarity::new(name.as_str(), "", *page_id)),
        }
    }
    rows
}

/// Append scraped rarities that the known rows do not already cover.
///
/// A row is covered when its prefix is taken or, for an empty prefix, when
/// its name is. Returns the number of rows appended.
pub fn merge_rarities(rarities: &mut Vec<Rarity>, scraped: Vec<Rarity>) -> usize {
    let mut prefixes: HashSet<String> = rarities
        .iter()
        .filter(|rarity| !rarity.prefix.is_empty())
        .map(|rarity| rarity.prefix.clone())
        .collect();
    let mut names: HashSet<String> = rarities.iter().map(|rarity| rarity.name.to_lowercase()).collect();

    let mut added = 0;
    for rarity in scraped {
        let covered = if rarity.prefix.is_empty() {
            names.contains(&rarity.name.to_lowercase())
        } else {
            !prefixes.insert(rarity.prefix.clone())
        };
        if covered {
            continue;
        }
        names.insert(rarity.name.to_lowercase());
        rarities.push(rarity);
        added += 1;
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members() -> BTreeMap<String, u64> {
        [
            ("Ultra Rare".to_string(), 7),
            ("Secret Rare".to_string(), 8),
            ("Normal Parallel Rare".to_string(), 9),
        ]
        .into()
    }

    #[test]
    fn test_rows_per_redirect() {
        let rows = rarity_rows(
            &members(),
            vec![
                ("Ultra Rare".to_string(), "UR".to_string(), Some(70)),
                ("Secret Rare".to_string(), "SE".to_string(), Some(80)),
                ("Secret Rare".to_string(), "ScR".to_string(), None),
                ("Common".to_string(), "C".to_string(), Some(1)),
            ],
        );

        assert_eq!(rows.len(), 4);
        let ur = rows.iter().find(|r| r.prefix == "UR").expect("UR row");
        assert_eq!(ur.name, "Ultra Rare");
        assert_eq!(ur.page_id, 70);
        let scr = rows.iter().find(|r| r.prefix == "ScR").expect("ScR row");
        assert_eq!(scr.page_id, 8);
        assert!(rows.iter().all(|r| r.prefix != "C"));

        let bare = rows
            .iter()
            .find(|r| r.name == "Normal Parallel Rare")
            .expect("member without redirect");
        assert_eq!(bare.prefix, "");
        assert_eq!(bare.page_id, 9);
    }

    #[test]
    fn test_merge_keeps_known_rows() {
        let mut rarities = vec![Rarity::new("Ultra Rare", "UR", 1)];
        let scraped = vec![
            Rarity::new("Ultra Rare (scraped)", "UR", 70),
            Rarity::new("Secret Rare", "SE", 80),
            Rarity::new("Secret Rare", "SE", 81),
            Rarity::new("ultra rare", "", 7),
            Rarity::new("Normal Parallel Rare", "", 9),
        ];

        assert_eq!(merge_rarities(&mut rarities, scraped), 2);
        assert_eq!(rarities.len(), 3);
        assert_eq!(rarities[0].page_id, 1);
        assert_eq!(rarities[1].prefix, "SE");
        assert_eq!(rarities[2].name, "Normal Parallel Rare");
    }
}

//! Catalog runs against an in-memory wiki.

use async_trait::async_trait;
use cardex_collector::{CatalogPipeline, RedirectResolver};
use cardex_core::{AppConfig, Card, CardSet, Rarity};
use cardex_fetch::{FetchError, FetchOrchestrator, Result, RetryPolicy, WikiTransport};
use cardex_reference::ReferenceTables;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers query, image, redirect, category and search requests from fixed tables.
#[derive(Default)]
struct FakeWiki {
    revisions: HashMap<String, String>,
    galleries: HashMap<String, Vec<String>>,
    image_urls: HashMap<String, String>,
    redirects: HashMap<String, String>,
    incoming: HashMap<String, Vec<String>>,
    categories: HashMap<String, Vec<String>>,
    card_rows: Vec<(String, Value)>,
    set_rows: Vec<(String, Value)>,
    rush_duel_rows: Vec<(String, Value)>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<Vec<(String, String)>>>,
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn pages(entries: Vec<Value>) -> Value {
    let pages: Map<String, Value> = entries
        .into_iter()
        .enumerate()
        .map(|(i, page)| ((i + 1).to_string(), page))
        .collect();
    json!({ "query": { "pages": pages } })
}

impl FakeWiki {
    fn into_orchestrator(self) -> (Arc<Self>, FetchOrchestrator) {
        let wiki = Arc::new(self);
        let fetch = FetchOrchestrator::new(wiki.clone(), &AppConfig::default())
            .with_retry_policy(RetryPolicy::fixed(2, Duration::from_millis(5)));
        (wiki, fetch)
    }

    fn request_count(&self, prop: &str) -> usize {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|params| param(params, "prop") == Some(prop))
            .count()
    }

    fn answer(&self, params: &[(String, String)]) -> Value {
        if param(params, "title") == Some("Special:Ask") {
            return self.ask(params);
        }
        if param(params, "generator") == Some("categorymembers") {
            let members = param(params, "gcmtitle").and_then(|c| self.categories.get(c));
            return pages(
                members
                    .into_iter()
                    .flatten()
                    .map(|title| json!({ "ns": 0, "title": title }))
                    .collect(),
            );
        }
        if param(params, "list") == Some("categorymembers") {
            let members: Vec<Value> = param(params, "cmtitle")
                .and_then(|c| self.categories.get(c))
                .into_iter()
                .flatten()
                .enumerate()
                .map(|(i, title)| json!({ "pageid": i + 1, "ns": 0, "title": title }))
                .collect();
            return json!({ "query": { "categorymembers": members } });
        }

        let titles: Vec<&str> = param(params, "titles").unwrap_or_default().split('|').collect();
        match param(params, "prop") {
            Some("revisions") => pages(
                titles
                    .iter()
                    .filter_map(|title| {
                        let text = self.revisions.get(*title)?;
                        Some(json!({ "title": title, "revisions": [{ "*": text }] }))
                    })
                    .collect(),
            ),
            Some("images") => pages(
                titles
                    .iter()
                    .filter_map(|title| {
                        let files = self.galleries.get(*title)?;
                        let images: Vec<Value> =
                            files.iter().map(|file| json!({ "title": file })).collect();
                        Some(json!({ "title": title, "images": images }))
                    })
                    .collect(),
            ),
            Some("pageimages") => pages(
                titles
                    .iter()
                    .filter_map(|title| {
                        let url = self.image_urls.get(*title)?;
                        Some(json!({ "title": title, "original": { "source": url } }))
                    })
                    .collect(),
            ),
            Some("redirects") if param(params, "redirects").is_none() => pages(
                titles
                    .iter()
                    .map(|title| {
                        let redirects: Vec<Value> = self
                            .incoming
                            .get(*title)
                            .into_iter()
                            .flatten()
                            .enumerate()
                            .map(|(i, from)| json!({ "pageid": 100 + i, "ns": 0, "title": from }))
                            .collect();
                        json!({ "title": title, "redirects": redirects })
                    })
                    .collect(),
            ),
            Some("redirects") => {
                let redirects: Vec<Value> = titles
                    .iter()
                    .filter_map(|title| {
                        let to = self.redirects.get(*title)?;
                        Some(json!({ "from": title, "to": to }))
                    })
                    .collect();
                json!({ "query": { "redirects": redirects, "pages": {} } })
            }
            _ => json!({}),
        }
    }

    fn ask(&self, params: &[(String, String)]) -> Value {
        let query = param(params, "q").unwrap_or_default();
        let offset: usize = param(params, "offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let limit: usize = param(params, "limit").and_then(|v| v.parse().ok()).unwrap_or(50);

        let rows: Vec<&(String, Value)> = if query.contains("Rush Duel") {
            self.rush_duel_rows.iter().collect()
        } else if query.contains("Set page") {
            self.set_rows.iter().collect()
        } else {
            self.card_rows
                .iter()
                .filter(|(name, _)| {
                    query
                        .split('~')
                        .nth(1)
                        .and_then(|rest| rest.split('*').next())
                        .is_some_and(|initial| name.starts_with(initial))
                })
                .collect()
        };

        let results: Map<String, Value> = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(name, printouts)| (name.clone(), json!({ "printouts": printouts })))
            .collect();
        json!({ "results": results })
    }

    fn should_fail(&self, params: &[(String, String)]) -> bool {
        ["titles", "title", "gcmtitle", "cmtitle"].iter().any(|key| {
            param(params, key)
                .is_some_and(|titles| titles.split('|').any(|title| self.failing.contains(title)))
        })
    }

    fn delay(&self, params: &[(String, String)]) -> Option<Duration> {
        let titles = param(params, "titles")?;
        titles
            .split('|')
            .find_map(|title| self.delays.get(title).copied())
    }
}

#[async_trait]
impl WikiTransport for FakeWiki {
    async fn get_json(&self, _endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(params.to_vec());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay(params) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail(params) {
            return Err(FetchError::Network("connection reset".to_string()));
        }
        Ok(self.answer(params))
    }
}

fn reference_tables(sets: Vec<CardSet>) -> Arc<ReferenceTables> {
    Arc::new(ReferenceTables::new(
        sets,
        vec![
            Card::new("Dark Magician").with_image_name("DarkMagician"),
            Card::new("Kuriboh").with_image_name("Kuriboh"),
            Card::new("Blue-Eyes White Dragon").with_image_name("BlueEyesWhiteDragon"),
        ],
        vec![
            Rarity::new("Ultra Rare", "UR", 1),
            Rarity::new("Rare", "R", 2),
        ],
    ))
}

fn age_of_overlord() -> CardSet {
    CardSet::new("Age of Overlord", "Japanese", "JP").with_prefix("AGOV-JP")
}

#[tokio::test(start_paused = true)]
async fn test_run_merges_signals_and_recovers_redirects() {
    let set = age_of_overlord();
    let mut wiki = FakeWiki::default();
    wiki.revisions.insert(
        set.set_list_page(),
        "{{Set list|region=JP|rarities=R\n\
         AGOV-JP001; Dark Magician; UR\n\
         AGOV-JP002; Kuriboh\n\
         AGOV-JP003; Blue-Eyes; UR\n\
         AGOV-JP004; Nonexistent Card; R\n\
         }}"
            .to_string(),
    );
    wiki.galleries.insert(
        set.gallery_page(),
        vec![
            "File:DarkMagician-AGOV-JP-UR.png".to_string(),
            "File:Mystery-AGOV-JP-UR.png".to_string(),
            "File:DarkMagician-AGOV-JP-OP.png".to_string(),
            "File:AGOV-BoosterJP.png".to_string(),
        ],
    );
    wiki.image_urls.insert(
        "File:DarkMagician-AGOV-JP-UR.png".to_string(),
        "https://ms.yugipedia.com/DarkMagician-AGOV-JP-UR.png".to_string(),
    );
    wiki.image_urls.insert(
        "File:Mystery-AGOV-JP-UR.png".to_string(),
        "https://ms.yugipedia.com/Mystery-AGOV-JP-UR.png".to_string(),
    );
    wiki.redirects
        .insert("Blue-Eyes".to_string(), "Blue-Eyes White Dragon".to_string());

    let tables = reference_tables(vec![set]);
    let (_wiki, fetch) = wiki.into_orchestrator();
    let pipeline = CatalogPipeline::new(fetch, &AppConfig::default());

    let output = pipeline.run(tables.sets(), &tables).await;

    assert_eq!(output.printings.len(), 3);

    let magician = &output.printings[0];
    assert_eq!(magician.card.name, "Dark Magician");
    assert_eq!(magician.code.as_deref(), Some("AGOV-JP001"));
    assert_eq!(
        magician.image_file.as_deref(),
        Some("File:DarkMagician-AGOV-JP-UR.png")
    );
    assert_eq!(
        magician.image_url.as_deref(),
        Some("https://ms.yugipedia.com/DarkMagician-AGOV-JP-UR.png")
    );

    let code_only: HashMap<&str, Option<&str>> = output.printings[1..]
        .iter()
        .map(|p| (p.card.name.as_str(), p.code.as_deref()))
        .collect();
    assert_eq!(code_only.get("Kuriboh"), Some(&Some("AGOV-JP002")));
    assert_eq!(code_only.get("Blue-Eyes White Dragon"), Some(&Some("AGOV-JP003")));

    assert_eq!(output.unlinked_images.len(), 1);
    assert_eq!(output.unlinked_images[0].card_image_name, "Mystery");
    assert!(output.unlinked_images[0].missing_card);
    assert_eq!(
        output.unlinked_images[0].image_url.as_deref(),
        Some("https://ms.yugipedia.com/Mystery-AGOV-JP-UR.png")
    );

    assert_eq!(output.stats.redirects_applied, 1);
    assert_eq!(output.stats.unresolved_cards, 1);
    assert_eq!(output.stats.image_urls_resolved, 1);
    assert_eq!(output.stats.failed_workers, 0);
    assert_eq!(output.stats.printings, 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_sets_do_not_lose_or_duplicate_results() {
    let sets: Vec<CardSet> = (0..8)
        .map(|i| CardSet::new(format!("Set {i}"), "Japanese", "JP").with_prefix(format!("S{i}-JP")))
        .collect();

    let mut wiki = FakeWiki::default();
    for (i, set) in sets.iter().enumerate() {
        wiki.galleries.insert(
            set.gallery_page(),
            vec![format!("File:DarkMagician-S{i}-JP-UR.png")],
        );
        wiki.revisions.insert(
            set.set_list_page(),
            format!("{{{{Set list|region=JP\nS{i}-JP001; Dark Magician; UR\n}}}}"),
        );
        wiki.delays.insert(
            set.gallery_page(),
            Duration::from_millis(10 * (8 - i as u64)),
        );
        wiki.delays
            .insert(set.set_list_page(), Duration::from_millis(5 * i as u64));
    }
    for i in [2, 5] {
        wiki.failing.insert(sets[i].gallery_page());
        wiki.failing.insert(sets[i].set_list_page());
    }

    let mut config = AppConfig::default();
    config.collector.max_concurrent_workers = 3;

    let tables = reference_tables(sets);
    let (wiki, fetch) = wiki.into_orchestrator();
    let pipeline = CatalogPipeline::new(fetch, &config);

    let output = pipeline.run(tables.sets(), &tables).await;

    let mut names: Vec<&str> = output
        .printings
        .iter()
        .map(|p| p.set.name.as_str())
        .collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["Set 0", "Set 1", "Set 3", "Set 4", "Set 6", "Set 7"]
    );
    for printing in &output.printings {
        assert!(printing.code.is_some());
        assert!(printing.image_file.is_some());
    }

    // Gallery and set list workers for two sets
    assert_eq!(output.stats.failed_workers, 4);
    // Two passes of three workers each, run side by side
    assert!(wiki.peak.load(Ordering::SeqCst) <= 6);
    // Each failing title exhausted its two attempts in both passes
    assert_eq!(wiki.request_count("images"), 6 + 2 * 2);
    assert_eq!(wiki.request_count("revisions"), 6 + 2 * 2);
}

#[tokio::test(start_paused = true)]
async fn test_redirect_batches_merge() {
    let mut wiki = FakeWiki::default();
    for i in 0..120 {
        wiki.redirects
            .insert(format!("Alias {i}"), format!("Card {i}"));
    }
    let (wiki, fetch) = wiki.into_orchestrator();
    let resolver = RedirectResolver::new(fetch, AppConfig::default().collector);

    let names: Vec<String> = (0..120)
        .map(|i| format!("Alias {i}"))
        .chain((0..120).map(|i| format!("Alias {i}")))
        .chain(std::iter::once("Kuriboh".to_string()))
        .collect();
    let map = resolver.resolve(names).await;

    assert_eq!(map.targets.len(), 120);
    assert_eq!(map.target("Alias 42"), Some("Card 42"));
    assert_eq!(map.target("Kuriboh"), None);
    assert_eq!(map.failed_workers, 0);
    // 121 distinct names in batches of 50
    assert_eq!(wiki.request_count("redirects"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reference_adds_cards_and_enriches_sets() {
    let mut wiki = FakeWiki::default();
    wiki.card_rows = vec![
        (
            "Dark Magician".to_string(),
            json!({ "Card image name": ["DarkMagicianNew"], "ATK": [2500] }),
        ),
        (
            "Dark Magician Girl".to_string(),
            json!({ "Card image name": ["DarkMagicianGirl"], "ATK": [2000] }),
        ),
        (
            "Kuriboh".to_string(),
            json!({ "Card image name": ["Kuriboh"] }),
        ),
    ];
    wiki.set_rows = vec![(
        "Age of Overlord".to_string(),
        json!({
            "Page name": ["Age of Overlord"],
            "Set image": ["AGOV-BoosterJP.png"],
            "Set type": [{ "fulltext": "Booster pack" }],
            "Japanese set and region prefix": ["AGOV-JP"],
            "Japanese release date": [{ "timestamp": "1689811200" }],
        }),
    )];
    wiki.image_urls.insert(
        "File:AGOV-BoosterJP.png".to_string(),
        "https://ms.yugipedia.com/AGOV-BoosterJP.png".to_string(),
    );

    let mut config = AppConfig::default();
    config.collector.search_initials = vec!["D".to_string(), "K".to_string()];
    config.collector.search_page_size = 1;

    let base = reference_tables(vec![CardSet::new("Age of Overlord", "Japanese", "JP")]);
    let (_wiki, fetch) = wiki.into_orchestrator();
    let pipeline = CatalogPipeline::new(fetch, &config);

    let refresh = pipeline.refresh_reference(&base).await;
    let refreshed = &refresh.tables;

    // Loaded row wins over the searched one
    let magician = refreshed.card_by_name("Dark Magician").expect("loaded card");
    assert_eq!(magician.card_image_name.as_deref(), Some("DarkMagician"));
    let girl = refreshed.card_by_name("Dark Magician Girl").expect("searched card");
    assert_eq!(girl.atk, Some(2000));
    assert_eq!(
        refreshed.card_by_image_name("DarkMagicianGirl").map(|c| c.name.as_str()),
        Some("Dark Magician Girl")
    );

    let set = &refreshed.sets()[0];
    assert_eq!(set.prefix.as_deref(), Some("AGOV-JP"));
    assert_eq!(set.set_code.as_deref(), Some("AGOV"));
    assert_eq!(set.set_type.as_deref(), Some("Booster pack"));
    assert_eq!(
        set.release_date.map(|d| d.to_string()).as_deref(),
        Some("2023-07-20")
    );
    assert_eq!(
        set.image_url.as_deref(),
        Some("https://ms.yugipedia.com/AGOV-BoosterJP.png")
    );
    assert_eq!(refreshed.rarities().len(), 2);
    assert_eq!(refresh.stats.cards_searched, 3);
    assert_eq!(refresh.stats.failed_workers, 0);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reference_reports_failed_card_search() {
    let mut wiki = FakeWiki::default();
    wiki.card_rows = vec![(
        "Kuriboh".to_string(),
        json!({ "Card image name": ["Kuriboh"] }),
    )];
    wiki.failing.insert("Special:Ask".to_string());

    let mut config = AppConfig::default();
    config.collector.search_initials = vec!["K".to_string()];

    let base = reference_tables(vec![age_of_overlord()]);
    let (_wiki, fetch) = wiki.into_orchestrator();
    let pipeline = CatalogPipeline::new(fetch, &config);

    let refresh = pipeline.refresh_reference(&base).await;

    // Card search initial, set search and Rush Duel search all failed
    assert_eq!(refresh.stats.failed_workers, 3);
    assert_eq!(refresh.stats.cards_searched, 0);
    assert_eq!(refresh.tables.cards().len(), 3);
    assert_eq!(refresh.tables.sets().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reference_discovers_sets_and_scrapes_rarities() {
    let mut wiki = FakeWiki::default();
    let category = |name: &str, titles: &[&str]| {
        (name.to_string(), titles.iter().map(|t| (*t).to_string()).collect::<Vec<_>>())
    };
    wiki.categories.extend([
        category(
            "Category:Japanese Set Card Lists",
            &[
                "Set Card Lists:Age of Overlord (OCG-JP)",
                "Set Card Lists:Duelist Nexus (OCG-JP)",
                "Set Card Lists:Rush Pack (OCG-JP)",
                "Category:Japanese Set Card Lists by year",
            ],
        ),
        category(
            "Category:Japanese Set Card Galleries",
            &[
                "Set Card Galleries:Duelist Nexus (OCG-JP)",
                "Set Card Galleries:Vol.1 (DM-JP)",
                "Set Card Galleries:Vol.2 (OCG-JP-Reprint)",
            ],
        ),
        category(
            "Category:Asian-English Set Card Lists",
            &["Set Card Lists:Premium Pack (OCG-AE-UE)"],
        ),
        category(
            "Category:Rarities",
            &["Ultra Rare", "Secret Rare", "Normal Parallel Rare"],
        ),
    ]);
    wiki.incoming.insert(
        "Ultra Rare".to_string(),
        vec!["UR".to_string(), "Ultra".to_string()],
    );
    wiki.incoming.insert(
        "Secret Rare".to_string(),
        vec!["ScR".to_string(), "SE".to_string()],
    );
    wiki.rush_duel_rows = vec![(
        "Rush Pack".to_string(),
        json!({ "Page name": ["Rush Pack"] }),
    )];
    wiki.failing
        .insert("Category:Japanese-Asian Set Card Galleries".to_string());

    let mut config = AppConfig::default();
    config.collector.search_initials = Vec::new();

    let base = reference_tables(vec![CardSet::new("Age of Overlord", "Japanese", "JP")]);
    let (wiki, fetch) = wiki.into_orchestrator();
    let pipeline = CatalogPipeline::new(fetch, &config);

    let refresh = pipeline.refresh_reference(&base).await;
    let tables = &refresh.tables;

    let mut names: Vec<&str> = tables.sets().iter().map(|set| set.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["Age of Overlord", "Duelist Nexus", "Premium Pack", "Vol.1"]
    );
    let premium = tables
        .set_by_page("Set Card Lists:Premium Pack (OCG-AE-UE)")
        .expect("discovered edition page");
    assert_eq!(premium.language, "AE");
    assert!(tables.set_by_page("Set Card Galleries:Vol.1 (DM-JP)").is_some());
    assert!(tables.set_by_page("Set Card Galleries:Duelist Nexus (OCG-JP)").is_some());

    // Loaded UR row is kept; the other redirects become new rows
    assert_eq!(tables.rarity_by_prefix("UR").map(|r| r.page_id), Some(1));
    assert_eq!(
        tables.rarity_by_prefix("ScR").map(|r| r.name.as_str()),
        Some("Secret Rare")
    );
    assert_eq!(
        tables.rarity_by_prefix("Ultra").map(|r| r.name.as_str()),
        Some("Ultra Rare")
    );
    assert!(tables.rarity_by_code_or_name("Normal Parallel Rare").is_some());
    assert_eq!(tables.rarities().len(), 6);

    assert_eq!(refresh.stats.sets_discovered, 4);
    assert_eq!(refresh.stats.sets_excluded, 1);
    assert_eq!(refresh.stats.rarities_scraped, 4);
    assert_eq!(refresh.stats.failed_workers, 1);
    // The rarity redirects were read without following them
    assert_eq!(wiki.request_count("redirects"), 1);
}

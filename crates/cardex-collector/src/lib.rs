//! Cardex Collector
//!
//! Signal collection and entity resolution for the catalog pipeline.
//!
//! Three collectors gather partial knowledge about the same printings:
//! the gallery collector links image scans, the set list collector reads
//! printing codes, and the semantic search collector discovers cards and
//! set details. Before a run, the reference tables can be refreshed with
//! sets found in the region categories and the scraped rarity table. The [`RedirectResolver`] maps aliased card names to their
//! canonical page, and [`consolidate`] fuses the image and code signals
//! into one record per composite key. Every pass fans out through the
//! bounded [`run_bounded`] worker pool.
//!
//! # Example
//!
//! ```no_run
//! use cardex_collector::CatalogPipeline;
//! use cardex_core::AppConfig;
//! use cardex_reference::ReferenceLoader;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load_with_env()?;
//! let tables = Arc::new(ReferenceLoader::with_default_dir()?.load()?);
//! let pipeline = CatalogPipeline::from_config(&config)?;
//!
//! let output = pipeline.run(tables.sets(), &tables).await;
//! println!("{} printings", output.printings.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod consolidate;
pub mod discovery;
pub mod error;
pub mod gallery;
pub mod image_url;
pub mod pipeline;
pub mod pool;
pub mod rarity;
pub mod redirect;
pub mod semantic;
pub mod set_list;

// Re-export commonly used types
pub use consolidate::consolidate;
pub use discovery::{merge_discovered, merge_set_pages, SetDiscovery, SetDiscoveryCollector};
pub use error::{CollectError, Result};
pub use gallery::{link_gallery_image, GalleryImageCollector, GalleryLink, GallerySignal};
pub use image_url::{apply_image_urls, ImageUrlResolver, ImageUrls};
pub use pipeline::{CatalogOutput, CatalogPipeline, CollectionStats, ReferenceRefresh};
pub use pool::{run_bounded, PoolOutcome};
pub use rarity::{merge_rarities, rarity_rows, RarityCollector, RarityScrape, RARITY_CATEGORY};
pub use redirect::{chain_mappings, RedirectMap, RedirectResolver};
pub use semantic::{apply_enrichment, exclude_sets, CardSearch, SemanticSearchCollector};
pub use set_list::{resolve_draft, resolve_draft_as, DraftResolution, SetListCollector, SetListSignal};

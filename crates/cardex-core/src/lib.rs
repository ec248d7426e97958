//! Cardex Core - Foundation crate for the Cardex catalog pipeline.
//!
//! This crate provides the entity model, composite identity keys, error
//! taxonomy, and configuration that every other Cardex crate depends on.
//!
//! # Modules
//!
//! - [`entity`] - Reference entities (`CardSet`, `Card`, `Rarity`) and the `Printing` they combine into
//! - [`types`] - Identity keys (`SetKey`, `PrintingKey`) and the `CardGame` family
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//!
//! # Example
//!
//! ```rust
//! use cardex_core::{AppConfig, Card, CardSet, Printing, Rarity};
//! use std::sync::Arc;
//!
//! let config = AppConfig::default();
//! assert_eq!(config.fetch.batch_size, 50);
//!
//! let set = Arc::new(CardSet::new("Age of Overlord", "Japanese", "JP"));
//! let card = Arc::new(Card::new("Dark Magician"));
//! let rarity = Arc::new(Rarity::new("Ultra Rare", "UR", 1));
//!
//! let printing = Printing::new(set, card, rarity);
//! assert_eq!(
//!     printing.key().to_string(),
//!     "Japanese|Age of Overlord|Dark Magician|Ultra Rare"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod entity;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, CollectorConfig, FetchConfig, SourceConfig};
pub use entity::{Card, CardSet, Printing, Rarity, UnlinkedImage};
pub use error::{CardexError, ConfigError, ConfigResult, ErrorKind, Result};
pub use types::{CardGame, PrintingKey, SetKey};

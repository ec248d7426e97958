//! Cardex Reference
//!
//! The sets, cards and rarities known before a run starts, loaded once and
//! indexed by natural key so collectors never scan a list to resolve a name.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod loader;
pub mod tables;

// Re-export commonly used types
pub use error::{ReferenceError, Result};
pub use loader::ReferenceLoader;
pub use tables::ReferenceTables;

//! Cardex Parser
//!
//! Pure parsing of the upstream wiki formats: set list markup, gallery image
//! filenames, set page titles and semantic search printouts. Nothing in this
//! crate performs I/O; inputs are strings and JSON values already fetched by
//! the caller.
//!
//! # Example
//!
//! ```
//! use cardex_parser::{decode_image_file, parse_set_list_page};
//!
//! let parsed = parse_set_list_page(
//!     "Set Card Lists:Age of Overlord (OCG-JP)",
//!     "{{Set list|region=JP|rarities=R\nAGOV-JP001;Test Card;;;1\n}}",
//! );
//! assert_eq!(parsed.drafts[0].card_name, "Test Card");
//!
//! let image = decode_image_file("File:TestCard-AGOV-JP-R-AA.png").unwrap();
//! assert!(image.is_alternate_art());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod image_file;
pub mod normalize;
pub mod printouts;
pub mod set_list;
pub mod set_page;

// Re-export commonly used types
pub use image_file::{decode_image_file, DecodedImage};
pub use normalize::{lookup_key, normalize_name, strip_artwork_marker};
pub use printouts::{
    card_from_printouts, set_enrichment_from_printouts, RegionRelease, SetEnrichment,
};
pub use set_list::{parse_set_list_page, parse_set_lists, DraftPrinting, ParsedSetLists};
pub use set_page::{language_for_region, parse_set_page, SetPage, SetPageKind, DISCOVERY_REGIONS};

//! Set list markup parsing.
//!
//! A set list page holds one or more `{{Set list|...}}` blocks. The first
//! line of a block carries `key=value` parameters, every further line is
//! either another parameter line (starting with `|`) or one entry:
//!
//! ```text
//! {{Set list|region=JP|rarities=R,UR|qty=1
//! AGOV-JP001;Dark Magician;;;2
//! AGOV-JP002;Dark Magician Girl (alternate artwork);SE
//! }}
//! ```
//!
//! Entries are expanded into one [`DraftPrinting`] per rarity code.
//! Resolution against reference tables happens in the collector.

use crate::normalize::{mentions_artwork_variant, normalize_name, strip_artwork_marker};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Fields in a full entry line.
const ENTRY_FIELDS: usize = 5;

/// An unresolved printing read from set list markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPrinting {
    /// Printing code, e.g. `AGOV-JP001`
    pub printing_code: Option<String>,
    /// Normalized card name with artwork markers removed
    pub card_name: String,
    /// One rarity code or name
    pub rarity_code: String,
    /// Region declared by the block header
    pub region: Option<String>,
    /// Print marker, e.g. `Reprint`
    pub print_code: Option<String>,
    /// Title of the page the entry came from
    pub source_page: String,
    /// Entry named an artwork variant
    pub is_alternate_artwork: bool,
    /// Quantity, when the block includes it
    pub quantity: Option<u32>,
    /// Description option, when the block includes it
    pub description: Option<String>,
}

/// Drafts from a batch of pages plus the number of entry lines skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSetLists {
    /// Expanded drafts, in page then line order
    pub drafts: Vec<DraftPrinting>,
    /// Malformed entry lines and unterminated blocks that were skipped
    pub skipped: usize,
}

impl ParsedSetLists {
    fn extend(&mut self, other: ParsedSetLists) {
        self.drafts.extend(other.drafts);
        self.skipped += other.skipped;
    }
}

/// Block-level parameters.
#[derive(Debug, Default)]
struct BlockHeader {
    region: Option<String>,
    default_rarities: Vec<String>,
    no_abbreviation: bool,
    include_quantity: bool,
    include_description: bool,
    default_print: Option<String>,
}

impl BlockHeader {
    fn apply(&mut self, params: &str) {
        for param in params.split('|') {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "region" => self.region = non_empty(value),
                "rarities" => self.default_rarities = split_list(value),
                "options" => {
                    self.no_abbreviation = value
                        .split(',')
                        .any(|opt| opt.trim().eq_ignore_ascii_case("noabbr"));
                }
                "qty" => self.include_quantity = is_truthy(value),
                "description" => self.include_description = is_truthy(value),
                "print" => self.default_print = non_empty(value),
                _ => {}
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').filter_map(non_empty).collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

/// Replace the escaped `=` and `|` templates with their literal characters.
#[must_use]
pub fn clean_wikitext_specials(text: &str) -> String {
    text.replace("{{=}}", "=").replace("{{!}}", "|")
}

fn block_opener() -> &'static Regex {
    static OPENER: OnceLock<Regex> = OnceLock::new();
    OPENER.get_or_init(|| Regex::new(r"(?i)\{\{\s*set list\s*\|").expect("valid regex"))
}

/// Find the body of every set list block, with nested templates balanced.
///
/// Returns the bodies and the number of unterminated blocks.
fn find_blocks(markup: &str) -> (Vec<&str>, usize) {
    let bytes = markup.as_bytes();
    let mut blocks = Vec::new();
    let mut unterminated = 0;
    let mut resume_at = 0;

    for opener in block_opener().find_iter(markup) {
        if opener.start() < resume_at {
            continue;
        }

        let start = opener.end();
        let mut depth = 1usize;
        let mut i = start;
        let mut end = None;

        while i + 1 < bytes.len() {
            if bytes[i] == b'{' && bytes[i + 1] == b'{' {
                depth += 1;
                i += 2;
            } else if bytes[i] == b'}' && bytes[i + 1] == b'}' {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
                i += 2;
            } else {
                i += 1;
            }
        }

        match end {
            Some(end) => {
                blocks.push(&markup[start..end]);
                resume_at = end + 2;
            }
            None => {
                unterminated += 1;
                resume_at = markup.len();
            }
        }
    }

    (blocks, unterminated)
}

/// Parse every page of a `{title -> markup}` map.
#[must_use]
pub fn parse_set_lists(pages: &BTreeMap<String, String>) -> ParsedSetLists {
    let mut parsed = ParsedSetLists::default();
    for (title, markup) in pages {
        parsed.extend(parse_set_list_page(title, markup));
    }
    parsed
}

/// Parse the set list blocks of one page.
#[must_use]
pub fn parse_set_list_page(title: &str, markup: &str) -> ParsedSetLists {
    let (blocks, unterminated) = find_blocks(markup);
    if unterminated > 0 {
        warn!(page = %title, unterminated, "Skipping unterminated set list block");
    }

    let mut parsed = ParsedSetLists {
        drafts: Vec::new(),
        skipped: unterminated,
    };
    for block in blocks {
        parsed.extend(parse_block(title, block));
    }

    debug!(page = %title, drafts = parsed.drafts.len(), "Parsed set list page");
    parsed
}

fn parse_block(title: &str, body: &str) -> ParsedSetLists {
    let mut lines = body.lines();
    let mut header = BlockHeader::default();
    if let Some(first) = lines.next() {
        header.apply(first);
    }

    let mut parsed = ParsedSetLists::default();
    for raw in lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("<!--") {
            continue;
        }
        if let Some(params) = line.strip_prefix('|') {
            header.apply(params);
            continue;
        }

        match parse_entry(title, line, &header) {
            Some(drafts) => parsed.drafts.extend(drafts),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

fn parse_entry(title: &str, line: &str, header: &BlockHeader) -> Option<Vec<DraftPrinting>> {
    let (data, options) = match line.split_once("//") {
        Some((data, options)) => (data, Some(options)),
        None => (line, None),
    };
    let data = clean_wikitext_specials(data);
    let mut fields: Vec<&str> = data.split(';').map(str::trim).collect();

    let name_only = header.no_abbreviation || fields.len() == 1;
    if name_only {
        fields.truncate(1);
        fields.insert(0, "");
    }
    fields.resize(ENTRY_FIELDS, "");

    let (card_name, marked_in_name) = strip_artwork_marker(fields[1]);
    if card_name.is_empty() {
        warn!(page = %title, line = %line, "Skipping set list entry without card name");
        return None;
    }

    let options = options.map(parse_options).unwrap_or_default();
    let is_alternate_artwork =
        marked_in_name || options.values().any(|value| mentions_artwork_variant(value));

    let mut rarities = if name_only {
        Vec::new()
    } else {
        split_list(fields[2])
    };
    if rarities.is_empty() {
        rarities.clone_from(&header.default_rarities);
    }
    if rarities.is_empty() {
        warn!(page = %title, line = %line, "Skipping set list entry without rarity");
        return None;
    }

    let printing_code = non_empty(&normalize_name(fields[0]));
    let print_code = non_empty(fields[3]).or_else(|| header.default_print.clone());
    let quantity = if header.include_quantity {
        fields[4].parse().ok()
    } else {
        None
    };
    let description = if header.include_description {
        options.get("description").and_then(|value| non_empty(value))
    } else {
        None
    };

    Some(
        rarities
            .into_iter()
            .map(|rarity_code| DraftPrinting {
                printing_code: printing_code.clone(),
                card_name: card_name.clone(),
                rarity_code,
                region: header.region.clone(),
                print_code: print_code.clone(),
                source_page: title.to_string(),
                is_alternate_artwork,
                quantity,
                description: description.clone(),
            })
            .collect(),
    )
}

/// Split `key::value, key=value` option text. A bare value is kept under its own text.
fn parse_options(options: &str) -> HashMap<String, String> {
    options
        .split(',')
        .filter_map(|option| {
            let option = option.trim();
            if option.is_empty() {
                return None;
            }
            let (key, value) = option
                .split_once("::")
                .or_else(|| option.split_once('='))
                .unwrap_or((option, option));
            Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

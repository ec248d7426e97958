//! Fusion of image-derived and code-derived printings.
//!
//! Both collectors describe the same physical printings through the weak
//! natural key `(region, set, card english name, rarity)`. The gallery
//! knows which scan belongs to a printing, the set list knows its code.
//! [`consolidate`] merges the two so every key appears exactly once:
//!
//! 1. Duplicates within each input collapse onto the first-seen record.
//! 2. Code-derived records with a non-empty code are indexed by key.
//! 3. Each image-derived record takes the indexed code for its key and
//!    keeps its own image fields.
//! 4. Code-derived records whose key no image produced are appended.

use cardex_core::{Printing, PrintingKey};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Merge the two printing signals into one record per composite key.
///
/// Output order is image-derived hosts in input order, then code-only
/// records in input order.
#[must_use]
pub fn consolidate(with_images: Vec<Printing>, with_codes: Vec<Printing>) -> Vec<Printing> {
    let mut hosts = collapse(with_images);
    let codes = collapse(with_codes);

    let code_index: HashMap<PrintingKey, &Printing> = codes
        .iter()
        .filter(|printing| printing.has_code())
        .map(|printing| (printing.key(), printing))
        .collect();
    let alternate_keys: HashSet<PrintingKey> = codes
        .iter()
        .filter(|printing| printing.is_alternate_artwork)
        .map(Printing::key)
        .collect();

    let mut matched = 0usize;
    for host in &mut hosts {
        let key = host.key();
        if let Some(coded) = code_index.get(&key) {
            host.code.clone_from(&coded.code);
            matched += 1;
        }
        if alternate_keys.contains(&key) {
            host.is_alternate_artwork = true;
        }
    }

    let host_keys: HashSet<PrintingKey> = hosts.iter().map(Printing::key).collect();
    let mut code_only = 0usize;
    for printing in codes {
        if !host_keys.contains(&printing.key()) {
            hosts.push(printing);
            code_only += 1;
        }
    }

    debug!(
        printings = hosts.len(),
        matched,
        code_only,
        "Consolidated printing signals"
    );
    hosts
}

/// Collapse records sharing a key onto the first one, filling its absent fields.
fn collapse(printings: Vec<Printing>) -> Vec<Printing> {
    let mut positions: HashMap<PrintingKey, usize> = HashMap::new();
    let mut unique: Vec<Printing> = Vec::with_capacity(printings.len());

    for printing in printings {
        let key = printing.key();
        if let Some(&position) = positions.get(&key) {
            let first = &mut unique[position];
            first.absorb(&printing);
            first.is_alternate_artwork |= printing.is_alternate_artwork;
        } else {
            positions.insert(key, unique.len());
            unique.push(printing);
        }
    }

    unique
}

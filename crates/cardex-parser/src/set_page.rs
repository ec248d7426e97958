//! Set page titles listed in the per-region set categories.
//!
//! Each region keeps two categories, `Category:{region} Set Card Lists` and
//! `Category:{region} Set Card Galleries`. Their members are titled
//! `Set Card Lists:{name} ({game}-{language}[-{edition}])`, and the set
//! name is recovered by stripping the namespace and the region qualifier.

use regex::Regex;
use std::sync::OnceLock;

/// Regions whose set categories are crawled.
pub const DISCOVERY_REGIONS: [&str; 3] = ["Japanese", "Japanese-Asian", "Asian-English"];

/// Which of a set's two pages a title names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SetPageKind {
    /// `Set Card Lists:` page
    List,
    /// `Set Card Galleries:` page
    Gallery,
}

impl SetPageKind {
    /// Title namespace prefix, including the colon.
    #[must_use]
    pub fn namespace(self) -> &'static str {
        match self {
            Self::List => "Set Card Lists:",
            Self::Gallery => "Set Card Galleries:",
        }
    }

    /// Category holding this kind of page for `region`.
    #[must_use]
    pub fn category(self, region: &str) -> String {
        match self {
            Self::List => format!("Category:{region} Set Card Lists"),
            Self::Gallery => format!("Category:{region} Set Card Galleries"),
        }
    }
}

/// A set page found through its region category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPage {
    /// Set name with namespace and region qualifier removed
    pub name: String,
    /// Region of the category the page was listed in
    pub region: String,
    /// Language code of that region
    pub language: String,
    /// Exact page title
    pub title: String,
    /// List or gallery page
    pub kind: SetPageKind,
}

/// Language code used by a discovery region.
#[must_use]
pub fn language_for_region(region: &str) -> Option<&'static str> {
    match region {
        "Japanese" => Some("JP"),
        "Japanese-Asian" => Some("JA"),
        "Asian-English" => Some("AE"),
        _ => None,
    }
}

fn qualifier_pattern(region: &str) -> Option<&'static Regex> {
    static JAPANESE: OnceLock<Regex> = OnceLock::new();
    static JAPANESE_ASIAN: OnceLock<Regex> = OnceLock::new();
    static ASIAN_ENGLISH: OnceLock<Regex> = OnceLock::new();

    let (cell, pattern) = match region {
        "Japanese" => (&JAPANESE, r" \((?:OCG|DM)-JP(?:-Reprint)?\)$"),
        "Japanese-Asian" => (&JAPANESE_ASIAN, r" \(OCG-JA\)$"),
        "Asian-English" => (&ASIAN_ENGLISH, r" \(OCG-AE(?:-UE|-1E|-LE)?\)$"),
        _ => return None,
    };
    Some(cell.get_or_init(|| Regex::new(pattern).expect("valid regex")))
}

/// Parse a category member title into a set page.
///
/// Returns `None` for titles outside the kind's namespace, reprint pages,
/// and regions without a known language.
#[must_use]
pub fn parse_set_page(title: &str, region: &str, kind: SetPageKind) -> Option<SetPage> {
    let title = title.trim();
    let rest = title.strip_prefix(kind.namespace())?;
    if title.ends_with("Reprint)") {
        return None;
    }
    let language = language_for_region(region)?;
    let name = match qualifier_pattern(region) {
        Some(pattern) => pattern.replace(rest, "").into_owned(),
        None => rest.to_string(),
    };
    if name.is_empty() {
        return None;
    }

    Some(SetPage {
        name,
        region: region.to_string(),
        language: language.to_string(),
        title: title.to_string(),
        kind,
    })
}

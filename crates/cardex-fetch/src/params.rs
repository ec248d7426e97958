//! Query parameter builders for the upstream endpoints.
//!
//! Title arguments are already `|`-joined batches (see
//! [`chunk_titles`](crate::chunk_titles)).

type Params = Vec<(String, String)>;

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Current revision content of each title.
#[must_use]
pub fn revisions(titles: &str) -> Params {
    params(&[
        ("action", "query"),
        ("format", "json"),
        ("prop", "revisions"),
        ("rvprop", "content"),
        ("titles", titles),
    ])
}

/// Files embedded in each title.
#[must_use]
pub fn gallery_images(titles: &str) -> Params {
    params(&[
        ("action", "query"),
        ("format", "json"),
        ("prop", "images"),
        ("imlimit", "500"),
        ("titles", titles),
    ])
}

/// Original upload URL of each `File:` title.
#[must_use]
pub fn original_images(file_titles: &str) -> Params {
    params(&[
        ("action", "query"),
        ("format", "json"),
        ("prop", "pageimages"),
        ("piprop", "original"),
        ("pilimit", "500"),
        ("titles", file_titles),
    ])
}

/// Redirect and normalization targets of each title.
#[must_use]
pub fn redirects(titles: &str) -> Params {
    params(&[
        ("action", "query"),
        ("format", "json"),
        ("prop", "redirects"),
        ("redirects", "1"),
        ("rdlimit", "500"),
        ("titles", titles),
    ])
}

/// Pages that redirect to each title, without following redirects.
#[must_use]
pub fn incoming_redirects(titles: &str) -> Params {
    params(&[
        ("action", "query"),
        ("format", "json"),
        ("prop", "redirects"),
        ("rdlimit", "500"),
        ("titles", titles),
    ])
}

/// Member pages of `category`, returned as a page generator.
#[must_use]
pub fn category_pages(category: &str) -> Params {
    params(&[
        ("action", "query"),
        ("format", "json"),
        ("generator", "categorymembers"),
        ("gcmtitle", category),
        ("gcmlimit", "500"),
    ])
}

/// Main-namespace members of `category` as a plain list.
#[must_use]
pub fn category_members(category: &str) -> Params {
    params(&[
        ("action", "query"),
        ("format", "json"),
        ("list", "categorymembers"),
        ("cmtitle", category),
        ("cmnamespace", "0"),
        ("cmlimit", "500"),
    ])
}

/// Semantic `Special:Ask` query with the given printout labels.
///
/// `offset` and `limit` are added by the paginator.
#[must_use]
pub fn ask<S: AsRef<str>>(query: &str, printouts: &[S]) -> Params {
    let printouts: String = printouts
        .iter()
        .map(|label| format!("|?{}", label.as_ref()))
        .collect();

    params(&[
        ("title", "Special:Ask"),
        ("q", query),
        ("po", printouts.as_str()),
        ("p", "format=json"),
        ("order", "asc"),
        ("eq", "yes"),
        ("link", "none"),
    ])
}

/// Card pages of the official card game whose name starts with `initial`.
#[must_use]
pub fn card_query(initial: &str) -> String {
    format!(
        "[[Page type::Card page]][[Page name::~{initial}*]][[Release::Yu-Gi-Oh! Official Card Game]]"
    )
}

/// Official OCG set pages with a Japanese release date.
#[must_use]
pub fn set_query() -> String {
    "[[Page type::Set page]][[Medium::OCG]][[Medium::Official]][[Japanese release date::+]]"
        .to_string()
}

/// Rush Duel set pages.
#[must_use]
pub fn rush_duel_set_query() -> String {
    "[[Page type::Set page]][[Medium::Yu-Gi-Oh! Rush Duel]]".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_revisions() {
        let p = revisions("A|B");
        assert_eq!(get(&p, "prop"), Some("revisions"));
        assert_eq!(get(&p, "titles"), Some("A|B"));
    }

    #[test]
    fn test_original_images() {
        let p = original_images("File:A.png");
        assert_eq!(get(&p, "prop"), Some("pageimages"));
        assert_eq!(get(&p, "piprop"), Some("original"));
        assert_eq!(get(&p, "pilimit"), Some("500"));
    }

    #[test]
    fn test_incoming_redirects_do_not_follow() {
        let p = incoming_redirects("Ultra Rare|Secret Rare");
        assert_eq!(get(&p, "prop"), Some("redirects"));
        assert_eq!(get(&p, "rdlimit"), Some("500"));
        assert_eq!(get(&p, "redirects"), None);
        assert_eq!(get(&redirects("A"), "redirects"), Some("1"));
    }

    #[test]
    fn test_category_queries() {
        let p = category_pages("Category:Japanese Set Card Lists");
        assert_eq!(get(&p, "generator"), Some("categorymembers"));
        assert_eq!(get(&p, "gcmtitle"), Some("Category:Japanese Set Card Lists"));
        assert_eq!(get(&p, "gcmlimit"), Some("500"));

        let p = category_members("Category:Rarities");
        assert_eq!(get(&p, "list"), Some("categorymembers"));
        assert_eq!(get(&p, "cmtitle"), Some("Category:Rarities"));
        assert_eq!(get(&p, "cmnamespace"), Some("0"));
    }

    #[test]
    fn test_ask() {
        let p = ask(&card_query("A"), &["Password", "Card type"]);
        assert_eq!(get(&p, "title"), Some("Special:Ask"));
        assert_eq!(get(&p, "po"), Some("|?Password|?Card type"));
        assert_eq!(
            get(&p, "q"),
            Some("[[Page type::Card page]][[Page name::~A*]][[Release::Yu-Gi-Oh! Official Card Game]]")
        );
        assert_eq!(get(&p, "offset"), None);
    }
}

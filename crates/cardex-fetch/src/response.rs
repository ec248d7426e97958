//! Decoders for upstream response bodies.
//!
//! Each function reads one page of a response. Pages missing the expected
//! structure decode to nothing rather than an error.

use serde_json::Value;
use std::collections::BTreeMap;

fn pages(page: &Value) -> impl Iterator<Item = &Value> {
    page.pointer("/query/pages")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|pages| pages.iter())
        .filter(|(id, body)| !id.starts_with('-') && body.get("missing").is_none())
        .map(|(_, body)| body)
}

fn title(body: &Value) -> Option<&str> {
    body.get("title").and_then(Value::as_str)
}

/// `{title -> wikitext}` from a revisions response.
#[must_use]
pub fn revision_texts(page: &Value) -> BTreeMap<String, String> {
    pages(page)
        .filter_map(|body| {
            let revision = body.get("revisions")?.as_array()?.first()?;
            let text = revision
                .get("*")
                .or_else(|| revision.get("content"))
                .or_else(|| revision.pointer("/slots/main/*"))?
                .as_str()?;
            Some((title(body)?.to_string(), text.to_string()))
        })
        .collect()
}

/// `(page title, file titles)` from an images response.
#[must_use]
pub fn gallery_images(page: &Value) -> Vec<(String, Vec<String>)> {
    pages(page)
        .filter_map(|body| {
            let images = body
                .get("images")
                .and_then(Value::as_array)
                .map(|images| {
                    images
                        .iter()
                        .filter_map(|image| title(image).map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            Some((title(body)?.to_string(), images))
        })
        .collect()
}

/// `{file title -> original URL}` from a page images response.
///
/// Missing pages (negative ids) are left out.
#[must_use]
pub fn original_image_urls(page: &Value) -> BTreeMap<String, String> {
    pages(page)
        .filter_map(|body| {
            let url = body.pointer("/original/source")?.as_str()?;
            Some((title(body)?.to_string(), url.to_string()))
        })
        .collect()
}

/// `(from, to)` pairs of one kind (`redirects` or `normalized`).
#[must_use]
pub fn title_mappings(page: &Value, kind: &str) -> Vec<(String, String)> {
    page.pointer(&format!("/query/{kind}"))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let from = entry.get("from")?.as_str()?;
                    let to = entry.get("to")?.as_str()?;
                    Some((from.to_string(), to.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Titles of the pages in a query response, as produced by a generator.
#[must_use]
pub fn page_titles(page: &Value) -> Vec<String> {
    pages(page)
        .filter_map(|body| title(body).map(str::to_string))
        .collect()
}

/// `(title, page id)` of each entry in a `list=categorymembers` response.
#[must_use]
pub fn category_members(page: &Value) -> Vec<(String, Option<u64>)> {
    page.pointer("/query/categorymembers")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|member| {
                    let id = member.get("pageid").and_then(Value::as_u64);
                    Some((title(member)?.to_string(), id))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `(page title, redirect title, redirect page id)` for every redirect
/// listed under each page of a `prop=redirects` response.
#[must_use]
pub fn incoming_redirects(page: &Value) -> Vec<(String, String, Option<u64>)> {
    pages(page)
        .filter_map(|body| Some((title(body)?, body.get("redirects")?.as_array()?)))
        .flat_map(|(target, redirects)| {
            redirects.iter().filter_map(move |redirect| {
                let id = redirect.get("pageid").and_then(Value::as_u64);
                Some((target.to_string(), title(redirect)?.to_string(), id))
            })
        })
        .collect()
}

/// `(result name, printouts)` rows of a semantic search page.
///
/// An empty result set is serialized as `[]` upstream and yields no rows.
#[must_use]
pub fn ask_results(page: &Value) -> Vec<(String, Value)> {
    page.get("results")
        .and_then(Value::as_object)
        .map(|results| {
            results
                .iter()
                .map(|(name, row)| {
                    let printouts = row.get("printouts").cloned().unwrap_or(Value::Null);
                    (name.clone(), printouts)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Number of rows in a semantic search page.
#[must_use]
pub fn ask_result_count(page: &Value) -> usize {
    page.get("results")
        .and_then(Value::as_object)
        .map_or(0, serde_json::Map::len)
}

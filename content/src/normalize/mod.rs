//! Upstream JSON to internal records.
//!
//! Every field that the upstreams have spelled more than one way is resolved
//! from a static candidate-key table with [`crate::shape::pick`]. The tables
//! live next to the normalizer that uses them.

pub mod event;
pub mod menu;
pub mod news;
pub mod page;
pub mod site;

use crate::model::DocumentLink;
use crate::shape::{absolutize, media_url, pick, pick_str, record_id};
use serde_json::Value;

const DOCUMENT_ID_KEYS: &[&str] = &["DocumentID", "document_id", "documentId", "ID", "id"];
const DOCUMENT_LABEL_KEYS: &[&str] = &[
    "Label", "label", "Name", "name", "Title", "title", "FileName", "file_name", "fileName",
];
const DOCUMENT_URL_KEYS: &[&str] = &[
    "URL", "Url", "url", "Link", "link", "FileURL", "file_url", "fileUrl", "href",
];
const DOCUMENT_FILE_KEYS: &[&str] = &["File", "file", "Media", "media", "Attachment"];

/// Canonical page path: one leading slash, no repeated slashes, no trailing
/// slash except for the root.
pub fn normalize_path(raw: &str) -> String {
    let segments: Vec<&str> = raw
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Normalizes a document list. Documents without a resolvable URL are dropped.
///
/// `origin` is the CMS origin for relative uploads; documents from the events
/// API are passed through without it.
pub fn normalize_documents(items: &[Value], origin: Option<&str>) -> Vec<DocumentLink> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| normalize_document(item, index, origin))
        .collect()
}

fn normalize_document(item: &Value, index: usize, origin: Option<&str>) -> Option<DocumentLink> {
    let url = pick_str(item, DOCUMENT_URL_KEYS)
        .or_else(|| pick(item, DOCUMENT_FILE_KEYS).and_then(media_url))
        .or_else(|| match item {
            Value::String(_) => media_url(item),
            _ => None,
        })?;

    let url = match origin {
        Some(origin) => absolutize(origin, &url),
        None => url,
    };

    let label = pick_str(item, DOCUMENT_LABEL_KEYS)
        .or_else(|| file_name(&url))
        .unwrap_or_else(|| format!("Document {}", index + 1));

    let id = pick_str(item, DOCUMENT_ID_KEYS)
        .or_else(|| record_id(item))
        .unwrap_or_else(|| format!("doc-{index}"));

    Some(DocumentLink { id, label, url })
}

fn file_name(url: &str) -> Option<String> {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

//! Accessors over untyped upstream JSON.
//!
//! CMS records arrive either flat (Strapi v5) or wrapped as
//! `{id, attributes: {..}}` (Strapi v4). Every accessor here checks the flat
//! key first and then the same key under `attributes`.

use serde_json::Value;

/// A value counts as present unless it is null or an empty string.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Returns the first candidate that is present.
pub fn first_defined<'a, I>(candidates: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    candidates.into_iter().flatten().find(|v| is_present(v))
}

/// Looks up `key` on the record, then on `record.attributes`.
pub fn field<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    first_defined([
        record.get(key),
        record.get("attributes").and_then(|a| a.get(key)),
    ])
}

/// First present value among the candidate keys.
pub fn pick<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    first_defined(keys.iter().map(|key| field(record, key)))
}

/// Like [`pick`], rendering numbers and booleans as strings.
pub fn pick_str(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| field(record, key))
        .find_map(scalar_string)
}

pub fn pick_i64(record: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().filter_map(|key| field(record, key)).find_map(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn pick_bool(record: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().filter_map(|key| field(record, key)).find_map(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Unwraps a single relation: `{data: {..}}`, `{data: null}` or a plain object.
pub fn relation<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    let value = field(record, key)?;
    let inner = match value.get("data") {
        Some(data) => data,
        None => value,
    };
    match inner {
        Value::Object(_) => Some(inner),
        Value::Array(items) => items.first(),
        _ => None,
    }
}

/// Unwraps a to-many relation or component list: `{data: [..]}` or `[..]`.
pub fn relation_list<'a>(record: &'a Value, key: &str) -> &'a [Value] {
    let Some(value) = field(record, key) else {
        return &[];
    };
    as_list(value)
}

pub fn as_list(value: &Value) -> &[Value] {
    let inner = value.get("data").unwrap_or(value);
    match inner {
        Value::Array(items) => items,
        _ => &[],
    }
}

/// Record id as a string. Strapi v5 `documentId` wins over the numeric id.
pub fn record_id(record: &Value) -> Option<String> {
    pick_str(record, &["documentId", "id"])
}

/// URL of a media field: a plain string, `{url}`, `{data: {attributes: {url}}}`
/// or a list of those (first wins).
pub fn media_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(media_url),
        Value::Object(_) => {
            if let Some(data) = value.get("data") {
                return media_url(data);
            }
            pick_str(value, &["url", "src"])
        }
        _ => None,
    }
}

/// Prefixes CMS-relative asset paths with the CMS origin.
///
/// Absolute and protocol-relative URLs are left alone, and applying this to
/// its own output returns the same string.
pub fn absolutize(origin: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{rest}");
    }

    let origin = origin.trim().trim_end_matches('/');
    if origin.is_empty() || url.starts_with(origin) {
        return url.to_string();
    }
    format!("{origin}/{}", url.trim_start_matches('/'))
}

// Header propagation runs before routing. It copies the normalized host and
// every query parameter onto the request as headers, so tenant identity and
// request options are readable from the headers alone.

use content::tenant::{SITE_HOST_HEADER, SITE_HOSTNAME_HEADER, normalize_host};
use http::Request;
use http::header::{HOST, HeaderMap, HeaderName, HeaderValue};

pub const QUERY_HEADER_PREFIX: &str = "x-q-";

static STATIC_PREFIXES: &[&str] = &["/_next/", "/static/"];
static STATIC_FILES: &[&str] = &["/favicon.ico", "/robots.txt"];

/// Static assets skip propagation: build output, the favicon and any path
/// whose last segment has a file extension.
pub fn is_static_asset(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) || STATIC_FILES.contains(&path)
    {
        return true;
    }

    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

pub fn propagate<B>(request: &mut Request<B>) {
    if is_static_asset(request.uri().path()) {
        return;
    }

    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .and_then(|raw| normalize_host(&raw));
    let query = request.uri().query().map(str::to_string);

    let headers = request.headers_mut();

    if let Some(host) = host
        && let Ok(value) = HeaderValue::from_str(&host)
    {
        headers.insert(SITE_HOST_HEADER, value.clone());
        headers.insert(SITE_HOSTNAME_HEADER, value);
    }

    if let Some(query) = query {
        forward_query(headers, &query);
    }
}

/// Adds `x-q-<key>` for each query parameter. The first occurrence of a key
/// wins; keys or values that are not valid in a header are skipped.
fn forward_query(headers: &mut HeaderMap, query: &str) {
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let name = format!("{QUERY_HEADER_PREFIX}{}", key.to_ascii_lowercase());
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) else {
            tracing::debug!(key = %key, "query parameter not forwarded");
            continue;
        };
        headers.entry(name).or_insert(value);
    }
}

//! Tenant resolution.
//!
//! Every inbound request maps to one racing site ("tenant"). The identity is
//! derived from request metadata only, in this priority order:
//!
//! 1. explicit `site` / `slug` query parameter
//! 2. `x-site-host` header set by the propagation middleware
//! 3. `x-site-hostname` header
//! 4. raw `host` header
//! 5. the process-wide default slug
//!
//! Resolution never fails. An empty identity means "use whatever the CMS
//! considers the default site".

use http::HeaderMap;
use serde::Serialize;

pub const SITE_HOST_HEADER: &str = "x-site-host";
pub const SITE_HOSTNAME_HEADER: &str = "x-site-hostname";

const QUERY_OVERRIDE_KEYS: &[&str] = &["site", "slug"];
const HOST_HEADERS: &[&str] = &[SITE_HOST_HEADER, SITE_HOSTNAME_HEADER, "host"];
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "[::1]", "::1"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TenantIdentity {
    pub slug: Option<String>,
    pub host: Option<String>,
}

impl TenantIdentity {
    pub fn from_slug(slug: impl Into<String>) -> Self {
        TenantIdentity {
            slug: Some(slug.into()),
            host: None,
        }
    }

    pub fn from_host(host: impl Into<String>) -> Self {
        TenantIdentity {
            slug: None,
            host: Some(host.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slug.is_none() && self.host.is_none()
    }

    /// Stable key for per-tenant caches. The slug wins over the host.
    pub fn cache_key(&self) -> String {
        match (&self.slug, &self.host) {
            (Some(slug), _) => format!("slug:{slug}"),
            (None, Some(host)) => format!("host:{host}"),
            (None, None) => "default".to_string(),
        }
    }
}

impl std::fmt::Display for TenantIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[derive(Clone, Debug, Default)]
pub struct TenantResolver {
    default_slug: Option<String>,
}

impl TenantResolver {
    pub fn new(default_slug: Option<String>) -> Self {
        let default_slug = default_slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        TenantResolver { default_slug }
    }

    pub fn default_slug(&self) -> Option<&str> {
        self.default_slug.as_deref()
    }

    /// Resolves the tenant from request headers and the raw query string.
    pub fn resolve(&self, headers: &HeaderMap, query: Option<&str>) -> TenantIdentity {
        let host = host_from_headers(headers);

        if let Some(slug) = query.and_then(query_override) {
            return TenantIdentity {
                slug: Some(slug),
                host,
            };
        }

        if let Some(host) = host {
            return TenantIdentity::from_host(host);
        }

        TenantIdentity {
            slug: self.default_slug.clone(),
            host: None,
        }
    }
}

/// Normalizes a host header value for use as a CMS filter value.
///
/// Strips the scheme, any path or trailing slash and the port. Returns `None`
/// for empty input and loopback hosts.
pub fn normalize_host(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    let authority = without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme);

    let host = if authority.starts_with('[') {
        // IPv6 literal, keep the brackets and drop the port after them
        match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        }
    } else {
        authority.split(':').next().unwrap_or(authority)
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();

    if host.is_empty() || LOOPBACK_HOSTS.contains(&host.as_str()) {
        return None;
    }

    Some(host)
}

fn host_from_headers(headers: &HeaderMap) -> Option<String> {
    HOST_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .and_then(normalize_host)
    })
}

fn query_override(query: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    QUERY_OVERRIDE_KEYS.iter().find_map(|key| {
        pairs
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    })
}

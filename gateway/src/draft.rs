//! Draft mode: a signed cookie that lets a browser see unpublished CMS
//! content.
//!
//! The cookie value is `hex(HMAC-SHA256(preview secret, "draft-mode"))`, so it
//! is only valid while the preview secret stays the same. Without a
//! configured secret draft mode can never be enabled.

use content::PublicationMode;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use http::header::COOKIE;
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const DRAFT_COOKIE: &str = "pitlane_draft";

const DRAFT_MESSAGE: &[u8] = b"draft-mode";
const TOKEN_KEY: &[u8] = b"pitlane-token-check";

fn sign(key: &str, message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

fn verify(key: &str, message: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(signature).is_ok()
}

fn token_mac(token: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(TOKEN_KEY).ok()?;
    mac.update(token.as_bytes());
    Some(mac)
}

/// Compares a caller-supplied token with a configured secret in constant time.
///
/// Both values are MACed under a fixed key, so the comparison covers every
/// byte of the token and key padding never makes two tokens equal.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let (Some(expected), Some(provided)) = (token_mac(expected), token_mac(provided)) else {
        return false;
    };
    provided.verify_slice(&expected.finalize().into_bytes()).is_ok()
}

#[derive(Clone)]
pub struct DraftGate {
    secret: Option<String>,
    site_url: Option<Url>,
}

impl DraftGate {
    pub fn new(secret: Option<String>, site_url: Option<Url>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            tracing::info!("no preview secret configured, draft mode disabled");
        }
        DraftGate { secret, site_url }
    }

    /// True when `token` matches the preview secret.
    pub fn verify_token(&self, token: Option<&str>) -> bool {
        match (&self.secret, token) {
            (Some(secret), Some(token)) => secrets_match(secret, token),
            _ => false,
        }
    }

    /// `Draft` only for requests carrying a valid draft cookie.
    pub fn mode(&self, headers: &HeaderMap) -> PublicationMode {
        let Some(secret) = &self.secret else {
            return PublicationMode::Live;
        };

        let valid = cookie_values(headers, DRAFT_COOKIE).any(|value| {
            hex::decode(value).is_ok_and(|signature| verify(secret, DRAFT_MESSAGE, &signature))
        });

        if valid {
            PublicationMode::Draft
        } else {
            PublicationMode::Live
        }
    }

    /// `Set-Cookie` value that turns draft mode on.
    pub fn enable_cookie(&self) -> Option<String> {
        let signature = sign(self.secret.as_deref()?, DRAFT_MESSAGE)?;
        Some(format!(
            "{DRAFT_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            hex::encode(signature)
        ))
    }

    /// `Set-Cookie` value that expires the draft cookie.
    pub fn disable_cookie(&self) -> String {
        format!("{DRAFT_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }

    /// Where to send the browser after toggling draft mode.
    ///
    /// Relative paths are kept. Absolute URLs are reduced to their path when
    /// they point at the site's own origin. Anything else goes to `/`.
    pub fn redirect_target(&self, redirect: Option<&str>) -> String {
        let Some(redirect) = redirect.map(str::trim).filter(|r| !r.is_empty()) else {
            return "/".to_string();
        };

        if redirect.starts_with('/') && !redirect.starts_with("//") && !redirect.contains('\\') {
            return redirect.to_string();
        }

        if let Some(site) = &self.site_url
            && let Ok(target) = Url::parse(redirect)
            && target.origin() == site.origin()
        {
            return match target.query() {
                Some(query) => format!("{}?{query}", target.path()),
                None => target.path().to_string(),
            };
        }

        tracing::debug!(redirect, "rejected draft mode redirect");
        "/".to_string()
    }
}

fn cookie_values<'a>(headers: &'a HeaderMap, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(move |pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}

use content::{CacheConfig, CmsConfig, ContentSettings, RaceReadyConfig, SnapshotConfig};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const MAX_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_SUBSCRIPTIONS: usize = 10_000;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Cache TTL cannot be 0")]
    InvalidCacheTtl,

    #[error("Push subscription capacity cannot be 0")]
    InvalidPushCapacity,

    #[error("{upstream} timeout must be between 1 and 30 seconds, got {secs}")]
    InvalidTimeout { upstream: &'static str, secs: u64 },

    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for site traffic
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub raceready: RaceReadyConfig,
    #[serde(default)]
    pub tenant: TenantConfig,
    #[serde(default)]
    pub secrets: Secrets,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub push: PushConfig,
    /// Public origin of the site. Absolute draft-mode redirects are only
    /// followed when they point here.
    #[serde(default)]
    pub site_url: Option<Url>,
}

impl Config {
    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.cache.ttl_secs == 0 {
            return Err(ValidationError::InvalidCacheTtl);
        }

        if self.push.max_subscriptions == 0 {
            return Err(ValidationError::InvalidPushCapacity);
        }

        validate_timeout("cms", self.cms.timeout_secs)?;
        validate_timeout("raceready", self.raceready.timeout_secs)?;

        Ok(())
    }

    /// Applies environment overrides on top of the file config. `lookup`
    /// returns the value of a variable, if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = var("CMS_URL") {
            self.cms.url = Some(parse_url("CMS_URL", &url)?);
        }
        if let Some(token) = var("CMS_API_TOKEN") {
            self.cms.api_token = Some(token);
        }
        if let Some(slug) = var("SITE_SLUG") {
            self.tenant.default_slug = Some(slug);
        }
        if let Some(secret) = var("REVALIDATE_SECRET") {
            self.secrets.revalidate = Some(secret);
        }
        if let Some(secret) = var("PREVIEW_SECRET") {
            self.secrets.preview = Some(secret);
        }
        if let Some(guid) = var("RACEREADY_GUID") {
            self.raceready.guid = Some(guid);
        }
        if let Some(url) = var("RACEREADY_URL") {
            self.raceready.url = Some(parse_url("RACEREADY_URL", &url)?);
        }
        if let Some(url) = var("SITE_URL") {
            self.site_url = Some(parse_url("SITE_URL", &url)?);
        }
        if let Some(path) = var("CONFIG_SNAPSHOT_PATH") {
            self.snapshot.path = Some(path);
        }

        Ok(())
    }

    pub fn content_settings(&self) -> ContentSettings {
        ContentSettings {
            cms: self.cms.clone(),
            raceready: self.raceready.clone(),
            cache: self.cache.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}

fn validate_timeout(upstream: &'static str, secs: u64) -> Result<(), ValidationError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ValidationError::InvalidTimeout { upstream, secs });
    }
    Ok(())
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ValidationError> {
    Url::parse(raw).map_err(|source| ValidationError::InvalidUrl { var, source })
}

/// Web Push subscription storage
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PushConfig {
    /// Subscriptions kept in memory before new ones are refused
    pub max_subscriptions: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            max_subscriptions: DEFAULT_MAX_SUBSCRIPTIONS,
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TenantConfig {
    /// Tenant used when neither the query nor the host identifies one.
    #[serde(default)]
    pub default_slug: Option<String>,
}

/// Shared secrets for the webhook and preview endpoints. A missing secret
/// rejects every call to its endpoint.
#[derive(Clone, Default, Deserialize, PartialEq)]
pub struct Secrets {
    #[serde(default)]
    pub revalidate: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<String>| s.as_ref().map(|_| "<redacted>");
        f.debug_struct("Secrets")
            .field("revalidate", &redact(&self.revalidate))
            .field("preview", &redact(&self.preview))
            .finish()
    }
}

use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 1200;
pub const DEFAULT_CACHE_CAPACITY: u64 = 256;
pub const DEFAULT_RACEREADY_URL: &str = "https://raceready.com.au/api/events/";

/// Connection to the CMS REST API.
///
/// Both `url` and `api_token` may be absent, in which case every CMS lookup
/// is skipped and the static snapshot is served.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CmsConfig {
    #[serde(default)]
    pub url: Option<Url>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        CmsConfig {
            url: None,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CmsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// The third-party events API.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RaceReadyConfig {
    /// Defaults to [`DEFAULT_RACEREADY_URL`].
    #[serde(default)]
    pub url: Option<Url>,
    /// Used when the tenant's site record carries no GUID.
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RaceReadyConfig {
    fn default() -> Self {
        RaceReadyConfig {
            url: None,
            guid: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RaceReadyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Where the fallback site config comes from. Without a path the copy
/// compiled into the binary is used.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub path: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_yaml() {
        let cms: CmsConfig = serde_yaml::from_str("url: https://cms.example.com\n").unwrap();
        assert_eq!(cms.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!cms.is_configured());

        let cms: CmsConfig =
            serde_yaml::from_str("url: https://cms.example.com\napi_token: abc\n").unwrap();
        assert!(cms.is_configured());

        let cache: CacheConfig = serde_yaml::from_str("ttl_secs: 60\n").unwrap();
        assert_eq!(cache.ttl(), Duration::from_secs(60));
        assert_eq!(cache.max_capacity, DEFAULT_CACHE_CAPACITY);

        let raceready: RaceReadyConfig = serde_yaml::from_str("guid: abc\n").unwrap();
        assert_eq!(raceready.guid.as_deref(), Some("abc"));
        assert_eq!(raceready.url, None);
        assert_eq!(raceready.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}

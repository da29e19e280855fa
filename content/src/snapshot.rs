//! The snapshot provider supplies the site config served when the CMS is
//! unreachable or has no record for the tenant.

use crate::config::SnapshotConfig;
use crate::model::SiteConfig;
use crate::tenant::TenantIdentity;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

const BUNDLED_SNAPSHOT: &str = include_str!("../data/site-config.json");

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fallback configs: one default plus optional per-tenant overrides keyed by
/// slug.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiteSnapshot {
    pub default: SiteConfig,
    pub sites: IndexMap<String, SiteConfig>,
}

// A snapshot file holds either a single config or `{default, sites}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Multi {
        default: SiteConfig,
        #[serde(default)]
        sites: IndexMap<String, SiteConfig>,
    },
    Single(SiteConfig),
}

impl From<SnapshotFile> for SiteSnapshot {
    fn from(file: SnapshotFile) -> Self {
        match file {
            SnapshotFile::Multi { default, sites } => SiteSnapshot { default, sites },
            SnapshotFile::Single(default) => SiteSnapshot {
                default,
                sites: IndexMap::new(),
            },
        }
    }
}

impl SiteSnapshot {
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str::<SnapshotFile>(raw)?.into())
    }

    /// The tenant's entry by slug, then by domain, else the default.
    pub fn for_tenant(&self, tenant: &TenantIdentity) -> SiteConfig {
        if let Some(slug) = &tenant.slug
            && let Some(config) = self.sites.get(slug)
        {
            return config.clone();
        }

        if let Some(host) = &tenant.host
            && let Some(config) = self.sites.values().find(|config| {
                config
                    .domain
                    .as_deref()
                    .is_some_and(|domain| domain.eq_ignore_ascii_case(host))
            })
        {
            return config.clone();
        }

        self.default.clone()
    }
}

pub trait SnapshotProvider: Send + Sync {
    fn load(&self) -> Result<SiteSnapshot, SnapshotError>;
}

/// Snapshot compiled into the binary.
pub struct BundledSnapshotProvider;

impl SnapshotProvider for BundledSnapshotProvider {
    fn load(&self) -> Result<SiteSnapshot, SnapshotError> {
        SiteSnapshot::from_json(BUNDLED_SNAPSHOT)
    }
}

pub struct FilesystemSnapshotProvider {
    path: PathBuf,
}

impl FilesystemSnapshotProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilesystemSnapshotProvider { path: path.into() }
    }
}

impl SnapshotProvider for FilesystemSnapshotProvider {
    fn load(&self) -> Result<SiteSnapshot, SnapshotError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader::<_, SnapshotFile>(reader)?.into())
    }
}

pub fn get_provider(config: &SnapshotConfig) -> Arc<dyn SnapshotProvider> {
    match &config.path {
        Some(path) => {
            tracing::info!(path = %path, "using site config snapshot from file");
            Arc::new(FilesystemSnapshotProvider::new(path))
        }
        None => Arc::new(BundledSnapshotProvider),
    }
}

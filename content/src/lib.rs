//! Tenant-aware content lookups against the CMS and the RaceReady events API.
//!
//! Every lookup degrades rather than fails: upstream errors move a fallback
//! chain to its next step, and the site config falls back to a static
//! snapshot.

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod metrics_defs;
pub mod model;
pub mod normalize;
pub mod query;
pub mod raceready;
pub mod service;
pub mod shape;
pub mod snapshot;
pub mod tenant;

pub use cache::CacheStatus;
pub use config::{CacheConfig, CmsConfig, RaceReadyConfig, SnapshotConfig};
pub use errors::FetchError;
pub use query::PublicationMode;
pub use raceready::{View, ViewError};
pub use service::{ContentService, ContentSettings, Listing, SiteConfigLookup};
pub use tenant::{TenantIdentity, TenantResolver};

//! Content lookups for one tenant, each expressed as a fallback chain over the
//! CMS, the events API and the static snapshot.

use crate::cache::{CacheStatus, ConfigCache, ConfigMiss, InMemoryConfigCache, PageCache};
use crate::client::CmsClient;
use crate::config::{CacheConfig, CmsConfig, RaceReadyConfig, SnapshotConfig};
use crate::errors::FetchError;
use crate::fallback::{FallbackChain, non_empty};
use crate::metrics_defs::CONFIG_CACHE_STATUS;
use crate::model::{Event, MenuItem, NewsItem, PageRecord, SiteConfig};
use crate::normalize::event::normalize_event;
use crate::normalize::menu::{derive_menu, menu_collection_items, normalize_menu_items};
use crate::normalize::news::normalize_news;
use crate::normalize::normalize_path;
use crate::normalize::page::{find_by_candidate, last_segment, normalize_page};
use crate::normalize::site::normalize_site;
use crate::query::{CmsQuery, PublicationMode, SortOrder};
use crate::raceready::{RaceReadyClient, View};
use crate::shape::relation_list;
use crate::snapshot::{SiteSnapshot, SnapshotError, get_provider};
use crate::tenant::TenantIdentity;
use serde::Serialize;
use serde_json::Value;
use shared::counter;
use std::sync::Arc;

const SITES: &str = "sites";
const MENUS: &str = "menus";
const PAGES: &str = "pages";
const NEWS_ITEMS: &str = "news-items";
const EVENTS: &str = "events";

/// Relation from content collections to their site.
const SITE_RELATION: &str = "site";
/// Parent levels populated for the page slug scan.
const PARENT_DEPTH: usize = 3;
const PAGE_LIST_SIZE: usize = 100;
const HOME_SLUG: &str = "home";

/// News lookups in priority order: relation name, sort field, source tag.
const NEWS_STEPS: &[(&str, &str, &str)] = &[
    ("sites", "date", "sites:date"),
    ("sites", "publishedDate", "sites:publishedDate"),
    ("sites", "publishedAt", "sites:publishedAt"),
    ("site", "date", "site:date"),
    ("site", "publishedDate", "site:publishedDate"),
    ("site", "publishedAt", "site:publishedAt"),
];

pub const NO_SOURCE: &str = "none";

/// A list together with the tag of the step that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub source: &'static str,
}

impl<T> Listing<T> {
    fn empty() -> Self {
        Listing {
            items: Vec::new(),
            source: NO_SOURCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfigLookup {
    pub config: SiteConfig,
    pub status: CacheStatus,
}

/// Everything the content layer needs from the process config.
#[derive(Clone, Debug, Default)]
pub struct ContentSettings {
    pub cms: CmsConfig,
    pub raceready: RaceReadyConfig,
    pub cache: CacheConfig,
    pub snapshot: SnapshotConfig,
}

pub struct ContentService {
    cms: Option<CmsClient>,
    raceready: Option<RaceReadyClient>,
    default_guid: Option<String>,
    configs: Arc<dyn ConfigCache>,
    pages: PageCache,
    snapshot: SiteSnapshot,
}

impl ContentService {
    /// Builds the service. Fails only when the snapshot cannot be loaded.
    pub fn from_settings(settings: &ContentSettings) -> Result<Self, SnapshotError> {
        let snapshot = get_provider(&settings.snapshot).load()?;

        let cms = CmsClient::from_config(&settings.cms);
        if cms.is_none() {
            tracing::warn!("CMS URL or token missing, serving the static site config only");
        }

        let raceready = match RaceReadyClient::from_config(&settings.raceready) {
            Ok(client) => Some(client),
            Err(error) => {
                tracing::warn!(%error, "events API disabled");
                None
            }
        };

        let ttl = settings.cache.ttl();
        let capacity = settings.cache.max_capacity;

        Ok(ContentService {
            cms,
            raceready,
            default_guid: settings.raceready.guid.clone(),
            configs: Arc::new(InMemoryConfigCache::new(ttl, capacity)),
            pages: PageCache::new(ttl, capacity),
            snapshot,
        })
    }

    pub fn new(
        cms: Option<CmsClient>,
        raceready: Option<RaceReadyClient>,
        default_guid: Option<String>,
        configs: Arc<dyn ConfigCache>,
        pages: PageCache,
        snapshot: SiteSnapshot,
    ) -> Self {
        ContentService {
            cms,
            raceready,
            default_guid,
            configs,
            pages,
            snapshot,
        }
    }

    fn cms(&self) -> Result<&CmsClient, FetchError> {
        self.cms.as_ref().ok_or(FetchError::NotConfigured)
    }

    /// The tenant's raw `sites` record.
    pub async fn site_record(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<Option<Value>, FetchError> {
        let query = CmsQuery::new()
            .tenant(tenant, None)
            .publication(mode)
            .populate_all();
        let records = self.cms()?.collection(SITES, &query).await?;
        Ok(records.into_iter().next())
    }

    async fn fetch_site_config(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<SiteConfig, ConfigMiss> {
        let cms = self.cms.as_ref().ok_or(ConfigMiss::NotConfigured)?;
        let record = self
            .site_record(tenant, mode)
            .await?
            .ok_or(ConfigMiss::NoMatch)?;
        Ok(normalize_site(&record, cms.origin()))
    }

    /// Site config from the cache or the CMS, else the static snapshot.
    ///
    /// Draft lookups bypass the cache.
    pub async fn site_config(&self, tenant: &TenantIdentity, mode: PublicationMode) -> SiteConfigLookup {
        let result = if mode.is_draft() {
            self.fetch_site_config(tenant, mode)
                .await
                .map(|config| (config, CacheStatus::Miss))
                .map_err(Arc::new)
        } else {
            self.configs
                .get_or_fetch(
                    &tenant.cache_key(),
                    Box::pin(self.fetch_site_config(tenant, mode)),
                )
                .await
        };

        let lookup = match result {
            Ok((config, status)) => SiteConfigLookup { config, status },
            Err(miss) => {
                tracing::warn!(%tenant, error = %miss, "serving static site config");
                SiteConfigLookup {
                    config: self.snapshot.for_tenant(tenant),
                    status: CacheStatus::Fallback,
                }
            }
        };

        counter!(CONFIG_CACHE_STATUS, "status" => lookup.status.as_str()).increment(1);
        lookup
    }

    /// Menu: dedicated collection, then the site's own menu, then derived
    /// from the page tree.
    pub async fn menu(&self, tenant: &TenantIdentity, mode: PublicationMode) -> Listing<MenuItem> {
        let chain = FallbackChain::new("menu")
            .step("menus", self.menu_from_collection(tenant, mode))
            .step("site.menu", self.menu_from_site(tenant, mode))
            .step("derived", self.menu_from_pages(tenant, mode));

        match chain.resolve().await {
            Some(resolved) => Listing {
                items: resolved.value,
                source: resolved.source,
            },
            None => Listing::empty(),
        }
    }

    async fn menu_from_collection(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<Option<Vec<MenuItem>>, FetchError> {
        let query = CmsQuery::new()
            .tenant(tenant, Some(SITE_RELATION))
            .publication(mode)
            .populate_all();
        let records = self.cms()?.collection(MENUS, &query).await?;
        Ok(non_empty(menu_collection_items(&records)))
    }

    async fn menu_from_site(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<Option<Vec<MenuItem>>, FetchError> {
        let record = self.site_record(tenant, mode).await?;
        Ok(record.and_then(|record| non_empty(normalize_menu_items(relation_list(&record, "menu")))))
    }

    async fn menu_from_pages(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<Option<Vec<MenuItem>>, FetchError> {
        let query = CmsQuery::new()
            .tenant(tenant, Some(SITE_RELATION))
            .publication(mode)
            .populate_all()
            .page_size(PAGE_LIST_SIZE);
        let records = self.cms()?.collection(PAGES, &query).await?;
        Ok(non_empty(derive_menu(&records)))
    }

    /// Tenant news, newest first. Tries each relation and sort field in turn,
    /// then unfiltered news.
    pub async fn news(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
        limit: usize,
    ) -> Listing<NewsItem> {
        let mut chain = FallbackChain::new("news");

        if !tenant.is_empty() {
            for &(relation, sort, source) in NEWS_STEPS {
                let query = CmsQuery::new()
                    .tenant(tenant, Some(relation))
                    .publication(mode)
                    .sort(sort, SortOrder::Desc)
                    .page_size(limit)
                    .populate_all();
                chain = chain.step(source, self.news_from(query));
            }
        }

        let global = CmsQuery::new()
            .publication(mode)
            .sort("publishedAt", SortOrder::Desc)
            .page_size(limit)
            .populate_all();
        chain = chain.step("global", self.news_from(global));

        match chain.resolve().await {
            Some(resolved) => Listing {
                items: resolved.value,
                source: resolved.source,
            },
            None => Listing::empty(),
        }
    }

    async fn news_from(&self, query: CmsQuery) -> Result<Option<Vec<NewsItem>>, FetchError> {
        let cms = self.cms()?;
        let records = cms.collection(NEWS_ITEMS, &query).await?;
        Ok(non_empty(normalize_news(&records, cms.origin())))
    }

    /// Page by path: exact `path` match, then a slug scan over candidate
    /// paths. Published pages are cached per tenant and path.
    pub async fn page(
        &self,
        tenant: &TenantIdentity,
        path: &str,
        mode: PublicationMode,
    ) -> Option<PageRecord> {
        let path = normalize_path(path);
        if mode.is_draft() {
            return self.resolve_page(tenant, &path, mode).await;
        }
        self.pages
            .get_or_fetch(&tenant.cache_key(), &path, self.resolve_page(tenant, &path, mode))
            .await
    }

    async fn resolve_page(
        &self,
        tenant: &TenantIdentity,
        path: &str,
        mode: PublicationMode,
    ) -> Option<PageRecord> {
        let chain = FallbackChain::new("page")
            .step("path", self.page_by_path(tenant, path, mode))
            .step("slug", self.page_by_slug(tenant, path, mode));

        chain.resolve().await.map(|resolved| resolved.value)
    }

    async fn page_by_path(
        &self,
        tenant: &TenantIdentity,
        path: &str,
        mode: PublicationMode,
    ) -> Result<Option<PageRecord>, FetchError> {
        let cms = self.cms()?;
        let query = CmsQuery::for_page(Some(path), tenant, mode);
        let records = cms.collection(PAGES, &query).await?;
        Ok(records
            .first()
            .map(|record| normalize_page(record, cms.origin())))
    }

    async fn page_by_slug(
        &self,
        tenant: &TenantIdentity,
        path: &str,
        mode: PublicationMode,
    ) -> Result<Option<PageRecord>, FetchError> {
        let cms = self.cms()?;
        let slug = last_segment(path).unwrap_or(HOME_SLUG);
        let query = CmsQuery::new()
            .tenant(tenant, Some(SITE_RELATION))
            .filter(&["slug"], "$eq", slug)
            .publication(mode)
            .populate_chain("parent", PARENT_DEPTH)
            .populate("populate[blocks]", "*");
        let records = cms.collection(PAGES, &query).await?;
        Ok(find_by_candidate(&records, path).map(|record| normalize_page(record, cms.origin())))
    }

    /// Events from the CMS `events` collection.
    pub async fn cms_events(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<Vec<Event>, FetchError> {
        let cms = self.cms()?;
        let query = CmsQuery::new()
            .tenant(tenant, Some(SITE_RELATION))
            .publication(mode)
            .populate_all();
        let records = cms.collection(EVENTS, &query).await?;
        Ok(records
            .iter()
            .filter_map(|record| normalize_event(record, Some(cms.origin())))
            .collect())
    }

    /// The events API GUID from the tenant's site config, else the process
    /// default.
    pub async fn race_ready_guid(&self, tenant: &TenantIdentity) -> Option<String> {
        let lookup = self.site_config(tenant, PublicationMode::Live).await;
        lookup
            .config
            .race_ready_guid
            .filter(|guid| !guid.trim().is_empty())
            .or_else(|| self.default_guid.clone())
    }

    fn raceready(&self) -> Result<&RaceReadyClient, FetchError> {
        self.raceready.as_ref().ok_or(FetchError::NotConfigured)
    }

    /// Event list: events API, then CMS events, then a single event built
    /// from the site hero.
    pub async fn events(&self, tenant: &TenantIdentity, mode: PublicationMode) -> Listing<Event> {
        let chain = FallbackChain::new("events")
            .step("raceready", self.events_from_raceready(tenant))
            .step("cms", self.events_from_cms(tenant, mode))
            .step("hero", self.events_from_hero(tenant, mode));

        match chain.resolve().await {
            Some(resolved) => Listing {
                items: resolved.value,
                source: resolved.source,
            },
            None => Listing::empty(),
        }
    }

    async fn events_from_raceready(
        &self,
        tenant: &TenantIdentity,
    ) -> Result<Option<Vec<Event>>, FetchError> {
        let Some(guid) = self.race_ready_guid(tenant).await else {
            return Ok(None);
        };
        Ok(non_empty(self.raceready()?.events(&guid).await?))
    }

    async fn events_from_cms(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<Option<Vec<Event>>, FetchError> {
        Ok(non_empty(self.cms_events(tenant, mode).await?))
    }

    async fn events_from_hero(
        &self,
        tenant: &TenantIdentity,
        mode: PublicationMode,
    ) -> Result<Option<Vec<Event>>, FetchError> {
        let lookup = self.site_config(tenant, mode).await;
        Ok(hero_event(&lookup.config).map(|event| vec![event]))
    }

    /// A single event by id or slug: events API detail, then the CMS events.
    pub async fn event(&self, tenant: &TenantIdentity, id: &str) -> Option<Event> {
        let chain = FallbackChain::new("event")
            .step("raceready", self.event_from_raceready(tenant, id))
            .step("cms", self.event_from_cms(tenant, id));

        chain.resolve().await.map(|resolved| resolved.value)
    }

    async fn event_from_raceready(
        &self,
        tenant: &TenantIdentity,
        id: &str,
    ) -> Result<Option<Event>, FetchError> {
        let Some(guid) = self.race_ready_guid(tenant).await else {
            return Ok(None);
        };
        self.raceready()?.event(&guid, id).await
    }

    async fn event_from_cms(
        &self,
        tenant: &TenantIdentity,
        id: &str,
    ) -> Result<Option<Event>, FetchError> {
        let events = self.cms_events(tenant, PublicationMode::Live).await?;
        Ok(events
            .into_iter()
            .find(|event| event.id == id || event.slug.as_deref() == Some(id)))
    }

    /// Normalized events API payload for `view`. Without a GUID, or when the
    /// upstream fails, this is `null`.
    pub async fn race_ready_view(&self, tenant: &TenantIdentity, view: &View) -> Value {
        let Some(guid) = self.race_ready_guid(tenant).await else {
            tracing::debug!(%tenant, "no events API GUID configured");
            return Value::Null;
        };
        let result = match self.raceready() {
            Ok(client) => client.view(&guid, view).await,
            Err(error) => Err(error),
        };
        result.unwrap_or_else(|error| {
            tracing::warn!(%tenant, view = view.name(), %error, "events API request failed");
            Value::Null
        })
    }

    pub async fn invalidate_tenant(&self, slug: &str) {
        tracing::info!(slug, "invalidating site config");
        self.configs.invalidate_site(slug).await;
    }

    pub async fn invalidate_configs(&self) {
        tracing::info!("invalidating all site configs");
        self.configs.invalidate_all().await;
    }

    pub fn invalidate_path(&self, path: &str) {
        let path = normalize_path(path);
        tracing::info!(path = %path, "invalidating cached pages");
        self.pages.invalidate_path(&path);
    }

    pub async fn invalidate_all(&self) {
        self.invalidate_configs().await;
        self.pages.invalidate_all();
    }
}

/// Pseudo-event for sites that only advertise their next meeting in the hero.
/// Needs a hero with an event date.
fn hero_event(site: &SiteConfig) -> Option<Event> {
    let hero = site.hero.as_ref()?;
    let start_date = hero.event_date.clone()?;
    let name = hero
        .title
        .clone()
        .or_else(|| (!site.title.is_empty()).then(|| site.title.clone()))?;

    Some(Event {
        id: "hero".to_string(),
        name,
        start_date: Some(start_date),
        image: hero.image.clone(),
        url: hero.cta_url.clone(),
        description: hero.subtitle.clone(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
    use crate::model::Hero;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot() -> SiteSnapshot {
        SiteSnapshot {
            default: SiteConfig {
                title: "Snapshot".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn service(cms: Option<&MockServer>, raceready: Option<&MockServer>) -> ContentService {
        let ttl = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);
        ContentService::new(
            cms.map(|server| {
                CmsClient::new(
                    Url::parse(&server.uri()).unwrap(),
                    Some("token".into()),
                    Duration::from_secs(2),
                )
            }),
            raceready.map(|server| {
                RaceReadyClient::from_config(&RaceReadyConfig {
                    url: Some(Url::parse(&server.uri()).unwrap()),
                    ..Default::default()
                })
                .unwrap()
            }),
            None,
            Arc::new(InMemoryConfigCache::new(ttl, DEFAULT_CACHE_CAPACITY)),
            PageCache::new(ttl, DEFAULT_CACHE_CAPACITY),
            snapshot(),
        )
    }

    fn data(records: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"data": records, "meta": {}}))
    }

    #[tokio::test]
    async fn test_menu_derived_from_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/menus"))
            .respond_with(data(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sites"))
            .and(query_param("filters[slug][$eq]", "mra"))
            .respond_with(data(json!([{"id": 1, "slug": "mra", "menu": []}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/pages"))
            .and(query_param("filters[site][slug][$eq]", "mra"))
            .respond_with(data(json!([
                {"id": 10, "title": "Events", "slug": "events", "showInNav": true, "order": 2},
                {"id": 11, "title": "About", "slug": "about", "showInNav": true, "order": 1}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let content = service(Some(&server), None);
        let menu = content
            .menu(&TenantIdentity::from_slug("mra"), PublicationMode::Live)
            .await;

        assert_eq!(menu.source, "derived");
        let labels: Vec<&str> = menu.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["About", "Events"]);
        assert_eq!(menu.items[1].url, "/events");
    }

    #[tokio::test]
    async fn test_dedicated_menu_skips_derived() {
        let server = MockServer::start().await;
        Mock::given(path("/api/menus"))
            .respond_with(data(json!([{"id": 1, "items": [{"label": "Entries", "url": "/entries"}]}])))
            .mount(&server)
            .await;
        Mock::given(path("/api/sites"))
            .respond_with(data(json!([])))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(path("/api/pages"))
            .respond_with(data(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let content = service(Some(&server), None);
        let menu = content
            .menu(&TenantIdentity::from_slug("mra"), PublicationMode::Live)
            .await;
        assert_eq!(menu.source, "menus");
        assert_eq!(menu.items.len(), 1);
    }

    #[tokio::test]
    async fn test_menu_without_cms() {
        let content = service(None, None);
        let menu = content
            .menu(&TenantIdentity::from_slug("mra"), PublicationMode::Live)
            .await;
        assert_eq!(menu, Listing::empty());
    }

    #[tokio::test]
    async fn test_news_relation_fallback() {
        let server = MockServer::start().await;
        // `sites` relation does not exist on this schema
        Mock::given(path("/api/news-items"))
            .and(query_param("filters[sites][slug][$eq]", "mra"))
            .respond_with(ResponseTemplate::new(400))
            .expect(3)
            .mount(&server)
            .await;
        // no `date` field either
        Mock::given(path("/api/news-items"))
            .and(query_param("filters[site][slug][$eq]", "mra"))
            .and(query_param("sort", "date:desc"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(path("/api/news-items"))
            .and(query_param("filters[site][slug][$eq]", "mra"))
            .and(query_param("sort", "publishedDate:desc"))
            .respond_with(data(json!([{"id": 5, "title": "Round 2 results", "slug": "round-2"}])))
            .mount(&server)
            .await;

        let content = service(Some(&server), None);
        let news = content
            .news(&TenantIdentity::from_slug("mra"), PublicationMode::Live, 12)
            .await;
        assert_eq!(news.source, "site:publishedDate");
        assert_eq!(news.items[0].url, "/news/round-2");
    }

    #[tokio::test]
    async fn test_news_global_fallback_and_total_failure() {
        let server = MockServer::start().await;
        Mock::given(path("/api/news-items"))
            .and(query_param("sort", "publishedAt:desc"))
            .and(query_param("pagination[pageSize]", "3"))
            .respond_with(data(json!([{"id": 1, "title": "Global"}])))
            .mount(&server)
            .await;
        Mock::given(path("/api/news-items"))
            .respond_with(data(json!([])))
            .mount(&server)
            .await;

        let content = service(Some(&server), None);
        // The tenant-scoped publishedAt steps also match the first mock, so
        // use an empty identity to go straight to the global step.
        let news = content
            .news(&TenantIdentity::default(), PublicationMode::Live, 3)
            .await;
        assert_eq!(news.source, "global");
        assert_eq!(news.items.len(), 1);

        let offline = service(None, None);
        let news = offline
            .news(&TenantIdentity::from_slug("mra"), PublicationMode::Live, 3)
            .await;
        assert!(news.items.is_empty());
        assert_eq!(news.source, NO_SOURCE);
    }

    #[tokio::test]
    async fn test_site_config_cache_and_fallback() {
        let server = MockServer::start().await;
        Mock::given(path("/api/sites"))
            .and(query_param("filters[slug][$eq]", "mra"))
            .respond_with(data(json!([{"id": 1, "slug": "mra", "title": "MRA"}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/api/sites"))
            .and(query_param("filters[slug][$eq]", "nobody"))
            .respond_with(data(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let content = service(Some(&server), None);
        let mra = TenantIdentity::from_slug("mra");

        let first = content.site_config(&mra, PublicationMode::Live).await;
        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(first.config.title, "MRA");

        let second = content.site_config(&mra, PublicationMode::Live).await;
        assert_eq!(second.status, CacheStatus::Hit);

        // Empty matches fall back and are not cached
        let nobody = TenantIdentity::from_slug("nobody");
        for _ in 0..2 {
            let lookup = content.site_config(&nobody, PublicationMode::Live).await;
            assert_eq!(lookup.status, CacheStatus::Fallback);
            assert_eq!(lookup.config.title, "Snapshot");
        }
    }

    #[tokio::test]
    async fn test_page_exact_then_slug_scan() {
        let server = MockServer::start().await;
        Mock::given(path("/api/pages"))
            .and(query_param("filters[path][$eq]", "/events/results"))
            .respond_with(data(json!([])))
            .mount(&server)
            .await;
        Mock::given(path("/api/pages"))
            .and(query_param("filters[slug][$eq]", "results"))
            .and(query_param("populate[parent][populate][parent][populate][parent]", "true"))
            .respond_with(data(json!([
                {"id": 1, "title": "Club results", "slug": "results", "parent": {"slug": "club"}},
                {"id": 2, "title": "Event results", "slug": "results", "parent": {"slug": "events"}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let content = service(Some(&server), None);
        let tenant = TenantIdentity::from_slug("mra");

        let page = content
            .page(&tenant, "events//results/", PublicationMode::Live)
            .await
            .unwrap();
        assert_eq!(page.title, "Event results");
        assert_eq!(page.path, "/events/results");

        // Second lookup is served from the page cache
        let cached = content
            .page(&tenant, "/events/results", PublicationMode::Live)
            .await;
        assert_eq!(cached, Some(page));

        assert!(content.page(&tenant, "/missing", PublicationMode::Live).await.is_none());
    }

    #[tokio::test]
    async fn test_events_chain() {
        let cms = MockServer::start().await;
        Mock::given(path("/api/sites"))
            .respond_with(data(json!([{"id": 1, "slug": "mra", "title": "MRA", "raceReadyGUID": "g-1"}])))
            .mount(&cms)
            .await;
        Mock::given(path("/api/events"))
            .respond_with(data(json!([{"id": 4, "title": "CMS round"}])))
            .mount(&cms)
            .await;

        let raceready = MockServer::start().await;
        Mock::given(query_param("guid", "g-1"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&raceready)
            .await;

        let content = service(Some(&cms), Some(&raceready));
        let events = content
            .events(&TenantIdentity::from_slug("mra"), PublicationMode::Live)
            .await;
        assert_eq!(events.source, "cms");
        assert_eq!(events.items[0].name, "CMS round");
    }

    #[tokio::test]
    async fn test_race_ready_view_without_guid_is_null() {
        let content = service(None, None);
        let value = content
            .race_ready_view(&TenantIdentity::from_slug("mra"), &View::Next)
            .await;
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_hero_event() {
        let mut site = SiteConfig {
            title: "MRA".into(),
            hero: Some(Hero {
                subtitle: Some("Winton".into()),
                event_date: Some("2024-05-04".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let event = hero_event(&site).unwrap();
        assert_eq!(event.name, "MRA");
        assert_eq!(event.start_date.as_deref(), Some("2024-05-04"));
        assert!(event.entries.is_empty());

        site.hero = Some(Hero {
            title: Some("No date".into()),
            ..Default::default()
        });
        assert!(hero_event(&site).is_none());
    }
}

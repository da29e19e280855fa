use crate::config::Config;
use crate::draft::DraftGate;
use crate::errors::GatewayError;
use crate::handlers::{self, HandlerResult, RequestContext, json_error};
use crate::headers;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use crate::push::{InMemorySubscriptionStore, SubscriptionStore};
use crate::router::{Action, route_table};
use bytes::Bytes;
use content::{ContentService, TenantResolver};
use http::header::{ALLOW, CACHE_CONTROL, HeaderValue};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use routing::RouteTable;
use shared::http::{into_boxed, make_error_response};
use shared::{gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Upper bound for webhook and subscription bodies.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Request handling independent of the transport. Takes fully buffered
/// requests so it can be driven directly in tests.
pub struct Gateway {
    content: ContentService,
    resolver: TenantResolver,
    draft: DraftGate,
    revalidate_secret: Option<String>,
    subscriptions: Arc<dyn SubscriptionStore>,
    routes: RouteTable<Action>,
}

impl Gateway {
    /// Builds the gateway. Fails when the site config snapshot cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let content = ContentService::from_settings(&config.content_settings())?;
        Ok(Gateway::new(
            content,
            TenantResolver::new(config.tenant.default_slug.clone()),
            DraftGate::new(config.secrets.preview.clone(), config.site_url.clone()),
            config.secrets.revalidate.clone(),
            Arc::new(InMemorySubscriptionStore::new(config.push.max_subscriptions)),
        ))
    }

    pub fn new(
        content: ContentService,
        resolver: TenantResolver,
        draft: DraftGate,
        revalidate_secret: Option<String>,
        subscriptions: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Gateway {
            content,
            resolver,
            draft,
            revalidate_secret: revalidate_secret.filter(|s| !s.is_empty()),
            subscriptions,
            routes: route_table(),
        }
    }

    /// Route name for metrics, without running the handler.
    pub fn route_name(&self, path: &str) -> &'static str {
        self.routes
            .resolve(path)
            .map(|matched| matched.action.name())
            .unwrap_or("unknown")
    }

    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        self.dispatch(request).await.unwrap_or_else(|error| {
            tracing::error!(%method, path = %path, %error, "request failed");
            make_error_response(error.status())
        })
    }

    async fn dispatch(&self, mut request: Request<Bytes>) -> HandlerResult {
        headers::propagate(&mut request);

        let Some(matched) = self.routes.resolve(request.uri().path()) else {
            return json_error(StatusCode::NOT_FOUND, "Not found");
        };
        let action = *matched.action;
        let event_id = matched.param("id").map(str::to_string);
        let page_path = format!("/{}", matched.rest.join("/"));

        if !action.allows(request.method()) {
            return method_not_allowed(action);
        }

        let tenant = self
            .resolver
            .resolve(request.headers(), request.uri().query());
        let mode = self.draft.mode(request.headers());
        tracing::debug!(route = action.name(), tenant = %tenant, draft = mode.is_draft(), "dispatching");

        let ctx = RequestContext::new(&request, tenant, mode);
        let content = &self.content;

        let mut response = match action {
            Action::Config => handlers::config::site_config(content, &ctx).await,
            Action::Menu => handlers::config::menu(content, &ctx).await,
            Action::News => handlers::news::news(content, &ctx).await,
            Action::Events => handlers::events::events(content, &ctx).await,
            Action::Event => {
                let id = event_id.unwrap_or_default();
                handlers::events::event(content, &ctx, &id).await
            }
            Action::RaceReadyEvents => handlers::events::race_ready_events(content, &ctx).await,
            Action::Revalidate => {
                handlers::revalidate::revalidate(content, self.revalidate_secret.as_deref(), &ctx)
                    .await
            }
            Action::DraftEnable => handlers::draft::enable(&self.draft, &ctx),
            Action::DraftDisable => handlers::draft::disable(&self.draft, &ctx),
            Action::PushSubscribe => handlers::push::subscribe(self.subscriptions.as_ref(), &ctx),
            Action::ApiNotFound => json_error(StatusCode::NOT_FOUND, "Not found"),
            Action::Page => handlers::page::page(content, &ctx, &page_path).await,
        }?;

        if mode.is_draft() {
            response
                .headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("private, no-store"));
        }
        Ok(response)
    }
}

fn method_not_allowed(action: Action) -> HandlerResult {
    let allow = action
        .methods()
        .iter()
        .map(|method| method.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut response = json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")?;
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    Ok(response)
}

/// hyper service wrapping [`Gateway`]: buffers the body, dispatches and
/// records request metrics.
pub struct GatewayService {
    gateway: Arc<Gateway>,
}

impl GatewayService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        GatewayService { gateway }
    }
}

impl Service<Request<Incoming>> for GatewayService {
    type Response = Response<BoxBody<Bytes, GatewayError>>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let gateway = self.gateway.clone();

        Box::pin(async move {
            let start = Instant::now();
            let route = gateway.route_name(req.uri().path());
            gauge!(REQUESTS_INFLIGHT).increment(1.0);

            let (parts, body) = req.into_parts();
            let response = match read_body(body).await {
                Ok(body) => gateway.handle(Request::from_parts(parts, body)).await,
                Err(error) => {
                    tracing::debug!(route, %error, "could not read request body");
                    make_error_response(error.status())
                }
            };

            gauge!(REQUESTS_INFLIGHT).decrement(1.0);
            histogram!(REQUEST_DURATION, "route" => route, "status" => response.status().as_str().to_string())
                .record(start.elapsed().as_secs_f64());

            Ok(into_boxed(response))
        })
    }
}

async fn read_body(body: Incoming) -> Result<Bytes, GatewayError> {
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(error) if error.downcast_ref::<LengthLimitError>().is_some() => {
            Err(GatewayError::RequestBodyTooLarge(MAX_BODY_BYTES))
        }
        Err(error) => Err(GatewayError::RequestBody(error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http::header::{COOKIE, HOST, LOCATION, SET_COOKIE};
    use serde_json::{Value, json};
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(extra: &str) -> Config {
        let yaml = format!(
            r#"
listener:
    host: "127.0.0.1"
    port: 3000
admin_listener:
    host: "127.0.0.1"
    port: 3001
secrets:
    revalidate: "hook"
    preview: "peek"
{extra}
"#
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    fn gateway(extra: &str) -> Gateway {
        Gateway::from_config(&config(extra)).unwrap()
    }

    fn get(uri: &str) -> Request<Bytes> {
        Request::builder()
            .uri(uri)
            .header(HOST, "mra.com.au")
            .body(Bytes::new())
            .unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: &str) -> Request<Bytes> {
        Request::builder()
            .uri(uri)
            .header(HOST, "mra.com.au")
            .header(COOKIE, cookie)
            .body(Bytes::new())
            .unwrap()
    }

    fn cms_gateway(cms: &MockServer) -> Gateway {
        gateway(&format!(
            "cms:\n    url: \"{}\"\n    api_token: \"token\"\n",
            cms.uri()
        ))
    }

    fn body_json(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_config_falls_back_when_cms_refuses_connections() {
        // Nothing listens on port 1
        let gateway = gateway(
            r#"
cms:
    url: "http://127.0.0.1:1"
    api_token: "token"
    timeout_secs: 2
"#,
        );

        let response = gateway.handle(get("/api/config")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "FALLBACK");
        let body = body_json(&response);
        assert_eq!(body["title"], json!("Motor Racing"));
        assert_eq!(body["menu"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_config_hit_and_miss() {
        let cms = MockServer::start().await;
        Mock::given(path("/api/sites"))
            .and(query_param("filters[domain][$containsi]", "mra.com.au"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "attributes": {"slug": "mra", "title": "MRA"}}]
            })))
            .expect(1)
            .mount(&cms)
            .await;

        let gateway = gateway(&format!(
            "cms:\n    url: \"{}\"\n    api_token: \"token\"\n",
            cms.uri()
        ));

        let first = gateway.handle(get("/api/config")).await;
        assert_eq!(first.headers().get("x-cache-status").unwrap(), "MISS");
        assert_eq!(body_json(&first)["title"], json!("MRA"));

        let second = gateway.handle(get("/api/config")).await;
        assert_eq!(second.headers().get("x-cache-status").unwrap(), "HIT");
    }

    #[tokio::test]
    async fn test_revalidate_tag_drops_host_keyed_config() {
        let cms = MockServer::start().await;
        Mock::given(path("/api/sites"))
            .and(query_param("filters[domain][$containsi]", "mra.com.au"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "attributes": {"slug": "mra", "title": "MRA"}}]
            })))
            .expect(2)
            .mount(&cms)
            .await;

        let gateway = cms_gateway(&cms);

        let response = gateway.handle(get("/api/config")).await;
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "MISS");
        let response = gateway.handle(get("/api/config")).await;
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "HIT");

        let response = gateway
            .handle(get("/api/revalidate?token=hook&tag=mra"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = gateway.handle(get("/api/config")).await;
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "MISS");
    }

    #[tokio::test]
    async fn test_draft_cookie_switches_queries_to_draft() {
        let cms = MockServer::start().await;
        let site = |title: &str| {
            json!({"data": [{"id": 1, "attributes": {"slug": "mra", "title": title}}]})
        };
        let page = |title: &str| {
            json!({"data": [{"id": 3, "title": title, "slug": "history", "path": "/club/history"}]})
        };

        // Draft lookups skip both caches, so every request reaches the CMS
        Mock::given(path("/api/sites"))
            .and(query_param("status", "draft"))
            .respond_with(ResponseTemplate::new(200).set_body_json(site("MRA draft")))
            .expect(2)
            .mount(&cms)
            .await;
        Mock::given(path("/api/pages"))
            .and(query_param("status", "draft"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page("History draft")))
            .expect(2)
            .mount(&cms)
            .await;

        let gateway = cms_gateway(&cms);

        let enable = gateway.handle(get("/api/draft/enable?token=peek")).await;
        let set_cookie = enable.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        for _ in 0..2 {
            let response = gateway.handle(get_with_cookie("/api/config", &cookie)).await;
            assert_eq!(response.headers().get("x-cache-status").unwrap(), "MISS");
            assert_eq!(
                response.headers().get(CACHE_CONTROL).unwrap(),
                "private, no-store"
            );
            assert_eq!(body_json(&response)["title"], json!("MRA draft"));

            let response = gateway
                .handle(get_with_cookie("/club/history", &cookie))
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(&response)["title"], json!("History draft"));
        }
    }

    #[tokio::test]
    async fn test_forged_draft_cookie_stays_published() {
        let cms = MockServer::start().await;
        for collection in ["/api/sites", "/api/pages", "/api/menus", "/api/news-items"] {
            Mock::given(path(collection))
                .and(query_param("status", "draft"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
                .expect(0)
                .mount(&cms)
                .await;
        }
        Mock::given(path("/api/sites"))
            .and(query_param("status", "published"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "attributes": {"slug": "mra", "title": "MRA"}}]
            })))
            .expect(1)
            .mount(&cms)
            .await;
        Mock::given(path("/api/pages"))
            .and(query_param("status", "published"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 3, "title": "History", "slug": "history", "path": "/club/history"}]
            })))
            .expect(1)
            .mount(&cms)
            .await;
        Mock::given(path("/api/menus"))
            .and(query_param("status", "published"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "label": "Home", "url": "/"}]
            })))
            .expect(1)
            .mount(&cms)
            .await;
        Mock::given(path("/api/news-items"))
            .and(query_param("status", "published"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1, "title": "Round 1 wrap"}]
            })))
            .expect(1)
            .mount(&cms)
            .await;

        let gateway = cms_gateway(&cms);

        // Without a cookie the published config is fetched once and cached
        let response = gateway.handle(get("/api/config")).await;
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "MISS");

        for forged in ["pitlane_draft=00ff", "pitlane_draft=peek", "pitlane_draft="] {
            let response = gateway.handle(get_with_cookie("/api/config", forged)).await;
            assert_eq!(response.headers().get("x-cache-status").unwrap(), "HIT");
            assert!(response.headers().get(CACHE_CONTROL).is_none());
            assert_eq!(body_json(&response)["title"], json!("MRA"));

            let response = gateway.handle(get_with_cookie("/club/history", forged)).await;
            assert_eq!(body_json(&response)["title"], json!("History"));
        }

        let response = gateway
            .handle(get_with_cookie("/api/menu", "pitlane_draft=00ff"))
            .await;
        assert_eq!(body_json(&response)["source"], json!("menus"));

        let response = gateway
            .handle(get_with_cookie("/api/news", "pitlane_draft=00ff"))
            .await;
        assert_eq!(body_json(&response)[0]["title"], json!("Round 1 wrap"));
    }

    #[tokio::test]
    async fn test_draft_enable_rejects_wrong_token() {
        let gateway = gateway("");

        let response = gateway.handle(get("/api/draft/enable?token=wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_json(&response), json!({"message": "Invalid token"}));
    }

    #[tokio::test]
    async fn test_draft_enable_and_disable() {
        let gateway = gateway("");

        let response = gateway
            .handle(get("/api/draft/enable?token=peek&redirect=/events"))
            .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/events");
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("pitlane_draft="));
        assert!(cookie.contains("HttpOnly"));

        let response = gateway
            .handle(get("/api/draft/disable?redirect=https://evil.example.com"))
            .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_raceready_event_view_requires_event() {
        let gateway = gateway("");

        let response = gateway
            .handle(get("/api/raceready-events?view=event"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = body_json(&response)["error"].as_str().unwrap().to_string();
        assert!(message.contains("event"));

        let response = gateway
            .handle(get("/api/raceready-events?view=calendar"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // No GUID anywhere: null, not an error
        let response = gateway.handle(get("/api/raceready-events")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response), Value::Null);
    }

    #[tokio::test]
    async fn test_revalidate() {
        let gateway = gateway("");

        let response = gateway.handle(get("/api/revalidate?token=nope")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(&response), json!({"message": "Invalid token"}));

        let response = gateway
            .handle(get("/api/revalidate?token=hook&tag=mra"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(&response);
        assert_eq!(body["revalidated"], json!(true));
        assert_eq!(body["tag"], json!("mra"));
        assert!(body["now"].as_u64().unwrap() > 0);

        let request = Request::builder()
            .method("POST")
            .uri("/api/revalidate")
            .header("x-revalidate-token", "hook")
            .body(Bytes::from_static(br#"{"path": "/events/"}"#))
            .unwrap();
        let response = gateway.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["path"], json!("/events/"));
    }

    #[tokio::test]
    async fn test_revalidate_without_secret_rejects_everything() {
        let mut config = config("");
        config.secrets.revalidate = None;
        let gateway = Gateway::from_config(&config).unwrap();

        let response = gateway.handle(get("/api/revalidate?token=")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_snapshot_only_mode() {
        let gateway = gateway("");

        let response = gateway.handle(get("/api/news?limit=5")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response), json!([]));

        let response = gateway.handle(get("/api/menu")).await;
        assert_eq!(body_json(&response), json!({"items": [], "source": "none"}));

        let response = gateway.handle(get("/api/events/round-1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(&response), json!({"error": "Event not found"}));

        let response = gateway.handle(get("/club/history")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = gateway.handle(get("/api/nothing-here")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_page_route() {
        let cms = MockServer::start().await;
        Mock::given(path("/api/pages"))
            .and(query_param("filters[path][$eq]", "/club/history"))
            .and(query_param("filters[site][domain][$containsi]", "mra.com.au"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": 3,
                    "title": "History",
                    "slug": "history",
                    "path": "/club/history",
                    "blocks": [{"__component": "blocks.rich-text", "body": "Since 1950"}]
                }]
            })))
            .mount(&cms)
            .await;

        let gateway = gateway(&format!(
            "cms:\n    url: \"{}\"\n    api_token: \"token\"\n",
            cms.uri()
        ));

        let response = gateway.handle(get("/club/history/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(&response);
        assert_eq!(body["title"], json!("History"));
        assert_eq!(body["blocks"][0]["type"], json!("rich-text"));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let gateway = gateway("");
        let request = Request::builder()
            .method("POST")
            .uri("/api/news")
            .body(Bytes::new())
            .unwrap();

        let response = gateway.handle(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET, HEAD");
    }

    #[tokio::test]
    async fn test_push_subscribe() {
        let store = Arc::new(InMemorySubscriptionStore::new(1));
        let content = ContentService::from_settings(&config("").content_settings()).unwrap();
        let gateway = Gateway::new(
            content,
            TenantResolver::default(),
            DraftGate::new(None, None),
            None,
            store.clone(),
        );

        let subscribe = Request::builder()
            .method("POST")
            .uri("/api/push/subscribe")
            .body(Bytes::from_static(
                br#"{"endpoint": "https://push.example.com/1", "keys": {"p256dh": "k", "auth": "a"}}"#,
            ))
            .unwrap();
        let response = gateway.handle(subscribe).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(store.len(), 1);

        let invalid = Request::builder()
            .method("POST")
            .uri("/api/push/subscribe")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        assert_eq!(gateway.handle(invalid).await.status(), StatusCode::BAD_REQUEST);

        // At capacity: a second endpoint is refused
        let second = Request::builder()
            .method("POST")
            .uri("/api/push/subscribe")
            .body(Bytes::from_static(
                br#"{"endpoint": "https://push.example.com/2", "keys": {"p256dh": "k", "auth": "a"}}"#,
            ))
            .unwrap();
        let response = gateway.handle(second).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(store.len(), 1);

        let unsubscribe = Request::builder()
            .method("DELETE")
            .uri("/api/push/subscribe?endpoint=https%3A%2F%2Fpush.example.com%2F1")
            .body(Bytes::new())
            .unwrap();
        let response = gateway.handle(unsubscribe).await;
        assert_eq!(body_json(&response), json!({"removed": true}));
        assert!(store.is_empty());
    }
}

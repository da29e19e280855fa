use crate::config::CmsConfig;
use crate::errors::FetchError;
use crate::metrics_defs::UPSTREAM_REQUEST;
use crate::query::CmsQuery;
use serde_json::Value;
use shared::counter;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// GET-only JSON client for one upstream.
#[derive(Clone, Debug)]
pub struct JsonClient {
    client: reqwest::Client,
    upstream: &'static str,
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
}

impl JsonClient {
    pub fn new(
        upstream: &'static str,
        base_url: Url,
        token: Option<String>,
        timeout: Duration,
    ) -> Self {
        JsonClient {
            client: reqwest::Client::new(),
            upstream,
            base_url,
            token,
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches `path` below the base URL with a pre-encoded query string.
    ///
    /// The timeout covers the whole exchange including reading the body.
    pub async fn get(&self, path: &str, query: &str) -> Result<Value, FetchError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }

        let result = timeout(self.timeout, self.fetch(url.clone())).await;
        let result = match result {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(url.to_string())),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(error) => error.outcome(),
        };
        counter!(UPSTREAM_REQUEST, "upstream" => self.upstream, "outcome" => outcome).increment(1);

        if let Err(error) = &result {
            tracing::debug!(upstream = self.upstream, %error, "upstream request failed");
        }
        result
    }

    async fn fetch(&self, url: Url) -> Result<Value, FetchError> {
        let url_string = url.to_string();
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| FetchError::Request {
            url: url_string.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_string,
                status,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::InvalidJson {
                url: url_string,
                message: e.to_string(),
            })
    }
}

/// Client for the CMS REST API (`/api/<collection>`).
#[derive(Clone, Debug)]
pub struct CmsClient {
    inner: JsonClient,
    origin: String,
}

impl CmsClient {
    /// Returns `None` when the CMS URL or token is missing.
    pub fn from_config(config: &CmsConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let url = config.url.clone()?;
        Some(CmsClient::new(url, config.api_token.clone(), config.timeout()))
    }

    pub fn new(base_url: Url, token: Option<String>, timeout: Duration) -> Self {
        let origin = base_url.as_str().trim_end_matches('/').to_string();
        CmsClient {
            inner: JsonClient::new("cms", base_url, token, timeout),
            origin,
        }
    }

    /// Origin used to absolutize uploaded media.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Records of a collection, unwrapped from the `data` envelope.
    pub async fn collection(&self, name: &str, query: &CmsQuery) -> Result<Vec<Value>, FetchError> {
        let body = self
            .inner
            .get(&format!("api/{name}"), &query.to_query_string())
            .await?;

        let records = match body {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) | None => Vec::new(),
                Some(single) => vec![single],
            },
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        tracing::debug!(collection = name, count = records.len(), "cms collection fetched");
        Ok(records)
    }
}

//! One handler per route. Handlers receive a fully buffered request and
//! return a fully buffered response.

pub mod config;
pub mod draft;
pub mod events;
pub mod news;
pub mod page;
pub mod push;
pub mod revalidate;

use crate::errors::GatewayError;
use bytes::Bytes;
use content::{PublicationMode, TenantIdentity};
use http::{Request, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use shared::http::make_json_response;

pub type HandlerResult = Result<Response<Bytes>, GatewayError>;

/// Per-request values shared by every handler.
pub struct RequestContext<'a> {
    pub request: &'a Request<Bytes>,
    pub tenant: TenantIdentity,
    pub mode: PublicationMode,
    query: Vec<(String, String)>,
}

impl<'a> RequestContext<'a> {
    pub fn new(request: &'a Request<Bytes>, tenant: TenantIdentity, mode: PublicationMode) -> Self {
        let query = request
            .uri()
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        RequestContext {
            request,
            tenant,
            mode,
            query,
        }
    }

    /// First non-empty value of a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }
}

pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> HandlerResult {
    let body = serde_json::to_vec(body)?;
    Ok(make_json_response(status, body))
}

/// `{"error": "<message>"}`
pub fn json_error(status: StatusCode, message: &str) -> HandlerResult {
    json_response(status, &json!({ "error": message }))
}

/// 401 shared by the secret-protected endpoints.
pub fn invalid_token() -> HandlerResult {
    json_response(StatusCode::UNAUTHORIZED, &json!({ "message": "Invalid token" }))
}

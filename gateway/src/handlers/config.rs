use super::{HandlerResult, RequestContext, json_response};
use content::ContentService;
use http::StatusCode;
use http::header::HeaderValue;

pub const CACHE_STATUS_HEADER: &str = "x-cache-status";
pub const CONTENT_SOURCE_HEADER: &str = "x-content-source";

/// `GET /api/config`: always 200. When the CMS cannot answer the body is the
/// static snapshot and the cache status is `FALLBACK`.
pub async fn site_config(content: &ContentService, ctx: &RequestContext<'_>) -> HandlerResult {
    let lookup = content.site_config(&ctx.tenant, ctx.mode).await;
    tracing::debug!(tenant = %ctx.tenant, status = lookup.status.as_str(), "site config");

    let mut response = json_response(StatusCode::OK, &lookup.config)?;
    response.headers_mut().insert(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(lookup.status.as_str()),
    );
    Ok(response)
}

/// `GET /api/menu`: `{"items": [...], "source": "..."}`.
pub async fn menu(content: &ContentService, ctx: &RequestContext<'_>) -> HandlerResult {
    let listing = content.menu(&ctx.tenant, ctx.mode).await;
    let mut response = json_response(StatusCode::OK, &listing)?;
    response.headers_mut().insert(
        CONTENT_SOURCE_HEADER,
        HeaderValue::from_static(listing.source),
    );
    Ok(response)
}
